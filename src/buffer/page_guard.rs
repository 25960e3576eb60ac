use crate::error::Result;

use super::buffer_pool::{BufferPool, PageHandle};

/// An RAII pin on a single page. Unpins on drop, and propagates whatever
/// `unpin_page` returns via the `Drop` impl only for logging — callers who
/// need the `Result` should call `unpin` explicitly instead of letting the
/// guard drop.
///
/// This covers the common case of touching one page at a time. Code that
/// must hold several pins concurrently (the record manager's free-list
/// relinking, which walks up to three linked pages) calls
/// `BufferPool::pin_page`/`unpin_page` directly instead, since a `PagePin`
/// borrows the pool mutably for its lifetime and a second one would not
/// borrow-check.
pub struct PagePin<'a> {
    pool: &'a mut BufferPool,
    handle: PageHandle,
    released: bool,
}

impl<'a> PagePin<'a> {
    pub fn new(pool: &'a mut BufferPool, page_num: crate::common::PageNumber) -> Result<Self> {
        let handle = pool.pin_page(page_num)?;
        Ok(Self {
            pool,
            handle,
            released: false,
        })
    }

    pub fn handle(&self) -> &PageHandle {
        &self.handle
    }

    pub fn data(&self) -> &[u8; crate::common::config::PAGE_SIZE] {
        self.pool.page_data(&self.handle)
    }

    pub fn data_mut(&mut self) -> &mut [u8; crate::common::config::PAGE_SIZE] {
        self.pool.page_data_mut(&self.handle)
    }

    pub fn mark_dirty(&mut self) {
        self.pool.mark_dirty(&self.handle);
    }

    /// Unpins the page now, surfacing any error instead of swallowing it
    /// in `Drop`.
    pub fn unpin(mut self) -> Result<()> {
        self.released = true;
        self.pool.unpin_page(&self.handle)
    }
}

impl Drop for PagePin<'_> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.pool.unpin_page(&self.handle) {
                tracing::warn!(error = %e, page = self.handle.page_num, "unpin on drop failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::buffer_pool::ReplacementStrategy;
    use crate::storage::DiskManager;
    use tempdir::TempDir;

    #[test]
    fn guard_unpins_on_drop() {
        let dir = TempDir::new("tupledb-guard").unwrap();
        let path = dir.path().join("test.db");
        let path = path.to_str().unwrap();
        DiskManager::create_page_file(path).unwrap();
        {
            let mut dm = DiskManager::open_page_file(path).unwrap();
            dm.ensure_capacity(2).unwrap();
        }

        let mut pool = BufferPool::init(path, 1, ReplacementStrategy::Fifo).unwrap();
        {
            let mut pin = PagePin::new(&mut pool, 0).unwrap();
            pin.data_mut()[..3].copy_from_slice(b"abc");
            pin.mark_dirty();
        }
        assert_eq!(pool.get_fix_counts(), vec![0]);

        let pin2 = PagePin::new(&mut pool, 0).unwrap();
        assert_eq!(&pin2.data()[..3], b"abc");
    }
}
