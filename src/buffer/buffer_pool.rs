use std::collections::HashMap;

use tracing::{debug, warn};

use crate::common::config::{FrameId, PageNumber, PAGE_SIZE};
use crate::error::{Error, Result};
use crate::storage::DiskManager;

use super::frame::Frame;

/// The page-replacement policy a `BufferPool` was constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementStrategy {
    Fifo,
    Lru,
    Clock,
}

/// A lightweight, `Copy` reference to a pinned page. Unlike a Rust borrow,
/// holding one does not prevent further calls into the owning `BufferPool`
/// — it is exactly the small id/pointer pair passed around by value, which
/// is what lets the record manager hold several pins
/// (the current page plus up to two free-list neighbors) at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle {
    pub page_num: PageNumber,
    pub(crate) frame_id: FrameId,
}

/// A bounded set of page frames over a single page file, with pinning,
/// dirty tracking, and FIFO/LRU/CLOCK victim selection.
///
/// Frames live in one arena (`frames: Vec<Frame>`) allocated at
/// construction and never resized; `head`/`tail`/`clock_hand` and each
/// frame's own `prev`/`next` are indices into that arena, not pointers.
pub struct BufferPool {
    file_name: String,
    num_pages: usize,
    strategy: ReplacementStrategy,
    frames: Vec<Frame>,
    page_table: HashMap<PageNumber, FrameId>,
    head: Option<FrameId>,
    tail: Option<FrameId>,
    clock_hand: Option<FrameId>,
    disk: DiskManager,
    num_read_io: u64,
    num_write_io: u64,
}

impl BufferPool {
    /// Opens `file_name` and allocates exactly `num_pages` empty frames,
    /// linked into a doubly linked list (closed into a ring for `Clock`,
    /// with the hand starting at the head).
    pub fn init(file_name: &str, num_pages: usize, strategy: ReplacementStrategy) -> Result<Self> {
        let disk = DiskManager::open_page_file(file_name)?;

        let mut frames: Vec<Frame> = (0..num_pages).map(|_| Frame::empty()).collect();
        for i in 0..num_pages {
            frames[i].prev = if i == 0 { None } else { Some(i - 1) };
            frames[i].next = if i + 1 == num_pages { None } else { Some(i + 1) };
        }
        let head = if num_pages == 0 { None } else { Some(0) };
        let tail = if num_pages == 0 {
            None
        } else {
            Some(num_pages - 1)
        };

        let clock_hand = if strategy == ReplacementStrategy::Clock && num_pages > 0 {
            frames[num_pages - 1].next = Some(0);
            frames[0].prev = Some(num_pages - 1);
            head
        } else {
            None
        };

        Ok(Self {
            file_name: file_name.to_string(),
            num_pages,
            strategy,
            frames,
            page_table: HashMap::new(),
            head,
            tail,
            clock_hand,
            disk,
            num_read_io: 0,
            num_write_io: 0,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    pub fn strategy(&self) -> ReplacementStrategy {
        self.strategy
    }

    /// Fails with `WriteFailed` if any frame is still pinned. Otherwise
    /// flushes every dirty frame and releases the pool.
    pub fn shutdown(mut self) -> Result<()> {
        if let Some(id) = self.frames.iter().position(|f| f.pin_count > 0) {
            warn!(frame = id, "refusing to shut down buffer pool: page pinned");
            return Err(Error::WriteFailed {
                detail: format!("frame {id} still pinned"),
            });
        }
        self.force_flush_pool()
    }

    /// Writes every dirty, unpinned frame back to disk.
    pub fn force_flush_pool(&mut self) -> Result<()> {
        for id in 0..self.frames.len() {
            if self.frames[id].dirty && self.frames[id].pin_count == 0 {
                let page_num = self.frames[id].page_num;
                self.disk.write_block(page_num, &self.frames[id].data)?;
                self.frames[id].dirty = false;
                self.num_write_io += 1;
            }
        }
        Ok(())
    }

    /// Marks the frame holding `handle.page_num` as dirty.
    pub fn mark_dirty(&mut self, handle: &PageHandle) {
        debug_assert_eq!(self.frames[handle.frame_id].page_num, handle.page_num);
        self.frames[handle.frame_id].dirty = true;
    }

    /// Decrements the frame's pin count. Returns `WriteFailed` if the count
    /// would go negative. If the frame is dirty after the decrement, writes
    /// it to disk via `force_page` and clears the dirty flag.
    pub fn unpin_page(&mut self, handle: &PageHandle) -> Result<()> {
        let id = handle.frame_id;
        debug_assert_eq!(self.frames[id].page_num, handle.page_num);
        self.frames[id].pin_count -= 1;
        if self.frames[id].pin_count < 0 {
            self.frames[id].pin_count = 0;
            return Err(Error::WriteFailed {
                detail: format!("unpin underflow on page {}", handle.page_num),
            });
        }
        if self.frames[id].dirty {
            self.force_page(handle)?;
            self.frames[id].dirty = false;
        }
        Ok(())
    }

    /// Unconditionally writes the frame's data to disk, regardless of the
    /// dirty flag, and increments `num_write_io`.
    pub fn force_page(&mut self, handle: &PageHandle) -> Result<()> {
        let id = handle.frame_id;
        debug_assert_eq!(self.frames[id].page_num, handle.page_num);
        self.disk.write_block(handle.page_num, &self.frames[id].data)?;
        self.num_write_io += 1;
        Ok(())
    }

    /// Pins `page_num`, returning a handle to its frame. Reads the page
    /// from disk on a miss, evicting a victim chosen by this pool's
    /// strategy. Fails with `NoFreeFrame` if every frame is pinned.
    pub fn pin_page(&mut self, page_num: PageNumber) -> Result<PageHandle> {
        if let Some(&id) = self.page_table.get(&page_num) {
            self.frames[id].pin_count += 1;
            self.frames[id].ref_bit = true;
            match self.strategy {
                ReplacementStrategy::Fifo => {}
                ReplacementStrategy::Lru => self.move_to_head(id),
                ReplacementStrategy::Clock => self.clock_hand = self.frames[id].next,
            }
            return Ok(PageHandle {
                page_num,
                frame_id: id,
            });
        }

        let victim = match self.strategy {
            ReplacementStrategy::Fifo | ReplacementStrategy::Lru => self.find_tail_victim()?,
            ReplacementStrategy::Clock => self.find_clock_victim()?,
        };

        self.load_into_frame(victim, page_num)?;

        match self.strategy {
            ReplacementStrategy::Fifo | ReplacementStrategy::Lru => self.move_to_head(victim),
            ReplacementStrategy::Clock => {
                self.clock_hand = self.frames[victim].next;
            }
        }

        Ok(PageHandle {
            page_num,
            frame_id: victim,
        })
    }

    /// Walks backward from the tail for the first unpinned frame.
    fn find_tail_victim(&self) -> Result<FrameId> {
        let mut cur = self.tail;
        while let Some(id) = cur {
            if self.frames[id].pin_count == 0 {
                return Ok(id);
            }
            cur = self.frames[id].prev;
        }
        Err(Error::NoFreeFrame)
    }

    /// Walks forward from the hand for the first frame with `pin == 0 &&
    /// ref_bit == 0`, clearing ref bits it passes over.
    ///
    /// One full revolution (`num_pages` steps) only guarantees every
    /// resident frame's ref bit has been cleared; it does not guarantee a
    /// victim has been seen with its ref bit already clear, since a frame
    /// visited early in the sweep may have had `ref_bit == true` at the
    /// time it was passed over. The sweep needs up to `num_pages + 1` steps
    /// so the hand can come back around and re-check that frame once its
    /// bit has been cleared.
    fn find_clock_victim(&mut self) -> Result<FrameId> {
        let start = self.clock_hand.ok_or(Error::NoFreeFrame)?;
        let mut cur = start;
        for _ in 0..=self.num_pages {
            if self.frames[cur].pin_count == 0 && !self.frames[cur].ref_bit {
                return Ok(cur);
            }
            self.frames[cur].ref_bit = false;
            cur = self.frames[cur]
                .next
                .expect("clock ring must be fully linked");
        }
        Err(Error::NoFreeFrame)
    }

    /// Flushes a dirty victim (always — this is the one deliberate
    /// deviation from the original, which skipped the flush on FIFO/LRU
    /// replacement), reads the new page in, and pins it.
    fn load_into_frame(&mut self, id: FrameId, page_num: PageNumber) -> Result<()> {
        if self.frames[id].is_resident() {
            if self.frames[id].dirty {
                let old_num = self.frames[id].page_num;
                self.disk.write_block(old_num, &self.frames[id].data)?;
                self.num_write_io += 1;
                self.frames[id].dirty = false;
            }
            self.page_table.remove(&self.frames[id].page_num);
        }

        self.disk.read_block(page_num, &mut self.frames[id].data)?;
        self.num_read_io += 1;
        self.frames[id].page_num = page_num;
        self.frames[id].pin_count = 1;
        self.frames[id].ref_bit = true;
        self.page_table.insert(page_num, id);
        debug!(page_num, frame = id, "pinned page (miss)");
        Ok(())
    }

    fn unlink(&mut self, id: FrameId) {
        let prev = self.frames[id].prev;
        let next = self.frames[id].next;
        match prev {
            Some(p) => self.frames[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.frames[n].prev = prev,
            None => self.tail = prev,
        }
        self.frames[id].prev = None;
        self.frames[id].next = None;
    }

    fn push_front(&mut self, id: FrameId) {
        let old_head = self.head;
        self.frames[id].prev = None;
        self.frames[id].next = old_head;
        if let Some(h) = old_head {
            self.frames[h].prev = Some(id);
        }
        self.head = Some(id);
        if self.tail.is_none() {
            self.tail = Some(id);
        }
    }

    /// Used by FIFO-on-hit-is-a-no-op / LRU-on-any-touch to promote `id` to
    /// the most-recently-used position.
    fn move_to_head(&mut self, id: FrameId) {
        if self.head == Some(id) {
            return;
        }
        self.unlink(id);
        self.push_front(id);
    }

    /// The page file's current page count (a passthrough to the storage
    /// layer, not tracked separately by the pool).
    pub fn total_pages(&self) -> PageNumber {
        self.disk.total_pages()
    }

    /// Grows the underlying file by one empty page and returns its page
    /// number. Used by the record manager to allocate a fresh data page
    /// without going through `pin_page` (the page isn't pinned or cached
    /// by this call — the caller pins it separately).
    pub fn append_empty_page(&mut self) -> Result<PageNumber> {
        self.disk.append_empty_block()?;
        Ok(self.disk.total_pages() - 1)
    }

    pub fn page_data(&self, handle: &PageHandle) -> &[u8; PAGE_SIZE] {
        debug_assert_eq!(self.frames[handle.frame_id].page_num, handle.page_num);
        &self.frames[handle.frame_id].data
    }

    pub fn page_data_mut(&mut self, handle: &PageHandle) -> &mut [u8; PAGE_SIZE] {
        debug_assert_eq!(self.frames[handle.frame_id].page_num, handle.page_num);
        &mut self.frames[handle.frame_id].data
    }

    /// Page numbers resident in each frame: creation sequence for FIFO/LRU,
    /// current list order for CLOCK. In this arena representation a frame's
    /// `Vec` index *is* its creation sequence, and CLOCK never reorders its
    /// ring (only the hand moves), so both cases reduce to plain index order.
    pub fn get_frame_contents(&self) -> Vec<PageNumber> {
        self.frames.iter().map(|f| f.page_num).collect()
    }

    pub fn get_dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.dirty).collect()
    }

    pub fn get_fix_counts(&self) -> Vec<i32> {
        self.frames.iter().map(|f| f.pin_count).collect()
    }

    pub fn get_ref_bits(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.ref_bit).collect()
    }

    pub fn get_num_read_io(&self) -> u64 {
        self.num_read_io
    }

    pub fn get_num_write_io(&self) -> u64 {
        self.num_write_io
    }
}
