use crate::common::config::{FrameId, PAGE_SIZE};
use crate::common::{PageNumber, NO_PAGE};

/// A single buffer-pool slot: `PAGE_SIZE` bytes of page data plus the
/// book-keeping the pool needs to run a replacement policy over it.
///
/// Frames live in a single arena (`BufferPool::frames: Vec<Frame>`),
/// allocated once at pool construction. `prev`/`next` are indices into that
/// same `Vec` rather than pointers, per the recommendation to replace an
/// intrusive pointer list with an arena-of-indices.
pub struct Frame {
    pub(crate) data: Box<[u8; PAGE_SIZE]>,
    pub(crate) page_num: PageNumber,
    pub(crate) dirty: bool,
    pub(crate) pin_count: i32,
    pub(crate) ref_bit: bool,
    pub(crate) prev: Option<FrameId>,
    pub(crate) next: Option<FrameId>,
}

impl Frame {
    pub(crate) fn empty() -> Self {
        Self {
            data: Box::new([0u8; PAGE_SIZE]),
            page_num: NO_PAGE,
            dirty: false,
            pin_count: 0,
            ref_bit: false,
            prev: None,
            next: None,
        }
    }

    pub(crate) fn is_resident(&self) -> bool {
        self.page_num != NO_PAGE
    }
}
