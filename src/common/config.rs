//! Fixed constants and type aliases shared by every layer.

/// Size, in bytes, of a page: the unit of all storage I/O.
pub const PAGE_SIZE: usize = 4096;

/// Size of the page-file header: `totalPages:i32` followed by
/// `currentPagePos:i32`.
pub const FILE_HEADER_SIZE: usize = 2 * std::mem::size_of::<i32>();

/// Sentinel page number for "no page"/"empty frame". Distinct from `0`,
/// which is the free-page list's null pointer (page 0 is always the table
/// header, never a free-list member).
pub const NO_PAGE: PageNumber = -1;

/// Page numbers are zero-based and contiguous once a file has pages at all;
/// `i32` keeps the `-1` sentinel representable and matches the original
/// implementation's RID fields.
pub type PageNumber = i32;

/// Index of a frame within a `BufferPool`'s frame arena.
pub type FrameId = usize;

/// Bytes reserved for an attribute name in the table-0 schema encoding.
pub const ATTR_NAME_LEN: usize = 64;

/// Per-attribute encoded size on page 0: name + dataType + typeLength + keyAttrIndex.
pub const ATTR_ENCODED_LEN: usize = ATTR_NAME_LEN + 3 * std::mem::size_of::<i32>();

/// Header fields on page 0 before the per-attribute entries:
/// recCnt, initFreePg, numAttr, keySize.
pub const TABLE_HEADER_FIXED_LEN: usize = 4 * std::mem::size_of::<i32>();

/// Bytes reserved for the per-page free-list links (`nextFreePage`,
/// `prevFreePage`) at the start of every data page.
pub const DATA_PAGE_HEADER_LEN: usize = 2 * std::mem::size_of::<i32>();

/// Usable bytes for slots on a data page.
///
/// Matches the original C definition
/// `REC_SZ = PAGE_SIZE - (sizeof(char) + 2*sizeof(int) + '\0')`, i.e. one
/// tombstone byte, the two free-list link ints, and one reserved pad byte —
/// `PAGE_SIZE - 10`, not the more obvious `PAGE_SIZE - 8`.
pub const REC_SZ: usize = PAGE_SIZE - 1 - DATA_PAGE_HEADER_LEN - 1;
