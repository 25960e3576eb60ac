//! The crate-wide error taxonomy.
//!
//! Every fallible operation in `storage`, `buffer`, and `record` returns
//! `Result<T>`. No panics on well-formed input; a dedicated variant exists
//! per documented error code rather than matching on raw `io::Error` kinds.

use crate::common::PageNumber;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("page file not found: {path}")]
    FileNotFound { path: String },

    #[error("file handle not initialized")]
    FileHandleNotInit,

    #[error("write failed: {detail}")]
    WriteFailed { detail: String },

    #[error("attempted to read non-existing page {page}")]
    ReadNonExistingPage { page: PageNumber },

    #[error("no free frame available for eviction")]
    NoFreeFrame,

    // The `BM_NULL_*` categories from the taxonomy: kept as variants for
    // completeness against the documented error codes, but ownership and
    // `Option` make the null-handle/null-pool conditions they describe
    // unrepresentable here, so nothing in this crate ever constructs them.
    #[error("null frame passed to buffer pool")]
    BmNullFrame,

    #[error("null buffer pool")]
    BmNullBuffer,

    #[error("null page handle")]
    BmNullPage,

    #[error("null page file name")]
    BmNullPageFile,

    #[error("serialized schema exceeds one page")]
    LargeSchema,

    #[error("record (plus tombstone) exceeds the usable slot area of a page")]
    LargeRecord,

    #[error("insert failed")]
    InsertFailed,

    #[error("delete failed: invalid record id")]
    DeleteFailed,

    #[error("update failed: invalid record id")]
    UpdateFailed,

    #[error("no more tuples")]
    NoMoreTuples,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
