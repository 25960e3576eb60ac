//! An embedded single-file record manager built over a paged storage
//! substrate: a fixed-size page file with a durable header (`storage`), a
//! bounded, pinned frame cache with FIFO/LRU/CLOCK replacement (`buffer`),
//! and schema-driven fixed-width tuples with a free-page list (`record`).
//!
//! Single-threaded by design: no concurrency primitives, no crash
//! recovery, no secondary indexes, no cross-page records.

pub mod buffer;
pub mod common;
pub mod error;
pub mod record;
pub mod storage;

pub use error::{Error, Result};
