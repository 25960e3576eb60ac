//! The storage substrate: a fixed-size page file with a durable header and
//! random-access, append-only page I/O. No caching happens at this layer —
//! every read and write here is an OS call.

pub mod disk_manager;

pub use disk_manager::DiskManager;
