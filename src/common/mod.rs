pub mod config;

pub use config::{FrameId, PageNumber, ATTR_ENCODED_LEN, ATTR_NAME_LEN, NO_PAGE, PAGE_SIZE};
