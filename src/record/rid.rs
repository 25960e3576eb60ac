use crate::common::{PageNumber, NO_PAGE};

/// A record identifier: the page it lives on and its slot within that
/// page's slot directory. `NONE` mirrors the original's `-1/-1` sentinel
/// for "no record".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rid {
    pub page: PageNumber,
    pub slot: i32,
}

impl Rid {
    pub const NONE: Rid = Rid {
        page: NO_PAGE,
        slot: -1,
    };

    pub fn is_none(&self) -> bool {
        self.page == NO_PAGE || self.slot == -1
    }
}

impl Default for Rid {
    fn default() -> Self {
        Self::NONE
    }
}
