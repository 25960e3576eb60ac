use super::rid::Rid;
use super::schema::Schema;

/// An in-memory tuple: a record identifier plus `recordSize` bytes of
/// payload. `live` reflects the tombstone byte as last read by
/// `Table::get_record`; freshly created or inserted records are `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Rid,
    pub data: Vec<u8>,
    pub live: bool,
}

impl Record {
    /// Allocates a zeroed `recordSize`-byte payload for `schema`, with no
    /// assigned id yet.
    pub fn new(schema: &Schema) -> Self {
        Self {
            id: Rid::default(),
            data: vec![0u8; schema.record_size()],
            live: true,
        }
    }

    /// Whether the tombstone byte last observed for this record marked it
    /// live. Only meaningful after `Table::get_record`; see its docs for
    /// why the record manager hands back stale bytes without checking this
    /// itself.
    pub fn is_live(&self) -> bool {
        self.live
    }
}
