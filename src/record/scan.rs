use tracing::warn;

use crate::buffer::PageHandle;
use crate::common::{PageNumber, NO_PAGE};
use crate::error::{Error, Result};

use super::page_layout;
use super::record::Record;
use super::rid::Rid;
use super::schema::Schema;
use super::table::Table;

/// The opaque predicate a scan filters by. The record manager never
/// inspects a predicate's internals — evaluating expressions is someone
/// else's concern, consumed here purely as `fn(&Record, &Schema) -> bool`.
pub trait ScanPredicate {
    fn eval(&self, record: &Record, schema: &Schema) -> bool;
}

/// A full-table scan over `(page, slot)` order starting at `(1, 0)`.
///
/// Unlike the original, which counts *physical slots* visited and so walks
/// past the end of valid data once any earlier slot has been deleted, this
/// walks slots but only counts *live* ones, stopping once `recCnt` live
/// records have been yielded.
pub struct Scan<'a> {
    table: &'a mut Table,
    cursor_page: PageNumber,
    cursor_slot: i32,
    rec_scan_cnt: i32,
    handle: Option<PageHandle>,
}

impl<'a> Scan<'a> {
    pub fn start(table: &'a mut Table) -> Self {
        Self {
            table,
            cursor_page: NO_PAGE,
            cursor_slot: -1,
            rec_scan_cnt: 0,
            handle: None,
        }
    }

    /// Advances to the next record matching `predicate` (or every record,
    /// if `None`). Returns `Error::NoMoreTuples` once `recCnt` live records
    /// have been yielded.
    pub fn next(&mut self, predicate: Option<&dyn ScanPredicate>) -> Result<Record> {
        if self.table.rec_cnt == 0 {
            return Err(Error::NoMoreTuples);
        }

        let record_size = self.table.schema.record_size();
        let slot_size = record_size + 1;
        let slots_per_page = page_layout::slots_per_page(slot_size);

        loop {
            if self.rec_scan_cnt == self.table.rec_cnt {
                self.reset();
                return Err(Error::NoMoreTuples);
            }

            self.advance_cursor(slots_per_page)?;

            let handle = self.handle.as_ref().expect("cursor always holds a pin");
            let buf = self.table.pool_mut().page_data(handle);
            if !page_layout::is_slot_live(buf, self.cursor_slot as usize, slot_size) {
                continue;
            }

            let data = page_layout::read_record(buf, self.cursor_slot as usize, slot_size, record_size);
            let record = Record {
                id: Rid {
                    page: self.cursor_page,
                    slot: self.cursor_slot,
                },
                data,
                live: true,
            };
            self.rec_scan_cnt += 1;

            match predicate {
                Some(p) if !p.eval(&record, &self.table.schema) => continue,
                _ => return Ok(record),
            }
        }
    }

    fn advance_cursor(&mut self, slots_per_page: usize) -> Result<()> {
        if self.cursor_page == NO_PAGE {
            self.cursor_page = 1;
            self.cursor_slot = 0;
            self.handle = Some(self.table.pool_mut().pin_page(self.cursor_page)?);
            return Ok(());
        }

        self.cursor_slot += 1;
        if self.cursor_slot as usize == slots_per_page {
            self.cursor_slot = 0;
            self.cursor_page += 1;
            if self.cursor_page >= self.table.pool_mut().total_pages() {
                self.reset();
                return Err(Error::NoMoreTuples);
            }
            let old = self.handle.take().expect("cursor always holds a pin");
            self.table.pool_mut().unpin_page(&old)?;
            self.handle = Some(self.table.pool_mut().pin_page(self.cursor_page)?);
        }
        Ok(())
    }

    fn reset(&mut self) {
        if let Some(h) = self.handle.take() {
            if let Err(e) = self.table.pool_mut().unpin_page(&h) {
                warn!(error = %e, "scan reset: unpin failed");
            }
        }
        self.cursor_page = NO_PAGE;
        self.cursor_slot = -1;
        self.rec_scan_cnt = 0;
    }

    /// Unpins the current page (if a scan is pending) and frees scan state.
    pub fn close(mut self) -> Result<()> {
        if let Some(h) = self.handle.take() {
            self.table.pool_mut().unpin_page(&h)?;
        }
        Ok(())
    }
}

impl Drop for Scan<'_> {
    fn drop(&mut self) {
        if let Some(h) = self.handle.take() {
            if let Err(e) = self.table.pool_mut().unpin_page(&h) {
                warn!(error = %e, "scan drop: unpin failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::schema::Attribute;
    use crate::record::value::Value;
    use tempdir::TempDir;

    fn sample_schema() -> Schema {
        Schema::new(vec![Attribute::int("a")], vec![0])
    }

    fn int_record(schema: &Schema, v: i32) -> Record {
        let mut r = Record::new(schema);
        schema.set_attr(&mut r, 0, &Value::Int(v));
        r
    }

    struct IsEven;
    impl ScanPredicate for IsEven {
        fn eval(&self, record: &Record, schema: &Schema) -> bool {
            match schema.get_attr(record, 0) {
                Value::Int(v) => v % 2 == 0,
                _ => false,
            }
        }
    }

    #[test]
    fn scan_yields_every_live_record_once() {
        let dir = TempDir::new("tupledb-scan").unwrap();
        let path = dir.path().join("scan.db");
        let path = path.to_str().unwrap();
        let schema = sample_schema();
        Table::create(path, &schema).unwrap();
        let mut table = Table::open(path).unwrap();

        for v in 0..5 {
            let mut r = int_record(&schema, v);
            table.insert_record(&mut r).unwrap();
        }

        let mut seen = Vec::new();
        {
            let mut scan = Scan::start(&mut table);
            loop {
                match scan.next(None) {
                    Ok(r) => {
                        if let Value::Int(v) = schema.get_attr(&r, 0) {
                            seen.push(v);
                        }
                    }
                    Err(Error::NoMoreTuples) => break,
                    Err(e) => panic!("unexpected scan error: {e}"),
                }
            }
            scan.close().unwrap();
        }
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn scan_skips_deleted_slots_without_overrunning() {
        let dir = TempDir::new("tupledb-scan").unwrap();
        let path = dir.path().join("scan2.db");
        let path = path.to_str().unwrap();
        let schema = sample_schema();
        Table::create(path, &schema).unwrap();
        let mut table = Table::open(path).unwrap();

        let mut records = Vec::new();
        for v in 0..5 {
            let mut r = int_record(&schema, v);
            table.insert_record(&mut r).unwrap();
            records.push(r);
        }
        table.delete_record(records[1].id).unwrap();
        table.delete_record(records[3].id).unwrap();

        let mut seen = Vec::new();
        let mut scan = Scan::start(&mut table);
        loop {
            match scan.next(None) {
                Ok(r) => {
                    if let Value::Int(v) = schema.get_attr(&r, 0) {
                        seen.push(v);
                    }
                }
                Err(Error::NoMoreTuples) => break,
                Err(e) => panic!("unexpected scan error: {e}"),
            }
        }
        seen.sort();
        assert_eq!(seen, vec![0, 2, 4]);
    }

    #[test]
    fn scan_applies_predicate() {
        let dir = TempDir::new("tupledb-scan").unwrap();
        let path = dir.path().join("scan3.db");
        let path = path.to_str().unwrap();
        let schema = sample_schema();
        Table::create(path, &schema).unwrap();
        let mut table = Table::open(path).unwrap();

        for v in 0..6 {
            let mut r = int_record(&schema, v);
            table.insert_record(&mut r).unwrap();
        }

        let mut seen = Vec::new();
        let mut scan = Scan::start(&mut table);
        loop {
            match scan.next(Some(&IsEven)) {
                Ok(r) => {
                    if let Value::Int(v) = schema.get_attr(&r, 0) {
                        seen.push(v);
                    }
                }
                Err(Error::NoMoreTuples) => break,
                Err(e) => panic!("unexpected scan error: {e}"),
            }
        }
        seen.sort();
        assert_eq!(seen, vec![0, 2, 4]);
    }
}
