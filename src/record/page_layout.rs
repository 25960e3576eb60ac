//! Byte-level access to a data page (page ≥ 1): the free-list links at
//! offsets 0/4 and the slot directory starting at offset 8. None of this
//! touches the buffer pool — callers pass in a pinned frame's bytes.

use crate::common::config::{DATA_PAGE_HEADER_LEN, PAGE_SIZE, REC_SZ};
use crate::common::PageNumber;

pub(crate) fn slots_per_page(slot_size: usize) -> usize {
    REC_SZ / slot_size
}

fn slot_offset(slot: usize, slot_size: usize) -> usize {
    DATA_PAGE_HEADER_LEN + slot * slot_size
}

pub(crate) fn read_next_free_page(buf: &[u8; PAGE_SIZE]) -> PageNumber {
    PageNumber::from_ne_bytes(buf[0..4].try_into().unwrap())
}

pub(crate) fn write_next_free_page(buf: &mut [u8; PAGE_SIZE], page: PageNumber) {
    buf[0..4].copy_from_slice(&page.to_ne_bytes());
}

pub(crate) fn read_prev_free_page(buf: &[u8; PAGE_SIZE]) -> PageNumber {
    PageNumber::from_ne_bytes(buf[4..8].try_into().unwrap())
}

pub(crate) fn write_prev_free_page(buf: &mut [u8; PAGE_SIZE], page: PageNumber) {
    buf[4..8].copy_from_slice(&page.to_ne_bytes());
}

/// The tombstone byte is `>0` for a live slot, `<=0` for a free one,
/// compared as a signed byte to match the original's `signed char`.
fn tombstone(buf: &[u8; PAGE_SIZE], slot: usize, slot_size: usize) -> i8 {
    buf[slot_offset(slot, slot_size)] as i8
}

pub(crate) fn is_slot_live(buf: &[u8; PAGE_SIZE], slot: usize, slot_size: usize) -> bool {
    tombstone(buf, slot, slot_size) > 0
}

/// First slot (if any) whose tombstone marks it free.
pub(crate) fn find_free_slot(buf: &[u8; PAGE_SIZE], slot_size: usize) -> Option<usize> {
    (0..slots_per_page(slot_size)).find(|&slot| tombstone(buf, slot, slot_size) <= 0)
}

pub(crate) fn write_record(
    buf: &mut [u8; PAGE_SIZE],
    slot: usize,
    slot_size: usize,
    record_size: usize,
    data: &[u8],
) {
    let off = slot_offset(slot, slot_size);
    buf[off] = 1;
    buf[off + 1..off + 1 + record_size].copy_from_slice(data);
}

/// Sets the tombstone byte to a non-positive value (`-1`, matching the
/// original's signed-byte assignment) without touching the payload bytes.
pub(crate) fn tombstone_delete(buf: &mut [u8; PAGE_SIZE], slot: usize, slot_size: usize) {
    buf[slot_offset(slot, slot_size)] = (-1i8) as u8;
}

pub(crate) fn write_payload(
    buf: &mut [u8; PAGE_SIZE],
    slot: usize,
    slot_size: usize,
    record_size: usize,
    data: &[u8],
) {
    let off = slot_offset(slot, slot_size);
    buf[off + 1..off + 1 + record_size].copy_from_slice(data);
}

pub(crate) fn read_record(
    buf: &[u8; PAGE_SIZE],
    slot: usize,
    slot_size: usize,
    record_size: usize,
) -> Vec<u8> {
    let off = slot_offset(slot, slot_size);
    buf[off + 1..off + 1 + record_size].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_per_page_matches_rec_sz_division() {
        assert_eq!(slots_per_page(9), REC_SZ / 9);
    }

    #[test]
    fn free_slot_search_skips_live_slots() {
        let mut buf = Box::new([0u8; PAGE_SIZE]);
        let slot_size = 9;
        write_record(&mut buf, 0, slot_size, 8, &[1; 8]);
        assert_eq!(find_free_slot(&buf, slot_size), Some(1));
    }

    #[test]
    fn tombstone_delete_frees_a_previously_live_slot() {
        let mut buf = Box::new([0u8; PAGE_SIZE]);
        let slot_size = 9;
        write_record(&mut buf, 0, slot_size, 8, &[1; 8]);
        assert!(is_slot_live(&buf, 0, slot_size));
        tombstone_delete(&mut buf, 0, slot_size);
        assert!(!is_slot_live(&buf, 0, slot_size));
        assert_eq!(find_free_slot(&buf, slot_size), Some(0));
    }

    #[test]
    fn free_list_links_round_trip() {
        let mut buf = Box::new([0u8; PAGE_SIZE]);
        write_next_free_page(&mut buf, 5);
        write_prev_free_page(&mut buf, 3);
        assert_eq!(read_next_free_page(&buf), 5);
        assert_eq!(read_prev_free_page(&buf), 3);
    }
}
