//! Slotted page layout: a fixed-size directory of [`Slot`]s at the front of
//! a [`storage::Page`], tuple payloads appended after it at increasing
//! offsets.
//!
//! Invariants:
//! - For every live slot, `offset >= DIRECTORY_SIZE` and
//!   `offset + length < PAGE_SIZE`.
//! - Live tuples' byte ranges never overlap.
//! - A slot's length, once set, is never reduced; a freed slot can only be
//!   reused by a tuple whose serialized size fits the original length.

use storage::{PAGE_SIZE, Page};

use crate::QueryError;
use crate::execution::tuple::Tuple;

/// Number of directory entries per page.
pub const MAX_SLOTS: usize = 512;
/// On-disk width of one [`Slot`]: 1-byte empty flag + u16 offset + u16 length.
const SLOT_SIZE: usize = 5;
/// Byte offset of the first tuple payload, immediately after the directory.
pub const DIRECTORY_SIZE: usize = MAX_SLOTS * SLOT_SIZE;
/// Sentinel for an unset offset/length, matching the source's `uint16_t` max.
pub const INVALID_VALUE: u16 = u16::MAX;

/// One directory entry: whether the slot holds a live tuple, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub empty: bool,
    pub offset: u16,
    pub length: u16,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            empty: true,
            offset: INVALID_VALUE,
            length: INVALID_VALUE,
        }
    }
}

impl Slot {
    fn to_bytes(self) -> [u8; SLOT_SIZE] {
        let mut out = [0u8; SLOT_SIZE];
        out[0] = self.empty as u8;
        out[1..3].copy_from_slice(&self.offset.to_le_bytes());
        out[3..5].copy_from_slice(&self.length.to_le_bytes());
        out
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            empty: bytes[0] != 0,
            offset: u16::from_le_bytes([bytes[1], bytes[2]]),
            length: u16::from_le_bytes([bytes[3], bytes[4]]),
        }
    }
}

fn read_slot(page: &Page, index: usize) -> Slot {
    let start = index * SLOT_SIZE;
    Slot::from_bytes(&page.data()[start..start + SLOT_SIZE])
}

fn write_slot(page: &mut Page, index: usize, slot: Slot) {
    let start = index * SLOT_SIZE;
    page.data_mut()[start..start + SLOT_SIZE].copy_from_slice(&slot.to_bytes());
}

/// Initializes a freshly-extended page's directory: every slot empty, both
/// offset and length at the sentinel.
pub fn new_empty_page(page: &mut Page) {
    for index in 0..MAX_SLOTS {
        write_slot(page, index, Slot::default());
    }
}

/// Serializes `tuple` and places it in the first slot with room, per the
/// source's left-to-right first-fit search. Returns `false` if no slot in
/// the directory can hold it.
pub fn add_tuple(page: &mut Page, tuple: &Tuple) -> bool {
    let serialized = tuple.serialize();
    let tuple_size = serialized.len();

    let mut chosen = None;
    for index in 0..MAX_SLOTS {
        let slot = read_slot(page, index);
        // A sentinel length counts as "large enough" (Q1): it means the
        // slot has never held a tuple, so its would-be offset is free to
        // grow past the directory.
        if slot.empty && (slot.length == INVALID_VALUE || slot.length as usize >= tuple_size) {
            chosen = Some(index);
            break;
        }
    }

    let Some(index) = chosen else {
        return false;
    };

    let mut slot = read_slot(page, index);
    slot.empty = false;

    let offset = if slot.offset == INVALID_VALUE {
        if index == 0 {
            DIRECTORY_SIZE as u16
        } else {
            let prev = read_slot(page, index - 1);
            prev.offset + prev.length
        }
    } else {
        slot.offset
    };

    if offset as usize + tuple_size >= PAGE_SIZE {
        // Revert: this slot cannot host the tuple after all.
        slot.empty = true;
        slot.offset = INVALID_VALUE;
        write_slot(page, index, slot);
        return false;
    }

    slot.offset = offset;
    if slot.length == INVALID_VALUE {
        slot.length = tuple_size as u16;
    }
    write_slot(page, index, slot);

    let start = offset as usize;
    page.data_mut()[start..start + tuple_size].copy_from_slice(serialized.as_bytes());
    true
}

/// Marks slot `index` empty without touching offset or length, so the space
/// can be reused by a future tuple of the same recorded length.
pub fn delete_tuple(page: &mut Page, index: usize) {
    if index >= MAX_SLOTS {
        return;
    }
    let mut slot = read_slot(page, index);
    if !slot.empty {
        slot.empty = true;
        write_slot(page, index, slot);
    }
}

/// Decodes the tuple held by a live slot, reading exactly `slot.length`
/// bytes so embedded whitespace in the textual encoding stays bounded.
pub fn read_tuple(page: &Page, index: usize) -> Result<Option<Tuple>, QueryError> {
    let slot = read_slot(page, index);
    if slot.empty {
        return Ok(None);
    }
    let start = slot.offset as usize;
    let end = start + slot.length as usize;
    let text = std::str::from_utf8(&page.data()[start..end])
        .map_err(|e| QueryError::Decode(e.to_string()))?;
    Ok(Some(Tuple::deserialize(text)?))
}

/// Returns the slot indices holding a live tuple, in directory order.
pub fn live_slots(page: &Page) -> Vec<usize> {
    (0..MAX_SLOTS)
        .filter(|&index| !read_slot(page, index).empty)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::tuple::fixed_schema_tuple;

    fn fresh_page() -> Page {
        let mut page = Page::new();
        new_empty_page(&mut page);
        page
    }

    #[test]
    fn test_new_empty_page_directory_is_all_sentinel() {
        let page = fresh_page();
        let slot = read_slot(&page, 0);
        assert!(slot.empty);
        assert_eq!(slot.offset, INVALID_VALUE);
        assert_eq!(slot.length, INVALID_VALUE);
    }

    #[test]
    fn test_add_tuple_places_first_tuple_right_after_directory() {
        let mut page = fresh_page();
        let tuple = fixed_schema_tuple(12, 34);
        assert!(add_tuple(&mut page, &tuple));
        let slot = read_slot(&page, 0);
        assert!(!slot.empty);
        assert_eq!(slot.offset as usize, DIRECTORY_SIZE);
        assert_eq!(slot.length as usize, tuple.serialize().len());
    }

    #[test]
    fn test_add_tuple_fills_slots_left_to_right() {
        let mut page = fresh_page();
        add_tuple(&mut page, &fixed_schema_tuple(1, 1));
        add_tuple(&mut page, &fixed_schema_tuple(2, 2));
        let slot0 = read_slot(&page, 0);
        let slot1 = read_slot(&page, 1);
        assert_eq!(slot1.offset, slot0.offset + slot0.length);
    }

    #[test]
    fn test_delete_tuple_preserves_offset_and_length() {
        let mut page = fresh_page();
        add_tuple(&mut page, &fixed_schema_tuple(12, 34));
        let before = read_slot(&page, 0);
        delete_tuple(&mut page, 0);
        let after = read_slot(&page, 0);
        assert!(after.empty);
        assert_eq!(after.offset, before.offset);
        assert_eq!(after.length, before.length);
    }

    #[test]
    fn test_deleted_slot_is_reused_by_next_tuple_of_same_size() {
        let mut page = fresh_page();
        add_tuple(&mut page, &fixed_schema_tuple(12, 34));
        delete_tuple(&mut page, 0);
        assert!(add_tuple(&mut page, &fixed_schema_tuple(56, 78)));
        // Still only one live slot, reusing slot 0's offset/length.
        assert_eq!(live_slots(&page), vec![0]);
    }

    #[test]
    fn test_read_tuple_round_trips() {
        let mut page = fresh_page();
        let tuple = fixed_schema_tuple(12, 34);
        add_tuple(&mut page, &tuple);
        let decoded = read_tuple(&page, 0).unwrap().unwrap();
        assert_eq!(decoded, tuple);
    }

    #[test]
    fn test_read_tuple_on_empty_slot_returns_none() {
        let page = fresh_page();
        assert_eq!(read_tuple(&page, 0).unwrap(), None);
    }

    #[test]
    fn test_live_slots_tracks_insertions() {
        let mut page = fresh_page();
        assert!(live_slots(&page).is_empty());
        add_tuple(&mut page, &fixed_schema_tuple(1, 1));
        add_tuple(&mut page, &fixed_schema_tuple(2, 2));
        assert_eq!(live_slots(&page), vec![0, 1]);
    }

    #[test]
    fn test_page_fills_up_and_rejects_further_inserts() {
        let mut page = fresh_page();
        let mut inserted = 0;
        while add_tuple(&mut page, &fixed_schema_tuple(12, 34)) {
            inserted += 1;
        }
        assert!(inserted > 0);
        assert!(!add_tuple(&mut page, &fixed_schema_tuple(12, 34)));
    }
}
