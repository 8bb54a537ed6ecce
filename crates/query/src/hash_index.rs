//! Open-addressed int-to-int aggregation index, built by scanning the
//! table. Insert probes quadratically; lookup probes linearly. That
//! asymmetry means a lookup can miss an entry insertion placed via a
//! quadratic jump. Preserved deliberately rather than "fixed".

const CAPACITY: usize = 100;
/// Returned by `get_value` when the key is not found.
pub const NOT_FOUND: i32 = -1;

#[derive(Debug, Clone, Copy)]
struct Entry {
    key: i32,
    value: i32,
    exists: bool,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            key: 0,
            value: 0,
            exists: false,
        }
    }
}

pub struct HashIndex {
    table: [Entry; CAPACITY],
}

impl Default for HashIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl HashIndex {
    pub fn new() -> Self {
        Self {
            table: [Entry::default(); CAPACITY],
        }
    }

    fn hash(key: i32) -> usize {
        key.rem_euclid(CAPACITY as i32) as usize
    }

    /// Inserts `key`/`value`, or accumulates `value` into an existing entry
    /// for `key`. Probes quadratically (step `i*i` on attempt `i`). If all
    /// `CAPACITY` attempts land on occupied, mismatched slots, the write is
    /// dropped and a "table full" diagnostic is logged.
    pub fn insert_or_update(&mut self, key: i32, value: i32) {
        let origin = Self::hash(key);

        for attempt in 0..CAPACITY {
            let index = (origin + attempt * attempt) % CAPACITY;
            let entry = &mut self.table[index];
            if !entry.exists {
                *entry = Entry {
                    key,
                    value,
                    exists: true,
                };
                return;
            }
            if entry.key == key {
                entry.value += value;
                return;
            }
        }

        log::warn!("hash index is full or cannot insert key {key}");
    }

    /// Probes linearly from `hash(key)`, stopping at the first empty slot or
    /// a full wraparound. Returns [`NOT_FOUND`] if no live entry matches.
    pub fn get_value(&self, key: i32) -> i32 {
        let origin = Self::hash(key);

        for attempt in 0..CAPACITY {
            let index = (origin + attempt) % CAPACITY;
            let entry = &self.table[index];
            if entry.exists && entry.key == key {
                return entry.value;
            }
            if !entry.exists {
                break;
            }
        }

        NOT_FOUND
    }

    /// Full scan for all live entries with `lo <= key <= hi`, in physical
    /// slot order. Not efficient, but this is an unordered index.
    pub fn range_query(&self, lo: i32, hi: i32) -> Vec<i32> {
        self.table
            .iter()
            .filter(|entry| entry.exists && entry.key >= lo && entry.key <= hi)
            .map(|entry| entry.value)
            .collect()
    }
}
