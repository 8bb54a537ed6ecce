//! The facade coordinating the storage and query layers into the single
//! insert / build-index / group-by-sum workflow the driver needs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use query::execution::operator::PhysicalOperator;
use query::{HashIndex, ScanOperator, Tuple, fixed_schema_tuple, slotted_page};
use storage::{BufferPoolManager, DiskManager};

/// Hard cap on insert attempts, matching the source's `max_number_of_tuples`.
const MAX_INSERT_ATTEMPTS: u64 = 5000;

pub struct Engine {
    buffer_pool: BufferPoolManager,
    hash_index: HashIndex,
    insert_attempts: u64,
}

impl Engine {
    /// Opens (creating if absent) the backing file and a buffer pool of the
    /// default capacity.
    pub fn open(db_path: &Path) -> Result<Self> {
        Self::open_with_capacity(db_path, storage::MAX_PAGES_IN_MEMORY)
    }

    pub fn open_with_capacity(db_path: &Path, capacity: usize) -> Result<Self> {
        // `DiskManager::open` appends a zero-filled page 0 the first time a
        // file is opened; a zero byte decodes as a live (non-empty) slot, so
        // that page's directory needs to be stamped with the slotted-page
        // "all slots empty" pattern before anything tries to insert into it.
        // An already-existing file must not be touched this way.
        let is_new_file = !db_path.exists() || fs::metadata(db_path).map(|m| m.len() == 0).unwrap_or(true);

        let disk_manager = DiskManager::open(db_path)
            .with_context(|| format!("open database file {}", db_path.display()))?;
        let mut buffer_pool = BufferPoolManager::new(disk_manager, capacity);

        if is_new_file {
            buffer_pool.with_page_mut(0, slotted_page::new_empty_page)?;
            buffer_pool.flush_page(0)?;
        }

        Ok(Self {
            buffer_pool,
            hash_index: HashIndex::new(),
            insert_attempts: 0,
        })
    }

    /// Builds the fixed-schema tuple from `key`/`value` and places it in the
    /// first page willing to take it, extending the file if none do. Every
    /// insert except every 100th then deletes slot 0 of page 0, continually
    /// recycling space at the head of the table.
    pub fn insert(&mut self, key: i32, value: i32) -> Result<()> {
        self.insert_attempts += 1;
        if self.insert_attempts >= MAX_INSERT_ATTEMPTS {
            return Ok(());
        }

        let tuple = fixed_schema_tuple(key, value);
        if !self.try_insert_into_existing_pages(&tuple)? {
            log::debug!("no resident page had room for key {key}, extending the file");
            let new_page_id = self.buffer_pool.extend()?;
            self.buffer_pool
                .with_page_mut(new_page_id, slotted_page::new_empty_page)?;
            let inserted = self.try_insert_into_existing_pages(&tuple)?;
            debug_assert!(inserted, "insert into a freshly extended page must succeed");
        }

        if self.insert_attempts % 100 != 0 {
            self.buffer_pool.with_page_mut(0, |page| {
                slotted_page::delete_tuple(page, 0);
            })?;
            self.buffer_pool.flush_page(0)?;
        }

        Ok(())
    }

    fn try_insert_into_existing_pages(&mut self, tuple: &Tuple) -> Result<bool> {
        let num_pages = self.buffer_pool.num_pages();
        for page_id in 0..num_pages {
            let inserted = self
                .buffer_pool
                .with_page_mut(page_id, |page| slotted_page::add_tuple(page, tuple))?;
            if inserted {
                self.buffer_pool.flush_page(page_id)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Walks every page and every live slot, decoding each tuple and
    /// accumulating `(key, value)` into the hash index.
    pub fn scan_table_to_build_index(&mut self) -> Result<()> {
        log::info!("scanning table to build index");
        let num_pages = self.buffer_pool.num_pages();
        for page_id in 0..num_pages {
            let tuples = self
                .buffer_pool
                .with_page(page_id, |page| -> Result<Vec<Tuple>, query::QueryError> {
                    let mut tuples = Vec::new();
                    for slot in slotted_page::live_slots(page) {
                        if let Some(tuple) = slotted_page::read_tuple(page, slot)? {
                            tuples.push(tuple);
                        }
                    }
                    Ok(tuples)
                })??;

            for tuple in tuples {
                let key = tuple.get(0).context("missing key field")?.as_int()?;
                let value = tuple.get(1).context("missing value field")?.as_int()?;
                self.hash_index.insert_or_update(key, value);
            }
        }
        Ok(())
    }

    /// Returns the pre-aggregated per-key sums for keys in `[lo, hi]`.
    /// Effectively `SELECT SUM(value) GROUP BY key WHERE key IN [lo, hi]`
    /// over the hash index built by `scan_table_to_build_index`.
    pub fn select_group_by_sum(&self, lo: i32, hi: i32) -> Vec<i32> {
        self.hash_index.range_query(lo, hi)
    }

    /// Drains a [`ScanOperator`] over the current pages, returning every
    /// live tuple via the iterator pipeline instead of the hash index.
    pub fn run_query_pipeline(&mut self) -> Result<Vec<Tuple>> {
        let mut scan = ScanOperator::new(&mut self.buffer_pool);
        let mut tuples = Vec::new();
        scan.open()?;
        while let Some(tuple) = scan.output() {
            tuples.push(tuple.clone());
            if !scan.next()? {
                break;
            }
        }
        scan.close()?;
        Ok(tuples)
    }
}
