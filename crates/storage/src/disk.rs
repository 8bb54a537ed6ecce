//! DiskManager: file-backed page array for a single implicit table.
//!
//! Invariants:
//! - File length is always a multiple of PAGE_SIZE.
//! - Page identifiers are dense, contiguous, non-negative integers; physical
//!   offset = page_id * PAGE_SIZE. No header page, no reserved page 0.
//! - On open, `num_pages` is derived from the file length; if the file is
//!   empty, `extend()` is called once so page 0 always exists.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use thiserror::Error;

pub type PageId = u64;
pub const PAGE_SIZE: usize = 4096;

/// Errors raised by the on-disk page array.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("short read/write for page {page_id}: expected {expected} bytes, got {actual}")]
    ShortTransfer {
        page_id: PageId,
        expected: usize,
        actual: usize,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Opens (creating if absent) a flat file of fixed-size pages.
pub struct DiskManager {
    file: File,
    num_pages: u64,
}

impl DiskManager {
    /// Opens or creates the backing file and derives `num_pages` from its
    /// length. A brand-new (empty) file is extended once so page 0 exists.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let len = file.metadata()?.len();
        let mut manager = Self {
            file,
            num_pages: len / PAGE_SIZE as u64,
        };
        if manager.num_pages == 0 {
            manager.extend()?;
        }
        Ok(manager)
    }

    /// Returns the number of pages currently backing the file.
    pub fn num_pages(&self) -> u64 {
        self.num_pages
    }

    /// Reads the page at `page_id` into a fresh `Page`.
    pub fn load(&self, page_id: PageId) -> StorageResult<crate::Page> {
        let mut page = crate::Page::new();
        let offset = page_id * PAGE_SIZE as u64;
        let read = self.file.read_at(page.data_mut(), offset)?;
        if read != PAGE_SIZE {
            return Err(StorageError::ShortTransfer {
                page_id,
                expected: PAGE_SIZE,
                actual: read,
            });
        }
        page.page_id = Some(page_id);
        Ok(page)
    }

    /// Writes `page` back to its slot on disk and flushes the OS buffer.
    pub fn flush(&self, page_id: PageId, page: &crate::Page) -> StorageResult<()> {
        let offset = page_id * PAGE_SIZE as u64;
        let written = self.file.write_at(page.data(), offset)?;
        if written != PAGE_SIZE {
            return Err(StorageError::ShortTransfer {
                page_id,
                expected: PAGE_SIZE,
                actual: written,
            });
        }
        self.file.sync_data()?;
        Ok(())
    }

    /// Appends one zero-initialized page to the file.
    pub fn extend(&mut self) -> StorageResult<PageId> {
        let page_id = self.num_pages;
        let offset = page_id * PAGE_SIZE as u64;
        self.file.write_at(&[0u8; PAGE_SIZE], offset)?;
        self.file.sync_data()?;
        self.num_pages += 1;
        Ok(page_id)
    }
}
