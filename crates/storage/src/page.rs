use crate::{PAGE_SIZE, PageId};

/// A fixed-size in-memory page buffer, identified once it has a home on disk.
///
/// Dirty tracking is deliberately not modeled here. Callers flush explicitly
/// after a mutation they care about (see `BufferPoolManager`).
#[derive(Debug, Clone)]
pub struct Page {
    pub(crate) data: [u8; PAGE_SIZE],
    pub(crate) page_id: Option<PageId>,
}

impl Page {
    /// Creates a zeroed page with no identity.
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
            page_id: None,
        }
    }

    /// Returns the page identifier, if assigned.
    pub fn page_id(&self) -> Option<PageId> {
        self.page_id
    }

    /// Returns the entire page data.
    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    /// Returns a mutable reference to the entire page data.
    pub fn data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.data
    }

    /// Reads a slice of bytes from the page.
    pub fn read_bytes(&self, offset: usize, len: usize) -> Option<&[u8]> {
        if offset.checked_add(len)? > PAGE_SIZE {
            return None;
        }
        Some(&self.data[offset..offset + len])
    }

    /// Writes bytes into the page at the given offset.
    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) -> bool {
        if offset + bytes.len() > PAGE_SIZE {
            return false;
        }
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        true
    }

    /// Resets all data and metadata to defaults.
    pub fn reset_memory(&mut self) {
        self.data.fill(0);
        self.page_id = None;
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}
