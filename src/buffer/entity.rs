use std::cell::RefCell;

use crate::storage::entity::{Page, PageId, PAGE_SIZE};

#[derive(Debug, PartialEq, Eq)]
pub struct Buffer {
    pub page_id: PageId,
    pub page: RefCell<Page>,
}

impl Buffer {
    pub fn new(page_id: PageId) -> Self {
        Self {
            page_id,
            page: RefCell::new([0u8; PAGE_SIZE]),
        }
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new(PageId::INVALID_PAGE_ID)
    }
}
