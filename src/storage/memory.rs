use std::io::{Error, ErrorKind, Read, Result, Write};

use zerocopy::AsBytes;

use super::entity::{PageId, PAGE_SIZE};
use super::file::PagedFile;

pub struct MemoryFile {
    next_page_id: u64,
    heap: Vec<[u8; PAGE_SIZE]>,
    free_page_ids: Vec<u64>,
}

impl MemoryFile {
    pub fn new() -> Self {
        Self {
            next_page_id: 0,
            heap: vec![],
            free_page_ids: vec![],
        }
    }

    fn check(&self, page_id: PageId) -> Result<usize> {
        let id = page_id.to_u64() as usize;
        if id >= self.heap.len() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("page {:?} is not a page of {}", page_id, self.filename()),
            ));
        }
        Ok(id)
    }
}

impl Default for MemoryFile {
    fn default() -> Self {
        Self::new()
    }
}

impl PagedFile for MemoryFile {
    fn allocate_page(&mut self) -> PageId {
        if let Some(id) = self.free_page_ids.pop() {
            self.heap[id as usize] = [0; PAGE_SIZE];
            return PageId(id);
        }
        let page_id = self.next_page_id;
        self.next_page_id += 1;
        self.heap.push([0; PAGE_SIZE]);
        PageId(page_id)
    }
    fn read_page(&mut self, page_id: PageId, data: &mut [u8]) -> Result<()> {
        let id = self.check(page_id)?;
        let mut row: &[u8] = self.heap[id].as_bytes();
        row.read_exact(data)?;
        Ok(())
    }
    fn write_page(&mut self, page_id: PageId, data: &[u8]) -> Result<()> {
        let id = self.check(page_id)?;
        let buf: &[u8] = data.as_bytes();
        let mut row: &mut [u8] = self.heap[id].as_bytes_mut();
        row.write_all(buf)?;
        Ok(())
    }
    fn delete_page(&mut self, page_id: PageId) -> Result<()> {
        let id = self.check(page_id)? as u64;
        if self.free_page_ids.contains(&id) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("page {:?} of {} is already deleted", page_id, self.filename()),
            ));
        }
        self.free_page_ids.push(id);
        Ok(())
    }
    fn filename(&self) -> String {
        "<memory>".to_string()
    }
    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}
