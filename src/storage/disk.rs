use std::fs::{File, OpenOptions};
use std::io::{self, prelude::*, SeekFrom};
use std::path::Path;

use bincode::Options;
use log::warn;
use serde::{Deserialize, Serialize};

use super::entity::{PageId, PAGE_SIZE};
use super::file::PagedFile;

// ページ 0 に置くヘッダ。データページは 1 番から始まる
#[derive(Debug, Serialize, Deserialize)]
struct Header {
    next_page_id: u64,
    free_page_ids: Vec<u64>,
}

pub struct DiskFile {
    // ヒープファイルのファイルディスクリプタ
    heap_file: File,
    // エラー報告用のファイル名
    name: String,
    // 採番カウンタと解放済みページのリスト
    header: Header,
}

impl DiskFile {
    pub fn new(heap_file: File, name: String) -> io::Result<Self> {
        let heap_file_size = heap_file.metadata()?.len();
        let mut disk = Self {
            heap_file,
            name,
            header: Header {
                next_page_id: 1,
                free_page_ids: vec![],
            },
        };
        if heap_file_size == 0 {
            disk.write_header()?;
        } else {
            disk.header = disk.read_header()?;
        }
        Ok(disk)
    }

    pub fn open(heap_file_path: impl AsRef<Path>) -> io::Result<Self> {
        let heap_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&heap_file_path)?;
        let name = heap_file_path.as_ref().display().to_string();
        Self::new(heap_file, name)
    }

    fn read_header(&mut self) -> io::Result<Header> {
        let mut page = [0u8; PAGE_SIZE];
        self.heap_file.seek(SeekFrom::Start(0))?;
        self.heap_file.read_exact(&mut page)?;
        bincode::options()
            .allow_trailing_bytes()
            .deserialize(&page)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn write_header(&mut self) -> io::Result<()> {
        let encoded = bincode::options()
            .serialize(&self.header)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if encoded.len() > PAGE_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("header of {} no longer fits in one page", self.name),
            ));
        }
        let mut page = [0u8; PAGE_SIZE];
        page[..encoded.len()].copy_from_slice(&encoded);
        self.heap_file.seek(SeekFrom::Start(0))?;
        self.heap_file.write_all(&page)
    }

    fn page_offset(&self, page_id: PageId) -> io::Result<u64> {
        let id = page_id.to_u64();
        if id == 0 || id >= self.header.next_page_id {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("page {:?} is not a page of {}", page_id, self.name),
            ));
        }
        Ok(PAGE_SIZE as u64 * id)
    }
}

impl PagedFile for DiskFile {
    fn allocate_page(&mut self) -> PageId {
        if let Some(id) = self.header.free_page_ids.pop() {
            return PageId(id);
        }
        let page_id = self.header.next_page_id;
        self.header.next_page_id += 1;
        PageId(page_id)
    }
    fn read_page(&mut self, page_id: PageId, data: &mut [u8]) -> io::Result<()> {
        let offset = self.page_offset(page_id)?;
        self.heap_file.seek(SeekFrom::Start(offset))?;
        self.heap_file.read_exact(data)
    }
    fn write_page(&mut self, page_id: PageId, data: &[u8]) -> io::Result<()> {
        let offset = self.page_offset(page_id)?;
        self.heap_file.seek(SeekFrom::Start(offset))?;
        self.heap_file.write_all(data)
    }
    fn delete_page(&mut self, page_id: PageId) -> io::Result<()> {
        self.page_offset(page_id)?;
        if self.header.free_page_ids.contains(&page_id.to_u64()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("page {:?} of {} is already deleted", page_id, self.name),
            ));
        }
        self.header.free_page_ids.push(page_id.to_u64());
        Ok(())
    }
    fn filename(&self) -> String {
        self.name.clone()
    }
    fn sync(&mut self) -> io::Result<()> {
        self.write_header()?;
        self.heap_file.flush()?;
        self.heap_file.sync_all()
    }
}

impl Drop for DiskFile {
    fn drop(&mut self) {
        if let Err(err) = self.sync() {
            warn!("failed to sync {}: {}", self.name, err);
        }
    }
}
