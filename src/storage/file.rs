use super::entity::PageId;

use std::io::Result;

pub trait PagedFile {
    // 新しいページIDを採番する
    fn allocate_page(&mut self) -> PageId;
    // ページのデータを読み出す
    fn read_page(&mut self, page_id: PageId, data: &mut [u8]) -> Result<()>;
    // データをページに書き出す
    fn write_page(&mut self, page_id: PageId, data: &[u8]) -> Result<()>;
    // ページをファイルから削除する
    fn delete_page(&mut self, page_id: PageId) -> Result<()>;
    // エラー報告用のファイル名
    fn filename(&self) -> String;
    // 同期処理
    fn sync(&mut self) -> Result<()>;
}
