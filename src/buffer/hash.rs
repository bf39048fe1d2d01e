use super::frame::FrameId;
use crate::storage::entity::PageId;

// ファイルの識別子。ハンドルの割り当てアドレスをそのまま使う
pub type FileToken = usize;

#[derive(Debug)]
struct Entry {
    file: FileToken,
    page_id: PageId,
    frame_id: FrameId,
}

// (file, page_id) -> frame_id のチェイン法ハッシュ表。
// エントリ数は高々プールのフレーム数なのでリサイズしない
#[derive(Debug)]
pub struct HashIndex {
    buckets: Vec<Vec<Entry>>,
}

impl HashIndex {
    pub fn new(num_bufs: usize) -> Self {
        // バケツ数はフレーム数の約 1.2 倍を奇数に丸める
        let htsize = (num_bufs * 6 / 5) / 2 * 2 + 1;
        let mut buckets = Vec::with_capacity(htsize);
        buckets.resize_with(htsize, Vec::new);
        Self { buckets }
    }

    fn bucket_of(&self, file: FileToken, page_id: PageId) -> usize {
        let h = (file as u64)
            .wrapping_mul(31)
            .wrapping_add(page_id.to_u64());
        (h % self.buckets.len() as u64) as usize
    }

    pub fn lookup(&self, file: FileToken, page_id: PageId) -> Option<FrameId> {
        self.buckets[self.bucket_of(file, page_id)]
            .iter()
            .find(|e| e.file == file && e.page_id == page_id)
            .map(|e| e.frame_id)
    }

    // 呼び出し側がキーの重複がないことを保証する
    pub fn insert(&mut self, file: FileToken, page_id: PageId, frame_id: FrameId) {
        debug_assert!(self.lookup(file, page_id).is_none());
        let bucket = self.bucket_of(file, page_id);
        self.buckets[bucket].push(Entry {
            file,
            page_id,
            frame_id,
        });
    }

    pub fn remove(&mut self, file: FileToken, page_id: PageId) -> bool {
        let bucket = self.bucket_of(file, page_id);
        let entries = &mut self.buckets[bucket];
        match entries
            .iter()
            .position(|e| e.file == file && e.page_id == page_id)
        {
            Some(pos) => {
                entries.swap_remove(pos);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_insert_remove_test() {
        let mut index = HashIndex::new(3);
        assert_eq!(None, index.lookup(1, PageId(1)));
        index.insert(1, PageId(1), FrameId(0));
        index.insert(1, PageId(2), FrameId(1));
        index.insert(2, PageId(1), FrameId(2));
        // 同じページ番号でもファイルが違えば別のエントリ
        assert_eq!(Some(FrameId(0)), index.lookup(1, PageId(1)));
        assert_eq!(Some(FrameId(1)), index.lookup(1, PageId(2)));
        assert_eq!(Some(FrameId(2)), index.lookup(2, PageId(1)));
        assert!(index.remove(1, PageId(1)));
        assert!(!index.remove(1, PageId(1)));
        assert_eq!(None, index.lookup(1, PageId(1)));
        assert_eq!(Some(FrameId(1)), index.lookup(1, PageId(2)));
    }

    #[test]
    fn collision_test() {
        // バケツ 1 個の表ではすべての挿入が衝突する
        let mut index = HashIndex::new(1);
        for i in 0usize..8 {
            index.insert(7, PageId(i as u64), FrameId(i));
        }
        for i in 0usize..8 {
            assert_eq!(Some(FrameId(i)), index.lookup(7, PageId(i as u64)));
        }
        assert!(index.remove(7, PageId(3)));
        assert_eq!(None, index.lookup(7, PageId(3)));
        assert_eq!(Some(FrameId(7)), index.lookup(7, PageId(7)));
    }
}
