use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use log::{debug, warn};

use super::entity::Buffer;
use super::frame::{Frame, FrameId};
use super::hash::{FileToken, HashIndex};
use crate::storage::entity::PageId;
use crate::storage::file::PagedFile;

// 呼び出し側が所有するファイルハンドル。マネージャは弱参照しか持たない
pub type FileRef<F> = Rc<RefCell<F>>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("all buffer frames are pinned")]
    BufferExceeded,
    #[error("page {1:?} of {0} is not pinned")]
    PageNotPinned(String, PageId),
    #[error("page {1:?} of {0} is still pinned")]
    PagePinned(String, PageId),
    #[error("frame {0:?} is in an invalid state")]
    BadBuffer(FrameId),
}

// ハンドルのアドレスをファイルの識別子として使う
fn file_token<F>(file: &FileRef<F>) -> FileToken {
    Rc::as_ptr(file) as usize
}

pub struct BufferPoolManager<F: PagedFile> {
    frames: Vec<Frame<F>>,
    pool: Vec<Rc<Buffer>>,
    index: HashIndex,
    // Clock アルゴリズムの針。探索は針をひとつ進めた位置から始まる
    clock_hand: usize,
}

impl<F: PagedFile> BufferPoolManager<F> {
    pub fn new(num_bufs: usize) -> Self {
        assert!(num_bufs > 0);
        let frames = (0..num_bufs).map(|i| Frame::new(FrameId(i))).collect();
        let mut pool = Vec::with_capacity(num_bufs);
        pool.resize_with(num_bufs, || Rc::new(Buffer::default()));
        Self {
            frames,
            pool,
            index: HashIndex::new(num_bufs),
            clock_hand: num_bufs - 1,
        }
    }

    fn advance_clock(&mut self) {
        self.clock_hand = (self.clock_hand + 1) % self.frames.len();
    }

    // Clock-sweep で次に使うフレームを選ぶ。
    // dirty な犠牲ページはフレームを明け渡す前に書き戻す
    fn alloc_buf(&mut self) -> Result<FrameId, Error> {
        let num_bufs = self.frames.len();
        let mut pinned = 0;
        loop {
            self.advance_clock();
            let hand = self.clock_hand;
            let frame = &mut self.frames[hand];
            if !frame.valid {
                break;
            }
            if frame.ref_bit {
                // second chance
                frame.ref_bit = false;
                continue;
            }
            if frame.pin_count > 0 {
                // pin されたフレームしか残っていなければ打ち切る
                pinned += 1;
                if pinned == num_bufs {
                    return Err(Error::BufferExceeded);
                }
                continue;
            }
            // valid で参照もピンもされていないページを犠牲にする
            let token = match &frame.file {
                Some(weak) => weak.as_ptr() as FileToken,
                None => return Err(Error::BadBuffer(FrameId(hand))),
            };
            if frame.dirty {
                let file = match frame.file.as_ref().and_then(|weak| weak.upgrade()) {
                    Some(file) => file,
                    None => return Err(Error::BadBuffer(FrameId(hand))),
                };
                debug!("write back page {:?} from frame {}", frame.page_id, hand);
                let page = self.pool[hand].page.borrow();
                file.borrow_mut().write_page(frame.page_id, page.as_ref())?;
                frame.dirty = false;
            }
            let page_id = frame.page_id;
            self.index.remove(token, page_id);
            break;
        }
        let hand = self.clock_hand;
        self.frames[hand].clear();
        Ok(FrameId(hand))
    }

    pub fn read_page(&mut self, file: &FileRef<F>, page_id: PageId) -> Result<Rc<Buffer>, Error> {
        let token = file_token(file);
        if let Some(frame_id) = self.index.lookup(token, page_id) {
            let frame = &mut self.frames[frame_id.to_usize()];
            frame.ref_bit = true;
            frame.pin_count += 1;
            return Ok(Rc::clone(&self.pool[frame_id.to_usize()]));
        }
        let frame_id = self.alloc_buf()?;
        let buffer = Rc::new(Buffer::new(page_id));
        file.borrow_mut()
            .read_page(page_id, buffer.page.borrow_mut().as_mut())?;
        self.pool[frame_id.to_usize()] = Rc::clone(&buffer);
        self.index.insert(token, page_id, frame_id);
        self.frames[frame_id.to_usize()].set(file, page_id);
        Ok(buffer)
    }

    pub fn alloc_page(&mut self, file: &FileRef<F>) -> Result<Rc<Buffer>, Error> {
        let token = file_token(file);
        // 先にページを採番してからフレームを確保する
        let page_id = file.borrow_mut().allocate_page();
        let frame_id = self.alloc_buf()?;
        let buffer = Rc::new(Buffer::new(page_id));
        self.pool[frame_id.to_usize()] = Rc::clone(&buffer);
        self.index.insert(token, page_id, frame_id);
        self.frames[frame_id.to_usize()].set(file, page_id);
        Ok(buffer)
    }

    pub fn unpin_page(
        &mut self,
        file: &FileRef<F>,
        page_id: PageId,
        dirty: bool,
    ) -> Result<(), Error> {
        // 索引に無いページの unpin は黙って成功させる
        let frame_id = match self.index.lookup(file_token(file), page_id) {
            Some(frame_id) => frame_id,
            None => return Ok(()),
        };
        let frame = &mut self.frames[frame_id.to_usize()];
        if frame.pin_count == 0 {
            return Err(Error::PageNotPinned(file.borrow().filename(), page_id));
        }
        frame.pin_count -= 1;
        if dirty {
            frame.dirty = true;
        }
        Ok(())
    }

    pub fn flush_file(&mut self, file: &FileRef<F>) -> Result<(), Error> {
        let token = file_token(file);
        for i in 0..self.frames.len() {
            let frame = &mut self.frames[i];
            if !frame.belongs_to(file) {
                continue;
            }
            if frame.pin_count > 0 {
                return Err(Error::PagePinned(file.borrow().filename(), frame.page_id));
            }
            if !frame.valid {
                return Err(Error::BadBuffer(FrameId(i)));
            }
            if frame.dirty {
                let page = self.pool[i].page.borrow();
                file.borrow_mut().write_page(frame.page_id, page.as_ref())?;
                frame.dirty = false;
            }
            self.index.remove(token, frame.page_id);
            frame.clear();
        }
        file.borrow_mut().sync()?;
        Ok(())
    }

    pub fn dispose_page(&mut self, file: &FileRef<F>, page_id: PageId) -> Result<(), Error> {
        let token = file_token(file);
        // プールに居れば書き戻さずに追い出す。ページごと消えるため
        if let Some(frame_id) = self.index.lookup(token, page_id) {
            self.index.remove(token, page_id);
            self.frames[frame_id.to_usize()].clear();
        }
        file.borrow_mut().delete_page(page_id)?;
        Ok(())
    }

    // 診断用ダンプ。各フレームの状態と valid なフレーム数を印字する
    pub fn dump(&self) {
        let mut valid_frames = 0;
        for frame in &self.frames {
            println!("{:?}", frame);
            if frame.valid {
                valid_frames += 1;
            }
        }
        println!("total number of valid frames: {}", valid_frames);
    }
}

impl<F: PagedFile> Drop for BufferPoolManager<F> {
    // 破棄時には dirty なページをすべて書き戻す
    fn drop(&mut self) {
        for (i, frame) in self.frames.iter().enumerate() {
            if frame.pin_count > 0 {
                warn!(
                    "frame {} is released with {} outstanding pins",
                    i, frame.pin_count
                );
            }
            if !(frame.valid && frame.dirty) {
                continue;
            }
            match frame.file.as_ref().and_then(|weak| weak.upgrade()) {
                Some(file) => {
                    let page = self.pool[i].page.borrow();
                    if let Err(err) = file.borrow_mut().write_page(frame.page_id, page.as_ref()) {
                        warn!(
                            "failed to write back page {:?} from frame {}: {}",
                            frame.page_id, i, err
                        );
                    }
                }
                None => warn!(
                    "cannot write back page {:?} from frame {}: file already released",
                    frame.page_id, i
                ),
            }
        }
    }
}
