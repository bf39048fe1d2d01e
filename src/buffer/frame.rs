use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::storage::entity::PageId;

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct FrameId(pub usize);

impl FrameId {
    pub fn to_usize(self) -> usize {
        self.0
    }
}

pub struct Frame<F> {
    // フレーム自身の番号。テーブル上の位置と常に一致する
    frame_no: FrameId,
    // ページを所有するファイルへの弱参照。valid のときだけ Some
    pub(crate) file: Option<Weak<RefCell<F>>>,
    pub(crate) page_id: PageId,
    pub(crate) valid: bool,
    pub(crate) dirty: bool,
    pub(crate) pin_count: u32,
    pub(crate) ref_bit: bool,
}

impl<F> Frame<F> {
    pub fn new(frame_no: FrameId) -> Self {
        Self {
            frame_no,
            file: None,
            page_id: PageId::INVALID_PAGE_ID,
            valid: false,
            dirty: false,
            pin_count: 0,
            ref_bit: false,
        }
    }

    pub fn frame_no(&self) -> FrameId {
        self.frame_no
    }

    // フレームを初期状態に戻す。frame_no だけは保つ
    pub fn clear(&mut self) {
        self.file = None;
        self.page_id = PageId::INVALID_PAGE_ID;
        self.valid = false;
        self.dirty = false;
        self.pin_count = 0;
        self.ref_bit = false;
    }

    // 読み込んだページをフレームに固定する。pin_count = 1 で貸し出す
    pub fn set(&mut self, file: &Rc<RefCell<F>>, page_id: PageId) {
        self.file = Some(Rc::downgrade(file));
        self.page_id = page_id;
        self.valid = true;
        self.dirty = false;
        self.pin_count = 1;
        self.ref_bit = true;
    }

    // このフレームが file のページを保持しているか
    pub fn belongs_to(&self, file: &Rc<RefCell<F>>) -> bool {
        match &self.file {
            Some(weak) => weak.as_ptr() == Rc::as_ptr(file),
            None => false,
        }
    }
}

impl<F> fmt::Debug for Frame<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("frame_no", &self.frame_no)
            .field("page_id", &self.page_id)
            .field("valid", &self.valid)
            .field("dirty", &self.dirty)
            .field("pin_count", &self.pin_count)
            .field("ref_bit", &self.ref_bit)
            .finish()
    }
}
