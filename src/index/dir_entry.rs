use crate::query::Constant;

/// A (dataval, child block) pair handed upward when a page split introduces
/// a new block that the parent directory must point to.
#[derive(Clone, Debug)]
pub struct DirEntry {
    dataval: Constant,
    blknum: i32,
}

impl DirEntry {
    pub fn new(dataval: Constant, blknum: i32) -> Self {
        Self { dataval, blknum }
    }

    pub fn dataval(&self) -> &Constant {
        &self.dataval
    }

    pub fn block_number(&self) -> i32 {
        self.blknum
    }
}
