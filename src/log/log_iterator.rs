use std::sync::Arc;

use crate::{
    error::DbResult,
    file::{BlockId, FileManager, Page, INT_BYTES},
};

/// Walks the log backward, yielding records newest first. Within a block
/// records are read from the boundary toward the block end; blocks are then
/// visited in decreasing order until block 0 is exhausted.
pub struct LogIterator {
    fm: Arc<FileManager>,
    block: BlockId,
    page: Page,
    current_pos: usize,
}

impl LogIterator {
    pub(crate) fn new(fm: Arc<FileManager>, block: BlockId) -> DbResult<Self> {
        let page = Page::new(fm.block_size());
        let mut it = Self {
            fm,
            block: block.clone(),
            page,
            current_pos: 0,
        };
        it.move_to_block(&block)?;
        Ok(it)
    }

    fn has_next(&self) -> bool {
        self.current_pos < self.fm.block_size() || self.block.number() > 0
    }

    fn move_to_block(&mut self, block: &BlockId) -> DbResult<()> {
        self.fm.read(block, &mut self.page)?;
        self.current_pos = self.page.get_int(0) as usize;
        Ok(())
    }
}

impl Iterator for LogIterator {
    type Item = DbResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }

        if self.current_pos == self.fm.block_size() {
            self.block = BlockId::new(self.block.filename(), self.block.number() - 1);
            let block = self.block.clone();
            if let Err(e) = self.move_to_block(&block) {
                return Some(Err(e));
            }
        }

        let rec = self.page.get_bytes(self.current_pos).to_vec();
        self.current_pos += INT_BYTES + rec.len();
        Some(Ok(rec))
    }
}
