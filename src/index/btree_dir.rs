use std::sync::Arc;

use crate::{
    error::DbResult,
    file::BlockId,
    index::{BTPage, DirEntry},
    query::Constant,
    record::Layout,
    tx::Transaction,
};

/// A directory block of the B-tree. The flag holds the level: 0 points at
/// leaves, higher levels point at other directory blocks.
pub struct BTreeDir {
    tx: Arc<Transaction>,
    layout: Arc<Layout>,
    contents: BTPage,
    filename: String,
}

impl BTreeDir {
    pub fn new(tx: Arc<Transaction>, block: BlockId, layout: Arc<Layout>) -> DbResult<Self> {
        let filename = block.filename().to_string();
        let contents = BTPage::new(Arc::clone(&tx), block, Arc::clone(&layout))?;
        Ok(Self {
            tx,
            layout,
            contents,
            filename,
        })
    }

    pub fn close(&mut self) {
        self.contents.close();
    }

    /// Descend from this page to the leaf level and return the number of
    /// the leaf block that should hold the search key.
    pub fn search(&mut self, search_key: &Constant) -> DbResult<i32> {
        let mut child_block = self.find_child_block(search_key)?;
        while self.contents.get_flag()? > 0 {
            self.contents.close();
            self.contents = BTPage::new(
                Arc::clone(&self.tx),
                child_block,
                Arc::clone(&self.layout),
            )?;
            child_block = self.find_child_block(search_key)?;
        }
        Ok(child_block.number())
    }

    /// Grow the tree by one level. The root always stays at block 0: its
    /// current records move to a fresh block, and the root is left holding
    /// the two entries for the old contents and the split-off sibling.
    pub fn make_new_root(&mut self, e: &DirEntry) -> DbResult<()> {
        let first_val = self.contents.get_data_val(0)?;
        let level = self.contents.get_flag()?;
        let new_block = self.contents.split(0, level)?;
        let old_root = DirEntry::new(first_val, new_block.number());
        self.insert_entry(&old_root)?;
        self.insert_entry(e)?;
        self.contents.set_flag(level + 1)
    }

    /// Insert a directory entry, recursing toward level 0. A `Some` return
    /// is a split that the caller has to record one level up.
    pub fn insert(&mut self, e: &DirEntry) -> DbResult<Option<DirEntry>> {
        if self.contents.get_flag()? == 0 {
            return self.insert_entry(e);
        }
        let child_block = self.find_child_block(e.dataval())?;
        let mut child = BTreeDir::new(
            Arc::clone(&self.tx),
            child_block,
            Arc::clone(&self.layout),
        )?;
        let entry = child.insert(e)?;
        child.close();
        match entry {
            Some(entry) => self.insert_entry(&entry),
            None => Ok(None),
        }
    }

    fn insert_entry(&mut self, e: &DirEntry) -> DbResult<Option<DirEntry>> {
        let new_slot = self.contents.find_slot_before(e.dataval())? + 1;
        self.contents
            .insert_dir(new_slot, e.dataval(), e.block_number())?;
        if !self.contents.is_full()? {
            return Ok(None);
        }
        // page is full, so split it
        let level = self.contents.get_flag()?;
        let split_pos = self.contents.get_num_recs()? / 2;
        let split_val = self.contents.get_data_val(split_pos)?;
        let new_block = self.contents.split(split_pos, level)?;
        Ok(Some(DirEntry::new(split_val, new_block.number())))
    }

    fn find_child_block(&self, search_key: &Constant) -> DbResult<BlockId> {
        let mut slot = self.contents.find_slot_before(search_key)?;
        // equal keys descend to the right, which keeps duplicates stable
        if self.contents.get_data_val(slot + 1)? == *search_key {
            slot += 1;
        }
        let blknum = self.contents.get_child_num(slot)?;
        Ok(BlockId::new(&self.filename, blknum))
    }
}
