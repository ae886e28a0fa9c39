use std::sync::Arc;

use crate::{
    error::DbResult,
    file::BlockId,
    index::{BTPage, DirEntry},
    query::Constant,
    record::{Layout, Rid},
    tx::Transaction,
};

/// A leaf block of the B-tree, positioned for one search key.
///
/// A leaf whose flag is >= 0 points at an overflow block whose records all
/// carry the leaf's first key; iteration follows that chain as long as the
/// search key keeps matching.
pub struct BTreeLeaf {
    tx: Arc<Transaction>,
    layout: Arc<Layout>,
    search_key: Constant,
    contents: BTPage,
    current_slot: i32,
    filename: String,
}

impl BTreeLeaf {
    pub fn new(
        tx: Arc<Transaction>,
        block: BlockId,
        layout: Arc<Layout>,
        search_key: Constant,
    ) -> DbResult<Self> {
        let filename = block.filename().to_string();
        let contents = BTPage::new(Arc::clone(&tx), block, Arc::clone(&layout))?;
        let current_slot = contents.find_slot_before(&search_key)?;
        Ok(Self {
            tx,
            layout,
            search_key,
            contents,
            current_slot,
            filename,
        })
    }

    pub fn close(&mut self) {
        self.contents.close();
    }

    /// Step to the next record whose dataval equals the search key,
    /// following the overflow chain when the page runs out.
    pub fn next(&mut self) -> DbResult<bool> {
        self.current_slot += 1;
        if self.current_slot >= self.contents.get_num_recs()? {
            self.try_overflow()
        } else if self.contents.get_data_val(self.current_slot)? == self.search_key {
            Ok(true)
        } else {
            self.try_overflow()
        }
    }

    pub fn get_data_rid(&self) -> DbResult<Rid> {
        self.contents.get_data_rid(self.current_slot)
    }

    pub fn delete(&mut self, datarid: Rid) -> DbResult<()> {
        while self.next()? {
            if self.get_data_rid()? == datarid {
                self.contents.delete(self.current_slot)?;
                return Ok(());
            }
        }
        Ok(())
    }

    /// Insert the (search key, rid) pair at the current position, splitting
    /// when the page overflows. Returns the directory entry for a new
    /// sibling, if one was created.
    pub fn insert(&mut self, datarid: Rid) -> DbResult<Option<DirEntry>> {
        let flag = self.contents.get_flag()?;
        let first_key = self.contents.get_data_val(0)?;

        // An overflow chain hangs off the first key of this leaf. If the new
        // key sorts before it, the chain must stay with the old first key:
        // move everything into a fresh block, keep the chain pointer there,
        // and let this leaf start over with just the new record.
        if flag >= 0 && first_key > self.search_key {
            let new_block = self.contents.split(0, flag)?;
            self.current_slot = 0;
            self.contents.set_flag(-1)?;
            self.contents
                .insert_leaf(self.current_slot, &self.search_key, datarid)?;
            return Ok(Some(DirEntry::new(first_key, new_block.number())));
        }

        self.current_slot += 1;
        self.contents
            .insert_leaf(self.current_slot, &self.search_key, datarid)?;
        if !self.contents.is_full()? {
            return Ok(None);
        }

        // page is full, so split it
        let num_recs = self.contents.get_num_recs()?;
        let first_key = self.contents.get_data_val(0)?;
        let last_key = self.contents.get_data_val(num_recs - 1)?;
        if last_key == first_key {
            // everything is one key: chain an overflow block holding all but
            // the first record
            let new_block = self.contents.split(1, flag)?;
            self.contents.set_flag(new_block.number())?;
            Ok(None)
        } else {
            let mut split_pos = num_recs / 2;
            let mut split_key = self.contents.get_data_val(split_pos)?;
            if split_key == first_key {
                // move right, looking for the next key
                while self.contents.get_data_val(split_pos)? == split_key {
                    split_pos += 1;
                }
                split_key = self.contents.get_data_val(split_pos)?;
            } else {
                // move left, looking for the first entry having that key
                while self.contents.get_data_val(split_pos - 1)? == split_key {
                    split_pos -= 1;
                }
            }
            let new_block = self.contents.split(split_pos, -1)?;
            Ok(Some(DirEntry::new(split_key, new_block.number())))
        }
    }

    fn try_overflow(&mut self) -> DbResult<bool> {
        let first_key = self.contents.get_data_val(0)?;
        let flag = self.contents.get_flag()?;
        if self.search_key != first_key || flag < 0 {
            return Ok(false);
        }
        self.contents.close();
        let next_block = BlockId::new(&self.filename, flag);
        self.contents = BTPage::new(Arc::clone(&self.tx), next_block, Arc::clone(&self.layout))?;
        self.current_slot = 0;
        Ok(true)
    }
}
