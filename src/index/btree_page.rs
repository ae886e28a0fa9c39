use std::sync::Arc;

use crate::{
    error::DbResult,
    file::{BlockId, INT_BYTES},
    query::Constant,
    record::{FieldType, Layout, Rid},
    tx::Transaction,
};

/// A directory-or-leaf page of a B-tree file.
///
/// Every page begins with a 4-byte flag (the level of a directory page; −1
/// or an overflow block number for a leaf) followed by a 4-byte record
/// count, then fixed-size slots kept sorted by `dataval`.
///
/// Constructing the wrapper pins the block; it stays pinned until `close`,
/// which also runs on drop so every exit path releases the pin.
pub struct BTPage {
    tx: Arc<Transaction>,
    current_block: Option<BlockId>,
    layout: Arc<Layout>,
}

impl BTPage {
    pub fn new(tx: Arc<Transaction>, block: BlockId, layout: Arc<Layout>) -> DbResult<Self> {
        tx.pin(&block)?;
        Ok(Self {
            tx,
            current_block: Some(block),
            layout,
        })
    }

    fn block(&self) -> &BlockId {
        self.current_block.as_ref().expect("page is closed")
    }

    /// The greatest slot whose dataval is still less than the search key,
    /// or −1 if there is none.
    pub fn find_slot_before(&self, search_key: &Constant) -> DbResult<i32> {
        let mut slot = 0;
        while slot < self.get_num_recs()? && self.get_data_val(slot)? < *search_key {
            slot += 1;
        }
        Ok(slot - 1)
    }

    pub fn close(&mut self) {
        if let Some(block) = self.current_block.take() {
            self.tx.unpin(&block);
        }
    }

    pub fn is_full(&self) -> DbResult<bool> {
        Ok(self.slot_pos(self.get_num_recs()? + 1) >= self.tx.block_size())
    }

    /// Move every record from `split_pos` on into a fresh block with the
    /// given flag, and return that block.
    pub fn split(&self, split_pos: i32, flag: i32) -> DbResult<BlockId> {
        let new_block = self.append_new(flag)?;
        let mut new_page = BTPage::new(
            Arc::clone(&self.tx),
            new_block.clone(),
            Arc::clone(&self.layout),
        )?;
        self.transfer_recs(split_pos, &new_page)?;
        new_page.set_flag(flag)?;
        new_page.close();
        Ok(new_block)
    }

    pub fn get_data_val(&self, slot: i32) -> DbResult<Constant> {
        self.get_val(slot, "dataval")
    }

    pub fn get_flag(&self) -> DbResult<i32> {
        self.tx.get_int(self.block(), 0)
    }

    pub fn set_flag(&self, val: i32) -> DbResult<()> {
        self.tx.set_int(self.block(), 0, val, true)
    }

    /// Append a formatted block to this page's file.
    pub fn append_new(&self, flag: i32) -> DbResult<BlockId> {
        let block = self.tx.append(self.block().filename())?;
        self.tx.pin(&block)?;
        self.format(&block, flag)?;
        self.tx.unpin(&block);
        Ok(block)
    }

    pub fn format(&self, block: &BlockId, flag: i32) -> DbResult<()> {
        self.tx.set_int(block, 0, flag, false)?;
        self.tx.set_int(block, INT_BYTES, 0, false)?;
        let record_size = self.layout.slot_size();
        let mut pos = 2 * INT_BYTES;
        while pos + record_size < self.tx.block_size() {
            self.make_default_record(block, pos)?;
            pos += record_size;
        }
        Ok(())
    }

    fn make_default_record(&self, block: &BlockId, pos: usize) -> DbResult<()> {
        let schema = self.layout.schema();
        for field_name in schema.fields() {
            let offset = self.layout.offset(field_name);
            match schema.field_type(field_name) {
                FieldType::Integer => self.tx.set_int(block, pos + offset, 0, false)?,
                FieldType::Varchar => self.tx.set_string(block, pos + offset, "", false)?,
            }
        }
        Ok(())
    }

    // directory page accessors

    pub fn get_child_num(&self, slot: i32) -> DbResult<i32> {
        self.get_int(slot, "block")
    }

    pub fn insert_dir(&self, slot: i32, val: &Constant, blknum: i32) -> DbResult<()> {
        self.insert(slot)?;
        self.set_val(slot, "dataval", val)?;
        self.set_int(slot, "block", blknum)
    }

    // leaf page accessors

    pub fn get_data_rid(&self, slot: i32) -> DbResult<Rid> {
        let blknum = self.get_int(slot, "block")?;
        let id = self.get_int(slot, "id")?;
        Ok(Rid::new(blknum, id))
    }

    pub fn insert_leaf(&self, slot: i32, val: &Constant, rid: Rid) -> DbResult<()> {
        self.insert(slot)?;
        self.set_val(slot, "dataval", val)?;
        self.set_int(slot, "block", rid.block_number())?;
        self.set_int(slot, "id", rid.slot())
    }

    pub fn delete(&self, slot: i32) -> DbResult<()> {
        let num_recs = self.get_num_recs()?;
        for i in slot + 1..num_recs {
            self.copy_record(i, i - 1)?;
        }
        self.set_num_recs(num_recs - 1)
    }

    pub fn get_num_recs(&self) -> DbResult<i32> {
        self.tx.get_int(self.block(), INT_BYTES)
    }

    fn get_int(&self, slot: i32, field_name: &str) -> DbResult<i32> {
        let pos = self.field_pos(slot, field_name);
        self.tx.get_int(self.block(), pos)
    }

    fn get_string(&self, slot: i32, field_name: &str) -> DbResult<String> {
        let pos = self.field_pos(slot, field_name);
        self.tx.get_string(self.block(), pos)
    }

    fn get_val(&self, slot: i32, field_name: &str) -> DbResult<Constant> {
        match self.layout.schema().field_type(field_name) {
            FieldType::Integer => Ok(Constant::Int(self.get_int(slot, field_name)?)),
            FieldType::Varchar => Ok(Constant::Str(self.get_string(slot, field_name)?)),
        }
    }

    fn set_int(&self, slot: i32, field_name: &str, val: i32) -> DbResult<()> {
        let pos = self.field_pos(slot, field_name);
        self.tx.set_int(self.block(), pos, val, true)
    }

    fn set_string(&self, slot: i32, field_name: &str, val: &str) -> DbResult<()> {
        let pos = self.field_pos(slot, field_name);
        self.tx.set_string(self.block(), pos, val, true)
    }

    fn set_val(&self, slot: i32, field_name: &str, val: &Constant) -> DbResult<()> {
        match self.layout.schema().field_type(field_name) {
            FieldType::Integer => self.set_int(slot, field_name, val.as_int()),
            FieldType::Varchar => self.set_string(slot, field_name, val.as_str()),
        }
    }

    fn set_num_recs(&self, n: i32) -> DbResult<()> {
        self.tx.set_int(self.block(), INT_BYTES, n, true)
    }

    /// Open a hole at `slot` by shifting the tail one position right.
    fn insert(&self, slot: i32) -> DbResult<()> {
        let num_recs = self.get_num_recs()?;
        let mut i = num_recs;
        while i > slot {
            self.copy_record(i - 1, i)?;
            i -= 1;
        }
        self.set_num_recs(num_recs + 1)
    }

    fn copy_record(&self, from: i32, to: i32) -> DbResult<()> {
        for field_name in self.layout.schema().fields() {
            let val = self.get_val(from, field_name)?;
            self.set_val(to, field_name, &val)?;
        }
        Ok(())
    }

    fn transfer_recs(&self, slot: i32, dest: &BTPage) -> DbResult<()> {
        let mut dest_slot = 0;
        while slot < self.get_num_recs()? {
            dest.insert(dest_slot)?;
            for field_name in self.layout.schema().fields() {
                let val = self.get_val(slot, field_name)?;
                dest.set_val(dest_slot, field_name, &val)?;
            }
            self.delete(slot)?;
            dest_slot += 1;
        }
        Ok(())
    }

    fn field_pos(&self, slot: i32, field_name: &str) -> usize {
        self.slot_pos(slot) + self.layout.offset(field_name)
    }

    fn slot_pos(&self, slot: i32) -> usize {
        INT_BYTES + INT_BYTES + slot as usize * self.layout.slot_size()
    }
}

impl Drop for BTPage {
    fn drop(&mut self) {
        self.close();
    }
}
