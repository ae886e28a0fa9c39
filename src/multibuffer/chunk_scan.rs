use std::sync::Arc;

use crate::{
    error::DbResult,
    file::BlockId,
    query::{Constant, Scan},
    record::{FieldType, Layout, RecordPage},
    tx::Transaction,
};

/// A scan over a contiguous range of record pages that stay pinned for the
/// scan's whole lifetime, so rescanning the chunk costs no I/O.
pub struct ChunkScan {
    buffs: Vec<RecordPage>,
    tx: Arc<Transaction>,
    filename: String,
    layout: Arc<Layout>,
    start_blknum: i32,
    end_blknum: i32,
    current_blknum: i32,
    current_slot: i32,
}

impl ChunkScan {
    pub fn new(
        tx: Arc<Transaction>,
        filename: &str,
        layout: Arc<Layout>,
        start_blknum: i32,
        end_blknum: i32,
    ) -> DbResult<Self> {
        let mut buffs = Vec::new();
        for i in start_blknum..=end_blknum {
            let block = BlockId::new(filename, i);
            buffs.push(RecordPage::new(
                Arc::clone(&tx),
                block,
                Arc::clone(&layout),
            )?);
        }
        Ok(Self {
            buffs,
            tx,
            filename: filename.to_string(),
            layout,
            start_blknum,
            end_blknum,
            current_blknum: start_blknum,
            current_slot: -1,
        })
    }

    fn move_to_block(&mut self, blknum: i32) {
        self.current_blknum = blknum;
        self.current_slot = -1;
    }

    fn rp(&self) -> &RecordPage {
        &self.buffs[(self.current_blknum - self.start_blknum) as usize]
    }
}

impl Scan for ChunkScan {
    fn before_first(&mut self) -> DbResult<()> {
        self.move_to_block(self.start_blknum);
        Ok(())
    }

    fn next(&mut self) -> DbResult<bool> {
        self.current_slot = self.rp().next_after(self.current_slot)?;
        while self.current_slot < 0 {
            if self.current_blknum == self.end_blknum {
                return Ok(false);
            }
            self.move_to_block(self.current_blknum + 1);
            self.current_slot = self.rp().next_after(self.current_slot)?;
        }
        Ok(true)
    }

    fn get_int(&mut self, field_name: &str) -> DbResult<i32> {
        self.rp().get_int(self.current_slot, field_name)
    }

    fn get_string(&mut self, field_name: &str) -> DbResult<String> {
        self.rp().get_string(self.current_slot, field_name)
    }

    fn get_val(&mut self, field_name: &str) -> DbResult<Constant> {
        match self.layout.schema().field_type(field_name) {
            FieldType::Integer => Ok(Constant::Int(self.get_int(field_name)?)),
            FieldType::Varchar => Ok(Constant::Str(self.get_string(field_name)?)),
        }
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.layout.schema().has_field(field_name)
    }

    fn close(&mut self) {
        for i in 0..self.buffs.len() {
            let block = BlockId::new(&self.filename, self.start_blknum + i as i32);
            self.tx.unpin(&block);
        }
        self.buffs.clear();
    }
}
