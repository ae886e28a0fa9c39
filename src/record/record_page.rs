use std::{cmp::Ordering, sync::Arc};

use crate::{
    error::DbResult,
    file::BlockId,
    record::{FieldType, Layout},
    tx::Transaction,
};

pub const EMPTY: i32 = 0;
pub const USED: i32 = 1;

/// A block viewed as contiguous fixed-size slots. Each slot starts with a
/// 4-byte flag; a slot is valid iff its byte extent fits in the block.
/// Deleted slots are marked EMPTY and reused by later inserts; space is
/// never compacted.
pub struct RecordPage {
    tx: Arc<Transaction>,
    block: BlockId,
    layout: Arc<Layout>,
}

impl RecordPage {
    /// Pins the block for the lifetime of the wrapper. The caller unpins
    /// through the transaction when done.
    pub fn new(tx: Arc<Transaction>, block: BlockId, layout: Arc<Layout>) -> DbResult<Self> {
        tx.pin(&block)?;
        Ok(Self { tx, block, layout })
    }

    pub fn get_int(&self, slot: i32, field_name: &str) -> DbResult<i32> {
        let fpos = self.offset(slot) + self.layout.offset(field_name);
        self.tx.get_int(&self.block, fpos)
    }

    pub fn get_string(&self, slot: i32, field_name: &str) -> DbResult<String> {
        let fpos = self.offset(slot) + self.layout.offset(field_name);
        self.tx.get_string(&self.block, fpos)
    }

    pub fn set_int(&self, slot: i32, field_name: &str, val: i32) -> DbResult<()> {
        let fpos = self.offset(slot) + self.layout.offset(field_name);
        self.tx.set_int(&self.block, fpos, val, true)
    }

    pub fn set_string(&self, slot: i32, field_name: &str, val: &str) -> DbResult<()> {
        let fpos = self.offset(slot) + self.layout.offset(field_name);
        self.tx.set_string(&self.block, fpos, val, true)
    }

    pub fn delete(&self, slot: i32) -> DbResult<()> {
        self.set_flag(slot, EMPTY)
    }

    /// Reset every slot to EMPTY with zeroed fields. The writes are silent:
    /// a freshly formatted page has no old values worth undoing.
    pub fn format(&self) -> DbResult<()> {
        let mut slot = 0;
        while self.is_valid_slot(slot) {
            self.tx
                .set_int(&self.block, self.offset(slot), EMPTY, false)?;
            let schema = self.layout.schema();
            for field_name in schema.fields() {
                let fpos = self.offset(slot) + self.layout.offset(field_name);
                match schema.field_type(field_name) {
                    FieldType::Integer => self.tx.set_int(&self.block, fpos, 0, false)?,
                    FieldType::Varchar => self.tx.set_string(&self.block, fpos, "", false)?,
                }
            }
            slot += 1;
        }
        Ok(())
    }

    /// The next USED slot after `slot`, or −1.
    pub fn next_after(&self, slot: i32) -> DbResult<i32> {
        self.search_after(slot, USED)
    }

    /// Claim the next EMPTY slot after `slot`, or return −1 when the page is
    /// full.
    pub fn insert_after(&self, slot: i32) -> DbResult<i32> {
        let new_slot = self.search_after(slot, EMPTY)?;
        if new_slot >= 0 {
            self.set_flag(new_slot, USED)?;
        }
        Ok(new_slot)
    }

    pub fn block(&self) -> &BlockId {
        &self.block
    }

    /// Compare two slots by the given fields, in order.
    pub fn compare(&self, slot1: i32, slot2: i32, fields: &[String]) -> DbResult<Ordering> {
        for field_name in fields {
            let ord = match self.layout.schema().field_type(field_name) {
                FieldType::Integer => self
                    .get_int(slot1, field_name)?
                    .cmp(&self.get_int(slot2, field_name)?),
                FieldType::Varchar => self
                    .get_string(slot1, field_name)?
                    .cmp(&self.get_string(slot2, field_name)?),
            };
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }
        Ok(Ordering::Equal)
    }

    /// Exchange the full contents of two slots.
    pub fn swap(&self, slot1: i32, slot2: i32) -> DbResult<()> {
        let schema = self.layout.schema();
        for field_name in schema.fields() {
            match schema.field_type(field_name) {
                FieldType::Integer => {
                    let v1 = self.get_int(slot1, field_name)?;
                    let v2 = self.get_int(slot2, field_name)?;
                    self.set_int(slot1, field_name, v2)?;
                    self.set_int(slot2, field_name, v1)?;
                }
                FieldType::Varchar => {
                    let v1 = self.get_string(slot1, field_name)?;
                    let v2 = self.get_string(slot2, field_name)?;
                    self.set_string(slot1, field_name, &v2)?;
                    self.set_string(slot2, field_name, &v1)?;
                }
            }
        }
        Ok(())
    }

    fn set_flag(&self, slot: i32, flag: i32) -> DbResult<()> {
        self.tx.set_int(&self.block, self.offset(slot), flag, true)
    }

    fn get_flag(&self, slot: i32) -> DbResult<i32> {
        self.tx.get_int(&self.block, self.offset(slot))
    }

    fn search_after(&self, mut slot: i32, flag: i32) -> DbResult<i32> {
        slot += 1;
        while self.is_valid_slot(slot) {
            if self.get_flag(slot)? == flag {
                return Ok(slot);
            }
            slot += 1;
        }
        Ok(-1)
    }

    fn is_valid_slot(&self, slot: i32) -> bool {
        self.offset(slot + 1) <= self.tx.block_size()
    }

    fn offset(&self, slot: i32) -> usize {
        slot as usize * self.layout.slot_size()
    }
}
