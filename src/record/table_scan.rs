use std::sync::Arc;

use crate::{
    error::DbResult,
    file::BlockId,
    query::{Constant, Scan, UpdateScan},
    record::{FieldType, Layout, RecordPage, Rid},
    tx::Transaction,
};

/// A forward cursor over the record pages of one table file. Also the
/// workhorse update scan: inserts find the first EMPTY slot, appending a
/// freshly formatted block when every page is full.
pub struct TableScan {
    tx: Arc<Transaction>,
    layout: Arc<Layout>,
    rp: Option<RecordPage>,
    filename: String,
    current_slot: i32,
}

impl TableScan {
    pub fn new(tx: Arc<Transaction>, table_name: &str, layout: Arc<Layout>) -> DbResult<Self> {
        let mut scan = Self {
            tx,
            layout,
            rp: None,
            filename: format!("{}.tbl", table_name),
            current_slot: -1,
        };
        if scan.tx.size(&scan.filename)? == 0 {
            scan.move_to_new_block()?;
        } else {
            scan.move_to_block(0)?;
        }
        Ok(scan)
    }

    fn rp(&self) -> &RecordPage {
        self.rp.as_ref().expect("table scan has no current page")
    }

    fn move_to_block(&mut self, blknum: i32) -> DbResult<()> {
        self.close();
        let block = BlockId::new(&self.filename, blknum);
        self.rp = Some(RecordPage::new(
            Arc::clone(&self.tx),
            block,
            Arc::clone(&self.layout),
        )?);
        self.current_slot = -1;
        Ok(())
    }

    fn move_to_new_block(&mut self) -> DbResult<()> {
        self.close();
        let block = self.tx.append(&self.filename)?;
        let rp = RecordPage::new(Arc::clone(&self.tx), block, Arc::clone(&self.layout))?;
        rp.format()?;
        self.rp = Some(rp);
        self.current_slot = -1;
        Ok(())
    }

    fn at_last_block(&self) -> DbResult<bool> {
        Ok(self.rp().block().number() == self.tx.size(&self.filename)? - 1)
    }
}

impl Scan for TableScan {
    fn before_first(&mut self) -> DbResult<()> {
        self.move_to_block(0)
    }

    fn next(&mut self) -> DbResult<bool> {
        self.current_slot = self.rp().next_after(self.current_slot)?;
        while self.current_slot < 0 {
            if self.at_last_block()? {
                return Ok(false);
            }
            let next_blknum = self.rp().block().number() + 1;
            self.move_to_block(next_blknum)?;
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
        if let Some(rp) = self.rp.take() {
            self.tx.unpin(rp.block());
        }
    }

    fn as_update_scan(&mut self) -> Option<&mut dyn UpdateScan> {
        Some(self)
    }
}

impl UpdateScan for TableScan {
    fn set_int(&mut self, field_name: &str, val: i32) -> DbResult<()> {
        self.rp().set_int(self.current_slot, field_name, val)
    }

    fn set_string(&mut self, field_name: &str, val: &str) -> DbResult<()> {
        self.rp().set_string(self.current_slot, field_name, val)
    }

    fn set_val(&mut self, field_name: &str, val: &Constant) -> DbResult<()> {
        match self.layout.schema().field_type(field_name) {
            FieldType::Integer => self.set_int(field_name, val.as_int()),
            FieldType::Varchar => self.set_string(field_name, val.as_str()),
        }
    }

    fn insert(&mut self) -> DbResult<()> {
        self.current_slot = self.rp().insert_after(self.current_slot)?;
        while self.current_slot < 0 {
            if self.at_last_block()? {
                self.move_to_new_block()?;
            } else {
                let next_blknum = self.rp().block().number() + 1;
                self.move_to_block(next_blknum)?;
            }
            self.current_slot = self.rp().insert_after(self.current_slot)?;
        }
        Ok(())
    }

    fn delete(&mut self) -> DbResult<()> {
        self.rp().delete(self.current_slot)
    }

    fn get_rid(&mut self) -> DbResult<Rid> {
        Ok(Rid::new(self.rp().block().number(), self.current_slot))
    }

    fn move_to_rid(&mut self, rid: Rid) -> DbResult<()> {
        self.close();
        let block = BlockId::new(&self.filename, rid.block_number());
        self.rp = Some(RecordPage::new(
            Arc::clone(&self.tx),
            block,
            Arc::clone(&self.layout),
        )?);
        self.current_slot = rid.slot();
        Ok(())
    }
}
