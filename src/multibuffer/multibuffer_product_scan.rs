use std::sync::Arc;

use crate::{
    error::DbResult,
    multibuffer::{best_factor, ChunkScan},
    query::{Constant, Scan},
    record::Layout,
    tx::Transaction,
};

/// The product of a scan with a stored table, processed one pinned chunk of
/// the table at a time. The left scan is replayed once per chunk instead of
/// once per right-hand block.
pub struct MultibufferProductScan {
    tx: Arc<Transaction>,
    lhs: Box<dyn Scan>,
    rhs: Option<ChunkScan>,
    filename: String,
    layout: Arc<Layout>,
    chunk_size: i32,
    next_blknum: i32,
    file_size: i32,
}

impl MultibufferProductScan {
    pub fn new(
        tx: Arc<Transaction>,
        lhs: Box<dyn Scan>,
        table_name: &str,
        layout: Arc<Layout>,
    ) -> DbResult<Self> {
        let filename = format!("{}.tbl", table_name);
        let file_size = tx.size(&filename)?;
        let available = tx.available_buffs() as i32;
        let chunk_size = best_factor(available, file_size);
        let mut scan = Self {
            tx,
            lhs,
            rhs: None,
            filename,
            layout,
            chunk_size,
            next_blknum: 0,
            file_size,
        };
        scan.before_first()?;
        Ok(scan)
    }

    fn use_next_chunk(&mut self) -> DbResult<bool> {
        if self.next_blknum >= self.file_size {
            return Ok(false);
        }

        if let Some(rhs) = self.rhs.as_mut() {
            rhs.close();
        }
        let end = (self.next_blknum + self.chunk_size - 1).min(self.file_size - 1);
        let mut rhs = ChunkScan::new(
            Arc::clone(&self.tx),
            &self.filename,
            Arc::clone(&self.layout),
            self.next_blknum,
            end,
        )?;
        rhs.before_first()?;
        self.rhs = Some(rhs);

        // replay the left side against the new chunk
        self.lhs.before_first()?;
        self.lhs.next()?;

        self.next_blknum = end + 1;
        Ok(true)
    }
}

impl Scan for MultibufferProductScan {
    fn before_first(&mut self) -> DbResult<()> {
        self.next_blknum = 0;
        self.use_next_chunk()?;
        Ok(())
    }

    fn next(&mut self) -> DbResult<bool> {
        loop {
            let rhs = match self.rhs.as_mut() {
                Some(rhs) => rhs,
                None => return Ok(false),
            };
            if rhs.next()? {
                return Ok(true);
            }
            // chunk exhausted for the current left row
            rhs.before_first()?;
            if rhs.next()? && self.lhs.next()? {
                return Ok(true);
            }
            if !self.use_next_chunk()? {
                return Ok(false);
            }
        }
    }

    fn get_int(&mut self, field_name: &str) -> DbResult<i32> {
        if self.lhs.has_field(field_name) {
            self.lhs.get_int(field_name)
        } else {
            self.rhs.as_mut().expect("scan is closed").get_int(field_name)
        }
    }

    fn get_string(&mut self, field_name: &str) -> DbResult<String> {
        if self.lhs.has_field(field_name) {
            self.lhs.get_string(field_name)
        } else {
            self.rhs
                .as_mut()
                .expect("scan is closed")
                .get_string(field_name)
        }
    }

    fn get_val(&mut self, field_name: &str) -> DbResult<Constant> {
        if self.lhs.has_field(field_name) {
            self.lhs.get_val(field_name)
        } else {
            self.rhs.as_mut().expect("scan is closed").get_val(field_name)
        }
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.lhs.has_field(field_name)
            || self
                .rhs
                .as_ref()
                .map(|rhs| rhs.has_field(field_name))
                .unwrap_or(false)
    }

    fn close(&mut self) {
        self.lhs.close();
        if let Some(rhs) = self.rhs.as_mut() {
            rhs.close();
        }
    }
}
