use std::sync::Arc;

use crate::{
    error::DbResult,
    index::Index,
    query::{Constant, Scan, UpdateScan},
    record::{Layout, Rid, TableScan},
    tx::Transaction,
};

pub const NUM_BUCKETS: u32 = 100;

/// A static hash index: the search key hashes to one of a fixed number of
/// buckets, each an ordinary table file `<name><bucket>.tbl` of (block, id,
/// dataval) records. Search cost is the bucket size, i.e. blocks ÷ buckets.
pub struct HashIndex {
    tx: Arc<Transaction>,
    index_name: String,
    layout: Arc<Layout>,
    search_key: Option<Constant>,
    ts: Option<TableScan>,
}

impl HashIndex {
    pub fn new(tx: Arc<Transaction>, index_name: &str, layout: Arc<Layout>) -> Self {
        Self {
            tx,
            index_name: index_name.to_string(),
            layout,
            search_key: None,
            ts: None,
        }
    }

    pub fn search_cost(num_blocks: i32, _rpb: i32) -> i32 {
        num_blocks / NUM_BUCKETS as i32
    }

    fn ts_mut(&mut self) -> &mut TableScan {
        self.ts.as_mut().expect("index is not positioned")
    }
}

impl Index for HashIndex {
    fn before_first(&mut self, search_key: &Constant) -> DbResult<()> {
        self.close();
        self.search_key = Some(search_key.clone());
        let bucket = search_key.hash_code() % NUM_BUCKETS;
        let table_name = format!("{}{}", self.index_name, bucket);
        self.ts = Some(TableScan::new(
            Arc::clone(&self.tx),
            &table_name,
            Arc::clone(&self.layout),
        )?);
        Ok(())
    }

    fn next(&mut self) -> DbResult<bool> {
        let search_key = self.search_key.clone().expect("index is not positioned");
        let ts = self.ts_mut();
        while ts.next()? {
            if ts.get_val("dataval")? == search_key {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn get_data_rid(&mut self) -> DbResult<Rid> {
        let ts = self.ts_mut();
        let blknum = ts.get_int("block")?;
        let id = ts.get_int("id")?;
        Ok(Rid::new(blknum, id))
    }

    fn insert(&mut self, dataval: &Constant, datarid: Rid) -> DbResult<()> {
        self.before_first(dataval)?;
        let ts = self.ts_mut();
        ts.insert()?;
        ts.set_int("block", datarid.block_number())?;
        ts.set_int("id", datarid.slot())?;
        ts.set_val("dataval", dataval)
    }

    fn delete(&mut self, dataval: &Constant, datarid: Rid) -> DbResult<()> {
        self.before_first(dataval)?;
        while self.next()? {
            if self.get_data_rid()? == datarid {
                self.ts_mut().delete()?;
                return Ok(());
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut ts) = self.ts.take() {
            ts.close();
        }
    }
}
