use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
};

use crate::{
    error::DbResult,
    record::{Layout, Schema, TableScan},
    tx::Transaction,
};

// increases monotonically by 1, so temp table names never collide within a
// process
static NEXT_TABLE_NUM: AtomicI32 = AtomicI32::new(0);

/// A throwaway table used by materialization and sorting. The backing file
/// appears in the database directory like any other table and is simply
/// abandoned when the operator finishes.
pub struct TempTable {
    tx: Arc<Transaction>,
    table_name: String,
    layout: Arc<Layout>,
}

impl TempTable {
    pub fn new(tx: Arc<Transaction>, schema: &Schema) -> Self {
        let table_name = format!("temp{}", NEXT_TABLE_NUM.fetch_add(1, Ordering::Relaxed) + 1);
        Self {
            tx,
            table_name,
            layout: Arc::new(Layout::new(schema.clone())),
        }
    }

    pub fn open(&self) -> DbResult<TableScan> {
        TableScan::new(
            Arc::clone(&self.tx),
            &self.table_name,
            Arc::clone(&self.layout),
        )
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn layout(&self) -> Arc<Layout> {
        Arc::clone(&self.layout)
    }
}
