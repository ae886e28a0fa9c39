use std::sync::Arc;

use crate::{
    error::DbResult,
    materialize::TempTable,
    plan::Plan,
    query::{Scan, UpdateScan},
    record::{Layout, Schema},
    tx::Transaction,
};

/// Copies its source into a temp table once, so downstream operators can
/// rescan cheaply.
pub struct MaterializePlan {
    src_plan: Arc<dyn Plan>,
    tx: Arc<Transaction>,
}

impl MaterializePlan {
    pub fn new(tx: Arc<Transaction>, src_plan: Arc<dyn Plan>) -> Self {
        Self { src_plan, tx }
    }
}

impl Plan for MaterializePlan {
    fn open(&self) -> DbResult<Box<dyn Scan>> {
        let schema = self.src_plan.schema().clone();
        let temp = TempTable::new(Arc::clone(&self.tx), &schema);
        let mut src = self.src_plan.open()?;
        let mut dest = temp.open()?;

        while src.next()? {
            dest.insert()?;
            for field_name in schema.fields() {
                let val = src.get_val(field_name)?;
                dest.set_val(field_name, &val)?;
            }
        }

        src.close();
        dest.before_first()?;
        Ok(Box::new(dest))
    }

    fn blocks_accessed(&self) -> i32 {
        // an estimate of the materialized size, not of the copying pass
        let layout = Layout::new(self.src_plan.schema().clone());
        let rpb = self.tx.block_size() as f64 / layout.slot_size() as f64;
        (self.src_plan.records_output() as f64 / rpb).ceil() as i32
    }

    fn records_output(&self) -> i32 {
        self.src_plan.records_output()
    }

    fn distinct_values(&self, field_name: &str) -> i32 {
        self.src_plan.distinct_values(field_name)
    }

    fn schema(&self) -> &Schema {
        self.src_plan.schema()
    }
}
