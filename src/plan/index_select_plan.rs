use std::sync::Arc;

use crate::{
    error::DbResult,
    metadata::IndexInfo,
    plan::{Plan, TablePlan},
    query::{Constant, IndexSelectScan, Scan},
    record::Schema,
};

/// An equality selection driven by an index: probe the index for the
/// constant, then fetch each matching record by RID.
pub struct IndexSelectPlan {
    p: Arc<TablePlan>,
    ii: IndexInfo,
    val: Constant,
}

impl IndexSelectPlan {
    pub fn new(p: Arc<TablePlan>, ii: IndexInfo, val: Constant) -> Self {
        Self { p, ii, val }
    }
}

impl Plan for IndexSelectPlan {
    fn open(&self) -> DbResult<Box<dyn Scan>> {
        let ts = self.p.open_table_scan()?;
        let idx = self.ii.open()?;
        Ok(Box::new(IndexSelectScan::new(ts, idx, self.val.clone())?))
    }

    fn blocks_accessed(&self) -> i32 {
        self.ii.blocks_accessed() + self.records_output()
    }

    fn records_output(&self) -> i32 {
        self.ii.records_output()
    }

    fn distinct_values(&self, field_name: &str) -> i32 {
        self.ii.distinct_values(field_name)
    }

    fn schema(&self) -> &Schema {
        self.p.schema()
    }
}
