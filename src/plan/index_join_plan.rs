use std::sync::Arc;

use crate::{
    error::DbResult,
    metadata::IndexInfo,
    plan::{Plan, TablePlan},
    query::{IndexJoinScan, Scan},
    record::Schema,
};

/// Joins a plan against an indexed table by probing the index once per
/// left-hand row.
pub struct IndexJoinPlan {
    p1: Arc<dyn Plan>,
    p2: Arc<TablePlan>,
    ii: IndexInfo,
    join_field: String,
    schema: Schema,
}

impl IndexJoinPlan {
    pub fn new(p1: Arc<dyn Plan>, p2: Arc<TablePlan>, ii: IndexInfo, join_field: &str) -> Self {
        let mut schema = Schema::new();
        schema.add_all(p1.schema());
        schema.add_all(p2.schema());
        Self {
            p1,
            p2,
            ii,
            join_field: join_field.to_string(),
            schema,
        }
    }
}

impl Plan for IndexJoinPlan {
    fn open(&self) -> DbResult<Box<dyn Scan>> {
        let s1 = self.p1.open()?;
        let ts = self.p2.open_table_scan()?;
        let idx = self.ii.open()?;
        Ok(Box::new(IndexJoinScan::new(s1, idx, &self.join_field, ts)?))
    }

    fn blocks_accessed(&self) -> i32 {
        self.p1.blocks_accessed()
            + self.p1.records_output() * self.ii.blocks_accessed()
            + self.records_output()
    }

    fn records_output(&self) -> i32 {
        self.p1.records_output() * self.ii.records_output()
    }

    fn distinct_values(&self, field_name: &str) -> i32 {
        if self.p1.schema().has_field(field_name) {
            self.p1.distinct_values(field_name)
        } else {
            self.p2.distinct_values(field_name)
        }
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
