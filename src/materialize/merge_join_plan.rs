use std::sync::Arc;

use crate::{
    error::DbResult,
    materialize::{MergeJoinScan, SortPlan},
    plan::Plan,
    query::Scan,
    record::Schema,
    tx::Transaction,
};

/// Equi-join by sorting both inputs on their join fields and merging.
pub struct MergeJoinPlan {
    p1: SortPlan,
    p2: SortPlan,
    field_name1: String,
    field_name2: String,
    schema: Schema,
}

impl MergeJoinPlan {
    pub fn new(
        tx: Arc<Transaction>,
        p1: Arc<dyn Plan>,
        p2: Arc<dyn Plan>,
        field_name1: &str,
        field_name2: &str,
    ) -> Self {
        let mut schema = Schema::new();
        schema.add_all(p1.schema());
        schema.add_all(p2.schema());
        Self {
            p1: SortPlan::new(Arc::clone(&tx), p1, vec![field_name1.to_string()]),
            p2: SortPlan::new(tx, p2, vec![field_name2.to_string()]),
            field_name1: field_name1.to_string(),
            field_name2: field_name2.to_string(),
            schema,
        }
    }
}

impl Plan for MergeJoinPlan {
    fn open(&self) -> DbResult<Box<dyn Scan>> {
        let s1 = self.p1.open()?;
        let s2 = self.p2.open_sort_scan()?;
        Ok(Box::new(MergeJoinScan::new(
            s1,
            s2,
            &self.field_name1,
            &self.field_name2,
        )?))
    }

    fn blocks_accessed(&self) -> i32 {
        self.p1.blocks_accessed() + self.p2.blocks_accessed()
    }

    fn records_output(&self) -> i32 {
        let max_vals = self
            .p1
            .distinct_values(&self.field_name1)
            .max(self.p2.distinct_values(&self.field_name2));
        (self.p1.records_output() * self.p2.records_output()) / max_vals.max(1)
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
