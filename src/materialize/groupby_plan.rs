use std::sync::Arc;

use crate::{
    error::DbResult,
    materialize::{AggregationFn, GroupByScan, SortPlan},
    plan::Plan,
    query::Scan,
    record::Schema,
    tx::Transaction,
};

/// Groups a plan's output on a set of fields, computing one aggregate row
/// per group. The input is sorted on the group fields first, so each group
/// arrives as a consecutive row range.
pub struct GroupByPlan {
    p: SortPlan,
    group_fields: Vec<String>,
    agg_fns: Vec<Box<dyn AggregationFn>>,
    schema: Schema,
}

impl GroupByPlan {
    pub fn new(
        tx: Arc<Transaction>,
        p: Arc<dyn Plan>,
        group_fields: Vec<String>,
        agg_fns: Vec<Box<dyn AggregationFn>>,
    ) -> Self {
        let mut schema = Schema::new();
        for field_name in &group_fields {
            schema.add(field_name, p.schema());
        }
        for agg_fn in &agg_fns {
            schema.add_int_field(&agg_fn.field_name());
        }
        Self {
            p: SortPlan::new(tx, p, group_fields.clone()),
            group_fields,
            agg_fns,
            schema,
        }
    }
}

impl Plan for GroupByPlan {
    fn open(&self) -> DbResult<Box<dyn Scan>> {
        let scan = self.p.open()?;
        let agg_fns = self.agg_fns.iter().map(|f| f.clone_box()).collect();
        Ok(Box::new(GroupByScan::new(
            scan,
            self.group_fields.clone(),
            agg_fns,
        )?))
    }

    fn blocks_accessed(&self) -> i32 {
        self.p.blocks_accessed()
    }

    fn records_output(&self) -> i32 {
        let mut num_groups = 1;
        for field_name in &self.group_fields {
            num_groups *= self.p.distinct_values(field_name);
        }
        num_groups
    }

    fn distinct_values(&self, field_name: &str) -> i32 {
        if self.p.schema().has_field(field_name) {
            self.p.distinct_values(field_name)
        } else {
            self.p.records_output()
        }
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
