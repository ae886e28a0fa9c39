use std::sync::Arc;

use crate::{
    error::DbResult,
    metadata::{MetadataManager, StatInfo},
    query::{Predicate, ProductScan, ProjectScan, Scan, SelectScan},
    record::{Layout, Schema, TableScan},
    tx::Transaction,
};

/// A node of a query tree: something that can produce a scan and estimate
/// its own cost. Plans compose; cost questions never touch the data.
pub trait Plan {
    fn open(&self) -> DbResult<Box<dyn Scan>>;
    /// The number of block reads an execution of this plan performs.
    fn blocks_accessed(&self) -> i32;
    /// The number of rows the plan produces.
    fn records_output(&self) -> i32;
    /// The number of distinct values of the field in the output.
    fn distinct_values(&self, field_name: &str) -> i32;
    fn schema(&self) -> &Schema;
}

/// Scans a stored table, with statistics from the catalog.
pub struct TablePlan {
    table_name: String,
    tx: Arc<Transaction>,
    layout: Arc<Layout>,
    si: StatInfo,
}

impl TablePlan {
    pub fn new(
        tx: Arc<Transaction>,
        table_name: &str,
        mdm: &MetadataManager,
    ) -> DbResult<Self> {
        let layout = mdm.get_layout(table_name, &tx)?;
        let si = mdm.get_stat_info(table_name, &layout, &tx)?;
        Ok(Self {
            table_name: table_name.to_string(),
            tx,
            layout,
            si,
        })
    }

    /// The concrete table scan, for callers that need RID positioning.
    pub fn open_table_scan(&self) -> DbResult<TableScan> {
        TableScan::new(
            Arc::clone(&self.tx),
            &self.table_name,
            Arc::clone(&self.layout),
        )
    }
}

impl Plan for TablePlan {
    fn open(&self) -> DbResult<Box<dyn Scan>> {
        Ok(Box::new(self.open_table_scan()?))
    }

    fn blocks_accessed(&self) -> i32 {
        self.si.blocks_accessed()
    }

    fn records_output(&self) -> i32 {
        self.si.records_output()
    }

    fn distinct_values(&self, field_name: &str) -> i32 {
        self.si.distinct_values(field_name)
    }

    fn schema(&self) -> &Schema {
        self.layout.schema()
    }
}

/// Filters its source by a predicate.
pub struct SelectPlan {
    p: Arc<dyn Plan>,
    pred: Predicate,
}

impl SelectPlan {
    pub fn new(p: Arc<dyn Plan>, pred: Predicate) -> Self {
        Self { p, pred }
    }
}

impl Plan for SelectPlan {
    fn open(&self) -> DbResult<Box<dyn Scan>> {
        let scan = self.p.open()?;
        Ok(Box::new(SelectScan::new(scan, self.pred.clone())))
    }

    fn blocks_accessed(&self) -> i32 {
        self.p.blocks_accessed()
    }

    fn records_output(&self) -> i32 {
        self.p.records_output() / self.pred.reduction_factor(self.p.as_ref()).max(1)
    }

    fn distinct_values(&self, field_name: &str) -> i32 {
        if self.pred.equates_with_constant(field_name).is_some() {
            1
        } else if let Some(other) = self.pred.equates_with_field(field_name) {
            self.p
                .distinct_values(field_name)
                .min(self.p.distinct_values(other))
        } else {
            self.p.distinct_values(field_name)
        }
    }

    fn schema(&self) -> &Schema {
        self.p.schema()
    }
}

/// Restricts its source to a list of fields.
pub struct ProjectPlan {
    p: Arc<dyn Plan>,
    schema: Schema,
}

impl ProjectPlan {
    pub fn new(p: Arc<dyn Plan>, fields: &[String]) -> Self {
        let mut schema = Schema::new();
        for field in fields {
            schema.add(field, p.schema());
        }
        Self { p, schema }
    }
}

impl Plan for ProjectPlan {
    fn open(&self) -> DbResult<Box<dyn Scan>> {
        let scan = self.p.open()?;
        Ok(Box::new(ProjectScan::new(
            scan,
            self.schema.fields().to_vec(),
        )))
    }

    fn blocks_accessed(&self) -> i32 {
        self.p.blocks_accessed()
    }

    fn records_output(&self) -> i32 {
        self.p.records_output()
    }

    fn distinct_values(&self, field_name: &str) -> i32 {
        self.p.distinct_values(field_name)
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// The cartesian product of two plans. The right side is rescanned once per
/// left row, which the cost formula reflects.
pub struct ProductPlan {
    p1: Arc<dyn Plan>,
    p2: Arc<dyn Plan>,
    schema: Schema,
}

impl ProductPlan {
    pub fn new(p1: Arc<dyn Plan>, p2: Arc<dyn Plan>) -> Self {
        let mut schema = Schema::new();
        schema.add_all(p1.schema());
        schema.add_all(p2.schema());
        Self { p1, p2, schema }
    }
}

impl Plan for ProductPlan {
    fn open(&self) -> DbResult<Box<dyn Scan>> {
        let s1 = self.p1.open()?;
        let s2 = self.p2.open()?;
        Ok(Box::new(ProductScan::new(s1, s2)?))
    }

    fn blocks_accessed(&self) -> i32 {
        self.p1.blocks_accessed() + self.p1.records_output() * self.p2.blocks_accessed()
    }

    fn records_output(&self) -> i32 {
        self.p1.records_output() * self.p2.records_output()
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
