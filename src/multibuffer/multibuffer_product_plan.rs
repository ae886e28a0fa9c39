use std::sync::Arc;

use crate::{
    error::DbResult,
    materialize::{MaterializePlan, TempTable},
    multibuffer::MultibufferProductScan,
    plan::Plan,
    query::{Scan, UpdateScan},
    record::Schema,
    tx::Transaction,
};

/// A product that materializes its right side and processes it chunk by
/// chunk, with each chunk pinned across one full replay of the left side.
pub struct MultibufferProductPlan {
    tx: Arc<Transaction>,
    lhs: Arc<dyn Plan>,
    rhs: Arc<dyn Plan>,
    schema: Schema,
}

impl MultibufferProductPlan {
    pub fn new(tx: Arc<Transaction>, lhs: Arc<dyn Plan>, rhs: Arc<dyn Plan>) -> Self {
        let mut schema = Schema::new();
        schema.add_all(lhs.schema());
        schema.add_all(rhs.schema());
        Self {
            tx,
            lhs,
            rhs,
            schema,
        }
    }

    fn copy_records_from(&self, p: &Arc<dyn Plan>) -> DbResult<TempTable> {
        let mut src = p.open()?;
        let schema = p.schema();
        let temp = TempTable::new(Arc::clone(&self.tx), schema);
        let mut dest = temp.open()?;
        while src.next()? {
            dest.insert()?;
            for field_name in schema.fields() {
                let val = src.get_val(field_name)?;
                dest.set_val(field_name, &val)?;
            }
        }
        src.close();
        dest.close();
        Ok(temp)
    }
}

impl Plan for MultibufferProductPlan {
    fn open(&self) -> DbResult<Box<dyn Scan>> {
        let left_scan = self.lhs.open()?;
        let temp = self.copy_records_from(&self.rhs)?;
        Ok(Box::new(MultibufferProductScan::new(
            Arc::clone(&self.tx),
            left_scan,
            temp.table_name(),
            temp.layout(),
        )?))
    }

    fn blocks_accessed(&self) -> i32 {
        let available = self.tx.available_buffs().max(1) as i32;
        let size = MaterializePlan::new(Arc::clone(&self.tx), Arc::clone(&self.rhs))
            .blocks_accessed();
        let num_chunks = (size / available).max(1);
        self.rhs.blocks_accessed() + self.lhs.blocks_accessed() * num_chunks
    }

    fn records_output(&self) -> i32 {
        self.lhs.records_output() * self.rhs.records_output()
    }

    fn distinct_values(&self, field_name: &str) -> i32 {
        if self.lhs.schema().has_field(field_name) {
            self.lhs.distinct_values(field_name)
        } else {
            self.rhs.distinct_values(field_name)
        }
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
