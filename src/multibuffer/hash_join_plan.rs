use std::sync::Arc;

use log::debug;

use crate::{
    error::DbResult,
    materialize::TempTable,
    multibuffer::{best_factor, HashJoinScan},
    plan::Plan,
    query::{Expression, Predicate, Scan, SelectScan, Term, UpdateScan},
    record::Schema,
    tx::Transaction,
};

/// Equi-join by recursive partitioning: both inputs are hashed into the
/// same buckets on their join fields until each right-side bucket fits in
/// the available buffers, then every bucket pair is joined with a
/// multibuffer product filtered by the join equality.
pub struct HashJoinPlan {
    tx: Arc<Transaction>,
    p1: Arc<dyn Plan>,
    p2: Arc<dyn Plan>,
    field_name1: String,
    field_name2: String,
    schema: Schema,
}

impl HashJoinPlan {
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
            tx,
            p1,
            p2,
            field_name1: field_name1.to_string(),
            field_name2: field_name2.to_string(),
            schema,
        }
    }

    fn copy_to_temp(&self, p: &Arc<dyn Plan>) -> DbResult<TempTable> {
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

    /// Partition both sides in lockstep until the right side of each pair
    /// fits in `num_buffers` blocks. The depth bound cuts off degenerate
    /// inputs where one bucket never shrinks.
    fn recursive_split(
        &self,
        t1: TempTable,
        t2: TempTable,
        num_buffers: i32,
        depth: i32,
    ) -> DbResult<(Vec<TempTable>, Vec<TempTable>)> {
        if depth == 0 {
            return Ok((vec![t1], vec![t2]));
        }

        let blocks2 = self.tx.size(&format!("{}.tbl", t2.table_name()))?;
        if blocks2 <= num_buffers {
            return Ok((vec![t1], vec![t2]));
        }

        let buckets1 = self.split_into_buckets(&t1, num_buffers, &self.field_name1)?;
        let buckets2 = self.split_into_buckets(&t2, num_buffers, &self.field_name2)?;

        let mut sub1 = Vec::new();
        let mut sub2 = Vec::new();
        for (b1, b2) in buckets1.into_iter().zip(buckets2) {
            let (mut s1, mut s2) = self.recursive_split(b1, b2, num_buffers, depth - 1)?;
            sub1.append(&mut s1);
            sub2.append(&mut s2);
        }
        Ok((sub1, sub2))
    }

    fn split_into_buckets(
        &self,
        t: &TempTable,
        num_buckets: i32,
        field_name: &str,
    ) -> DbResult<Vec<TempTable>> {
        let schema = t.layout().schema().clone();
        let mut buckets = Vec::with_capacity(num_buckets as usize);
        let mut scans = Vec::with_capacity(num_buckets as usize);
        for _ in 0..num_buckets {
            let temp = TempTable::new(Arc::clone(&self.tx), &schema);
            scans.push(temp.open()?);
            buckets.push(temp);
        }

        let mut src = t.open()?;
        while src.next()? {
            let val = src.get_val(field_name)?;
            let bucket = (val.hash_code() % num_buckets as u32) as usize;
            let dest = &mut scans[bucket];
            dest.insert()?;
            for field_name in schema.fields() {
                let val = src.get_val(field_name)?;
                dest.set_val(field_name, &val)?;
            }
        }
        src.close();
        for mut scan in scans {
            scan.close();
        }
        Ok(buckets)
    }
}

impl Plan for HashJoinPlan {
    fn open(&self) -> DbResult<Box<dyn Scan>> {
        let available = self.tx.available_buffs() as i32;
        let num_buffers = best_factor(available, self.p2.blocks_accessed());

        let t1 = self.copy_to_temp(&self.p1)?;
        let t2 = self.copy_to_temp(&self.p2)?;

        let (buckets1, buckets2) = self.recursive_split(t1, t2, num_buffers, 100)?;
        debug!("hash join uses {} bucket pairs", buckets1.len());

        let scan = HashJoinScan::new(Arc::clone(&self.tx), buckets1, buckets2)?;
        let pred = Predicate::from_term(Term::new(
            Expression::Field(self.field_name1.clone()),
            Expression::Field(self.field_name2.clone()),
        ));
        Ok(Box::new(SelectScan::new(Box::new(scan), pred)))
    }

    fn blocks_accessed(&self) -> i32 {
        // partition both sides, then read every bucket pair once
        3 * (self.p1.blocks_accessed() + self.p2.blocks_accessed())
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
