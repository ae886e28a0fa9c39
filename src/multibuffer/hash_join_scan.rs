use std::sync::Arc;

use crate::{
    error::DbResult,
    materialize::TempTable,
    multibuffer::MultibufferProductScan,
    query::{Constant, Scan},
    tx::Transaction,
};

/// Walks the bucket pairs of a partitioned hash join, producing the product
/// of each pair; an enclosing equality select keeps the actual matches.
pub struct HashJoinScan {
    tx: Arc<Transaction>,
    buckets1: Vec<TempTable>,
    buckets2: Vec<TempTable>,
    current_bucket: usize,
    current_scan: Option<MultibufferProductScan>,
}

impl HashJoinScan {
    pub fn new(
        tx: Arc<Transaction>,
        buckets1: Vec<TempTable>,
        buckets2: Vec<TempTable>,
    ) -> DbResult<Self> {
        let mut scan = Self {
            tx,
            buckets1,
            buckets2,
            current_bucket: 0,
            current_scan: None,
        };
        scan.before_first()?;
        Ok(scan)
    }

    fn open_bucket(&mut self, bucket: usize) -> DbResult<()> {
        let lhs = Box::new(self.buckets1[bucket].open()?);
        let rhs_name = self.buckets2[bucket].table_name().to_string();
        let rhs_layout = self.buckets2[bucket].layout();
        self.current_scan = Some(MultibufferProductScan::new(
            Arc::clone(&self.tx),
            lhs,
            &rhs_name,
            rhs_layout,
        )?);
        Ok(())
    }

    fn current(&mut self) -> &mut MultibufferProductScan {
        self.current_scan.as_mut().expect("scan is closed")
    }
}

impl Scan for HashJoinScan {
    fn before_first(&mut self) -> DbResult<()> {
        self.current_bucket = 0;
        self.open_bucket(0)
    }

    fn next(&mut self) -> DbResult<bool> {
        loop {
            if self.current().next()? {
                return Ok(true);
            }
            self.current_bucket += 1;
            if self.current_bucket >= self.buckets1.len() {
                return Ok(false);
            }
            self.current().close();
            self.open_bucket(self.current_bucket)?;
        }
    }

    fn get_int(&mut self, field_name: &str) -> DbResult<i32> {
        self.current().get_int(field_name)
    }

    fn get_string(&mut self, field_name: &str) -> DbResult<String> {
        self.current().get_string(field_name)
    }

    fn get_val(&mut self, field_name: &str) -> DbResult<Constant> {
        self.current().get_val(field_name)
    }

    fn has_field(&self, field_name: &str) -> bool {
        match &self.current_scan {
            Some(scan) => scan.has_field(field_name),
            None => false,
        }
    }

    fn close(&mut self) {
        if let Some(scan) = self.current_scan.as_mut() {
            scan.close();
        }
    }
}
