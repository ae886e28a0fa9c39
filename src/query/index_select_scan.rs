use crate::{
    error::DbResult,
    index::Index,
    query::{Constant, Scan, UpdateScan},
    record::TableScan,
};

/// Positions a table scan at each record the index reports for one search
/// key.
pub struct IndexSelectScan {
    ts: TableScan,
    idx: Box<dyn Index>,
    val: Constant,
}

impl IndexSelectScan {
    pub fn new(ts: TableScan, idx: Box<dyn Index>, val: Constant) -> DbResult<Self> {
        let mut scan = Self { ts, idx, val };
        scan.before_first()?;
        Ok(scan)
    }
}

impl Scan for IndexSelectScan {
    fn before_first(&mut self) -> DbResult<()> {
        self.idx.before_first(&self.val)
    }

    fn next(&mut self) -> DbResult<bool> {
        let found = self.idx.next()?;
        if found {
            let rid = self.idx.get_data_rid()?;
            self.ts.move_to_rid(rid)?;
        }
        Ok(found)
    }

    fn get_int(&mut self, field_name: &str) -> DbResult<i32> {
        self.ts.get_int(field_name)
    }

    fn get_string(&mut self, field_name: &str) -> DbResult<String> {
        self.ts.get_string(field_name)
    }

    fn get_val(&mut self, field_name: &str) -> DbResult<Constant> {
        self.ts.get_val(field_name)
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.ts.has_field(field_name)
    }

    fn close(&mut self) {
        self.idx.close();
        self.ts.close();
    }
}
