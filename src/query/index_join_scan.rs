use crate::{
    error::DbResult,
    index::Index,
    query::{Constant, Scan, UpdateScan},
    record::TableScan,
};

/// Joins a left-hand scan against an indexed table: for every left row the
/// index is probed with the join value, and each matching RID positions the
/// right-hand table scan.
pub struct IndexJoinScan {
    lhs: Box<dyn Scan>,
    idx: Box<dyn Index>,
    join_field: String,
    rhs: TableScan,
    // false once the left side runs out (or started empty)
    positioned: bool,
}

impl IndexJoinScan {
    pub fn new(
        lhs: Box<dyn Scan>,
        idx: Box<dyn Index>,
        join_field: &str,
        rhs: TableScan,
    ) -> DbResult<Self> {
        let mut scan = Self {
            lhs,
            idx,
            join_field: join_field.to_string(),
            rhs,
            positioned: false,
        };
        scan.before_first()?;
        Ok(scan)
    }

    fn reset_index(&mut self) -> DbResult<()> {
        let search_key = self.lhs.get_val(&self.join_field)?;
        self.idx.before_first(&search_key)
    }
}

impl Scan for IndexJoinScan {
    fn before_first(&mut self) -> DbResult<()> {
        self.lhs.before_first()?;
        self.positioned = self.lhs.next()?;
        if self.positioned {
            self.reset_index()?;
        }
        Ok(())
    }

    fn next(&mut self) -> DbResult<bool> {
        if !self.positioned {
            return Ok(false);
        }
        loop {
            if self.idx.next()? {
                let rid = self.idx.get_data_rid()?;
                self.rhs.move_to_rid(rid)?;
                return Ok(true);
            }
            if !self.lhs.next()? {
                self.positioned = false;
                return Ok(false);
            }
            self.reset_index()?;
        }
    }

    fn get_int(&mut self, field_name: &str) -> DbResult<i32> {
        if self.rhs.has_field(field_name) {
            self.rhs.get_int(field_name)
        } else {
            self.lhs.get_int(field_name)
        }
    }

    fn get_string(&mut self, field_name: &str) -> DbResult<String> {
        if self.rhs.has_field(field_name) {
            self.rhs.get_string(field_name)
        } else {
            self.lhs.get_string(field_name)
        }
    }

    fn get_val(&mut self, field_name: &str) -> DbResult<Constant> {
        if self.rhs.has_field(field_name) {
            self.rhs.get_val(field_name)
        } else {
            self.lhs.get_val(field_name)
        }
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.rhs.has_field(field_name) || self.lhs.has_field(field_name)
    }

    fn close(&mut self) {
        self.lhs.close();
        self.idx.close();
        self.rhs.close();
    }
}
