use std::cmp::Ordering;

use crate::{
    error::DbResult,
    materialize::SortScan,
    query::{Constant, Scan},
};

/// Merges two sorted scans on their join fields. When the left side repeats
/// a join value, the right side's position is restored so the whole
/// duplicate group matches again.
pub struct MergeJoinScan {
    s1: Box<dyn Scan>,
    s2: SortScan,
    field_name1: String,
    field_name2: String,
    join_val: Option<Constant>,
}

impl MergeJoinScan {
    pub fn new(
        s1: Box<dyn Scan>,
        s2: SortScan,
        field_name1: &str,
        field_name2: &str,
    ) -> DbResult<Self> {
        let mut scan = Self {
            s1,
            s2,
            field_name1: field_name1.to_string(),
            field_name2: field_name2.to_string(),
            join_val: None,
        };
        scan.before_first()?;
        Ok(scan)
    }
}

impl Scan for MergeJoinScan {
    fn before_first(&mut self) -> DbResult<()> {
        self.s1.before_first()?;
        self.s2.before_first()
    }

    fn next(&mut self) -> DbResult<bool> {
        let mut has_more2 = self.s2.next()?;
        if has_more2 {
            let val2 = self.s2.get_val(&self.field_name2)?;
            if self.join_val.as_ref() == Some(&val2) {
                return Ok(true);
            }
        }

        let mut has_more1 = self.s1.next()?;
        if has_more1 {
            let val1 = self.s1.get_val(&self.field_name1)?;
            if self.join_val.as_ref() == Some(&val1) {
                self.s2.restore_position()?;
                return Ok(true);
            }
        }

        while has_more1 && has_more2 {
            let v1 = self.s1.get_val(&self.field_name1)?;
            let v2 = self.s2.get_val(&self.field_name2)?;
            match v1.cmp(&v2) {
                Ordering::Less => has_more1 = self.s1.next()?,
                Ordering::Greater => has_more2 = self.s2.next()?,
                Ordering::Equal => {
                    self.s2.save_position()?;
                    self.join_val = Some(self.s2.get_val(&self.field_name2)?);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn get_int(&mut self, field_name: &str) -> DbResult<i32> {
        if self.s1.has_field(field_name) {
            self.s1.get_int(field_name)
        } else {
            self.s2.get_int(field_name)
        }
    }

    fn get_string(&mut self, field_name: &str) -> DbResult<String> {
        if self.s1.has_field(field_name) {
            self.s1.get_string(field_name)
        } else {
            self.s2.get_string(field_name)
        }
    }

    fn get_val(&mut self, field_name: &str) -> DbResult<Constant> {
        if self.s1.has_field(field_name) {
            self.s1.get_val(field_name)
        } else {
            self.s2.get_val(field_name)
        }
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.s1.has_field(field_name) || self.s2.has_field(field_name)
    }

    fn close(&mut self) {
        self.s1.close();
        self.s2.close();
    }
}
