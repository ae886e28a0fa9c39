use crate::{
    error::DbResult,
    query::{Constant, Scan},
};

/// The cartesian product of two scans: for every row of the left scan, the
/// right scan is replayed from the start.
pub struct ProductScan {
    s1: Box<dyn Scan>,
    s2: Box<dyn Scan>,
}

impl ProductScan {
    pub fn new(s1: Box<dyn Scan>, s2: Box<dyn Scan>) -> DbResult<Self> {
        let mut scan = Self { s1, s2 };
        scan.before_first()?;
        Ok(scan)
    }
}

impl Scan for ProductScan {
    fn before_first(&mut self) -> DbResult<()> {
        self.s1.before_first()?;
        self.s1.next()?;
        self.s2.before_first()
    }

    fn next(&mut self) -> DbResult<bool> {
        if self.s2.next()? {
            return Ok(true);
        }
        self.s2.before_first()?;
        Ok(self.s2.next()? && self.s1.next()?)
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
