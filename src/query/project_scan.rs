use crate::{
    error::{DbError, DbResult},
    query::{Constant, Scan},
};

/// Restricts an underlying scan to a list of field names. Accessing a field
/// outside the list fails with `FieldNotFound`.
pub struct ProjectScan {
    scan: Box<dyn Scan>,
    field_list: Vec<String>,
}

impl ProjectScan {
    pub fn new(scan: Box<dyn Scan>, field_list: Vec<String>) -> Self {
        Self { scan, field_list }
    }
}

impl Scan for ProjectScan {
    fn before_first(&mut self) -> DbResult<()> {
        self.scan.before_first()
    }

    fn next(&mut self) -> DbResult<bool> {
        self.scan.next()
    }

    fn get_int(&mut self, field_name: &str) -> DbResult<i32> {
        if !self.has_field(field_name) {
            return Err(DbError::FieldNotFound(field_name.to_string()));
        }
        self.scan.get_int(field_name)
    }

    fn get_string(&mut self, field_name: &str) -> DbResult<String> {
        if !self.has_field(field_name) {
            return Err(DbError::FieldNotFound(field_name.to_string()));
        }
        self.scan.get_string(field_name)
    }

    fn get_val(&mut self, field_name: &str) -> DbResult<Constant> {
        if !self.has_field(field_name) {
            return Err(DbError::FieldNotFound(field_name.to_string()));
        }
        self.scan.get_val(field_name)
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.field_list.iter().any(|f| f == field_name)
    }

    fn close(&mut self) {
        self.scan.close();
    }
}
