use std::cmp::Ordering;

use crate::{error::DbResult, query::Scan};

/// Compares the current rows of two scans field by field.
#[derive(Clone)]
pub struct RecordComparator {
    fields: Vec<String>,
}

impl RecordComparator {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn compare(&self, s1: &mut dyn Scan, s2: &mut dyn Scan) -> DbResult<Ordering> {
        for field_name in &self.fields {
            let val1 = s1.get_val(field_name)?;
            let val2 = s2.get_val(field_name)?;
            let result = val1.cmp(&val2);
            if result != Ordering::Equal {
                return Ok(result);
            }
        }
        Ok(Ordering::Equal)
    }
}
