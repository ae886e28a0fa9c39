use crate::{error::DbResult, query::Constant, record::Rid};

/// A cursor over a relation, base table or operator output alike. All scans
/// start positioned before their first row; `next` advances and reports
/// whether a row is available; getters read fields of the current row.
pub trait Scan {
    fn before_first(&mut self) -> DbResult<()>;
    fn next(&mut self) -> DbResult<bool>;
    fn get_int(&mut self, field_name: &str) -> DbResult<i32>;
    fn get_string(&mut self, field_name: &str) -> DbResult<String>;
    fn get_val(&mut self, field_name: &str) -> DbResult<Constant>;
    fn has_field(&self, field_name: &str) -> bool;
    fn close(&mut self);

    /// The update capability of this scan, if it has one. Wrapper scans that
    /// merely pass rows through forward the probe to their source, so a
    /// select over a table scan is updatable while a select over a project
    /// is not.
    fn as_update_scan(&mut self) -> Option<&mut dyn UpdateScan> {
        None
    }
}

/// Refinement of `Scan` for cursors whose rows can be modified in place.
pub trait UpdateScan: Scan {
    fn set_val(&mut self, field_name: &str, val: &Constant) -> DbResult<()>;
    fn set_int(&mut self, field_name: &str, val: i32) -> DbResult<()>;
    fn set_string(&mut self, field_name: &str, val: &str) -> DbResult<()>;
    fn insert(&mut self) -> DbResult<()>;
    fn delete(&mut self) -> DbResult<()>;
    fn get_rid(&mut self) -> DbResult<Rid>;
    fn move_to_rid(&mut self, rid: Rid) -> DbResult<()>;
}
