use crate::{
    error::{DbError, DbResult},
    query::{Constant, Predicate, Scan, UpdateScan},
    record::Rid,
};

/// Filters an underlying scan by a predicate. The scan is update-capable
/// exactly when its source is; update calls on a non-updatable source fail
/// with `NotUpdatable`.
pub struct SelectScan {
    scan: Box<dyn Scan>,
    pred: Predicate,
}

impl SelectScan {
    pub fn new(scan: Box<dyn Scan>, pred: Predicate) -> Self {
        Self { scan, pred }
    }

    fn update_scan(&mut self) -> DbResult<&mut dyn UpdateScan> {
        self.scan.as_update_scan().ok_or(DbError::NotUpdatable)
    }
}

impl Scan for SelectScan {
    fn before_first(&mut self) -> DbResult<()> {
        self.scan.before_first()
    }

    fn next(&mut self) -> DbResult<bool> {
        while self.scan.next()? {
            if self.pred.is_satisfied(self.scan.as_mut())? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn get_int(&mut self, field_name: &str) -> DbResult<i32> {
        self.scan.get_int(field_name)
    }

    fn get_string(&mut self, field_name: &str) -> DbResult<String> {
        self.scan.get_string(field_name)
    }

    fn get_val(&mut self, field_name: &str) -> DbResult<Constant> {
        self.scan.get_val(field_name)
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.scan.has_field(field_name)
    }

    fn close(&mut self) {
        self.scan.close();
    }

    fn as_update_scan(&mut self) -> Option<&mut dyn UpdateScan> {
        if self.scan.as_update_scan().is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl UpdateScan for SelectScan {
    fn set_val(&mut self, field_name: &str, val: &Constant) -> DbResult<()> {
        self.update_scan()?.set_val(field_name, val)
    }

    fn set_int(&mut self, field_name: &str, val: i32) -> DbResult<()> {
        self.update_scan()?.set_int(field_name, val)
    }

    fn set_string(&mut self, field_name: &str, val: &str) -> DbResult<()> {
        self.update_scan()?.set_string(field_name, val)
    }

    fn insert(&mut self) -> DbResult<()> {
        self.update_scan()?.insert()
    }

    fn delete(&mut self) -> DbResult<()> {
        self.update_scan()?.delete()
    }

    fn get_rid(&mut self) -> DbResult<Rid> {
        self.update_scan()?.get_rid()
    }

    fn move_to_rid(&mut self, rid: Rid) -> DbResult<()> {
        self.update_scan()?.move_to_rid(rid)
    }
}
