use std::sync::Arc;

use crate::{
    error::{DbError, DbResult},
    metadata::{TableManager, MAX_NAME},
    query::{Scan, UpdateScan},
    record::{Schema, TableScan},
    tx::Transaction,
};

/// The longest serialized view definition, in characters. Serialized
/// structured queries run wordier than the SQL they stand for, so the
/// column takes as much of a 400-byte block as a viewcat slot can hold.
pub const MAX_VIEWDEF: usize = 150;

/// Stores view definitions in the `viewcat` catalog table. The definition
/// is the serialized structured query, not SQL text.
pub struct ViewManager {
    tm: Arc<TableManager>,
}

impl ViewManager {
    pub fn new(is_new: bool, tm: Arc<TableManager>, tx: &Arc<Transaction>) -> DbResult<Self> {
        if is_new {
            let mut schema = Schema::new();
            schema.add_string_field("viewname", MAX_NAME);
            schema.add_string_field("viewdef", MAX_VIEWDEF);
            tm.create_table("viewcat", &schema, tx)?;
        }
        Ok(Self { tm })
    }

    pub fn create_view(
        &self,
        view_name: &str,
        view_def: &str,
        tx: &Arc<Transaction>,
    ) -> DbResult<()> {
        if view_def.chars().count() > MAX_VIEWDEF {
            return Err(DbError::BadSyntax(format!(
                "view definition of {} does not fit the catalog",
                view_name
            )));
        }
        let layout = self.tm.get_layout("viewcat", tx)?;
        let mut ts = TableScan::new(Arc::clone(tx), "viewcat", layout)?;
        ts.insert()?;
        ts.set_string("viewname", view_name)?;
        ts.set_string("viewdef", view_def)?;
        ts.close();
        Ok(())
    }

    pub fn get_view_def(
        &self,
        view_name: &str,
        tx: &Arc<Transaction>,
    ) -> DbResult<Option<String>> {
        let layout = self.tm.get_layout("viewcat", tx)?;
        let mut ts = TableScan::new(Arc::clone(tx), "viewcat", layout)?;
        let mut result = None;
        while ts.next()? {
            if ts.get_string("viewname")? == view_name {
                result = Some(ts.get_string("viewdef")?);
                break;
            }
        }
        ts.close();
        Ok(result)
    }
}
