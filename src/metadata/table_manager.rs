use std::{collections::HashMap, sync::Arc};

use crate::{
    error::{DbError, DbResult},
    query::{Scan, UpdateScan},
    record::{FieldType, Layout, Schema, TableScan},
    tx::Transaction,
};

/// The longest name a table or field may have, in characters.
pub const MAX_NAME: usize = 16;

/// Keeps table definitions in two catalog tables: `tblcat` has one record
/// per table, `fldcat` one per field. The catalogs describe themselves and
/// are created on first use of a fresh database.
pub struct TableManager {
    tcat_layout: Arc<Layout>,
    fcat_layout: Arc<Layout>,
}

impl TableManager {
    pub fn new(is_new: bool, tx: &Arc<Transaction>) -> DbResult<Self> {
        let mut tcat_schema = Schema::new();
        tcat_schema.add_string_field("tblname", MAX_NAME);
        tcat_schema.add_int_field("slotsize");
        let tcat_layout = Arc::new(Layout::new(tcat_schema.clone()));

        let mut fcat_schema = Schema::new();
        fcat_schema.add_string_field("tblname", MAX_NAME);
        fcat_schema.add_string_field("fldname", MAX_NAME);
        fcat_schema.add_int_field("type");
        fcat_schema.add_int_field("length");
        fcat_schema.add_int_field("offset");
        let fcat_layout = Arc::new(Layout::new(fcat_schema.clone()));

        let tm = Self {
            tcat_layout,
            fcat_layout,
        };
        if is_new {
            tm.create_table("tblcat", &tcat_schema, tx)?;
            tm.create_table("fldcat", &fcat_schema, tx)?;
        }
        Ok(tm)
    }

    pub fn create_table(
        &self,
        table_name: &str,
        schema: &Schema,
        tx: &Arc<Transaction>,
    ) -> DbResult<()> {
        let layout = Layout::new(schema.clone());

        let mut tcat = TableScan::new(Arc::clone(tx), "tblcat", Arc::clone(&self.tcat_layout))?;
        tcat.insert()?;
        tcat.set_string("tblname", table_name)?;
        tcat.set_int("slotsize", layout.slot_size() as i32)?;
        tcat.close();

        let mut fcat = TableScan::new(Arc::clone(tx), "fldcat", Arc::clone(&self.fcat_layout))?;
        for field_name in schema.fields() {
            fcat.insert()?;
            fcat.set_string("tblname", table_name)?;
            fcat.set_string("fldname", field_name)?;
            fcat.set_int("type", schema.field_type(field_name).to_i32())?;
            fcat.set_int("length", schema.length(field_name) as i32)?;
            fcat.set_int("offset", layout.offset(field_name) as i32)?;
        }
        fcat.close();
        Ok(())
    }

    pub fn get_layout(&self, table_name: &str, tx: &Arc<Transaction>) -> DbResult<Arc<Layout>> {
        let mut slot_size = -1;
        let mut tcat = TableScan::new(Arc::clone(tx), "tblcat", Arc::clone(&self.tcat_layout))?;
        while tcat.next()? {
            if tcat.get_string("tblname")? == table_name {
                slot_size = tcat.get_int("slotsize")?;
                break;
            }
        }
        tcat.close();
        if slot_size < 0 {
            return Err(DbError::TableNotFound(table_name.to_string()));
        }

        let mut schema = Schema::new();
        let mut offsets: HashMap<String, usize> = HashMap::new();
        let mut fcat = TableScan::new(Arc::clone(tx), "fldcat", Arc::clone(&self.fcat_layout))?;
        while fcat.next()? {
            if fcat.get_string("tblname")? == table_name {
                let field_name = fcat.get_string("fldname")?;
                let field_type = FieldType::from_i32(fcat.get_int("type")?)?;
                let length = fcat.get_int("length")? as usize;
                let offset = fcat.get_int("offset")? as usize;
                schema.add_field(&field_name, field_type, length);
                offsets.insert(field_name, offset);
            }
        }
        fcat.close();

        Ok(Arc::new(Layout::from_metadata(
            schema,
            offsets,
            slot_size as usize,
        )))
    }
}
