use std::{collections::HashMap, sync::Arc};

use crate::{
    error::DbResult,
    index::{BTreeIndex, Index},
    metadata::{StatInfo, StatManager, TableManager, MAX_NAME},
    query::{Scan, UpdateScan},
    record::{FieldType, Layout, Schema, TableScan},
    tx::Transaction,
};

/// What the planner needs to know about one index: how to open it and what
/// using it would cost.
pub struct IndexInfo {
    index_name: String,
    field_name: String,
    tx: Arc<Transaction>,
    index_layout: Arc<Layout>,
    si: StatInfo,
}

impl IndexInfo {
    pub fn new(
        index_name: &str,
        field_name: &str,
        table_schema: &Schema,
        tx: Arc<Transaction>,
        si: StatInfo,
    ) -> Self {
        let index_layout = Arc::new(Self::create_index_layout(table_schema, field_name));
        Self {
            index_name: index_name.to_string(),
            field_name: field_name.to_string(),
            tx,
            index_layout,
            si,
        }
    }

    pub fn open(&self) -> DbResult<Box<dyn Index>> {
        let idx = BTreeIndex::new(
            Arc::clone(&self.tx),
            &self.index_name,
            Arc::clone(&self.index_layout),
        )?;
        Ok(Box::new(idx))
    }

    pub fn blocks_accessed(&self) -> i32 {
        let rpb = (self.tx.block_size() / self.index_layout.slot_size()) as i32;
        let num_blocks = if rpb > 0 {
            self.si.records_output() / rpb
        } else {
            self.si.records_output()
        };
        BTreeIndex::search_cost(num_blocks, rpb)
    }

    pub fn records_output(&self) -> i32 {
        self.si.records_output() / self.si.distinct_values(&self.field_name).max(1)
    }

    pub fn distinct_values(&self, field_name: &str) -> i32 {
        if field_name == self.field_name {
            1
        } else {
            self.si.distinct_values(field_name)
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Index records hold the location of the data record plus the indexed
    /// value.
    fn create_index_layout(table_schema: &Schema, field_name: &str) -> Layout {
        let mut schema = Schema::new();
        schema.add_int_field("block");
        schema.add_int_field("id");
        match table_schema.field_type(field_name) {
            FieldType::Integer => schema.add_int_field("dataval"),
            FieldType::Varchar => {
                schema.add_string_field("dataval", table_schema.length(field_name))
            }
        }
        Layout::new(schema)
    }
}

/// Keeps one `idxcat` record per index.
pub struct IndexManager {
    layout: Arc<Layout>,
    tm: Arc<TableManager>,
    sm: Arc<StatManager>,
}

impl IndexManager {
    pub fn new(
        is_new: bool,
        tm: Arc<TableManager>,
        sm: Arc<StatManager>,
        tx: &Arc<Transaction>,
    ) -> DbResult<Self> {
        if is_new {
            let mut schema = Schema::new();
            schema.add_string_field("indexname", MAX_NAME);
            schema.add_string_field("tablename", MAX_NAME);
            schema.add_string_field("fieldname", MAX_NAME);
            tm.create_table("idxcat", &schema, tx)?;
        }
        let layout = tm.get_layout("idxcat", tx)?;
        Ok(Self { layout, tm, sm })
    }

    pub fn create_index(
        &self,
        index_name: &str,
        table_name: &str,
        field_name: &str,
        tx: &Arc<Transaction>,
    ) -> DbResult<()> {
        let mut ts = TableScan::new(Arc::clone(tx), "idxcat", Arc::clone(&self.layout))?;
        ts.insert()?;
        ts.set_string("indexname", index_name)?;
        ts.set_string("tablename", table_name)?;
        ts.set_string("fieldname", field_name)?;
        ts.close();
        Ok(())
    }

    /// Every index on the table, keyed by the indexed field.
    pub fn get_index_info(
        &self,
        table_name: &str,
        tx: &Arc<Transaction>,
    ) -> DbResult<HashMap<String, IndexInfo>> {
        let mut result = HashMap::new();
        let mut ts = TableScan::new(Arc::clone(tx), "idxcat", Arc::clone(&self.layout))?;
        while ts.next()? {
            if ts.get_string("tablename")? == table_name {
                let index_name = ts.get_string("indexname")?;
                let field_name = ts.get_string("fieldname")?;
                let layout = self.tm.get_layout(table_name, tx)?;
                let si = self.sm.get_stat_info(table_name, &layout, tx)?;
                let ii = IndexInfo::new(
                    &index_name,
                    &field_name,
                    layout.schema(),
                    Arc::clone(tx),
                    si,
                );
                result.insert(field_name, ii);
            }
        }
        ts.close();
        Ok(result)
    }
}
