use std::{collections::HashMap, sync::Arc};

use crate::{
    error::DbResult,
    metadata::{IndexInfo, IndexManager, StatInfo, StatManager, TableManager, ViewManager},
    record::{Layout, Schema},
    tx::Transaction,
};

/// Façade over the four catalog managers.
pub struct MetadataManager {
    tm: Arc<TableManager>,
    vm: ViewManager,
    sm: Arc<StatManager>,
    im: IndexManager,
}

impl MetadataManager {
    pub fn new(is_new: bool, tx: &Arc<Transaction>) -> DbResult<Self> {
        let tm = Arc::new(TableManager::new(is_new, tx)?);
        let vm = ViewManager::new(is_new, Arc::clone(&tm), tx)?;
        let sm = Arc::new(StatManager::new(Arc::clone(&tm), tx)?);
        let im = IndexManager::new(is_new, Arc::clone(&tm), Arc::clone(&sm), tx)?;
        Ok(Self { tm, vm, sm, im })
    }

    pub fn create_table(
        &self,
        table_name: &str,
        schema: &Schema,
        tx: &Arc<Transaction>,
    ) -> DbResult<()> {
        self.tm.create_table(table_name, schema, tx)
    }

    pub fn get_layout(&self, table_name: &str, tx: &Arc<Transaction>) -> DbResult<Arc<Layout>> {
        self.tm.get_layout(table_name, tx)
    }

    pub fn create_view(
        &self,
        view_name: &str,
        view_def: &str,
        tx: &Arc<Transaction>,
    ) -> DbResult<()> {
        self.vm.create_view(view_name, view_def, tx)
    }

    pub fn get_view_def(
        &self,
        view_name: &str,
        tx: &Arc<Transaction>,
    ) -> DbResult<Option<String>> {
        self.vm.get_view_def(view_name, tx)
    }

    pub fn create_index(
        &self,
        index_name: &str,
        table_name: &str,
        field_name: &str,
        tx: &Arc<Transaction>,
    ) -> DbResult<()> {
        self.im.create_index(index_name, table_name, field_name, tx)
    }

    pub fn get_index_info(
        &self,
        table_name: &str,
        tx: &Arc<Transaction>,
    ) -> DbResult<HashMap<String, IndexInfo>> {
        self.im.get_index_info(table_name, tx)
    }

    pub fn get_stat_info(
        &self,
        table_name: &str,
        layout: &Arc<Layout>,
        tx: &Arc<Transaction>,
    ) -> DbResult<StatInfo> {
        self.sm.get_stat_info(table_name, layout, tx)
    }
}
