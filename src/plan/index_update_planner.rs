use std::sync::Arc;

use crate::{
    error::{DbError, DbResult},
    metadata::MetadataManager,
    plan::{
        CreateIndexData, CreateTableData, CreateViewData, DeleteData, InsertData, ModifyData,
        Plan, SelectPlan, TablePlan, UpdatePlanner,
    },
    tx::Transaction,
};

/// An update planner that keeps every index of the touched table in sync:
/// inserts and deletes mirror the record into each index, modifications of
/// an indexed field delete the old entry and insert the new one.
pub struct IndexUpdatePlanner {
    mdm: Arc<MetadataManager>,
}

impl IndexUpdatePlanner {
    pub fn new(mdm: Arc<MetadataManager>) -> Self {
        Self { mdm }
    }
}

impl UpdatePlanner for IndexUpdatePlanner {
    fn execute_insert(&self, data: &InsertData, tx: &Arc<Transaction>) -> DbResult<i32> {
        let plan = TablePlan::new(Arc::clone(tx), &data.table_name, &self.mdm)?;
        let mut scan = plan.open()?;
        let indexes = self.mdm.get_index_info(&data.table_name, tx)?;
        {
            let us = scan.as_update_scan().ok_or(DbError::NotUpdatable)?;
            us.insert()?;
            let rid = us.get_rid()?;

            for (field, val) in data.fields.iter().zip(&data.values) {
                us.set_val(field, val)?;

                if let Some(ii) = indexes.get(field) {
                    let mut idx = ii.open()?;
                    idx.insert(val, rid)?;
                    idx.close();
                }
            }
        }
        scan.close();
        Ok(1)
    }

    fn execute_delete(&self, data: &DeleteData, tx: &Arc<Transaction>) -> DbResult<i32> {
        let table_plan: Arc<dyn Plan> =
            Arc::new(TablePlan::new(Arc::clone(tx), &data.table_name, &self.mdm)?);
        let plan = SelectPlan::new(table_plan, data.pred.clone());
        let indexes = self.mdm.get_index_info(&data.table_name, tx)?;

        let mut scan = plan.open()?;
        let mut count = 0;
        {
            let us = scan.as_update_scan().ok_or(DbError::NotUpdatable)?;
            while us.next()? {
                // remove the index entries first, while the record is intact
                let rid = us.get_rid()?;
                for (field, ii) in &indexes {
                    let val = us.get_val(field)?;
                    let mut idx = ii.open()?;
                    idx.delete(&val, rid)?;
                    idx.close();
                }
                us.delete()?;
                count += 1;
            }
        }
        scan.close();
        Ok(count)
    }

    fn execute_modify(&self, data: &ModifyData, tx: &Arc<Transaction>) -> DbResult<i32> {
        let table_plan: Arc<dyn Plan> =
            Arc::new(TablePlan::new(Arc::clone(tx), &data.table_name, &self.mdm)?);
        let plan = SelectPlan::new(table_plan, data.pred.clone());
        let indexes = self.mdm.get_index_info(&data.table_name, tx)?;
        let index_info = indexes.get(&data.field_name);

        let mut scan = plan.open()?;
        let mut count = 0;
        while scan.next()? {
            let new_val = data.new_value.evaluate(scan.as_mut())?;
            let us = scan.as_update_scan().ok_or(DbError::NotUpdatable)?;
            let old_val = us.get_val(&data.field_name)?;
            us.set_val(&data.field_name, &new_val)?;

            if let Some(ii) = index_info {
                let rid = us.get_rid()?;
                let mut idx = ii.open()?;
                idx.delete(&old_val, rid)?;
                idx.insert(&new_val, rid)?;
                idx.close();
            }
            count += 1;
        }
        scan.close();
        Ok(count)
    }

    fn execute_create_table(
        &self,
        data: &CreateTableData,
        tx: &Arc<Transaction>,
    ) -> DbResult<i32> {
        self.mdm.create_table(&data.table_name, &data.schema, tx)?;
        Ok(0)
    }

    fn execute_create_view(&self, data: &CreateViewData, tx: &Arc<Transaction>) -> DbResult<i32> {
        let view_def = serde_json::to_string(&data.view_def)?;
        self.mdm.create_view(&data.view_name, &view_def, tx)?;
        Ok(0)
    }

    fn execute_create_index(
        &self,
        data: &CreateIndexData,
        tx: &Arc<Transaction>,
    ) -> DbResult<i32> {
        self.mdm
            .create_index(&data.index_name, &data.table_name, &data.field_name, tx)?;
        Ok(0)
    }
}
