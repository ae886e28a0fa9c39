use std::sync::Arc;

use log::debug;

use crate::{
    error::{DbError, DbResult},
    metadata::MetadataManager,
    plan::{
        CreateIndexData, CreateTableData, CreateViewData, DeleteData, InsertData, ModifyData,
        Plan, ProductPlan, ProjectPlan, QueryData, QueryPlanner, SelectPlan, TablePlan,
        UpdatePlanner,
    },
    tx::Transaction,
};

/// The heuristic query planner: expand views, join the tables in left-deep
/// order taking the cheaper operand order at each step, then select and
/// project.
pub struct BasicQueryPlanner {
    mdm: Arc<MetadataManager>,
}

impl BasicQueryPlanner {
    pub fn new(mdm: Arc<MetadataManager>) -> Self {
        Self { mdm }
    }
}

impl QueryPlanner for BasicQueryPlanner {
    fn create_plan(&self, data: &QueryData, tx: &Arc<Transaction>) -> DbResult<Arc<dyn Plan>> {
        // step 1: one plan per table, expanding views transparently
        let mut plans: Vec<Arc<dyn Plan>> = Vec::new();
        for table in &data.tables {
            match self.mdm.get_view_def(table, tx)? {
                Some(view_def) => {
                    let view_data: QueryData = serde_json::from_str(&view_def)?;
                    plans.push(self.create_plan(&view_data, tx)?);
                }
                None => {
                    plans.push(Arc::new(TablePlan::new(Arc::clone(tx), table, &self.mdm)?));
                }
            }
        }

        // step 2: left-deep products, cheaper operand order first
        let mut plans = plans.into_iter();
        let mut plan = plans
            .next()
            .ok_or_else(|| DbError::BadSyntax("query names no tables".to_string()))?;
        for next in plans {
            let choice1: Arc<dyn Plan> =
                Arc::new(ProductPlan::new(Arc::clone(&next), Arc::clone(&plan)));
            let choice2: Arc<dyn Plan> = Arc::new(ProductPlan::new(plan, next));
            if choice1.blocks_accessed() < choice2.blocks_accessed() {
                plan = choice1;
            } else {
                plan = choice2;
            }
        }

        // step 3: selection, then projection
        let plan: Arc<dyn Plan> = Arc::new(SelectPlan::new(plan, data.pred.clone()));
        let plan: Arc<dyn Plan> = Arc::new(ProjectPlan::new(plan, &data.fields));
        debug!(
            "planned query, estimated blocks: {}",
            plan.blocks_accessed()
        );
        Ok(plan)
    }
}

/// Executes updates directly against table scans, without index upkeep.
pub struct BasicUpdatePlanner {
    mdm: Arc<MetadataManager>,
}

impl BasicUpdatePlanner {
    pub fn new(mdm: Arc<MetadataManager>) -> Self {
        Self { mdm }
    }
}

impl UpdatePlanner for BasicUpdatePlanner {
    fn execute_insert(&self, data: &InsertData, tx: &Arc<Transaction>) -> DbResult<i32> {
        let plan = TablePlan::new(Arc::clone(tx), &data.table_name, &self.mdm)?;
        let mut scan = plan.open()?;
        {
            let us = scan.as_update_scan().ok_or(DbError::NotUpdatable)?;
            us.insert()?;
            for (field, val) in data.fields.iter().zip(&data.values) {
                us.set_val(field, val)?;
            }
        }
        scan.close();
        Ok(1)
    }

    fn execute_delete(&self, data: &DeleteData, tx: &Arc<Transaction>) -> DbResult<i32> {
        let table_plan: Arc<dyn Plan> =
            Arc::new(TablePlan::new(Arc::clone(tx), &data.table_name, &self.mdm)?);
        let plan = SelectPlan::new(table_plan, data.pred.clone());
        let mut scan = plan.open()?;
        let mut count = 0;
        {
            let us = scan.as_update_scan().ok_or(DbError::NotUpdatable)?;
            while us.next()? {
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
        let mut scan = plan.open()?;
        let mut count = 0;
        while scan.next()? {
            let val = data.new_value.evaluate(scan.as_mut())?;
            let us = scan.as_update_scan().ok_or(DbError::NotUpdatable)?;
            us.set_val(&data.field_name, &val)?;
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
