use std::sync::Arc;

use crate::{
    error::DbResult,
    plan::{
        CreateIndexData, CreateTableData, CreateViewData, DeleteData, InsertData, ModifyData,
        Plan, QueryData, UpdateCommand,
    },
    tx::Transaction,
};

pub trait QueryPlanner {
    /// Build a plan for the query, ignoring which fields are selected.
    fn create_plan(&self, data: &QueryData, tx: &Arc<Transaction>) -> DbResult<Arc<dyn Plan>>;
}

pub trait UpdatePlanner {
    fn execute_insert(&self, data: &InsertData, tx: &Arc<Transaction>) -> DbResult<i32>;
    fn execute_delete(&self, data: &DeleteData, tx: &Arc<Transaction>) -> DbResult<i32>;
    fn execute_modify(&self, data: &ModifyData, tx: &Arc<Transaction>) -> DbResult<i32>;
    fn execute_create_table(&self, data: &CreateTableData, tx: &Arc<Transaction>)
        -> DbResult<i32>;
    fn execute_create_view(&self, data: &CreateViewData, tx: &Arc<Transaction>) -> DbResult<i32>;
    fn execute_create_index(&self, data: &CreateIndexData, tx: &Arc<Transaction>)
        -> DbResult<i32>;
}

/// Entry point for structured commands: queries go to the query planner,
/// updates dispatch on the command tag. Update results are affected-row
/// counts (zero for DDL).
pub struct Planner {
    qp: Box<dyn QueryPlanner>,
    up: Box<dyn UpdatePlanner>,
}

impl Planner {
    pub fn new(qp: Box<dyn QueryPlanner>, up: Box<dyn UpdatePlanner>) -> Self {
        Self { qp, up }
    }

    pub fn create_query_plan(
        &self,
        data: &QueryData,
        tx: &Arc<Transaction>,
    ) -> DbResult<Arc<dyn Plan>> {
        self.qp.create_plan(data, tx)
    }

    pub fn execute_update(&self, cmd: &UpdateCommand, tx: &Arc<Transaction>) -> DbResult<i32> {
        match cmd {
            UpdateCommand::Insert(data) => self.up.execute_insert(data, tx),
            UpdateCommand::Delete(data) => self.up.execute_delete(data, tx),
            UpdateCommand::Modify(data) => self.up.execute_modify(data, tx),
            UpdateCommand::CreateTable(data) => self.up.execute_create_table(data, tx),
            UpdateCommand::CreateView(data) => self.up.execute_create_view(data, tx),
            UpdateCommand::CreateIndex(data) => self.up.execute_create_index(data, tx),
        }
    }
}
