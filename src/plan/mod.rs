mod basic_planner;
mod command;
mod index_join_plan;
mod index_select_plan;
mod index_update_planner;
mod plan;
mod planner;

pub use basic_planner::{BasicQueryPlanner, BasicUpdatePlanner};
pub use command::{
    CreateIndexData, CreateTableData, CreateViewData, DeleteData, InsertData, ModifyData,
    QueryData, UpdateCommand,
};
pub use index_join_plan::IndexJoinPlan;
pub use index_select_plan::IndexSelectPlan;
pub use index_update_planner::IndexUpdatePlanner;
pub use plan::{Plan, ProductPlan, ProjectPlan, SelectPlan, TablePlan};
pub use planner::{Planner, QueryPlanner, UpdatePlanner};
