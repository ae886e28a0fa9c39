mod aggregation_fn;
mod groupby_plan;
mod groupby_scan;
mod materialize_plan;
mod merge_join_plan;
mod merge_join_scan;
mod one_buffer_sort_plan;
mod record_comparator;
mod sort_plan;
mod sort_scan;
mod temp_table;

pub use aggregation_fn::{AggregationFn, CountFn, MaxFn};
pub use groupby_plan::GroupByPlan;
pub use groupby_scan::GroupByScan;
pub use materialize_plan::MaterializePlan;
pub use merge_join_plan::MergeJoinPlan;
pub use merge_join_scan::MergeJoinScan;
pub use one_buffer_sort_plan::OneBufferSortPlan;
pub use record_comparator::RecordComparator;
pub use sort_plan::SortPlan;
pub use sort_scan::SortScan;
pub use temp_table::TempTable;
