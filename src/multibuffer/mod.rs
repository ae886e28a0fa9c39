mod buffer_needs;
mod chunk_scan;
mod hash_join_plan;
mod hash_join_scan;
mod multi_buffer_sort_plan;
mod multi_buffer_sort_scan;
mod multibuffer_product_plan;
mod multibuffer_product_scan;

pub use buffer_needs::{best_factor, best_root};
pub use chunk_scan::ChunkScan;
pub use hash_join_plan::HashJoinPlan;
pub use hash_join_scan::HashJoinScan;
pub use multi_buffer_sort_plan::MultiBufferSortPlan;
pub use multi_buffer_sort_scan::MultiBufferSortScan;
pub use multibuffer_product_plan::MultibufferProductPlan;
pub use multibuffer_product_scan::MultibufferProductScan;
