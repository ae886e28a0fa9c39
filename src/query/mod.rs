mod constant;
mod expression;
mod index_join_scan;
mod index_select_scan;
mod predicate;
mod product_scan;
mod project_scan;
mod scan;
mod select_scan;
mod term;

pub use constant::Constant;
pub use expression::Expression;
pub use index_join_scan::IndexJoinScan;
pub use index_select_scan::IndexSelectScan;
pub use predicate::Predicate;
pub use product_scan::ProductScan;
pub use project_scan::ProjectScan;
pub use scan::{Scan, UpdateScan};
pub use select_scan::SelectScan;
pub use term::Term;
