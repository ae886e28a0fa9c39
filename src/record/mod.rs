mod layout;
mod record_page;
mod rid;
mod schema;
mod table_scan;

pub use layout::Layout;
pub use record_page::{RecordPage, EMPTY, USED};
pub use rid::Rid;
pub use schema::{FieldType, Schema};
pub use table_scan::TableScan;
