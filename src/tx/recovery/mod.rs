mod log_record;
mod recovery_manager;

pub use log_record::{
    LogRecord, CHECKPOINT, COMMIT, ROLLBACK, SETINT, SETSTRING, START,
};
pub use recovery_manager::RecoveryManager;
