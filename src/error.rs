use std::io;

use thiserror::Error;

use crate::file::BlockId;

/// The single error type of the crate. Low-level failures (I/O, lock and
/// buffer timeouts) are never swallowed; they surface at the transaction
/// boundary, where the caller is expected to roll back and discard the
/// transaction.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("buffer abort: timed out waiting for a free buffer")]
    BufferAbort,

    #[error("lock abort: timed out waiting for a lock on {0}")]
    LockAbort(BlockId),

    #[error("bad syntax: {0}")]
    BadSyntax(String),

    #[error("field {0} not found")]
    FieldNotFound(String),

    #[error("scan does not support updates")]
    NotUpdatable,

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("table {0} not found")]
    TableNotFound(String),

    #[error("block {0} is not pinned by this transaction")]
    BlockNotPinned(BlockId),

    #[error("unknown log record type {0}")]
    UnknownLogRecord(i32),

    #[error("bad view definition: {0}")]
    BadViewDef(#[from] serde_json::Error),
}

pub type DbResult<T> = Result<T, DbError>;
