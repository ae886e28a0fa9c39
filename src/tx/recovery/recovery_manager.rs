use std::{collections::HashSet, sync::Arc};

use log::debug;

use crate::{
    buffer::{Buffer, BufferManager},
    error::DbResult,
    log::LogManager,
    tx::{
        recovery::{LogRecord, CHECKPOINT, COMMIT, ROLLBACK, START},
        Transaction,
    },
};

/// Write-ahead, undo-only recovery for one transaction.
///
/// A START record is written when the manager is created. Commit flushes the
/// transaction's dirty buffers first, then makes the COMMIT record durable.
/// Rollback walks the log backward undoing this transaction's updates until
/// its START. Restart recovery undoes every update of every unfinished
/// transaction back to the most recent quiescent checkpoint.
pub struct RecoveryManager {
    lm: Arc<LogManager>,
    bm: Arc<BufferManager>,
    txnum: i32,
}

impl RecoveryManager {
    pub fn new(txnum: i32, lm: Arc<LogManager>, bm: Arc<BufferManager>) -> DbResult<Self> {
        LogRecord::Start { txnum }.write_to_log(&lm)?;
        Ok(Self { lm, bm, txnum })
    }

    pub fn commit(&self) -> DbResult<()> {
        self.bm.flush_all(self.txnum)?;
        let lsn = LogRecord::Commit { txnum: self.txnum }.write_to_log(&self.lm)?;
        self.lm.flush(lsn)
    }

    pub fn rollback(&self, tx: &Transaction) -> DbResult<()> {
        self.do_rollback(tx)?;

        self.bm.flush_all(self.txnum)?;
        let lsn = LogRecord::Rollback { txnum: self.txnum }.write_to_log(&self.lm)?;
        self.lm.flush(lsn)
    }

    /// Called once at startup, before user transactions begin.
    pub fn recover(&self, tx: &Transaction) -> DbResult<()> {
        self.do_recover(tx)?;

        self.bm.flush_all(self.txnum)?;
        let lsn = LogRecord::Checkpoint.write_to_log(&self.lm)?;
        self.lm.flush(lsn)
    }

    /// Log the value currently at the offset and return the record's LSN;
    /// the caller performs the in-place write afterwards.
    pub fn set_int(&self, buffer: &Buffer, offset: usize) -> DbResult<i32> {
        let old_val = buffer.contents().get_int(offset);
        let block = buffer
            .block()
            .expect("buffer has no block assigned")
            .clone();
        LogRecord::SetInt {
            txnum: self.txnum,
            block,
            offset,
            val: old_val,
        }
        .write_to_log(&self.lm)
    }

    pub fn set_string(&self, buffer: &Buffer, offset: usize) -> DbResult<i32> {
        let old_val = buffer.contents().get_string(offset);
        let block = buffer
            .block()
            .expect("buffer has no block assigned")
            .clone();
        LogRecord::SetString {
            txnum: self.txnum,
            block,
            offset,
            val: old_val,
        }
        .write_to_log(&self.lm)
    }

    fn do_rollback(&self, tx: &Transaction) -> DbResult<()> {
        for bytes in self.lm.iterator()? {
            let rec = LogRecord::from_bytes(bytes?)?;
            if rec.tx_number() == self.txnum {
                if rec.op() == START {
                    return Ok(());
                }
                debug!("undoing {}", rec);
                rec.undo(tx)?;
            }
        }
        Ok(())
    }

    fn do_recover(&self, tx: &Transaction) -> DbResult<()> {
        let mut finished_txs: HashSet<i32> = HashSet::new();
        for bytes in self.lm.iterator()? {
            let rec = LogRecord::from_bytes(bytes?)?;
            if rec.op() == CHECKPOINT {
                return Ok(());
            }
            if rec.op() == COMMIT || rec.op() == ROLLBACK {
                finished_txs.insert(rec.tx_number());
            } else if !finished_txs.contains(&rec.tx_number()) {
                debug!("undoing {}", rec);
                rec.undo(tx)?;
            }
        }
        Ok(())
    }
}
