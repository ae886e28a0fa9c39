use core::fmt;

use crate::{
    error::{DbError, DbResult},
    file::{self, BlockId, Page, INT_BYTES},
    log::LogManager,
    tx::Transaction,
};

pub const CHECKPOINT: i32 = 0;
pub const START: i32 = 1;
pub const COMMIT: i32 = 2;
pub const ROLLBACK: i32 = 3;
pub const SETINT: i32 = 4;
pub const SETSTRING: i32 = 5;

/// One record of the undo log. Every record starts with a 4-byte op code;
/// the update records additionally carry the transaction, the touched
/// location and the value that was there *before* the write, which is what
/// `undo` puts back.
#[derive(Debug, PartialEq)]
pub enum LogRecord {
    Checkpoint,
    Start {
        txnum: i32,
    },
    Commit {
        txnum: i32,
    },
    Rollback {
        txnum: i32,
    },
    SetInt {
        txnum: i32,
        block: BlockId,
        offset: usize,
        val: i32,
    },
    SetString {
        txnum: i32,
        block: BlockId,
        offset: usize,
        val: String,
    },
}

impl LogRecord {
    /// Decode a record from its log bytes, dispatching on the op word.
    pub fn from_bytes(bytes: Vec<u8>) -> DbResult<LogRecord> {
        let p = Page::from_bytes(bytes);
        match p.get_int(0) {
            CHECKPOINT => Ok(LogRecord::Checkpoint),
            START => Ok(LogRecord::Start {
                txnum: p.get_int(INT_BYTES),
            }),
            COMMIT => Ok(LogRecord::Commit {
                txnum: p.get_int(INT_BYTES),
            }),
            ROLLBACK => Ok(LogRecord::Rollback {
                txnum: p.get_int(INT_BYTES),
            }),
            SETINT => {
                let (txnum, block, offset, vpos) = Self::decode_update(&p);
                Ok(LogRecord::SetInt {
                    txnum,
                    block,
                    offset,
                    val: p.get_int(vpos),
                })
            }
            SETSTRING => {
                let (txnum, block, offset, vpos) = Self::decode_update(&p);
                Ok(LogRecord::SetString {
                    txnum,
                    block,
                    offset,
                    val: p.get_string(vpos),
                })
            }
            other => Err(DbError::UnknownLogRecord(other)),
        }
    }

    fn decode_update(p: &Page) -> (i32, BlockId, usize, usize) {
        let tpos = INT_BYTES;
        let txnum = p.get_int(tpos);
        let fpos = tpos + INT_BYTES;
        let filename = p.get_string(fpos);
        let bpos = fpos + file::max_length(filename.encode_utf16().count());
        let blknum = p.get_int(bpos);
        let opos = bpos + INT_BYTES;
        let offset = p.get_int(opos) as usize;
        let vpos = opos + INT_BYTES;
        (txnum, BlockId::new(&filename, blknum), offset, vpos)
    }

    pub fn op(&self) -> i32 {
        match self {
            LogRecord::Checkpoint => CHECKPOINT,
            LogRecord::Start { .. } => START,
            LogRecord::Commit { .. } => COMMIT,
            LogRecord::Rollback { .. } => ROLLBACK,
            LogRecord::SetInt { .. } => SETINT,
            LogRecord::SetString { .. } => SETSTRING,
        }
    }

    pub fn tx_number(&self) -> i32 {
        match self {
            LogRecord::Checkpoint => -1,
            LogRecord::Start { txnum }
            | LogRecord::Commit { txnum }
            | LogRecord::Rollback { txnum }
            | LogRecord::SetInt { txnum, .. }
            | LogRecord::SetString { txnum, .. } => *txnum,
        }
    }

    /// Put back the previous value recorded here. The write is silent (not
    /// logged again); only the update records do anything.
    pub fn undo(&self, tx: &Transaction) -> DbResult<()> {
        match self {
            LogRecord::SetInt {
                block, offset, val, ..
            } => {
                tx.pin(block)?;
                tx.set_int(block, *offset, *val, false)?;
                tx.unpin(block);
                Ok(())
            }
            LogRecord::SetString {
                block, offset, val, ..
            } => {
                tx.pin(block)?;
                tx.set_string(block, *offset, val, false)?;
                tx.unpin(block);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn write_to_log(&self, lm: &LogManager) -> DbResult<i32> {
        match self {
            LogRecord::Checkpoint => {
                let mut p = Page::new(INT_BYTES);
                p.set_int(0, CHECKPOINT);
                lm.append(p.contents())
            }
            LogRecord::Start { txnum }
            | LogRecord::Commit { txnum }
            | LogRecord::Rollback { txnum } => {
                let mut p = Page::new(2 * INT_BYTES);
                p.set_int(0, self.op());
                p.set_int(INT_BYTES, *txnum);
                lm.append(p.contents())
            }
            LogRecord::SetInt {
                txnum,
                block,
                offset,
                val,
            } => {
                let (mut p, vpos) = Self::encode_update(SETINT, *txnum, block, *offset, INT_BYTES);
                p.set_int(vpos, *val);
                lm.append(p.contents())
            }
            LogRecord::SetString {
                txnum,
                block,
                offset,
                val,
            } => {
                let val_len = file::max_length(val.encode_utf16().count());
                let (mut p, vpos) = Self::encode_update(SETSTRING, *txnum, block, *offset, val_len);
                p.set_string(vpos, val);
                lm.append(p.contents())
            }
        }
    }

    fn encode_update(
        op: i32,
        txnum: i32,
        block: &BlockId,
        offset: usize,
        val_len: usize,
    ) -> (Page, usize) {
        let tpos = INT_BYTES;
        let fpos = tpos + INT_BYTES;
        let bpos = fpos + file::max_length(block.filename().encode_utf16().count());
        let opos = bpos + INT_BYTES;
        let vpos = opos + INT_BYTES;

        let mut p = Page::new(vpos + val_len);
        p.set_int(0, op);
        p.set_int(tpos, txnum);
        p.set_string(fpos, block.filename());
        p.set_int(bpos, block.number());
        p.set_int(opos, offset as i32);
        (p, vpos)
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LogRecord::Checkpoint => write!(f, "<CHECKPOINT>"),
            LogRecord::Start { txnum } => write!(f, "<START {}>", txnum),
            LogRecord::Commit { txnum } => write!(f, "<COMMIT {}>", txnum),
            LogRecord::Rollback { txnum } => write!(f, "<ROLLBACK {}>", txnum),
            LogRecord::SetInt {
                txnum,
                block,
                offset,
                val,
            } => write!(f, "<SETINT {} {} {} {}>", txnum, block, offset, val),
            LogRecord::SetString {
                txnum,
                block,
                offset,
                val,
            } => write!(f, "<SETSTRING {} {} {} {}>", txnum, block, offset, val),
        }
    }
}
