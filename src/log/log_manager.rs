use std::sync::{Arc, Mutex};

use log::debug;

use crate::{
    error::DbResult,
    file::{BlockId, FileManager, Page, INT_BYTES},
    log::LogIterator,
};

#[derive(Debug)]
struct LogState {
    log_page: Page,
    current_block: BlockId,
    latest_lsn: i32,
    last_saved_lsn: i32,
}

/// The append-only record log.
///
/// Records are placed right to left inside the tail block: the first four
/// bytes of a log block hold the offset of the most recently written record
/// (the boundary), and records grow downward from the block end toward it.
/// Each record is a length-prefixed byte blob. LSNs are monotonic positive
/// integers assigned at append time.
#[derive(Debug)]
pub struct LogManager {
    fm: Arc<FileManager>,
    logfile: String,
    state: Mutex<LogState>,
}

impl LogManager {
    pub fn new(fm: Arc<FileManager>, logfile: &str) -> DbResult<Self> {
        let mut log_page = Page::new(fm.block_size());

        let log_size = fm.length(logfile)?;
        let current_block = if log_size == 0 {
            Self::append_new_block(&fm, logfile, &mut log_page)?
        } else {
            let block = BlockId::new(logfile, log_size - 1);
            fm.read(&block, &mut log_page)?;
            block
        };

        Ok(Self {
            fm,
            logfile: logfile.to_string(),
            state: Mutex::new(LogState {
                log_page,
                current_block,
                latest_lsn: 0,
                last_saved_lsn: 0,
            }),
        })
    }

    /// Append a record and return its LSN. The record is not guaranteed to
    /// be on disk until a `flush` covering the LSN.
    pub fn append(&self, rec: &[u8]) -> DbResult<i32> {
        let mut state = self.state.lock().unwrap();

        let mut boundary = state.log_page.get_int(0) as usize;
        let bytes_needed = rec.len() + INT_BYTES;
        if (boundary as i64 - bytes_needed as i64) < INT_BYTES as i64 {
            // the record does not fit, move to a new block
            self.flush_state(&mut state)?;
            state.current_block =
                Self::append_new_block(&self.fm, &self.logfile, &mut state.log_page)?;
            boundary = state.log_page.get_int(0) as usize;
        }

        let recpos = boundary - bytes_needed;
        state.log_page.set_bytes(recpos, rec);
        state.log_page.set_int(0, recpos as i32);
        state.latest_lsn += 1;

        debug!(
            "log append, lsn: {}, pos: {}, bytes: {}",
            state.latest_lsn,
            recpos,
            hex::encode(rec)
        );
        Ok(state.latest_lsn)
    }

    /// Ensure the log is durable at least through `lsn`.
    pub fn flush(&self, lsn: i32) -> DbResult<()> {
        let mut state = self.state.lock().unwrap();
        if lsn >= state.last_saved_lsn {
            self.flush_state(&mut state)?;
        }
        Ok(())
    }

    /// Flush, then iterate the log backward starting from the tail block.
    pub fn iterator(&self) -> DbResult<LogIterator> {
        let mut state = self.state.lock().unwrap();
        self.flush_state(&mut state)?;
        LogIterator::new(Arc::clone(&self.fm), state.current_block.clone())
    }

    fn append_new_block(
        fm: &Arc<FileManager>,
        logfile: &str,
        log_page: &mut Page,
    ) -> DbResult<BlockId> {
        let block = fm.append(logfile)?;
        log_page.set_int(0, fm.block_size() as i32);
        fm.write(&block, log_page)?;
        Ok(block)
    }

    fn flush_state(&self, state: &mut LogState) -> DbResult<()> {
        self.fm.write(&state.current_block, &state.log_page)?;
        state.last_saved_lsn = state.latest_lsn;
        Ok(())
    }
}
