use std::sync::Arc;

use crate::{
    error::DbResult,
    file::{BlockId, FileManager, Page},
    log::LogManager,
};

/// A frame in the buffer pool: one page plus bookkeeping about the block it
/// holds, how many times it is pinned, and which transaction last modified
/// it (`txnum >= 0` means dirty) at which LSN.
///
/// Invariant: a dirty buffer is only written back after the log is durable
/// through its LSN.
#[derive(Debug)]
pub struct Buffer {
    fm: Arc<FileManager>,
    lm: Arc<LogManager>,
    contents: Page,
    block: Option<BlockId>,
    pins: i32,
    txnum: i32,
    lsn: i32,
}

impl Buffer {
    pub fn new(fm: Arc<FileManager>, lm: Arc<LogManager>) -> Self {
        let contents = Page::new(fm.block_size());
        Self {
            fm,
            lm,
            contents,
            block: None,
            pins: 0,
            txnum: -1,
            lsn: -1,
        }
    }

    pub fn contents(&self) -> &Page {
        &self.contents
    }

    pub fn contents_mut(&mut self) -> &mut Page {
        &mut self.contents
    }

    pub fn block(&self) -> Option<&BlockId> {
        self.block.as_ref()
    }

    pub fn set_modified(&mut self, txnum: i32, lsn: i32) {
        self.txnum = txnum;
        if lsn >= 0 {
            self.lsn = lsn;
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.pins > 0
    }

    pub fn modifying_tx(&self) -> i32 {
        self.txnum
    }

    pub(crate) fn assign_to_block(&mut self, block: BlockId) -> DbResult<()> {
        self.flush()?;
        self.fm.read(&block, &mut self.contents)?;
        self.block = Some(block);
        self.pins = 0;
        Ok(())
    }

    /// Write the page back if it is dirty, honoring the WAL rule: the log is
    /// flushed through this buffer's LSN first.
    pub(crate) fn flush(&mut self) -> DbResult<()> {
        if self.txnum >= 0 {
            if let Some(block) = &self.block {
                self.lm.flush(self.lsn)?;
                self.fm.write(block, &self.contents)?;
            }
            self.txnum = -1;
        }
        Ok(())
    }

    pub(crate) fn pin(&mut self) {
        self.pins += 1;
    }

    pub(crate) fn unpin(&mut self) {
        self.pins -= 1;
    }
}
