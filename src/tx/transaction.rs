use std::sync::{Arc, Mutex};

use log::info;

use crate::{
    buffer::{Buffer, BufferManager},
    error::{DbError, DbResult},
    file::{BlockId, FileManager},
    log::LogManager,
    tx::{
        concurrency::{ConcurrencyManager, LockTable},
        recovery::RecoveryManager,
        BufferList,
    },
    types::Pod,
    utils::HandyRwLock,
};

const END_OF_FILE: i32 = -1;

/// One unit of work against the database, combining recovery, concurrency
/// and buffer management behind value-typed reads and writes.
///
/// A transaction is created, performs any number of reads and writes, and
/// ends with exactly one `commit` or `rollback`; after that it must not be
/// used again. The struct is shared as `Arc<Transaction>` by every scan and
/// page wrapper that operates on its behalf.
pub struct Transaction {
    fm: Arc<FileManager>,
    bm: Arc<BufferManager>,
    rm: RecoveryManager,
    cm: Mutex<ConcurrencyManager>,
    buffers: Mutex<BufferList>,
    txnum: i32,
}

impl Transaction {
    pub fn new(
        fm: Arc<FileManager>,
        lm: Arc<LogManager>,
        bm: Arc<BufferManager>,
        lock_table: Arc<LockTable>,
        txnum: i32,
    ) -> DbResult<Self> {
        let rm = RecoveryManager::new(txnum, lm, Arc::clone(&bm))?;
        Ok(Self {
            fm,
            bm: Arc::clone(&bm),
            rm,
            cm: Mutex::new(ConcurrencyManager::new(lock_table)),
            buffers: Mutex::new(BufferList::new(bm)),
            txnum,
        })
    }

    pub fn tx_number(&self) -> i32 {
        self.txnum
    }

    pub fn commit(&self) -> DbResult<()> {
        self.rm.commit()?;
        info!("transaction {} committed", self.txnum);
        self.cm.lock().unwrap().release();
        self.buffers.lock().unwrap().unpin_all();
        Ok(())
    }

    pub fn rollback(&self) -> DbResult<()> {
        self.rm.rollback(self)?;
        info!("transaction {} rolled back", self.txnum);
        self.cm.lock().unwrap().release();
        self.buffers.lock().unwrap().unpin_all();
        Ok(())
    }

    /// Undo the effects of every unfinished transaction found in the log and
    /// write a quiescent checkpoint. Called once at startup, before user
    /// transactions begin.
    pub fn recover(&self) -> DbResult<()> {
        self.bm.flush_all(self.txnum)?;
        self.rm.recover(self)
    }

    pub fn pin(&self, block: &BlockId) -> DbResult<()> {
        self.buffers.lock().unwrap().pin(block)
    }

    pub fn unpin(&self, block: &BlockId) {
        self.buffers.lock().unwrap().unpin(block);
    }

    pub fn get_int(&self, block: &BlockId, offset: usize) -> DbResult<i32> {
        self.cm.lock().unwrap().s_lock(block)?;
        let buffer = self.buffer_for(block)?;
        let b = buffer.rl();
        Ok(b.contents().get_int(offset))
    }

    pub fn get_string(&self, block: &BlockId, offset: usize) -> DbResult<String> {
        self.cm.lock().unwrap().s_lock(block)?;
        let buffer = self.buffer_for(block)?;
        let b = buffer.rl();
        Ok(b.contents().get_string(offset))
    }

    /// Write an integer at the given location. With `ok_to_log` the previous
    /// value is captured in an undo record first; silent writes are used for
    /// page formatting and by undo itself.
    pub fn set_int(&self, block: &BlockId, offset: usize, val: i32, ok_to_log: bool) -> DbResult<()> {
        self.cm.lock().unwrap().x_lock(block)?;
        let buffer = self.buffer_for(block)?;
        let mut b = buffer.wl();
        let lsn = if ok_to_log {
            self.rm.set_int(&b, offset)?
        } else {
            -1
        };
        b.contents_mut().set_int(offset, val);
        b.set_modified(self.txnum, lsn);
        Ok(())
    }

    pub fn set_string(
        &self,
        block: &BlockId,
        offset: usize,
        val: &str,
        ok_to_log: bool,
    ) -> DbResult<()> {
        self.cm.lock().unwrap().x_lock(block)?;
        let buffer = self.buffer_for(block)?;
        let mut b = buffer.wl();
        let lsn = if ok_to_log {
            self.rm.set_string(&b, offset)?
        } else {
            -1
        };
        b.contents_mut().set_string(offset, val);
        b.set_modified(self.txnum, lsn);
        Ok(())
    }

    /// The file length in blocks. Takes a shared lock on the end-of-file
    /// marker so the observation serializes against concurrent appends.
    pub fn size(&self, filename: &str) -> DbResult<i32> {
        let dummy = BlockId::new(filename, END_OF_FILE);
        self.cm.lock().unwrap().s_lock(&dummy)?;
        self.fm.length(filename)
    }

    /// Extend the file by one block, exclusively locking the end-of-file
    /// marker.
    pub fn append(&self, filename: &str) -> DbResult<BlockId> {
        let dummy = BlockId::new(filename, END_OF_FILE);
        self.cm.lock().unwrap().x_lock(&dummy)?;
        self.fm.append(filename)
    }

    pub fn block_size(&self) -> usize {
        self.fm.block_size()
    }

    pub fn available_buffs(&self) -> usize {
        self.bm.available()
    }

    fn buffer_for(&self, block: &BlockId) -> DbResult<Pod<Buffer>> {
        self.buffers
            .lock()
            .unwrap()
            .get_buffer(block)
            .ok_or_else(|| DbError::BlockNotPinned(block.clone()))
    }
}
