use std::{
    path::Path,
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
};

use log::info;

use crate::{
    buffer::BufferManager,
    error::DbResult,
    file::FileManager,
    log::LogManager,
    metadata::MetadataManager,
    plan::{BasicQueryPlanner, IndexUpdatePlanner, Planner},
    tx::{concurrency::LockTable, Transaction},
};

pub const BLOCK_SIZE: usize = 400;
pub const BUFFER_SIZE: usize = 8;
pub const LOG_FILE: &str = "minirel.log";

/// One database instance: the managers for one directory, plus the catalog
/// and planner. All shared state hangs off this value, so separate
/// instances (and separate tests) never interfere.
pub struct Database {
    fm: Arc<FileManager>,
    lm: Arc<LogManager>,
    bm: Arc<BufferManager>,
    lock_table: Arc<LockTable>,
    mdm: Option<Arc<MetadataManager>>,
    planner: Option<Planner>,
    next_txnum: AtomicI32,
}

impl Database {
    /// Open the database with the full stack: metadata, planner, and crash
    /// recovery when the directory already existed.
    pub fn new<P: AsRef<Path>>(dirname: P) -> DbResult<Self> {
        let mut db = Self::with_config(dirname, BLOCK_SIZE, BUFFER_SIZE)?;

        let tx = db.new_tx()?;
        if db.fm.is_new() {
            info!("creating new database");
        } else {
            info!("recovering existing database");
            tx.recover()?;
        }
        let mdm = Arc::new(MetadataManager::new(db.fm.is_new(), &tx)?);
        let planner = Planner::new(
            Box::new(BasicQueryPlanner::new(Arc::clone(&mdm))),
            Box::new(IndexUpdatePlanner::new(Arc::clone(&mdm))),
        );
        tx.commit()?;

        db.mdm = Some(mdm);
        db.planner = Some(planner);
        Ok(db)
    }

    /// Open only the storage kernel, without catalog or planner. Meant for
    /// tests and tools that drive transactions directly; performs no
    /// recovery.
    pub fn with_config<P: AsRef<Path>>(
        dirname: P,
        block_size: usize,
        buffer_size: usize,
    ) -> DbResult<Self> {
        let fm = Arc::new(FileManager::new(dirname, block_size)?);
        let lm = Arc::new(LogManager::new(Arc::clone(&fm), LOG_FILE)?);
        let bm = Arc::new(BufferManager::new(
            Arc::clone(&fm),
            Arc::clone(&lm),
            buffer_size,
        ));
        Ok(Self {
            fm,
            lm,
            bm,
            lock_table: Arc::new(LockTable::new()),
            mdm: None,
            planner: None,
            next_txnum: AtomicI32::new(0),
        })
    }

    pub fn new_tx(&self) -> DbResult<Arc<Transaction>> {
        let txnum = self.next_txnum.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Arc::new(Transaction::new(
            Arc::clone(&self.fm),
            Arc::clone(&self.lm),
            Arc::clone(&self.bm),
            Arc::clone(&self.lock_table),
            txnum,
        )?))
    }

    pub fn file_manager(&self) -> &Arc<FileManager> {
        &self.fm
    }

    pub fn log_manager(&self) -> &Arc<LogManager> {
        &self.lm
    }

    pub fn buffer_manager(&self) -> &Arc<BufferManager> {
        &self.bm
    }

    pub fn metadata(&self) -> &Arc<MetadataManager> {
        self.mdm
            .as_ref()
            .expect("database was opened without metadata")
    }

    pub fn planner(&self) -> &Planner {
        self.planner
            .as_ref()
            .expect("database was opened without a planner")
    }
}
