use std::{
    sync::{Arc, Condvar, Mutex, RwLock},
    time::{Duration, Instant},
};

use log::debug;

use crate::{
    buffer::Buffer,
    error::{DbError, DbResult},
    file::{BlockId, FileManager},
    log::LogManager,
    types::Pod,
    utils::HandyRwLock,
};

const MAX_TIME: Duration = Duration::from_secs(10);

/// A fixed pool of buffers. Pin requests that cannot be satisfied wait on a
/// condition variable; a request that waits longer than the configured bound
/// fails with `BufferAbort`.
pub struct BufferManager {
    pool: Vec<Pod<Buffer>>,
    num_available: Mutex<usize>,
    cond: Condvar,
    max_wait: Duration,
}

impl BufferManager {
    pub fn new(fm: Arc<FileManager>, lm: Arc<LogManager>, num_buffs: usize) -> Self {
        Self::with_wait_time(fm, lm, num_buffs, MAX_TIME)
    }

    /// Same as `new` but with a custom wait bound, so the abort path can be
    /// exercised without ten-second sleeps.
    pub fn with_wait_time(
        fm: Arc<FileManager>,
        lm: Arc<LogManager>,
        num_buffs: usize,
        max_wait: Duration,
    ) -> Self {
        let mut pool = Vec::with_capacity(num_buffs);
        for _ in 0..num_buffs {
            pool.push(Arc::new(RwLock::new(Buffer::new(
                Arc::clone(&fm),
                Arc::clone(&lm),
            ))));
        }
        Self {
            pool,
            num_available: Mutex::new(num_buffs),
            cond: Condvar::new(),
            max_wait,
        }
    }

    /// The number of unpinned buffers.
    pub fn available(&self) -> usize {
        *self.num_available.lock().unwrap()
    }

    /// Flush every buffer modified by the given transaction.
    pub fn flush_all(&self, txnum: i32) -> DbResult<()> {
        let _guard = self.num_available.lock().unwrap();
        for buffer in &self.pool {
            let mut b = buffer.wl();
            if b.modifying_tx() == txnum {
                b.flush()?;
            }
        }
        Ok(())
    }

    pub fn unpin(&self, buffer: &Pod<Buffer>) {
        let mut available = self.num_available.lock().unwrap();

        let mut b = buffer.wl();
        b.unpin();
        if !b.is_pinned() {
            *available += 1;
            self.cond.notify_all();
        }
    }

    /// Pin a buffer to the given block, reading it in (and flushing a dirty
    /// victim) if it is not already resident.
    pub fn pin(&self, block: &BlockId) -> DbResult<Pod<Buffer>> {
        let mut available = self.num_available.lock().unwrap();

        let start = Instant::now();
        loop {
            if let Some(buffer) = self.try_to_pin(block, &mut available)? {
                return Ok(buffer);
            }
            if start.elapsed() > self.max_wait {
                debug!("giving up on pin of {}", block);
                return Err(DbError::BufferAbort);
            }
            let (guard, _) = self.cond.wait_timeout(available, self.max_wait).unwrap();
            available = guard;
        }
    }

    fn try_to_pin(
        &self,
        block: &BlockId,
        available: &mut usize,
    ) -> DbResult<Option<Pod<Buffer>>> {
        let buffer = match self.find_existing_buffer(block) {
            Some(b) => b,
            None => match self.choose_unpinned_buffer() {
                Some(b) => {
                    b.wl().assign_to_block(block.clone())?;
                    b
                }
                None => return Ok(None),
            },
        };

        let mut b = buffer.wl();
        if !b.is_pinned() {
            *available -= 1;
        }
        b.pin();
        drop(b);
        Ok(Some(buffer))
    }

    fn find_existing_buffer(&self, block: &BlockId) -> Option<Pod<Buffer>> {
        for buffer in &self.pool {
            if buffer.rl().block() == Some(block) {
                return Some(Arc::clone(buffer));
            }
        }
        None
    }

    fn choose_unpinned_buffer(&self) -> Option<Pod<Buffer>> {
        for buffer in &self.pool {
            if !buffer.rl().is_pinned() {
                return Some(Arc::clone(buffer));
            }
        }
        None
    }
}
