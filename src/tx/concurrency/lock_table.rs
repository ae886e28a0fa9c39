use std::{
    collections::HashMap,
    sync::{Condvar, Mutex},
    time::{Duration, Instant},
};

use log::debug;

use crate::{
    error::{DbError, DbResult},
    file::BlockId,
};

const MAX_TIME: Duration = Duration::from_secs(10);

/// Process-wide table of block locks, shared by every transaction of one
/// database instance.
///
/// Each entry is a counter: a positive value n means n shared holders, −1
/// means one exclusive holder, no entry means unlocked. Deadlock is not
/// detected, only resolved: a request that waits longer than the bound fails
/// with `LockAbort`. Every release broadcasts, which keeps waiters live in
/// the absence of timeouts; fairness is not guaranteed.
pub struct LockTable {
    locks: Mutex<HashMap<BlockId, i32>>,
    cond: Condvar,
    max_wait: Duration,
}

impl LockTable {
    pub fn new() -> Self {
        Self::with_wait_time(MAX_TIME)
    }

    pub fn with_wait_time(max_wait: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            cond: Condvar::new(),
            max_wait,
        }
    }

    pub fn s_lock(&self, block: &BlockId) -> DbResult<()> {
        let mut locks = self.locks.lock().unwrap();

        let start = Instant::now();
        while Self::has_x_lock(&locks, block) && start.elapsed() <= self.max_wait {
            let (guard, _) = self.cond.wait_timeout(locks, self.max_wait).unwrap();
            locks = guard;
        }
        if Self::has_x_lock(&locks, block) {
            debug!("slock timed out on {}", block);
            return Err(DbError::LockAbort(block.clone()));
        }
        let val = Self::lock_val(&locks, block);
        locks.insert(block.clone(), val + 1);
        Ok(())
    }

    /// Upgrade to an exclusive lock. The caller is expected to already hold
    /// a shared lock on the block, so only *other* shared holders are waited
    /// out.
    pub fn x_lock(&self, block: &BlockId) -> DbResult<()> {
        let mut locks = self.locks.lock().unwrap();

        let start = Instant::now();
        while Self::has_other_s_locks(&locks, block) && start.elapsed() <= self.max_wait {
            let (guard, _) = self.cond.wait_timeout(locks, self.max_wait).unwrap();
            locks = guard;
        }
        if Self::has_other_s_locks(&locks, block) {
            debug!("xlock timed out on {}", block);
            return Err(DbError::LockAbort(block.clone()));
        }
        locks.insert(block.clone(), -1);
        Ok(())
    }

    pub fn unlock(&self, block: &BlockId) {
        let mut locks = self.locks.lock().unwrap();

        let val = Self::lock_val(&locks, block);
        if val > 1 {
            locks.insert(block.clone(), val - 1);
        } else {
            locks.remove(block);
            self.cond.notify_all();
        }
    }

    fn has_x_lock(locks: &HashMap<BlockId, i32>, block: &BlockId) -> bool {
        Self::lock_val(locks, block) < 0
    }

    fn has_other_s_locks(locks: &HashMap<BlockId, i32>, block: &BlockId) -> bool {
        Self::lock_val(locks, block) > 1
    }

    fn lock_val(locks: &HashMap<BlockId, i32>, block: &BlockId) -> i32 {
        *locks.get(block).unwrap_or(&0)
    }
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}
