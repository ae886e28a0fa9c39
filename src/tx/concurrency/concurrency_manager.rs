use std::{collections::HashMap, sync::Arc};

use crate::{error::DbResult, file::BlockId, tx::concurrency::LockTable};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// A transaction's private view of the locks it holds. Locks are only ever
/// acquired here and released all at once at commit or rollback, never in
/// between (strict two-phase locking).
pub struct ConcurrencyManager {
    lock_table: Arc<LockTable>,
    locks: HashMap<BlockId, LockMode>,
}

impl ConcurrencyManager {
    pub fn new(lock_table: Arc<LockTable>) -> Self {
        Self {
            lock_table,
            locks: HashMap::new(),
        }
    }

    pub fn s_lock(&mut self, block: &BlockId) -> DbResult<()> {
        if self.locks.contains_key(block) {
            return Ok(());
        }
        self.lock_table.s_lock(block)?;
        self.locks.insert(block.clone(), LockMode::Shared);
        Ok(())
    }

    /// Acquire an exclusive lock, going through a shared lock first so that
    /// the upgrade only has to wait out other transactions' shared holders.
    pub fn x_lock(&mut self, block: &BlockId) -> DbResult<()> {
        if self.has_x_lock(block) {
            return Ok(());
        }
        self.lock_table.s_lock(block)?;
        self.lock_table.x_lock(block)?;
        self.locks.insert(block.clone(), LockMode::Exclusive);
        Ok(())
    }

    pub fn release(&mut self) {
        for block in self.locks.keys() {
            self.lock_table.unlock(block);
        }
        self.locks.clear();
    }

    fn has_x_lock(&self, block: &BlockId) -> bool {
        self.locks.get(block) == Some(&LockMode::Exclusive)
    }
}
