use std::{collections::HashMap, sync::Arc};

use crate::{
    buffer::{Buffer, BufferManager},
    error::DbResult,
    file::BlockId,
    types::Pod,
};

/// The buffers a transaction currently has pinned. Repeated pins of the same
/// block are tracked individually so `unpin_all` releases exactly what this
/// transaction acquired.
pub struct BufferList {
    buffers: HashMap<BlockId, Pod<Buffer>>,
    pins: Vec<BlockId>,
    bm: Arc<BufferManager>,
}

impl BufferList {
    pub fn new(bm: Arc<BufferManager>) -> Self {
        Self {
            buffers: HashMap::new(),
            pins: Vec::new(),
            bm,
        }
    }

    pub fn get_buffer(&self, block: &BlockId) -> Option<Pod<Buffer>> {
        self.buffers.get(block).map(Arc::clone)
    }

    pub fn pin(&mut self, block: &BlockId) -> DbResult<()> {
        let buffer = self.bm.pin(block)?;
        self.buffers.insert(block.clone(), buffer);
        self.pins.push(block.clone());
        Ok(())
    }

    pub fn unpin(&mut self, block: &BlockId) {
        if let Some(buffer) = self.buffers.get(block) {
            self.bm.unpin(buffer);
        }
        if let Some(pos) = self.pins.iter().position(|b| b == block) {
            self.pins.remove(pos);
        }
        if !self.pins.contains(block) {
            self.buffers.remove(block);
        }
    }

    pub fn unpin_all(&mut self) {
        for block in &self.pins {
            if let Some(buffer) = self.buffers.get(block) {
                self.bm.unpin(buffer);
            }
        }
        self.buffers.clear();
        self.pins.clear();
    }
}
