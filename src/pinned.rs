use tracing::warn;

use crate::block::{Block, BlockStorage, FileId};
use crate::error::BlockError;

/// Guard over a pinned block.
///
/// [PinnedBlock::release] hands the block back and reports write back
/// failures. A guard dropped without being released (early return through
/// `?`, a dropped iterator) still unpins its block, logging any failure, so
/// every acquisition is matched by exactly one release.
pub struct PinnedBlock<'a, S: BlockStorage + ?Sized> {
    storage: &'a S,
    block: Block,
    released: bool,
}

impl<'a, S: BlockStorage + ?Sized> PinnedBlock<'a, S> {
    pub fn fetch(storage: &'a S, file: FileId, number: u32) -> Result<Self, BlockError> {
        let block = storage.get_block(file, number)?;
        Ok(Self::wrap(storage, block))
    }

    pub fn allocate(storage: &'a S, file: FileId) -> Result<Self, BlockError> {
        let block = storage.allocate_block(file)?;
        Ok(Self::wrap(storage, block))
    }

    fn wrap(storage: &'a S, block: Block) -> Self {
        Self {
            storage,
            block,
            released: false,
        }
    }

    pub fn number(&self) -> u32 {
        self.block.number()
    }

    pub fn data(&self) -> &[u8] {
        self.block.data()
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.block.data_mut()
    }

    pub fn set_dirty(&mut self) {
        self.block.set_dirty();
    }

    pub fn release(mut self) -> Result<(), BlockError> {
        self.released = true;
        let block = std::mem::replace(&mut self.block, Block::detached());
        self.storage.unpin_block(block)
    }
}

impl<S: BlockStorage + ?Sized> Drop for PinnedBlock<'_, S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let block = std::mem::replace(&mut self.block, Block::detached());
        let (file, number) = (block.file(), block.number());
        if let Err(err) = self.storage.unpin_block(block) {
            warn!("Failed to release block {} of file {}: {}", number, file, err);
        }
    }
}
