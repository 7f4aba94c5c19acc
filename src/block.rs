/// The block storage contract consumed by the hash file layer.
///
/// Everything below block granularity (file I/O, buffering, caching) lives
/// behind [BlockStorage]. The hash file only ever asks for whole blocks by
/// number, writes into them and hands them back.
use std::fmt;
use std::path::Path;

use crate::consts::BLOCK_SIZE;
use crate::error::BlockError;

/// Handle to a file opened through a [BlockStorage]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pinned block handed out by a [BlockStorage]
///
/// The buffer is a private copy of the block's contents. Changes reach the
/// file only if the block is marked dirty before it is unpinned.
#[derive(Debug)]
pub struct Block {
    file: FileId,
    number: u32,
    data: Box<[u8]>,
    dirty: bool,
}

impl Block {
    /// Wraps block contents read by a storage implementation
    ///
    /// `data` must be exactly [BLOCK_SIZE] bytes long.
    pub fn new(file: FileId, number: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), BLOCK_SIZE, "block buffer has the wrong length");
        Self {
            file,
            number,
            data: data.into_boxed_slice(),
            dirty: false,
        }
    }

    /// A zero filled block, used for freshly allocated blocks
    pub fn zeroed(file: FileId, number: u32) -> Self {
        Self::new(file, number, vec![0; BLOCK_SIZE])
    }

    /// Placeholder left behind once a guard has handed its block back
    pub(crate) fn detached() -> Self {
        Self {
            file: FileId(u32::MAX),
            number: u32::MAX,
            data: Box::default(),
            dirty: false,
        }
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn set_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Block addressed file storage
///
/// Every block returned by [BlockStorage::get_block] or
/// [BlockStorage::allocate_block] is pinned and must be passed back to
/// [BlockStorage::unpin_block] exactly once. Methods take `&self` so that a
/// caller can hold a pinned block guard while issuing further requests.
pub trait BlockStorage {
    /// Creates a new, empty file. Fails if the file already exists.
    fn create_file(&self, path: &Path) -> Result<(), BlockError>;

    fn open_file(&self, path: &Path) -> Result<FileId, BlockError>;

    /// Closes the file. Fails while any of its blocks are still pinned.
    fn close_file(&self, file: FileId) -> Result<(), BlockError>;

    /// Appends a zeroed block, numbered with the previous block count, and
    /// returns it pinned
    fn allocate_block(&self, file: FileId) -> Result<Block, BlockError>;

    fn get_block(&self, file: FileId, number: u32) -> Result<Block, BlockError>;

    /// Releases a pin, writing the contents back first if the block is dirty.
    /// The pin is released even when the write back fails.
    fn unpin_block(&self, block: Block) -> Result<(), BlockError>;

    fn block_count(&self, file: FileId) -> Result<u32, BlockError>;
}

impl<S: BlockStorage + ?Sized> BlockStorage for &S {
    fn create_file(&self, path: &Path) -> Result<(), BlockError> {
        (**self).create_file(path)
    }

    fn open_file(&self, path: &Path) -> Result<FileId, BlockError> {
        (**self).open_file(path)
    }

    fn close_file(&self, file: FileId) -> Result<(), BlockError> {
        (**self).close_file(file)
    }

    fn allocate_block(&self, file: FileId) -> Result<Block, BlockError> {
        (**self).allocate_block(file)
    }

    fn get_block(&self, file: FileId, number: u32) -> Result<Block, BlockError> {
        (**self).get_block(file, number)
    }

    fn unpin_block(&self, block: Block) -> Result<(), BlockError> {
        (**self).unpin_block(block)
    }

    fn block_count(&self, file: FileId) -> Result<u32, BlockError> {
        (**self).block_count(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_block_is_clean() {
        let block = Block::zeroed(FileId(1), 4);
        assert_eq!(block.data().len(), BLOCK_SIZE);
        assert!(block.data().iter().all(|b| *b == 0));
        assert!(!block.is_dirty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "block buffer has the wrong length")]
    fn test_short_buffer_is_rejected() {
        Block::new(FileId(1), 0, vec![0; BLOCK_SIZE - 1]);
    }
}
