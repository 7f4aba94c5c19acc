/// Block storage over plain files
///
/// No caching: every `get_block` reads the block from disk and every dirty
/// unpin writes it straight back. Pin counts are tracked per block so that
/// unbalanced pin/unpin usage shows up as an error instead of going unnoticed.
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::block::{Block, BlockStorage, FileId};
use crate::consts::BLOCK_SIZE;
use crate::error::BlockError;

struct OpenBlockFile {
    path: PathBuf,
    file: File,
    block_count: u32,
    /// Number of outstanding pins per block number
    pins: HashMap<u32, u32>,
}

impl OpenBlockFile {
    fn offset(number: u32) -> u64 {
        number as u64 * BLOCK_SIZE as u64
    }

    fn pinned_blocks(&self) -> u32 {
        self.pins.values().sum()
    }

    fn pin(&mut self, number: u32) {
        *self.pins.entry(number).or_insert(0) += 1;
    }

    fn unpin(&mut self, file: FileId, number: u32) -> Result<(), BlockError> {
        match self.pins.get_mut(&number) {
            Some(count) if *count > 1 => {
                *count -= 1;
                Ok(())
            }
            Some(_) => {
                self.pins.remove(&number);
                Ok(())
            }
            None => Err(BlockError::NotPinned { file, number }),
        }
    }
}

#[derive(Default)]
struct FileTable {
    next_id: u32,
    files: HashMap<FileId, OpenBlockFile>,
}

/// [BlockStorage] backed by files on the local file system
#[derive(Default)]
pub struct FileBlockStorage {
    /// Relative paths are resolved against this directory when set
    root: Option<PathBuf>,
    table: RefCell<FileTable>,
}

impl FileBlockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage resolving relative file names against `root`
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
            table: RefCell::default(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Number of files currently open
    pub fn open_files(&self) -> usize {
        self.table.borrow().files.len()
    }

    /// Total number of outstanding pins over all open files
    pub fn pinned_blocks(&self) -> u32 {
        self.table
            .borrow()
            .files
            .values()
            .map(OpenBlockFile::pinned_blocks)
            .sum()
    }
}

impl BlockStorage for FileBlockStorage {
    fn create_file(&self, path: &Path) -> Result<(), BlockError> {
        let path = self.resolve(path);
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        debug!("Created block file {:?}", path);
        Ok(())
    }

    fn open_file(&self, path: &Path) -> Result<FileId, BlockError> {
        let path = std::fs::canonicalize(self.resolve(path))?;
        if self.table.borrow().files.values().any(|open| open.path == path) {
            return Err(BlockError::AlreadyOpen { path });
        }
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let len = file.metadata()?.len();
        if len % BLOCK_SIZE as u64 != 0 {
            return Err(BlockError::MisalignedFile { path, len });
        }
        let block_count = (len / BLOCK_SIZE as u64) as u32;

        let mut table = self.table.borrow_mut();
        let id = FileId(table.next_id);
        table.next_id += 1;
        debug!("Opened block file {:?} as {} ({} blocks)", path, id, block_count);
        table.files.insert(
            id,
            OpenBlockFile {
                path,
                file,
                block_count,
                pins: HashMap::new(),
            },
        );
        Ok(id)
    }

    fn close_file(&self, file: FileId) -> Result<(), BlockError> {
        let mut table = self.table.borrow_mut();
        let open = table.files.get(&file).ok_or(BlockError::InvalidFile(file))?;
        let count = open.pinned_blocks();
        if count > 0 {
            return Err(BlockError::PinnedBlocks { file, count });
        }
        if let Some(mut open) = table.files.remove(&file) {
            open.file.flush()?;
            debug!("Closed block file {:?}", open.path);
        }
        Ok(())
    }

    fn allocate_block(&self, file: FileId) -> Result<Block, BlockError> {
        let mut table = self.table.borrow_mut();
        let open = table
            .files
            .get_mut(&file)
            .ok_or(BlockError::InvalidFile(file))?;

        let number = open.block_count;
        open.file.seek(SeekFrom::Start(OpenBlockFile::offset(number)))?;
        open.file.write_all(&[0; BLOCK_SIZE])?;
        open.block_count += 1;
        open.pin(number);
        trace!("Allocated block {} in file {}", number, file);
        Ok(Block::zeroed(file, number))
    }

    fn get_block(&self, file: FileId, number: u32) -> Result<Block, BlockError> {
        let mut table = self.table.borrow_mut();
        let open = table
            .files
            .get_mut(&file)
            .ok_or(BlockError::InvalidFile(file))?;

        if number >= open.block_count {
            return Err(BlockError::BlockOutOfRange {
                file,
                number,
                count: open.block_count,
            });
        }

        let mut buf = vec![0; BLOCK_SIZE];
        open.file.seek(SeekFrom::Start(OpenBlockFile::offset(number)))?;
        open.file.read_exact(&mut buf)?;
        open.pin(number);
        trace!("Pinned block {} of file {}", number, file);
        Ok(Block::new(file, number, buf))
    }

    fn unpin_block(&self, block: Block) -> Result<(), BlockError> {
        let file = block.file();
        let mut table = self.table.borrow_mut();
        let open = table
            .files
            .get_mut(&file)
            .ok_or(BlockError::InvalidFile(file))?;

        open.unpin(file, block.number())?;
        trace!("Unpinned block {} of file {}", block.number(), file);
        if block.is_dirty() {
            open.file
                .seek(SeekFrom::Start(OpenBlockFile::offset(block.number())))?;
            open.file.write_all(block.data())?;
        }
        Ok(())
    }

    fn block_count(&self, file: FileId) -> Result<u32, BlockError> {
        self.table
            .borrow()
            .files
            .get(&file)
            .map(|open| open.block_count)
            .ok_or(BlockError::InvalidFile(file))
    }
}
