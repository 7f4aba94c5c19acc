//! Static hash file storage
//!
//! Records are spread over a fixed number of buckets, the depth, chosen when
//! the file is created and never changed. Each bucket is a chain of data
//! blocks; a bucket gets its first block on its first insert and a new tail
//! block whenever the current tail fills up.
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::block::{BlockStorage, FileId};
use crate::bytes::{FromBytes, IntoBytes};
use crate::config::HashFileConfig;
use crate::consts::RECORD_SIZE;
use crate::error::{BlockError, HashFileError, Result};
use crate::layout::{DataBlockHeader, DirectoryBlock, HashFileHeader};
use crate::open_table::{IndexDesc, OpenFileTable, OpenIndex};
use crate::pinned::PinnedBlock;
use crate::record::Record;
use crate::scan::Entries;
use crate::statistics::{ChainSummary, HashStatistics};

/// Hash file context: the block storage plus the table of open hash files
///
/// Every operation goes through this value instead of process wide state.
/// Operations that change the table or a file take `&mut self`, so an
/// [Entries] walk can never overlap an insert.
pub struct HashFile<S: BlockStorage> {
    storage: S,
    open_files: OpenFileTable,
}

impl<S: BlockStorage> HashFile<S> {
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, HashFileConfig::default())
    }

    pub fn with_config(storage: S, config: HashFileConfig) -> Self {
        Self {
            storage,
            open_files: OpenFileTable::new(config.max_open_files),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn open_files(&self) -> &OpenFileTable {
        &self.open_files
    }

    /// Creates a hash file with `depth` buckets, all empty
    ///
    /// Writes the header into block 0 and the directory into the blocks after
    /// it. The file is closed again before returning. A failure part way
    /// through leaves the partial file on disk.
    pub fn create_index<P: AsRef<Path>>(&self, path: P, depth: u32) -> Result<()> {
        let path = path.as_ref();
        let header = HashFileHeader::new(depth)?;

        self.storage.create_file(path)?;
        let file = self.storage.open_file(path)?;
        let written = self.write_metadata(file, &header);
        let closed = self.storage.close_file(file);
        written?;
        closed?;

        debug!(
            "Created hash file {:?} with {} buckets in {} directory blocks",
            path,
            depth,
            header.directory_blocks()
        );
        Ok(())
    }

    fn write_metadata(&self, file: FileId, header: &HashFileHeader) -> Result<()> {
        let mut block = PinnedBlock::allocate(&self.storage, file)?;
        header.write_bytes(block.data_mut());
        block.set_dirty();
        block.release()?;

        let directory = DirectoryBlock::empty();
        for _ in 0..header.directory_blocks() {
            let mut block = PinnedBlock::allocate(&self.storage, file)?;
            directory.write_bytes(block.data_mut());
            block.set_dirty();
            block.release()?;
        }
        Ok(())
    }

    /// Opens a hash file and binds it to the first free descriptor
    ///
    /// On failure the underlying file is closed again and the open file
    /// table is left as it was. A file can be bound to one descriptor at a
    /// time.
    pub fn open_index<P: AsRef<Path>>(&mut self, path: P) -> Result<IndexDesc> {
        let path = path.as_ref();
        let file = self.storage.open_file(path).map_err(|err| match err {
            BlockError::MisalignedFile { .. } => {
                HashFileError::Format(path.display().to_string())
            }
            BlockError::AlreadyOpen { .. } => {
                HashFileError::AlreadyOpen(path.display().to_string())
            }
            err => err.into(),
        })?;

        let header = match self.read_header(file, path) {
            Ok(header) => header,
            Err(err) => {
                self.close_quietly(file);
                return Err(err);
            }
        };

        let index = OpenIndex {
            file,
            header,
            path: path.to_path_buf(),
        };
        match self.open_files.bind(index) {
            Ok(desc) => {
                debug!("Opened hash file {:?} as index {}", path, desc);
                Ok(desc)
            }
            Err(err) => {
                self.close_quietly(file);
                Err(err)
            }
        }
    }

    fn read_header(&self, file: FileId, path: &Path) -> Result<HashFileHeader> {
        let not_a_hash_file = || HashFileError::Format(path.display().to_string());

        let block_count = self.storage.block_count(file)?;
        if block_count == 0 {
            return Err(not_a_hash_file());
        }

        let block = PinnedBlock::fetch(&self.storage, file, 0)?;
        let header = HashFileHeader::from_bytes(block.data());
        block.release()?;

        let header = header.map_err(|err| match err {
            HashFileError::Format(_) => not_a_hash_file(),
            err => err,
        })?;
        if block_count <= header.directory_blocks() {
            return Err(HashFileError::Corrupted(format!(
                "{} blocks cannot hold a directory of {} blocks",
                block_count,
                header.directory_blocks()
            )));
        }
        Ok(header)
    }

    fn close_quietly(&self, file: FileId) {
        if let Err(err) = self.storage.close_file(file) {
            warn!("Failed to close block file {}: {}", file, err);
        }
    }

    /// Closes an open hash file and frees its descriptor
    pub fn close_file(&mut self, desc: IndexDesc) -> Result<()> {
        let file = self.open_files.get(desc)?.file;
        self.storage.close_file(file)?;
        let index = self.open_files.unbind(desc)?;
        debug!("Closed hash file {:?} (index {})", index.path, desc);
        Ok(())
    }

    /// Closes every open hash file, returning the first failure
    pub fn close_all(&mut self) -> Result<()> {
        let mut result = Ok(());
        for desc in self.open_files.descriptors() {
            if let Err(err) = self.close_file(desc) {
                warn!("Failed to close index {}: {}", desc, err);
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }

    pub fn header(&self, desc: IndexDesc) -> Result<HashFileHeader> {
        Ok(self.open_files.get(desc)?.header)
    }

    /// Appends a record to the tail of its bucket's chain
    ///
    /// Records with equal ids are not rejected. If the storage fails after an
    /// overflow block was allocated but before it was linked, that block stays
    /// in the file unreachable.
    pub fn insert_entry(&mut self, desc: IndexDesc, record: &Record) -> Result<()> {
        let index = self.open_files.get(desc)?;
        let (file, header) = (index.file, index.header);
        let storage = &self.storage;

        let bucket = header.bucket_of(record.id());
        let (directory_block, slot) = header.directory_slot(bucket);
        let mut directory = PinnedBlock::fetch(storage, file, directory_block)?;

        let mut tail = match DirectoryBlock::read_head(directory.data(), slot)? {
            Some(head) => {
                directory.release()?;
                self.find_tail(file, &header, head)?
            }
            None => {
                let mut block = PinnedBlock::allocate(storage, file)?;
                DataBlockHeader::empty().write_bytes(block.data_mut());
                block.set_dirty();
                DirectoryBlock::write_head(directory.data_mut(), slot, Some(block.number()));
                directory.set_dirty();
                directory.release()?;
                trace!("Bucket {} starts at block {}", bucket, block.number());
                block
            }
        };

        let mut data = DataBlockHeader::read(tail.data(), &header)?;
        if data.is_full(&header) {
            let mut overflow = PinnedBlock::allocate(storage, file)?;
            DataBlockHeader::empty().write_bytes(overflow.data_mut());
            overflow.set_dirty();

            data.next = Some(overflow.number());
            data.write_bytes(tail.data_mut());
            tail.set_dirty();
            tail.release()?;
            debug!(
                "Bucket {} overflowed into block {}",
                bucket,
                overflow.number()
            );

            tail = overflow;
            data = DataBlockHeader::empty();
        }

        let offset = DataBlockHeader::slot_offset(data.record_count);
        record.write_bytes(&mut tail.data_mut()[offset..offset + RECORD_SIZE]);
        data.record_count += 1;
        data.write_bytes(tail.data_mut());
        tail.set_dirty();
        trace!(
            "Inserted record {} into bucket {} at block {} slot {}",
            record.id(),
            bucket,
            tail.number(),
            data.record_count - 1
        );
        tail.release()?;
        Ok(())
    }

    /// Walks a chain to its last block and returns that block pinned
    fn find_tail(
        &self,
        file: FileId,
        header: &HashFileHeader,
        head: u32,
    ) -> Result<PinnedBlock<'_, S>> {
        let block_count = self.storage.block_count(file)?;
        header.check_chain_pointer(head, block_count)?;
        let mut current = PinnedBlock::fetch(&self.storage, file, head)?;
        let mut chain_len = 1;

        while let Some(next) = DataBlockHeader::read(current.data(), header)?.next {
            chain_len += 1;
            header.check_chain_pointer(next, block_count)?;
            header.check_chain_length(chain_len, block_count)?;
            current.release()?;
            current = PinnedBlock::fetch(&self.storage, file, next)?;
        }
        Ok(current)
    }

    /// Lazily walks the records of an open hash file
    ///
    /// With `id` set this is a point lookup: only the id's bucket is read and
    /// the walk stops at the first matching record. See [Entries].
    pub fn entries(&self, desc: IndexDesc, id: Option<i32>) -> Result<Entries<'_, S>> {
        let index = self.open_files.get(desc)?;
        let block_count = self.storage.block_count(index.file)?;
        Ok(Entries::new(
            &self.storage,
            index.file,
            index.header,
            block_count,
            id,
        ))
    }

    pub fn all_entries(&self, desc: IndexDesc) -> Result<Entries<'_, S>> {
        self.entries(desc, None)
    }

    /// First record with the given id, in chain order
    pub fn find_entry(&self, desc: IndexDesc, id: i32) -> Result<Record> {
        self.entries(desc, Some(id))?
            .next()
            .unwrap_or(Err(HashFileError::NotFound(id)))
    }

    /// Walks the directory and every chain, one block at a time
    pub fn statistics(&self, desc: IndexDesc) -> Result<HashStatistics> {
        let index = self.open_files.get(desc)?;
        let (file, header) = (index.file, index.header);
        let total_blocks = self.storage.block_count(file)?;

        let mut chains = Vec::with_capacity(header.depth() as usize);
        for head in self.read_directory(file, &header)? {
            chains.push(self.chain_summary(file, &header, head, total_blocks)?);
        }
        Ok(HashStatistics::from_chains(&header, total_blocks, &chains))
    }

    /// Head pointer of every bucket, in bucket order
    fn read_directory(&self, file: FileId, header: &HashFileHeader) -> Result<Vec<Option<u32>>> {
        let mut heads = Vec::with_capacity(header.depth() as usize);
        for number in 1..=header.directory_blocks() {
            let block = PinnedBlock::fetch(&self.storage, file, number)?;
            let directory = DirectoryBlock::from_bytes(block.data());
            block.release()?;

            let remaining = header.depth() as usize - heads.len();
            heads.extend(directory?.heads().iter().take(remaining));
        }
        Ok(heads)
    }

    fn chain_summary(
        &self,
        file: FileId,
        header: &HashFileHeader,
        head: Option<u32>,
        block_count: u32,
    ) -> Result<ChainSummary> {
        let mut summary = ChainSummary::default();
        let mut next = head;
        while let Some(number) = next {
            summary.blocks += 1;
            header.check_chain_pointer(number, block_count)?;
            header.check_chain_length(summary.blocks, block_count)?;

            let block = PinnedBlock::fetch(&self.storage, file, number)?;
            let data = DataBlockHeader::read(block.data(), header);
            block.release()?;

            let data = data?;
            summary.records += data.record_count as u64;
            next = data.next;
        }
        Ok(summary)
    }
}
