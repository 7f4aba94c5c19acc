use std::iter::FusedIterator;
use std::ops::Range;

use crate::block::{BlockStorage, FileId};
use crate::bytes::FromBytes;
use crate::consts::RECORD_SIZE;
use crate::error::{HashFileError, Result};
use crate::layout::{DataBlockHeader, DirectoryBlock, HashFileHeader};
use crate::pinned::PinnedBlock;
use crate::record::Record;

/// Position inside the data block currently being read
struct Cursor<'a, S: BlockStorage + ?Sized> {
    block: PinnedBlock<'a, S>,
    next: Option<u32>,
    slot: u32,
    count: u32,
    /// Blocks visited in the current chain, including this one
    chain_len: u32,
}

/// Lazy walk over the records of an open hash file
///
/// Buckets are visited in directory order, each chain from head to tail and
/// each block in slot order. At most one block is pinned at any point: the
/// directory block is decoded and released before a chain is entered, and a
/// data block is released before its successor is fetched.
///
/// Created by [crate::HashFile::entries]. With an id, only that id's bucket
/// is walked; the first matching record is yielded and the walk ends, or a
/// single [HashFileError::NotFound] is yielded if nothing matches. After an
/// error the iterator is exhausted.
pub struct Entries<'a, S: BlockStorage + ?Sized> {
    storage: &'a S,
    file: FileId,
    header: HashFileHeader,
    block_count: u32,
    target: Option<i32>,
    buckets: Range<u32>,
    directory: Option<(u32, DirectoryBlock)>,
    cursor: Option<Cursor<'a, S>>,
    finished: bool,
}

impl<'a, S: BlockStorage + ?Sized> Entries<'a, S> {
    pub(crate) fn new(
        storage: &'a S,
        file: FileId,
        header: HashFileHeader,
        block_count: u32,
        target: Option<i32>,
    ) -> Self {
        let buckets = match target {
            Some(id) => {
                let bucket = header.bucket_of(id);
                bucket..bucket + 1
            }
            None => 0..header.depth(),
        };
        Self {
            storage,
            file,
            header,
            block_count,
            target,
            buckets,
            directory: None,
            cursor: None,
            finished: false,
        }
    }

    fn head_of(&mut self, bucket: u32) -> Result<Option<u32>> {
        let (number, slot) = self.header.directory_slot(bucket);
        let cached = matches!(&self.directory, Some((cached, _)) if *cached == number);
        if !cached {
            let block = PinnedBlock::fetch(self.storage, self.file, number)?;
            let directory = DirectoryBlock::from_bytes(block.data());
            block.release()?;
            self.directory = Some((number, directory?));
        }
        Ok(self
            .directory
            .as_ref()
            .and_then(|(_, directory)| directory.head(slot)))
    }

    fn enter(&mut self, number: u32, chain_len: u32) -> Result<()> {
        self.header.check_chain_pointer(number, self.block_count)?;
        self.header.check_chain_length(chain_len, self.block_count)?;

        let block = PinnedBlock::fetch(self.storage, self.file, number)?;
        let data = DataBlockHeader::read(block.data(), &self.header)?;
        self.cursor = Some(Cursor {
            block,
            next: data.next,
            slot: 0,
            count: data.record_count,
            chain_len,
        });
        Ok(())
    }

    /// Next record of the current block, if any are left
    fn next_in_block(&mut self) -> Result<Option<Record>> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };
        if cursor.slot >= cursor.count {
            return Ok(None);
        }
        let offset = DataBlockHeader::slot_offset(cursor.slot);
        cursor.slot += 1;
        Record::from_bytes(&cursor.block.data()[offset..offset + RECORD_SIZE]).map(Some)
    }

    /// Releases the current block and moves to its successor. Returns false
    /// when there was no block or the chain has ended.
    fn advance_chain(&mut self) -> Result<bool> {
        let Some(cursor) = self.cursor.take() else {
            return Ok(false);
        };
        let (next, chain_len) = (cursor.next, cursor.chain_len);
        cursor.block.release()?;
        match next {
            Some(next) => {
                self.enter(next, chain_len + 1)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn step(&mut self) -> Result<Option<Record>> {
        loop {
            if let Some(record) = self.next_in_block()? {
                match self.target {
                    Some(id) if record.id() != id => continue,
                    Some(_) => {
                        self.finished = true;
                        if let Some(cursor) = self.cursor.take() {
                            cursor.block.release()?;
                        }
                        return Ok(Some(record));
                    }
                    None => return Ok(Some(record)),
                }
            }

            if self.advance_chain()? {
                continue;
            }

            match self.buckets.next() {
                Some(bucket) => {
                    if let Some(head) = self.head_of(bucket)? {
                        self.enter(head, 1)?;
                    }
                }
                None => {
                    return match self.target {
                        Some(id) => Err(HashFileError::NotFound(id)),
                        None => Ok(None),
                    };
                }
            }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.directory = None;
        // Dropping the guard releases a block still pinned after an error
        self.cursor = None;
    }
}

impl<S: BlockStorage + ?Sized> Iterator for Entries<'_, S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.step() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finish();
                None
            }
            Err(err) => {
                self.finish();
                Some(Err(err))
            }
        }
    }
}

impl<S: BlockStorage + ?Sized> FusedIterator for Entries<'_, S> {}
