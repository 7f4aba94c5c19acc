/// On-disk structures of a hash file
///
/// ## File layout
/// - Block 0 is the header, see [HashFileHeader]
/// - Blocks `1..=directory_blocks` hold the bucket directory, see [DirectoryBlock]
/// - Every later block is a data block of some bucket's chain, see [DataBlockHeader]
///
/// All integers are little endian i32. `-1` marks an empty bucket and the end
/// of a chain; in memory that is `None`.
use crate::bytes::{read_i32, write_i32, ByteLength, FromBytes, IntoBytes};
use crate::consts::*;
use crate::error::HashFileError;

fn decode_pointer(raw: i32, what: &str) -> Result<Option<u32>, HashFileError> {
    match raw {
        NO_BLOCK => Ok(None),
        n if n >= 0 => Ok(Some(n as u32)),
        n => Err(HashFileError::Corrupted(format!("{what} holds {n}"))),
    }
}

fn encode_pointer(pointer: Option<u32>) -> i32 {
    pointer.map_or(NO_BLOCK, |n| n as i32)
}

fn check_len(bytes: &[u8], expected: usize, what: &str) -> Result<(), HashFileError> {
    if bytes.len() < expected {
        return Err(HashFileError::Corrupted(format!(
            "{what} of {} bytes, expected {expected}",
            bytes.len()
        )));
    }
    Ok(())
}

/// Block 0 of a hash file
///
/// ## Binary layout
/// - `[0,5)` the marker `"hash\0"`
/// - `[5,9)` depth, the number of buckets
/// - `[9,13)` records per data block
/// - the last 8 bytes start with a second copy of records per block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashFileHeader {
    depth: u32,
    records_per_block: u32,
}

impl HashFileHeader {
    /// Header for a new file with `depth` buckets
    pub fn new(depth: u32) -> Result<Self, HashFileError> {
        if depth == 0 || depth > i32::MAX as u32 {
            return Err(HashFileError::InvalidDepth(depth));
        }
        Ok(Self {
            depth,
            records_per_block: RECORDS_PER_BLOCK as u32,
        })
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn records_per_block(&self) -> u32 {
        self.records_per_block
    }

    /// Number of blocks after block 0 taken by the directory
    pub fn directory_blocks(&self) -> u32 {
        self.depth.div_ceil(BUCKETS_PER_BLOCK as u32)
    }

    /// Static hash of a record id, always in `0..depth`
    pub fn bucket_of(&self, id: i32) -> u32 {
        (id as i64).rem_euclid(self.depth as i64) as u32
    }

    /// The directory block holding `bucket` and the slot within it
    pub fn directory_slot(&self, bucket: u32) -> (u32, usize) {
        let per_block = BUCKETS_PER_BLOCK as u32;
        (bucket / per_block + 1, (bucket % per_block) as usize)
    }

    /// True for block numbers that may belong to a bucket chain
    pub fn is_data_block(&self, number: u32) -> bool {
        number > self.directory_blocks()
    }

    /// Checks a head or next pointer read from disk before following it
    pub fn check_chain_pointer(&self, number: u32, block_count: u32) -> Result<(), HashFileError> {
        if !self.is_data_block(number) || number >= block_count {
            return Err(HashFileError::Corrupted(format!(
                "chain points at block {number}, data blocks are {}..{block_count}",
                self.directory_blocks() + 1
            )));
        }
        Ok(())
    }

    /// A chain can never hold more blocks than the file does
    pub fn check_chain_length(&self, length: u32, block_count: u32) -> Result<(), HashFileError> {
        if length > block_count {
            return Err(HashFileError::Corrupted(
                "bucket chain does not terminate".to_string(),
            ));
        }
        Ok(())
    }
}

impl ByteLength for HashFileHeader {
    const BYTE_LEN: usize = BLOCK_SIZE;
}

impl IntoBytes for HashFileHeader {
    fn write_bytes(&self, buf: &mut [u8]) {
        buf[..BLOCK_SIZE].fill(0);
        buf[..HASH_FILE_MARKER.len()].copy_from_slice(HASH_FILE_MARKER);
        write_i32(buf, HEADER_DEPTH_OFFSET, self.depth as i32);
        write_i32(buf, HEADER_RECORDS_PER_BLOCK_OFFSET, self.records_per_block as i32);
        write_i32(buf, HEADER_LEGACY_OFFSET, self.records_per_block as i32);
    }
}

impl FromBytes for HashFileHeader {
    type Error = HashFileError;

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() < BLOCK_SIZE || &bytes[..HASH_FILE_MARKER.len()] != HASH_FILE_MARKER {
            return Err(HashFileError::Format("missing hash file marker".to_string()));
        }

        let depth = read_i32(bytes, HEADER_DEPTH_OFFSET);
        if depth <= 0 {
            return Err(HashFileError::Corrupted(format!("depth {depth}")));
        }

        let records_per_block = read_i32(bytes, HEADER_RECORDS_PER_BLOCK_OFFSET);
        if records_per_block <= 0 || records_per_block as usize > RECORDS_PER_BLOCK {
            return Err(HashFileError::Corrupted(format!(
                "{records_per_block} records per block"
            )));
        }

        Ok(Self {
            depth: depth as u32,
            records_per_block: records_per_block as u32,
        })
    }
}

/// One block of the bucket directory: head block pointers, one per bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryBlock {
    heads: Vec<Option<u32>>,
}

impl DirectoryBlock {
    /// A block with every bucket empty
    pub fn empty() -> Self {
        Self {
            heads: vec![None; BUCKETS_PER_BLOCK],
        }
    }

    pub fn head(&self, slot: usize) -> Option<u32> {
        self.heads.get(slot).copied().flatten()
    }

    pub fn heads(&self) -> &[Option<u32>] {
        &self.heads
    }

    /// Reads a single slot without decoding the whole block
    pub fn read_head(bytes: &[u8], slot: usize) -> Result<Option<u32>, HashFileError> {
        decode_pointer(read_i32(bytes, slot * INT_SIZE), "directory slot")
    }

    pub fn write_head(bytes: &mut [u8], slot: usize, head: Option<u32>) {
        write_i32(bytes, slot * INT_SIZE, encode_pointer(head));
    }
}

impl ByteLength for DirectoryBlock {
    const BYTE_LEN: usize = BUCKETS_PER_BLOCK * INT_SIZE;
}

impl IntoBytes for DirectoryBlock {
    fn write_bytes(&self, buf: &mut [u8]) {
        for (slot, head) in self.heads.iter().enumerate() {
            Self::write_head(buf, slot, *head);
        }
    }
}

impl FromBytes for DirectoryBlock {
    type Error = HashFileError;

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        check_len(bytes, Self::BYTE_LEN, "directory block")?;
        let heads = (0..BUCKETS_PER_BLOCK)
            .map(|slot| Self::read_head(bytes, slot))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { heads })
    }
}

/// Header at the start of every data block, followed by the record slots
///
/// ## Binary layout
/// - `[0,4)` next block in the chain, `-1` for the tail
/// - `[4,8)` number of records in use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataBlockHeader {
    pub next: Option<u32>,
    pub record_count: u32,
}

impl DataBlockHeader {
    /// Header of a freshly allocated tail block
    pub fn empty() -> Self {
        Self {
            next: None,
            record_count: 0,
        }
    }

    /// Decodes and checks the header against the file's block capacity
    pub fn read(bytes: &[u8], header: &HashFileHeader) -> Result<Self, HashFileError> {
        let data = Self::from_bytes(bytes)?;
        if data.record_count > header.records_per_block() {
            return Err(HashFileError::Corrupted(format!(
                "data block holds {} records, capacity is {}",
                data.record_count,
                header.records_per_block()
            )));
        }
        Ok(data)
    }

    pub fn is_full(&self, header: &HashFileHeader) -> bool {
        self.record_count >= header.records_per_block()
    }

    /// Byte offset of a record slot within a data block
    pub fn slot_offset(slot: u32) -> usize {
        DATA_BLOCK_HEADER_SIZE + slot as usize * RECORD_SIZE
    }
}

impl ByteLength for DataBlockHeader {
    const BYTE_LEN: usize = DATA_BLOCK_HEADER_SIZE;
}

impl IntoBytes for DataBlockHeader {
    fn write_bytes(&self, buf: &mut [u8]) {
        write_i32(buf, 0, encode_pointer(self.next));
        write_i32(buf, INT_SIZE, self.record_count as i32);
    }
}

impl FromBytes for DataBlockHeader {
    type Error = HashFileError;

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        check_len(bytes, Self::BYTE_LEN, "data block header")?;
        let next = decode_pointer(read_i32(bytes, 0), "next block pointer")?;
        let record_count = read_i32(bytes, INT_SIZE);
        if record_count < 0 {
            return Err(HashFileError::Corrupted(format!(
                "negative record count {record_count}"
            )));
        }
        Ok(Self {
            next,
            record_count: record_count as u32,
        })
    }
}
