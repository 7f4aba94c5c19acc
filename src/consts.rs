pub const BLOCK_SIZE: usize = 512;

pub const INT_SIZE: usize = 4;

/// The first five bytes of block 0, `"hash"` plus its NUL terminator
pub const HASH_FILE_MARKER: &[u8; 5] = b"hash\0";

pub const HEADER_DEPTH_OFFSET: usize = 5;

pub const HEADER_RECORDS_PER_BLOCK_OFFSET: usize = 9;

/// Legacy copy of records per block, written at creation and never read back
pub const HEADER_LEGACY_OFFSET: usize = BLOCK_SIZE - 2 * INT_SIZE;

pub const BUCKETS_PER_BLOCK: usize = BLOCK_SIZE / INT_SIZE;

pub const DATA_BLOCK_HEADER_SIZE: usize = 2 * INT_SIZE;

pub const NAME_LEN: usize = 15;

pub const SURNAME_LEN: usize = 20;

pub const CITY_LEN: usize = 20;

/// id, the three text fields and one byte of trailing padding
pub const RECORD_SIZE: usize = INT_SIZE + NAME_LEN + SURNAME_LEN + CITY_LEN + 1;

pub const RECORDS_PER_BLOCK: usize = (BLOCK_SIZE - DATA_BLOCK_HEADER_SIZE) / RECORD_SIZE;

/// On disk marker for an empty bucket or the end of a chain
pub const NO_BLOCK: i32 = -1;

pub const DEFAULT_MAX_OPEN_FILES: usize = 20;
