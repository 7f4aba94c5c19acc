//! Error types for the block layer and the hash file operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::block::FileId;
use crate::open_table::IndexDesc;

#[derive(Error, Debug)]
pub enum BlockError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("File handle {0} is not open")]
    InvalidFile(FileId),

    #[error("Block {number} out of range for file {file} with {count} blocks")]
    BlockOutOfRange { file: FileId, number: u32, count: u32 },

    #[error("Block {number} of file {file} is not pinned")]
    NotPinned { file: FileId, number: u32 },

    #[error("File {file} still has {count} pinned blocks")]
    PinnedBlocks { file: FileId, count: u32 },

    #[error("File {path:?} has length {len} which is not a whole number of blocks")]
    MisalignedFile { path: PathBuf, len: u64 },

    #[error("File {path:?} is already open")]
    AlreadyOpen { path: PathBuf },
}

#[derive(Error, Debug)]
pub enum HashFileError {
    #[error("Not a hash file: {0}")]
    Format(String),

    #[error("Hash file {0} is already open")]
    AlreadyOpen(String),

    #[error("Open file table is full ({capacity} files)")]
    Capacity { capacity: usize },

    #[error("There is no open file at index {0}")]
    InvalidHandle(IndexDesc),

    #[error("Block storage error: {0}")]
    Io(#[from] BlockError),

    #[error("There is no record with id = {0}")]
    NotFound(i32),

    #[error("Invalid depth {0}: must be between 1 and {max}", max = i32::MAX)]
    InvalidDepth(u32),

    #[error("Field {field} is invalid: {reason}")]
    RecordField { field: &'static str, reason: String },

    #[error("Corrupted hash file: {0}")]
    Corrupted(String),
}

pub type Result<T> = std::result::Result<T, HashFileError>;
