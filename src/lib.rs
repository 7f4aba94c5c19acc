//! Static hash file organization over a block storage layer
//!
//! A hash file keeps fixed size records in a fixed number of buckets. Block 0
//! holds the header, the blocks after it the bucket directory, and every
//! bucket owns a chain of data blocks that grows as records arrive.

pub mod block;
pub mod bytes;
pub mod config;
pub mod consts;
pub mod error;
pub mod file_storage;
pub mod hash_file;
pub mod layout;
pub mod open_table;
pub mod pinned;
pub mod record;
pub mod scan;
pub mod statistics;

mod command;
mod execute;
mod parse;
mod repl;
mod script;
mod setup;
mod stdin;


pub use block::{Block, BlockStorage, FileId};
pub use config::HashFileConfig;
pub use error::{BlockError, HashFileError, Result};
pub use file_storage::FileBlockStorage;
pub use hash_file::HashFile;
pub use layout::HashFileHeader;
pub use open_table::IndexDesc;
pub use record::Record;
pub use scan::Entries;
pub use statistics::HashStatistics;

pub use command::Command;
pub use repl::run_repl;
pub use script::process_script;
pub use setup::{setup_db, CliConfig};
pub use stdin::process_from_stdin;
