use std::path::PathBuf;

use tracing::debug;

use crate::config::HashFileConfig;
use crate::consts::DEFAULT_MAX_OPEN_FILES;
use crate::file_storage::FileBlockStorage;
use crate::hash_file::HashFile;

const DEFAULT_DATA_DIR: &str = ".";

/// Settings of the command line front end
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Relative file names in commands are resolved against this directory
    pub data_dir: PathBuf,
    pub max_open_files: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            max_open_files: DEFAULT_MAX_OPEN_FILES,
        }
    }
}

/// Returns the hash file context the front end runs commands against
pub fn setup_db(config: &CliConfig) -> std::io::Result<HashFile<FileBlockStorage>> {
    std::fs::create_dir_all(&config.data_dir)?;
    debug!(
        "Using data directory {:?} with {} open file slots",
        config.data_dir, config.max_open_files
    );
    let storage = FileBlockStorage::with_root(&config.data_dir);
    let hash_config = HashFileConfig::default().with_max_open_files(config.max_open_files);
    Ok(HashFile::with_config(storage, hash_config))
}
