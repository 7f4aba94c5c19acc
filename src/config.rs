use crate::consts::DEFAULT_MAX_OPEN_FILES;

/// Settings for a [crate::HashFile] context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashFileConfig {
    /// Capacity of the open file table
    pub max_open_files: usize,
}

impl Default for HashFileConfig {
    fn default() -> Self {
        Self {
            max_open_files: DEFAULT_MAX_OPEN_FILES,
        }
    }
}

impl HashFileConfig {
    pub fn with_max_open_files(mut self, max_open_files: usize) -> Self {
        self.max_open_files = max_open_files;
        self
    }
}
