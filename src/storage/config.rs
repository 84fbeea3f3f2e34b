use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_LEDGER_FILE: &str = "expenses.csv";

/// Where the ledger lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub data_dir: PathBuf,
    pub file_name: String,
}

impl LedgerConfig {
    pub fn new(data_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            file_name: file_name.into(),
        }
    }

    /// Config for the default file name inside `data_dir`.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(data_dir, DEFAULT_LEDGER_FILE)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR, DEFAULT_LEDGER_FILE)
    }
}
