mod config;
mod ledger_store;

pub use config::*;
pub use ledger_store::*;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Header record of every ledger file, in fixed column order.
pub const LEDGER_HEADER: [&str; 4] = ["date", "amount", "category", "note"];

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The append failed and so did cutting the file back; the ledger may end
    /// in a partial record.
    #[error(
        "Failed to append to {}: {source}; rolling back the partial record also failed: {rollback}",
        .path.display()
    )]
    PartialAppend {
        path: PathBuf,
        #[source]
        source: io::Error,
        rollback: io::Error,
    },

    #[error("Failed to encode ledger record: {0}")]
    Encode(#[from] csv::Error),

    #[error("corrupt ledger at line {line}: {reason}")]
    Corrupt { line: u64, reason: String },
}

impl StorageError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
