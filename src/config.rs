use std::path::{Path, PathBuf};

pub const DEFAULT_ACCOUNTS_PATH: &str = "accounts.json";
pub const DEFAULT_TRANSACTIONS_PATH: &str = "transactions.csv";

/// Locations of the two files the bank persists to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub accounts_path: PathBuf,
    pub transactions_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accounts_path: PathBuf::from(DEFAULT_ACCOUNTS_PATH),
            transactions_path: PathBuf::from(DEFAULT_TRANSACTIONS_PATH),
        }
    }
}

impl Config {
    /// Default file names, placed under `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            accounts_path: dir.join(DEFAULT_ACCOUNTS_PATH),
            transactions_path: dir.join(DEFAULT_TRANSACTIONS_PATH),
        }
    }
}
