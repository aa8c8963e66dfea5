use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use csv::WriterBuilder;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::account::{Account, TIMESTAMP_FORMAT, TransactionEntry, TransactionKind};

pub const HEADER: [&str; 6] = [
    "Account Number",
    "Username",
    "Type",
    "Amount",
    "Balance",
    "Timestamp",
];

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Failed to open transaction log: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to write transaction log: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct LogRow<'a> {
    account_number: &'a str,
    username: &'a str,
    kind: TransactionKind,
    amount: String,
    balance: String,
    timestamp: String,
}

/// Append-only CSV audit trail shared by every account. Never read back.
#[derive(Debug)]
pub struct TransactionLog {
    path: PathBuf,
}

impl TransactionLog {
    /// Creates the file with its header row if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let log = Self { path: path.into() };
        log.open_for_append()?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, account: &Account, entry: &TransactionEntry) -> Result<(), JournalError> {
        let file = self.open_for_append()?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.serialize(LogRow {
            account_number: account.account_number().as_str(),
            username: account.username(),
            kind: entry.kind,
            amount: entry.amount.to_string(),
            balance: entry.balance.to_string(),
            timestamp: entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        })?;
        writer.flush()?;
        debug!(
            account = %account.account_number(),
            kind = %entry.kind,
            "Appended transaction log row"
        );
        Ok(())
    }

    fn open_for_append(&self) -> Result<File, JournalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if file.metadata()?.len() == 0 {
            let mut writer = WriterBuilder::new().from_writer(&file);
            writer.write_record(HEADER)?;
            writer.flush()?;
            debug!(path = %self.path.display(), "Created transaction log");
        }
        Ok(file)
    }
}
