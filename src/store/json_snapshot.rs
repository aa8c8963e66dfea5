use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use tracing::debug;

use super::{Accounts, SnapshotStorage, StoreError};

/// Accounts snapshot kept as pretty printed JSON, keyed by account number.
///
/// Saves go to a temporary file in the same directory which is then renamed
/// over the snapshot, so an interrupted save leaves the previous one intact.
#[derive(Debug)]
pub struct JsonSnapshot {
    path: PathBuf,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl SnapshotStorage for JsonSnapshot {
    fn load(&self) -> Result<Accounts, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No snapshot yet, starting empty");
                return Ok(Accounts::new());
            }
            Err(err) => return Err(err.into()),
        };
        let accounts: Accounts = serde_json::from_reader(BufReader::new(file))?;

        for (key, account) in &accounts {
            if key != account.account_number() {
                return Err(StoreError::KeyMismatch {
                    key: key.to_string(),
                    account_number: account.account_number().to_string(),
                });
            }
        }
        Ok(accounts)
    }

    fn save(&mut self, accounts: &Accounts) -> Result<(), StoreError> {
        let mut tmp = NamedTempFile::new_in(self.dir())?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            let mut serializer =
                serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
            accounts.serialize(&mut serializer)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;

        debug!(path = %self.path.display(), accounts = accounts.len(), "Saved snapshot");
        Ok(())
    }
}
