use super::{Accounts, SnapshotStorage, StoreError};

/// Keeps the last saved snapshot in memory and counts saves.
#[derive(Debug, Default)]
pub struct InMemorySnapshot {
    pub accounts: Accounts,
    pub saves: usize,
}

impl SnapshotStorage for InMemorySnapshot {
    fn load(&self) -> Result<Accounts, StoreError> {
        Ok(self.accounts.clone())
    }

    fn save(&mut self, accounts: &Accounts) -> Result<(), StoreError> {
        self.accounts = accounts.clone();
        self.saves += 1;
        Ok(())
    }
}
