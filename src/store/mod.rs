use std::{collections::BTreeMap, io};

use chrono::{Local, NaiveDateTime, SubsecRound};
use rand::{Rng, rngs::ThreadRng};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    account::{Account, AccountError, TransactionEntry},
    command::TransactionCommand,
    config::Config,
    identity::{AccountNumber, Cnic, Pin},
    journal::{JournalError, TransactionLog},
};

pub mod in_memory_snapshot;
pub mod json_snapshot;

pub use in_memory_snapshot::InMemorySnapshot;
pub use json_snapshot::JsonSnapshot;

pub type Accounts = BTreeMap<AccountNumber, Account>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed account snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("Snapshot entry `{key}` holds account `{account_number}`")]
    KeyMismatch {
        key: String,
        account_number: String,
    },
    #[error(transparent)]
    Journal(#[from] JournalError),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("Account not found")]
    AccountNotFound,
    #[error("Incorrect password")]
    IncorrectPassword,
}

/// Where the full set of accounts is persisted. Every save replaces the
/// previous snapshot as a whole.
pub trait SnapshotStorage {
    fn load(&self) -> Result<Accounts, StoreError>;

    fn save(&mut self, accounts: &Accounts) -> Result<(), StoreError>;
}

/// Already validated input for [`AccountStore::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub address: String,
    pub cnic: Cnic,
    pub pin: Pin,
}

/// Owns every account and is the only way to change one. Each mutation is
/// persisted to the snapshot and, for balance changes, to the transaction log
/// before the call returns.
pub struct AccountStore<S, R = ThreadRng> {
    accounts: Accounts,
    storage: S,
    journal: TransactionLog,
    rng: R,
}

impl AccountStore<JsonSnapshot> {
    /// Opens the files named by `config`. A malformed snapshot is an error.
    pub fn open(config: &Config) -> Result<Self, StoreError> {
        let journal = TransactionLog::open(&config.transactions_path)?;
        Self::with_rng(
            JsonSnapshot::new(&config.accounts_path),
            journal,
            rand::thread_rng(),
        )
    }
}

impl<S, R> AccountStore<S, R>
where
    S: SnapshotStorage,
    R: Rng,
{
    pub fn with_rng(storage: S, journal: TransactionLog, rng: R) -> Result<Self, StoreError> {
        let accounts = storage.load()?;
        info!(accounts = accounts.len(), "Loaded accounts");
        Ok(Self {
            accounts,
            storage,
            journal,
            rng,
        })
    }

    pub fn get(&self, account_number: &str) -> Option<&Account> {
        self.accounts.get(account_number)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn save(&mut self) -> Result<(), StoreError> {
        self.storage.save(&self.accounts)
    }

    pub fn create_account(&mut self, new_account: NewAccount) -> Result<&Account, StoreError> {
        let account_number = self.unused_account_number();
        let account = Account::new(
            account_number.clone(),
            new_account.username,
            new_account.address,
            new_account.cnic,
            new_account.pin.hash(),
        );
        self.accounts.insert(account_number.clone(), account);

        if let Err(err) = self.save() {
            self.accounts.remove(&account_number);
            return Err(err);
        }

        info!(account = %account_number, "Created account");
        Ok(&self.accounts[&account_number])
    }

    pub fn login(&self, account_number: &str, pin: &str) -> Result<&Account, LoginError> {
        let account = self
            .accounts
            .get(account_number)
            .ok_or(LoginError::AccountNotFound)?;
        if !account.password().matches(pin) {
            debug!(account = %account_number, "Rejected login");
            return Err(LoginError::IncorrectPassword);
        }
        Ok(account)
    }

    pub fn deposit(
        &mut self,
        account_number: &str,
        amount: Decimal,
    ) -> Result<TransactionEntry, StoreError> {
        self.execute(account_number, &TransactionCommand::deposit(amount))
    }

    pub fn withdraw(
        &mut self,
        account_number: &str,
        amount: Decimal,
    ) -> Result<TransactionEntry, StoreError> {
        self.execute(account_number, &TransactionCommand::withdraw(amount))
    }

    /// Applies `command` to the account, appends the log row and saves the
    /// snapshot. A rejected command writes nothing.
    pub fn execute(
        &mut self,
        account_number: &str,
        command: &TransactionCommand,
    ) -> Result<TransactionEntry, StoreError> {
        let account = self
            .accounts
            .get_mut(account_number)
            .ok_or_else(|| StoreError::AccountNotFound(account_number.to_owned()))?;

        let event = account.handle(command)?;
        let entry = account.apply(event, now());
        self.journal.append(account, &entry)?;
        self.storage.save(&self.accounts)?;

        info!(
            account = %account_number,
            kind = %entry.kind,
            amount = %entry.amount,
            balance = %entry.balance,
            "Recorded transaction"
        );
        Ok(entry)
    }

    fn unused_account_number(&mut self) -> AccountNumber {
        loop {
            let candidate = AccountNumber::generate(&mut self.rng);
            if !self.accounts.contains_key(&candidate) {
                return candidate;
            }
            debug!(account = %candidate, "Account number taken, drawing another");
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}
