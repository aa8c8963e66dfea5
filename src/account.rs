use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    command::TransactionCommand,
    identity::{AccountNumber, Cnic, PasswordHash},
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rounds to whole cents with ties away from zero, as balances are shown to
/// the user. Stored values keep their full precision.
pub fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Withdraw,
}

impl TransactionKind {
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Deposit => "deposited",
            Self::Withdraw => "withdrawn",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => f.write_str("Deposit"),
            Self::Withdraw => f.write_str("Withdraw"),
        }
    }
}

/// One line of account history. `balance` is the balance right after the
/// transaction was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EntryRecord", into = "EntryRecord")]
pub struct TransactionEntry {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub balance: Decimal,
    pub timestamp: NaiveDateTime,
}

/// On disk an entry is a 4 element array: `[type, amount, balance, timestamp]`.
#[derive(Serialize, Deserialize)]
struct EntryRecord(
    TransactionKind,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")] Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")] Decimal,
    #[serde(with = "timestamp")] NaiveDateTime,
);

impl From<EntryRecord> for TransactionEntry {
    fn from(EntryRecord(kind, amount, balance, timestamp): EntryRecord) -> Self {
        Self {
            kind,
            amount,
            balance,
            timestamp,
        }
    }
}

impl From<TransactionEntry> for EntryRecord {
    fn from(entry: TransactionEntry) -> Self {
        Self(entry.kind, entry.amount, entry.balance, entry.timestamp)
    }
}

mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(de::Error::custom)
    }
}

/// Validated outcome of a [`TransactionCommand`], ready to be applied.
#[derive(Debug, PartialEq, Eq)]
pub struct AccountEvent {
    kind: TransactionKind,
    amount: Decimal,
    balance: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },
    #[error("Balance overflow while applying {kind} of {amount}")]
    Overflow {
        kind: TransactionKind,
        amount: Decimal,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    username: String,
    address: String,
    cnic: Cnic,
    password: PasswordHash,
    account_number: AccountNumber,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    balance: Decimal,
    #[serde(default)]
    transactions: Vec<TransactionEntry>,
}

impl Account {
    pub fn new(
        account_number: AccountNumber,
        username: String,
        address: String,
        cnic: Cnic,
        password: PasswordHash,
    ) -> Self {
        Self {
            username,
            address,
            cnic,
            password,
            account_number,
            balance: Decimal::ZERO,
            transactions: Vec::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn cnic(&self) -> &Cnic {
        &self.cnic
    }

    pub fn password(&self) -> &PasswordHash {
        &self.password
    }

    pub fn account_number(&self) -> &AccountNumber {
        &self.account_number
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn transactions(&self) -> &[TransactionEntry] {
        &self.transactions
    }

    /// Checks `command` against the current balance without changing anything.
    pub fn handle(&self, command: &TransactionCommand) -> Result<AccountEvent, AccountError> {
        let amount = command.amount;
        let balance = match command.kind {
            TransactionKind::Deposit => self.balance.checked_add(amount),
            TransactionKind::Withdraw => {
                if amount > self.balance {
                    return Err(AccountError::InsufficientFunds {
                        requested: amount,
                        available: self.balance,
                    });
                }
                self.balance.checked_sub(amount)
            }
        }
        .ok_or(AccountError::Overflow {
            kind: command.kind,
            amount,
        })?;

        Ok(AccountEvent {
            kind: command.kind,
            amount,
            balance,
        })
    }

    /// Applies a previously handled event and records it in the history.
    pub fn apply(&mut self, event: AccountEvent, timestamp: NaiveDateTime) -> TransactionEntry {
        self.balance = event.balance;
        let entry = TransactionEntry {
            kind: event.kind,
            amount: event.amount,
            balance: self.balance,
            timestamp,
        };
        self.transactions.push(entry.clone());
        entry
    }

    pub fn deposit(
        &mut self,
        amount: Decimal,
        timestamp: NaiveDateTime,
    ) -> Result<TransactionEntry, AccountError> {
        let event = self.handle(&TransactionCommand::deposit(amount))?;
        Ok(self.apply(event, timestamp))
    }

    pub fn withdraw(
        &mut self,
        amount: Decimal,
        timestamp: NaiveDateTime,
    ) -> Result<TransactionEntry, AccountError> {
        let event = self.handle(&TransactionCommand::withdraw(amount))?;
        Ok(self.apply(event, timestamp))
    }

    pub fn mini_statement(&self) -> Statement<'_> {
        Statement { account: self }
    }
}

/// Full history of one account, oldest first.
pub struct Statement<'a> {
    account: &'a Account,
}

impl<'a> Statement<'a> {
    pub fn entries(&self) -> &'a [TransactionEntry] {
        self.account.transactions()
    }
}

impl fmt::Display for Statement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Mini Statement for {} (Account: {}):",
            self.account.username, self.account.account_number
        )?;
        for entry in self.entries() {
            writeln!(
                f,
                "{} | {} | Amount: {} | Balance: {:.2}",
                entry.timestamp.format(TIMESTAMP_FORMAT),
                entry.kind,
                entry.amount,
                to_cents(entry.balance)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::prelude::FromPrimitive;

    use super::*;
    use crate::identity::Pin;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn new_account() -> Account {
        Account::new(
            AccountNumber::parse("ACC123456").unwrap(),
            "Ayesha".to_string(),
            "12 Mall Road".to_string(),
            Cnic::parse("1234567890123").unwrap(),
            Pin::parse("1234", "1234").unwrap().hash(),
        )
    }

    #[test]
    fn deposit_and_withdraw() {
        let mut acc = new_account();
        assert_eq!(acc.balance(), Decimal::ZERO);

        let entry = acc
            .deposit(Decimal::from_u32(100).unwrap(), at(10, 0, 0))
            .unwrap();
        assert_eq!(entry.kind, TransactionKind::Deposit);
        assert_eq!(entry.balance, Decimal::from_u32(100).unwrap());
        assert_eq!(acc.balance(), Decimal::from_u32(100).unwrap());

        let err = acc
            .withdraw(Decimal::from_u32(150).unwrap(), at(10, 1, 0))
            .unwrap_err();
        assert!(matches!(err, AccountError::InsufficientFunds { .. }));
        assert_eq!(
            err.to_string(),
            "Insufficient balance: requested 150, available 100"
        );
        assert_eq!(acc.balance(), Decimal::from_u32(100).unwrap());
        assert_eq!(acc.transactions().len(), 1);

        let entry = acc
            .withdraw(Decimal::from_u32(40).unwrap(), at(10, 2, 0))
            .unwrap();
        assert_eq!(entry.kind, TransactionKind::Withdraw);
        assert_eq!(entry.balance, Decimal::from_u32(60).unwrap());
        assert_eq!(acc.balance(), Decimal::from_u32(60).unwrap());

        let kinds: Vec<_> = acc.mini_statement().entries().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![TransactionKind::Deposit, TransactionKind::Withdraw]);
    }

    #[test]
    fn withdraw_whole_balance() {
        let mut acc = new_account();
        acc.deposit(Decimal::new(1050, 2), at(9, 0, 0)).unwrap();
        let entry = acc.withdraw(Decimal::new(1050, 2), at(9, 0, 1)).unwrap();
        assert_eq!(entry.balance, Decimal::ZERO);
    }

    #[test]
    fn handle_does_not_mutate() {
        let acc = new_account();
        let event = acc
            .handle(&TransactionCommand::deposit(Decimal::from_u32(5).unwrap()))
            .unwrap();
        assert_eq!(event.balance, Decimal::from_u32(5).unwrap());
        assert_eq!(acc.balance(), Decimal::ZERO);
        assert!(acc.transactions().is_empty());
    }

    #[test]
    fn deposit_overflow_is_an_error() {
        let mut acc = new_account();
        acc.deposit(Decimal::MAX, at(9, 0, 0)).unwrap();
        let err = acc.deposit(Decimal::MAX, at(9, 0, 1)).unwrap_err();
        assert!(matches!(err, AccountError::Overflow { .. }));
        assert_eq!(acc.balance(), Decimal::MAX);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut acc = new_account();
        acc.deposit(Decimal::new(10050, 2), at(8, 30, 0)).unwrap();
        acc.withdraw(Decimal::new(2525, 2), at(8, 31, 15)).unwrap();

        let json = serde_json::to_value(&acc).unwrap();
        assert_eq!(json["cnic"], "1234567890123");
        assert_eq!(json["balance"], 75.25);
        let first = &json["transactions"][0];
        assert_eq!(first[0], "Deposit");
        assert_eq!(first[1], 100.5);
        assert_eq!(first[2], 100.5);
        assert_eq!(first[3], "2024-03-01 08:30:00");

        let restored: Account = serde_json::from_value(json).unwrap();
        assert_eq!(restored, acc);
        assert!(restored.password().matches("1234"));
    }

    #[test]
    fn snapshot_keeps_every_digit() {
        let mut acc = new_account();
        let amount = Decimal::from_str_exact("1234567890.123456789").unwrap();
        acc.deposit(amount, at(8, 30, 0)).unwrap();

        let text = serde_json::to_string(&acc).unwrap();
        assert!(text.contains("1234567890.123456789"));
        let restored: Account = serde_json::from_str(&text).unwrap();
        assert_eq!(restored.balance(), amount);
        assert_eq!(restored.transactions()[0].amount, amount);
        assert_eq!(restored.transactions()[0].balance, amount);

        let mut acc = new_account();
        acc.deposit(Decimal::MAX, at(8, 30, 0)).unwrap();
        let text = serde_json::to_string(&acc).unwrap();
        assert!(text.contains("79228162514264337593543950335"));
        let restored: Account = serde_json::from_str(&text).unwrap();
        assert_eq!(restored.balance(), Decimal::MAX);
        assert_eq!(restored, acc);
    }

    #[test]
    fn load_legacy_record() {
        let json = r#"{
            "username": "Bilal",
            "address": "Street 4",
            "cnic": 4210112345671,
            "password": "03ac674216f3e15c761ee1a5e255f067953623c8b388b4459e13f978d7c846f4",
            "account_number": "ACC654321",
            "balance": 60.0,
            "transactions": [
                ["Deposit", 100.0, 100.0, "2024-01-05 09:00:00"],
                ["Withdraw", 40.0, 60.0, "2024-01-05 09:05:00"]
            ]
        }"#;
        let acc: Account = serde_json::from_str(json).unwrap();
        assert_eq!(acc.cnic().as_str(), "4210112345671");
        assert_eq!(acc.balance(), Decimal::from_u32(60).unwrap());
        assert_eq!(acc.transactions()[1].kind, TransactionKind::Withdraw);
        assert_eq!(acc.transactions()[1].balance, Decimal::from_u32(60).unwrap());
    }

    #[test]
    fn statement_text() {
        let mut acc = new_account();
        acc.deposit(Decimal::from_u32(100).unwrap(), at(10, 0, 0)).unwrap();
        acc.withdraw(Decimal::from_u32(40).unwrap(), at(10, 2, 0)).unwrap();
        assert_eq!(
            acc.mini_statement().to_string(),
            "Mini Statement for Ayesha (Account: ACC123456):\n\
             2024-03-01 10:00:00 | Deposit | Amount: 100 | Balance: 100.00\n\
             2024-03-01 10:02:00 | Withdraw | Amount: 40 | Balance: 60.00\n"
        );
    }

    #[test]
    fn statement_rounds_half_cents_up() {
        let mut acc = new_account();
        acc.deposit(Decimal::new(5, 3), at(10, 0, 0)).unwrap();
        acc.deposit(Decimal::new(10, 3), at(10, 0, 1)).unwrap();
        assert_eq!(
            acc.mini_statement().to_string(),
            "Mini Statement for Ayesha (Account: ACC123456):\n\
             2024-03-01 10:00:00 | Deposit | Amount: 0.005 | Balance: 0.01\n\
             2024-03-01 10:00:01 | Deposit | Amount: 0.010 | Balance: 0.02\n"
        );
        assert_eq!(acc.balance(), Decimal::new(15, 3));
        assert_eq!(to_cents(Decimal::new(-125, 3)), Decimal::new(-13, 2));
    }
}
