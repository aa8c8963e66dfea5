use std::str::FromStr;

use rust_decimal::{Decimal, prelude::Zero};
use thiserror::Error;

use crate::account::TransactionKind;

/// A balance change requested by the user, with an amount that is already
/// known to be a positive number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionCommand {
    pub kind: TransactionKind,
    pub amount: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("`{input}` is not a number")]
    NotANumber { input: String },
    #[error("Amount must be positive for {kind}, got {amount}")]
    NotPositive { kind: TransactionKind, amount: Decimal },
}

impl TransactionCommand {
    pub fn deposit(amount: Decimal) -> Self {
        Self {
            kind: TransactionKind::Deposit,
            amount,
        }
    }

    pub fn withdraw(amount: Decimal) -> Self {
        Self {
            kind: TransactionKind::Withdraw,
            amount,
        }
    }

    pub fn parse(kind: TransactionKind, input: &str) -> Result<Self, AmountError> {
        let input = input.trim();
        let amount = Decimal::from_str(input)
            .or_else(|_| Decimal::from_scientific(input))
            .map_err(|_| AmountError::NotANumber {
                input: input.to_owned(),
            })?;
        if amount <= Decimal::zero() {
            return Err(AmountError::NotPositive { kind, amount });
        }
        Ok(Self { kind, amount })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::FromPrimitive;

    use super::*;

    #[test]
    fn parse_amounts() {
        let cmd = TransactionCommand::parse(TransactionKind::Deposit, "100").unwrap();
        assert_eq!(cmd, TransactionCommand::deposit(Decimal::from_u32(100).unwrap()));

        let cmd = TransactionCommand::parse(TransactionKind::Withdraw, " 40.25 ").unwrap();
        assert_eq!(cmd, TransactionCommand::withdraw(Decimal::new(4025, 2)));
    }

    #[test]
    fn parse_scientific_notation() {
        let cmd = TransactionCommand::parse(TransactionKind::Deposit, "1e3").unwrap();
        assert_eq!(cmd.amount, Decimal::from_u32(1000).unwrap());

        let cmd = TransactionCommand::parse(TransactionKind::Withdraw, "2.5e-1").unwrap();
        assert_eq!(cmd.amount, Decimal::new(25, 2));

        let err = TransactionCommand::parse(TransactionKind::Deposit, "1e").unwrap_err();
        assert!(matches!(err, AmountError::NotANumber { .. }));
        let err = TransactionCommand::parse(TransactionKind::Deposit, "-1e2").unwrap_err();
        assert!(matches!(err, AmountError::NotPositive { .. }));
    }

    #[test]
    fn reject_malformed_amounts() {
        let err = TransactionCommand::parse(TransactionKind::Deposit, "ten").unwrap_err();
        assert!(matches!(err, AmountError::NotANumber { .. }));
        assert_eq!(err.to_string(), "`ten` is not a number");

        let err = TransactionCommand::parse(TransactionKind::Deposit, "").unwrap_err();
        assert!(matches!(err, AmountError::NotANumber { .. }));

        let err = TransactionCommand::parse(TransactionKind::Withdraw, "0").unwrap_err();
        assert!(matches!(
            err,
            AmountError::NotPositive {
                kind: TransactionKind::Withdraw,
                ..
            }
        ));

        let err = TransactionCommand::parse(TransactionKind::Deposit, "-5").unwrap_err();
        assert_eq!(err.to_string(), "Amount must be positive for Deposit, got -5");
    }
}
