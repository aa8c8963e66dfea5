use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    account::{TransactionKind, to_cents},
    command::TransactionCommand,
    identity::{AccountNumber, Cnic, Pin},
    store::{AccountStore, LoginError, NewAccount, SnapshotStorage, StoreError},
};

/// The user closed standard input.
#[derive(Debug, Error)]
#[error("input closed")]
struct InputClosed;

/// Interactive menu over any line based input and any output.
pub struct Session<S, G, R, W> {
    pub store: AccountStore<S, G>,
    pub input: R,
    pub output: W,
}

impl<S, G, R, W> Session<S, G, R, W>
where
    S: SnapshotStorage,
    G: Rng,
    R: BufRead,
    W: Write,
{
    /// Runs until the user exits or input ends. Errors are persistence or
    /// terminal failures; everything the user can fix is reported inline.
    pub fn run(&mut self) -> Result<()> {
        match self.main_menu() {
            Err(err) if err.is::<InputClosed>() => {
                debug!("Input closed, ending session");
                Ok(())
            }
            result => result,
        }
    }

    fn main_menu(&mut self) -> Result<()> {
        loop {
            writeln!(self.output, "\n====== BANK SYSTEM MENU ======")?;
            writeln!(self.output, "1. Create New Account")?;
            writeln!(self.output, "2. Login to Existing Account")?;
            writeln!(self.output, "3. Exit")?;

            match self.prompt("Choose an option: ")?.as_str() {
                "1" => {
                    let account_number = self.create_account()?;
                    self.account_menu(&account_number)?;
                }
                "2" => {
                    if let Some(account_number) = self.login()? {
                        self.account_menu(&account_number)?;
                    }
                }
                "3" => {
                    writeln!(self.output, "\nThank you for banking with us. Goodbye!")?;
                    return Ok(());
                }
                _ => writeln!(self.output, "Invalid option. Please try again.")?,
            }
        }
    }

    fn create_account(&mut self) -> Result<AccountNumber> {
        writeln!(self.output, "\n--- Create New Account ---")?;
        let username = self.prompt("Enter your name: ")?;
        let address = self.prompt("Enter your address: ")?;

        let cnic = loop {
            let input = self.prompt("Enter your 13-digit CNIC (numbers only): ")?;
            match Cnic::parse(&input) {
                Ok(cnic) => break cnic,
                Err(err) => writeln!(self.output, "{err}.")?,
            }
        };

        let pin = loop {
            let pin = self.prompt("Set a 4-digit numeric password: ")?;
            let confirmation = self.prompt("Confirm password: ")?;
            match Pin::parse(&pin, &confirmation) {
                Ok(pin) => break pin,
                Err(err) => writeln!(self.output, "{err}. Try again.")?,
            }
        };

        let account = self
            .store
            .create_account(NewAccount {
                username,
                address,
                cnic,
                pin,
            })
            .context("Failed to save new account")?;

        writeln!(
            self.output,
            "\nAccount created! Your account number is {}",
            account.account_number()
        )?;
        Ok(account.account_number().clone())
    }

    fn login(&mut self) -> Result<Option<AccountNumber>> {
        writeln!(self.output, "\n--- Login to Your Account ---")?;
        let account_number = self.prompt("Enter your account number: ")?;
        if self.store.get(&account_number).is_none() {
            writeln!(self.output, "{}.", LoginError::AccountNotFound)?;
            return Ok(None);
        }

        let pin = self.prompt("Enter your password: ")?;
        match self.store.login(&account_number, &pin) {
            Ok(account) => {
                writeln!(self.output, "\nWelcome back, {}!", account.username())?;
                Ok(Some(account.account_number().clone()))
            }
            Err(err) => {
                warn!(account = %account_number, "Failed login attempt");
                writeln!(self.output, "{err}.")?;
                Ok(None)
            }
        }
    }

    fn account_menu(&mut self, account_number: &AccountNumber) -> Result<()> {
        loop {
            writeln!(self.output, "\n--- Account Menu ---")?;
            writeln!(self.output, "1. Deposit")?;
            writeln!(self.output, "2. Withdraw")?;
            writeln!(self.output, "3. Mini Statement")?;
            writeln!(self.output, "4. Logout")?;

            match self.prompt("Select option: ")?.as_str() {
                "1" => self.transact(
                    account_number,
                    TransactionKind::Deposit,
                    "Enter amount to deposit: ",
                )?,
                "2" => self.transact(
                    account_number,
                    TransactionKind::Withdraw,
                    "Enter amount to withdraw: ",
                )?,
                "3" => self.print_statement(account_number)?,
                "4" => {
                    writeln!(self.output, "\nLogged out of account {account_number}.")?;
                    return Ok(());
                }
                _ => writeln!(self.output, "Invalid option.")?,
            }
        }
    }

    fn transact(
        &mut self,
        account_number: &AccountNumber,
        kind: TransactionKind,
        prompt: &str,
    ) -> Result<()> {
        let input = self.prompt(prompt)?;
        let command = match TransactionCommand::parse(kind, &input) {
            Ok(command) => command,
            Err(err) => {
                writeln!(self.output, "Invalid amount. {err}.")?;
                return Ok(());
            }
        };

        match self.store.execute(account_number.as_str(), &command) {
            Ok(entry) => {
                writeln!(
                    self.output,
                    "\n{} {} successfully.",
                    entry.amount,
                    entry.kind.past_tense()
                )?;
                writeln!(self.output, "New Balance: {:.2}", to_cents(entry.balance))?;
            }
            Err(StoreError::Account(err)) => writeln!(self.output, "\n{err}.")?,
            Err(err) => return Err(err).context("Failed to record transaction"),
        }
        Ok(())
    }

    fn print_statement(&mut self, account_number: &AccountNumber) -> Result<()> {
        let account = self
            .store
            .get(account_number.as_str())
            .with_context(|| format!("Account {account_number} is missing from the store"))?;
        writeln!(self.output)?;
        write!(self.output, "{}", account.mini_statement())?;
        Ok(())
    }

    /// Prints `text` and reads one trimmed line.
    fn prompt(&mut self, text: &str) -> Result<String> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(InputClosed.into());
        }
        Ok(line.trim().to_owned())
    }
}
