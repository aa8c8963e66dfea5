use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use toy_bank::{
    config::{Config, DEFAULT_ACCOUNTS_PATH, DEFAULT_TRANSACTIONS_PATH},
    session::Session,
    store::AccountStore,
};
use tracing_subscriber::EnvFilter;

/// Interactive command-line bank: create an account, log in, deposit,
/// withdraw and review a mini statement.
#[derive(Parser, Debug)]
#[command(name = "toy-bank", version, about)]
struct Args {
    /// Accounts snapshot file
    #[arg(long, default_value = DEFAULT_ACCOUNTS_PATH)]
    accounts: PathBuf,

    /// Transaction log file
    #[arg(long, default_value = DEFAULT_TRANSACTIONS_PATH)]
    transactions: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = Config {
        accounts_path: args.accounts,
        transactions_path: args.transactions,
    };

    let store = AccountStore::open(&config).with_context(|| {
        format!(
            "Failed to load accounts from `{}`",
            config.accounts_path.display()
        )
    })?;

    let mut session = Session {
        store,
        input: io::stdin().lock(),
        output: io::stdout(),
    };
    session.run()
}
