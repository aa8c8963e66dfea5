/// Account record: balance, credentials and history. Balance changes are
/// handled as commands that produce events, which are then applied.
pub mod account;

/// Parsing of user entered amounts into deposit and withdraw commands.
pub mod command;

/// File locations.
pub mod config;

/// Account numbers, national IDs and PIN hashing, plus their validation.
pub mod identity;

/// Append-only CSV log of every balance change, across all accounts.
pub mod journal;

/// Interactive menu, driven by any reader and writer so it can be
/// exercised from tests the same way as from a terminal.
pub mod session;

/// Account store and its snapshot persistence.
///
/// NOTE: the storage trait exists so tests can swap the JSON file for an
/// in-memory snapshot.
pub mod store;
