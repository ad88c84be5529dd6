//! Transaction synchronization and pending-transaction reconciliation for an account-based
//! wallet.
//!
//! A [`wallet::WalletManager`] polls an Etherscan-compatible indexer through the
//! [`indexer::LedgerClient`] seam, merges locally submitted transactions with confirmed
//! history, allocates nonces for new sends and keeps per-currency views for the
//! presentation layer.

pub mod config;
pub mod indexer;
pub mod transaction;
pub mod utils;
pub mod wallet;

pub use config::WalletConfig;
pub use wallet::{WalletError, WalletManager};
