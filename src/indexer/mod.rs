//! Indexer integration module for the account-based ledger
//!
//! This module defines the [`LedgerClient`] seam the wallet polls for balances, transaction
//! history and block height, together with an Etherscan-compatible HTTP implementation.
//! Every query is keyed by address and may fail independently.

/// HTTP client for Etherscan-compatible indexers
mod client;
/// Type definitions for indexer data structures
mod types;

pub use client::{EtherscanIndexerClient, IndexerClientConfig};
pub use types::*;

use crate::wallet::Token;

/// Async request/response API of the remote ledger-indexing service.
///
/// Implementations own their timeouts; a timed-out query is reported as an error like any
/// other failure.
#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync {
	/// Native balance of `address` in wei.
	async fn get_balance(&self, address: &str) -> Result<u128, IndexerError>;

	/// Confirmed native transactions touching `address`.
	async fn get_transaction_list(&self, address: &str)
	-> Result<Vec<RawTransaction>, IndexerError>;

	/// Balance of `token` held by `address`, in the token's base units.
	async fn get_token_balance(&self, address: &str, token: &Token) -> Result<u128, IndexerError>;

	/// Confirmed `Transfer` events of `token` where `address` is sender or recipient.
	async fn get_token_transaction_list(
		&self,
		address: &str,
		token: &Token,
	) -> Result<Vec<TokenTransferEvent>, IndexerError>;

	/// Current chain height.
	async fn get_latest_block_number(&self) -> Result<u64, IndexerError>;

	/// Broadcast a signed, `0x`-prefixed hex transaction and return its hash.
	async fn submit_raw_transaction(&self, hex_payload: &str) -> Result<String, IndexerError>;
}
