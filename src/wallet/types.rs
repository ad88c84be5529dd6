use crate::indexer::IndexerError;
use crate::wallet::metadata::TransactionMetadata;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a currency tracked by the wallet: the native asset or a token code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurrencyCode(String);

impl CurrencyCode {
	/// Code of the ledger's native asset.
	pub const NATIVE: &'static str = "ETH";

	pub fn native() -> Self {
		Self(Self::NATIVE.to_string())
	}

	pub fn new(code: &str) -> Self {
		Self(code.to_uppercase())
	}

	pub fn is_native(&self) -> bool {
		self.0 == Self::NATIVE
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for CurrencyCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for CurrencyCode {
	fn from(code: &str) -> Self {
		Self::new(code)
	}
}

/// Direction of a transaction relative to the wallet's own address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
	Sent,
	Received,
	/// Sender and recipient are both the wallet itself.
	Moved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
	/// Submitted locally, not yet seen in a confirmed fetch.
	Pending,
	Confirmed,
	/// Mined but reverted.
	Failed,
}

/// One entry of a currency's merged transaction view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTransaction {
	pub hash: String,
	pub currency: CurrencyCode,
	pub from: String,
	pub to: String,
	/// Amount in base units of `currency`.
	pub amount: u128,
	pub direction: Direction,
	pub status: TransactionStatus,
	/// Sender sequence number. Known for native transactions only.
	pub nonce: Option<u64>,
	pub block_number: Option<u64>,
	pub timestamp: u64,
	pub confirmations: u64,
	pub gas_price: Option<u128>,
	pub gas_limit: Option<u64>,
	pub gas_used: Option<u64>,
	pub metadata: Option<TransactionMetadata>,
}

impl WalletTransaction {
	pub fn is_pending(&self) -> bool {
		self.status == TransactionStatus::Pending
	}
}

/// Errors surfaced by the wallet engine
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
	#[error("Network failure: {0}")]
	NetworkFailure(String),

	#[error("Decode failure: {0}")]
	DecodeFailure(String),

	#[error("Submission rejected: {0}")]
	SubmissionRejected(String),

	#[error("Configuration error: {0}")]
	ConfigurationError(String),

	#[error("Identity unavailable: {0}")]
	IdentityUnavailable(String),

	#[error("Wallet has been wiped")]
	Wiped,
}

impl From<IndexerError> for WalletError {
	fn from(error: IndexerError) -> Self {
		match error {
			IndexerError::HttpError(ref e) if e.is_decode() => {
				WalletError::DecodeFailure(error.to_string())
			}
			IndexerError::HttpError(_) | IndexerError::HttpStatus(_) | IndexerError::ApiError(_) => {
				WalletError::NetworkFailure(error.to_string())
			}
			IndexerError::JsonError(_) | IndexerError::InvalidQuantity(_) | IndexerError::NoData => {
				WalletError::DecodeFailure(error.to_string())
			}
			IndexerError::RpcError { .. } => WalletError::SubmissionRejected(error.to_string()),
		}
	}
}
