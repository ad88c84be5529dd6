//! Types for the Etherscan-style ledger indexer

use crate::utils::quantity::{de_flag, de_opt_u64, de_u64, de_u128};
use serde::Deserialize;

/// keccak-256 of `Transfer(address,address,uint256)`, the ERC-20 transfer event signature.
pub const TRANSFER_EVENT_TOPIC: &str =
	"0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

/// Envelope of the `account`/`logs` module responses.
///
/// `status` is `"1"` on success. On failure `result` carries a human-readable reason,
/// except for empty lists where the indexer reports `"0"` with an empty array.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
	/// `"1"` for success, `"0"` otherwise.
	pub status: String,
	/// Short status text such as `OK`, `NOTOK` or `No transactions found`.
	pub message: String,
	/// Payload, or an error string when `status` is `"0"`.
	pub result: serde_json::Value,
}

/// Envelope of the `proxy` module responses, which mirror JSON-RPC.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
	pub result: Option<String>,
	pub error: Option<RpcErrorBody>,
}

/// JSON-RPC error object returned by the node behind the proxy.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorBody {
	pub code: i64,
	pub message: String,
}

/// Confirmed native transaction as returned by the `txlist` query.
///
/// Numeric fields arrive as decimal strings. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
	/// Block containing the transaction.
	#[serde(deserialize_with = "de_u64")]
	pub block_number: u64,
	/// Block timestamp in unix seconds.
	#[serde(rename = "timeStamp", deserialize_with = "de_u64")]
	pub timestamp: u64,
	/// Transferred value in wei.
	#[serde(deserialize_with = "de_u128")]
	pub value: u128,
	/// Sender address.
	pub from: String,
	/// Recipient address, empty for contract creation.
	#[serde(default)]
	pub to: String,
	/// Confirmations at the time of the query.
	#[serde(deserialize_with = "de_u64")]
	pub confirmations: u64,
	/// Transaction hash.
	pub hash: String,
	/// Sender sequence number.
	#[serde(deserialize_with = "de_u64")]
	pub nonce: u64,
	/// Gas price in wei.
	#[serde(default, deserialize_with = "de_u128")]
	pub gas_price: u128,
	/// Gas limit.
	#[serde(rename = "gas", default, deserialize_with = "de_u64")]
	pub gas_limit: u64,
	/// Gas actually consumed.
	#[serde(default, deserialize_with = "de_u64")]
	pub gas_used: u64,
	/// Execution reverted.
	#[serde(default, deserialize_with = "de_flag")]
	pub is_error: bool,
}

/// ERC-20 `Transfer` log entry as returned by the `getLogs` query.
///
/// `topics` holds the event signature followed by the zero-padded sender and recipient;
/// `data` holds the hex amount. Placeholders synthesized for just-submitted transfers have
/// `is_complete == false` and are never produced by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransferEvent {
	/// Token contract address.
	pub address: String,
	pub topics: Vec<String>,
	/// Hex-encoded transfer amount.
	pub data: String,
	#[serde(rename = "timeStamp", deserialize_with = "de_u64")]
	pub timestamp: u64,
	pub transaction_hash: String,
	#[serde(default, deserialize_with = "de_opt_u64")]
	pub block_number: Option<u64>,
	#[serde(skip, default = "default_complete")]
	pub is_complete: bool,
}

fn default_complete() -> bool {
	true
}

impl TokenTransferEvent {
	/// Build the pre-confirmation placeholder for a transfer this wallet just submitted.
	pub fn placeholder(
		contract: &str,
		from: &str,
		to: &str,
		amount: u128,
		timestamp: u64,
		transaction_hash: &str,
	) -> Self {
		Self {
			address: contract.to_lowercase(),
			topics: vec![
				TRANSFER_EVENT_TOPIC.to_string(),
				pad_address_topic(from),
				pad_address_topic(to),
			],
			data: format!("0x{:064x}", amount),
			timestamp,
			transaction_hash: transaction_hash.to_string(),
			block_number: None,
			is_complete: false,
		}
	}

	/// Sender address decoded from the second topic.
	pub fn sender(&self) -> Option<String> {
		self.topics.get(1).and_then(|t| address_from_topic(t))
	}

	/// Recipient address decoded from the third topic.
	pub fn recipient(&self) -> Option<String> {
		self.topics.get(2).and_then(|t| address_from_topic(t))
	}
}

/// Left-pad a 20-byte address to a 32-byte topic.
pub fn pad_address_topic(address: &str) -> String {
	let bare = address.trim_start_matches("0x").to_lowercase();
	format!("0x{:0>64}", bare)
}

/// Extract the address from a 32-byte topic (last 40 hex characters).
pub fn address_from_topic(topic: &str) -> Option<String> {
	let bare = topic.trim_start_matches("0x");
	if bare.len() < 40 {
		return None;
	}
	Some(format!("0x{}", bare[bare.len() - 40..].to_lowercase()))
}

/// Error types for indexer operations
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
	#[error("HTTP error: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("HTTP status {0}")]
	HttpStatus(u16),

	#[error("JSON parse error: {0}")]
	JsonError(#[from] serde_json::Error),

	#[error("Indexer API error: {0}")]
	ApiError(String),

	#[error("Node RPC error {code}: {message}")]
	RpcError { code: i64, message: String },

	#[error("Invalid quantity: {0}")]
	InvalidQuantity(String),

	#[error("No data returned")]
	NoData,
}

impl IndexerError {
	/// Whether repeating the same read query may succeed.
	pub fn is_transient(&self) -> bool {
		match self {
			IndexerError::HttpError(e) => !e.is_decode(),
			IndexerError::HttpStatus(status) => *status == 429 || *status >= 500,
			IndexerError::ApiError(message) => message.to_lowercase().contains("rate limit"),
			_ => false,
		}
	}
}
