//!
//! Transaction sender utilities.
//!
//! Provides a sender that signs a [`TransferRequest`] through the crypto collaborator and
//! broadcasts it through the [`LedgerClient`]. Submission is attempted exactly once.

use super::builder::TransactionError;
use super::crypto::{KeySource, LedgerCrypto, SignedTransaction, TransferRequest};
use crate::indexer::LedgerClient;
use crate::wallet::WalletError;

use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of a successful broadcast
#[derive(Debug, Clone)]
pub struct Submission {
	pub hash: String,
	pub signed: SignedTransaction,
}

/// Transaction sender for submitting transfers to the network
pub struct Sender {
	client: Arc<dyn LedgerClient>,
	crypto: Arc<dyn LedgerCrypto>,
	keys: Arc<dyn KeySource>,
}

impl Sender {
	/// Creates a new transaction sender
	pub fn new(
		client: Arc<dyn LedgerClient>,
		crypto: Arc<dyn LedgerCrypto>,
		keys: Arc<dyn KeySource>,
	) -> Self {
		Self {
			client,
			crypto,
			keys,
		}
	}

	pub fn crypto(&self) -> &Arc<dyn LedgerCrypto> {
		&self.crypto
	}

	/// Signs and broadcasts a transfer, returning its hash and serialized form
	pub async fn send_tx(&self, request: &TransferRequest) -> Result<Submission, WalletError> {
		let key = self.keys.private_key()?;
		let signed = self.crypto.build_and_sign(request, &key).map_err(|e| {
			error!("Failed to sign transaction: {}", e);
			WalletError::ConfigurationError(e.to_string())
		})?;
		let local_hash = self.crypto.raw_transaction_hash(&signed);
		debug!(
			"Signed transaction {} ({} bytes), nonce {}",
			local_hash,
			signed.raw.len(),
			request.nonce
		);

		let hash = self
			.client
			.submit_raw_transaction(&signed.to_hex())
			.await
			.map_err(|e| {
				error!("Failed to submit transaction {}: {}", local_hash, e);
				WalletError::from(e)
			})?;

		if !hash.eq_ignore_ascii_case(&local_hash) {
			warn!(
				"Node returned hash {} for locally hashed transaction {}",
				hash, local_hash
			);
		}
		info!("Transaction {} submitted", hash);

		Ok(Submission { hash, signed })
	}
}

impl From<TransactionError> for WalletError {
	fn from(error: TransactionError) -> Self {
		WalletError::ConfigurationError(error.to_string())
	}
}
