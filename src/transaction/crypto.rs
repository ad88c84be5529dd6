//! Seam to the ledger crypto collaborator.
//!
//! Signing, RLP and ABI encoding live outside this crate. The wallet hands a fully
//! parameterized [`TransferRequest`] to a [`LedgerCrypto`] implementation and gets back the
//! serialized signed transaction.

use std::fmt;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::wallet::WalletError;

#[derive(Error, Debug)]
pub enum CryptoError {
	#[error("Signing failed: {0}")]
	SigningFailed(String),

	#[error("Unknown token contract: {0}")]
	UnknownToken(String),
}

/// Opaque on-chain handle of a token known to the crypto collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHandle {
	pub contract: String,
	pub decimals: u32,
}

/// What a transfer moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferAsset {
	Native,
	Token(TokenHandle),
}

/// Fully parameterized, unsigned transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
	pub asset: TransferAsset,
	pub to: String,
	/// Amount in base units of the asset.
	pub amount: u128,
	pub gas_price: u128,
	pub gas_limit: u64,
	pub nonce: u64,
	pub chain_id: u64,
}

/// Serialized signed transaction.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	pub raw: Vec<u8>,
}

impl SignedTransaction {
	/// `0x`-prefixed hex form accepted by `eth_sendRawTransaction`.
	pub fn to_hex(&self) -> String {
		format!("0x{}", hex::encode(&self.raw))
	}
}

impl fmt::Debug for SignedTransaction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SignedTransaction({} bytes)", self.raw.len())
	}
}

/// Private signing key handed to the crypto collaborator for one send.
///
/// The key bytes are zeroed when the value is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(pub [u8; 32]);

impl fmt::Debug for PrivateKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("PrivateKey(<redacted>)")
	}
}

/// External ledger crypto collaborator. Pure, synchronous and trusted.
pub trait LedgerCrypto: Send + Sync {
	/// Resolve the on-chain handle for a token contract.
	///
	/// Returns [`CryptoError::UnknownToken`] when the collaborator has no handle for it.
	fn token_handle(&self, contract: &str) -> Result<TokenHandle, CryptoError>;

	/// Construct, sign and serialize a transaction.
	fn build_and_sign(
		&self,
		request: &TransferRequest,
		key: &PrivateKey,
	) -> Result<SignedTransaction, CryptoError>;

	/// Canonical hash of a signed transaction, `0x`-prefixed.
	fn raw_transaction_hash(&self, signed: &SignedTransaction) -> String;
}

/// Source of the account's private key, consulted once per send.
pub trait KeySource: Send + Sync {
	fn private_key(&self) -> Result<PrivateKey, WalletError>;
}
