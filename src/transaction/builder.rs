//! Transfer request builder
//!
//! Collects the parameters of a native or token transfer and validates them into a
//! [`TransferRequest`] ready for the crypto collaborator.

use super::address::Address;
use super::crypto::{TokenHandle, TransferAsset, TransferRequest};

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransactionError {
	#[error("Transaction validation error: {0}")]
	ValidationError(String),

	#[error("Missing transaction field: {0}")]
	MissingField(&'static str),
}

/// Builder for constructing transfer requests
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
	asset: TransferAsset,
	to: Option<String>,
	amount: Option<u128>,
	gas_price: Option<u128>,
	gas_limit: Option<u64>,
	nonce: Option<u64>,
	chain_id: u64,
}

impl TransactionBuilder {
	/// Creates a builder for a native transfer
	pub fn native() -> Self {
		Self {
			asset: TransferAsset::Native,
			to: None,
			amount: None,
			gas_price: None,
			gas_limit: None,
			nonce: None,
			chain_id: 1,
		}
	}

	/// Creates a builder for a token transfer through the given contract handle
	pub fn token(handle: TokenHandle) -> Self {
		Self {
			asset: TransferAsset::Token(handle),
			..Self::native()
		}
	}

	/// Sets the recipient
	pub fn with_recipient(mut self, to: &str) -> Self {
		self.to = Some(to.to_string());
		self
	}

	/// Sets the amount in base units
	pub fn with_amount(mut self, amount: u128) -> Self {
		self.amount = Some(amount);
		self
	}

	pub fn with_gas_price(mut self, gas_price: u128) -> Self {
		self.gas_price = Some(gas_price);
		self
	}

	pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
		self.gas_limit = Some(gas_limit);
		self
	}

	pub fn with_nonce(mut self, nonce: u64) -> Self {
		self.nonce = Some(nonce);
		self
	}

	pub fn with_chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = chain_id;
		self
	}

	/// Builds the final request
	pub fn build(self) -> Result<TransferRequest, TransactionError> {
		let to = self.to.ok_or(TransactionError::MissingField("to"))?;
		let to = Address::parse(&to).map_err(|e| {
			log::error!("Invalid recipient {}: {}", to, e);
			TransactionError::ValidationError(format!("invalid recipient {to}: {e}"))
		})?;
		let amount = self.amount.ok_or(TransactionError::MissingField("amount"))?;
		let gas_price = self
			.gas_price
			.ok_or(TransactionError::MissingField("gas_price"))?;
		let gas_limit = self
			.gas_limit
			.ok_or(TransactionError::MissingField("gas_limit"))?;
		let nonce = self.nonce.ok_or(TransactionError::MissingField("nonce"))?;

		if gas_limit == 0 {
			return Err(TransactionError::ValidationError(
				"gas limit must be positive".to_string(),
			));
		}

		log::info!(
			"Built {} transfer request: nonce {}, gas price {}, gas limit {}",
			match &self.asset {
				TransferAsset::Native => "native",
				TransferAsset::Token(_) => "token",
			},
			nonce,
			gas_price,
			gas_limit
		);

		Ok(TransferRequest {
			asset: self.asset,
			to: to.as_str().to_string(),
			amount,
			gas_price,
			gas_limit,
			nonce,
			chain_id: self.chain_id,
		})
	}
}

impl Default for TransactionBuilder {
	fn default() -> Self {
		Self::native()
	}
}
