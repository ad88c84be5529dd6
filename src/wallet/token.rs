use serde::{Deserialize, Serialize};

use crate::wallet::CurrencyCode;

/// ERC-20 token tracked by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	pub name: String,
	/// Currency code, unique within the wallet's token set.
	pub code: String,
	pub symbol: String,
	/// Contract address, lowercase `0x` hex.
	pub address: String,
	pub decimals: u32,
	/// Identifier of the contract ABI understood by the crypto collaborator.
	pub abi: String,
}

impl Token {
	pub fn new(name: &str, code: &str, symbol: &str, address: &str, decimals: u32) -> Self {
		Self {
			name: name.to_string(),
			code: code.to_uppercase(),
			symbol: symbol.to_string(),
			address: address.to_lowercase(),
			decimals,
			abi: "erc20".to_string(),
		}
	}

	pub fn currency(&self) -> CurrencyCode {
		CurrencyCode::new(&self.code)
	}
}
