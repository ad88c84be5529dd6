use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
	#[error("address must start with '0x'")]
	MissingPrefix,
	#[error("address must be 20 bytes, got {0}")]
	InvalidLength(usize),
	#[error("address is not valid hex: {0}")]
	InvalidHex(String),
}

/// Account address, stored as lowercase `0x`-prefixed hex.
///
/// Mixed-case checksummed input is accepted; comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
	pub const LEN: usize = 20;

	pub fn parse(encoded: &str) -> Result<Self, AddressError> {
		let encoded = encoded.trim();
		let bare = encoded
			.strip_prefix("0x")
			.or_else(|| encoded.strip_prefix("0X"))
			.ok_or(AddressError::MissingPrefix)?;
		let bytes = hex::decode(bare).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
		Self::from_bytes(&bytes)
	}

	pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
		if bytes.len() != Self::LEN {
			return Err(AddressError::InvalidLength(bytes.len()));
		}
		Ok(Self(format!("0x{}", hex::encode(bytes))))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Case-insensitive match against an address string in any casing.
	pub fn matches(&self, other: &str) -> bool {
		self.0.eq_ignore_ascii_case(other.trim())
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse() {
		let address = Address::parse("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf")
			.expect("Failed while parsing address");
		assert_eq!(address.as_str(), "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
		assert!(address.matches("0x7E5F4552091A69125D5DFCB7B8C2659029395BDF"));
	}

	#[test]
	fn test_parse_rejects_malformed() {
		assert_eq!(
			Address::parse("7e5f4552091a69125d5dfcb7b8c2659029395bdf"),
			Err(AddressError::MissingPrefix)
		);
		assert_eq!(Address::parse("0x1234"), Err(AddressError::InvalidLength(2)));
		assert!(matches!(
			Address::parse("0xzz5f4552091a69125d5dfcb7b8c2659029395bdf"),
			Err(AddressError::InvalidHex(_))
		));
	}
}
