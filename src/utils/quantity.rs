//! Quantity parsing for indexer payloads.
//!
//! Etherscan-style APIs return numbers as strings, decimal in `account` module responses
//! and `0x`-prefixed hex in `proxy`/`logs` responses. The serde helpers accept both.

use serde::{Deserialize, Deserializer, de::Error as _};

/// Parse a decimal or `0x`-prefixed hex quantity. An empty string or bare `0x` is zero.
pub fn parse_quantity(value: &str) -> Result<u128, String> {
	let value = value.trim();
	if let Some(hex_digits) = value
		.strip_prefix("0x")
		.or_else(|| value.strip_prefix("0X"))
	{
		let digits = hex_digits.trim_start_matches('0');
		if digits.is_empty() {
			return Ok(0);
		}
		return u128::from_str_radix(digits, 16)
			.map_err(|e| format!("invalid hex quantity {value:?}: {e}"));
	}
	if value.is_empty() {
		return Ok(0);
	}
	value
		.parse::<u128>()
		.map_err(|e| format!("invalid decimal quantity {value:?}: {e}"))
}

/// Same as [`parse_quantity`] but bounded to `u64` (block numbers, nonces, timestamps).
pub fn parse_quantity_u64(value: &str) -> Result<u64, String> {
	let quantity = parse_quantity(value)?;
	u64::try_from(quantity).map_err(|_| format!("quantity {value:?} does not fit in u64"))
}

pub(crate) fn de_u128<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;
	parse_quantity(&raw).map_err(D::Error::custom)
}

pub(crate) fn de_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;
	parse_quantity_u64(&raw).map_err(D::Error::custom)
}

pub(crate) fn de_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<String>::deserialize(deserializer)?;
	match raw {
		Some(raw) if !raw.trim().is_empty() => {
			parse_quantity_u64(&raw).map(Some).map_err(D::Error::custom)
		}
		_ => Ok(None),
	}
}

/// Etherscan encodes `isError` as `"0"`/`"1"`.
pub(crate) fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;
	Ok(raw.trim() == "1")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_decimal_and_hex() {
		assert_eq!(parse_quantity("1000"), Ok(1000));
		assert_eq!(parse_quantity("0x3e8"), Ok(1000));
		assert_eq!(parse_quantity("0x"), Ok(0));
		assert_eq!(parse_quantity(""), Ok(0));
		assert_eq!(
			parse_quantity("0x0000000000000000000000000000000000000000000000000de0b6b3a7640000"),
			Ok(1_000_000_000_000_000_000)
		);
	}

	#[test]
	fn rejects_garbage_and_overflow() {
		assert!(parse_quantity("12ab").is_err());
		assert!(parse_quantity("0xzz").is_err());
		assert!(parse_quantity_u64("0x1ffffffffffffffff").is_err());
	}
}
