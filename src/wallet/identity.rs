//! Account identity: primary address and Wallet ID.
//!
//! The Wallet ID is a short, verbally-recitable fingerprint of the primary address that the
//! user can quote to associated systems. It is derived as follows:
//! 1. take the address without its `0x` prefix,
//! 2. SHA-256 its UTF-8 bytes and keep the first 10 bytes,
//! 3. base-32 encode (RFC 4648, no padding) and lowercase,
//! 4. split into 4-character groups joined by a single space.

use crate::transaction::Address;
use crate::wallet::WalletError;

use itertools::Itertools;
use sha2::{Digest, Sha256};
use sha3::Keccak256;

const WALLET_ID_DIGEST_BYTES: usize = 10;
const WALLET_ID_GROUP: usize = 4;

/// Derive the Wallet ID for `address`. Returns `None` when the address is empty.
pub fn derive_wallet_id(address: &str) -> Option<String> {
	let bare = address.strip_prefix("0x").unwrap_or(address);
	if bare.is_empty() {
		return None;
	}

	let digest = Sha256::digest(bare.as_bytes());
	let encoded = base32::encode(
		base32::Alphabet::RFC4648 { padding: false },
		&digest[..WALLET_ID_DIGEST_BYTES],
	)
	.to_lowercase();

	let groups = encoded.chars().chunks(WALLET_ID_GROUP);
	let wallet_id = groups
		.into_iter()
		.map(|group| group.collect::<String>())
		.join(" ");
	Some(wallet_id)
}

/// The wallet's account. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
	public_key: Option<Vec<u8>>,
	address: Address,
	wallet_id: Option<String>,
}

impl Account {
	/// Build an account from a secp256k1 public key, either 65 bytes uncompressed
	/// (`0x04` prefix) or the 64-byte raw form.
	pub fn from_public_key(public_key: &[u8]) -> Result<Self, WalletError> {
		let raw = match public_key.len() {
			65 if public_key[0] == 0x04 => &public_key[1..],
			64 => public_key,
			len => {
				return Err(WalletError::IdentityUnavailable(format!(
					"unsupported public key length {len}"
				)));
			}
		};

		let hash = Keccak256::digest(raw);
		let address = Address::from_bytes(&hash[12..])
			.map_err(|e| WalletError::IdentityUnavailable(e.to_string()))?;

		Ok(Self::with_address(Some(public_key.to_vec()), address))
	}

	/// Build a watch-only account for a known address.
	pub fn watch_only(address: &str) -> Result<Self, WalletError> {
		let address =
			Address::parse(address).map_err(|e| WalletError::IdentityUnavailable(e.to_string()))?;
		Ok(Self::with_address(None, address))
	}

	fn with_address(public_key: Option<Vec<u8>>, address: Address) -> Self {
		let wallet_id = derive_wallet_id(address.as_str());
		Self {
			public_key,
			address,
			wallet_id,
		}
	}

	pub fn public_key(&self) -> Option<&[u8]> {
		self.public_key.as_deref()
	}

	/// Primary address, lowercase `0x` hex.
	pub fn address(&self) -> &str {
		self.address.as_str()
	}

	pub fn primary_address(&self) -> &Address {
		&self.address
	}

	pub fn wallet_id(&self) -> Option<&str> {
		self.wallet_id.as_deref()
	}

	/// Case-insensitive comparison against the primary address.
	pub fn is_own_address(&self, address: &str) -> bool {
		self.address.matches(address)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::RngCore;

	fn assert_wallet_id_shape(id: &str) {
		let groups: Vec<&str> = id.split(' ').collect();
		assert_eq!(groups.len(), 4, "16 base-32 characters make four groups: {id}");
		for group in groups {
			assert_eq!(group.len(), 4);
			assert!(
				group
					.chars()
					.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
			);
		}
	}

	#[test]
	fn wallet_id_is_deterministic_and_grouped() {
		let address = "0x8fb4cb96f7c15f9c39b3854595733f728e1963bc";
		let first = derive_wallet_id(address).expect("wallet id");
		let second = derive_wallet_id(address).expect("wallet id");
		assert_eq!(first, second);
		assert_wallet_id_shape(&first);
	}

	#[test]
	fn wallet_id_ignores_prefix_only() {
		let with_prefix = derive_wallet_id("0x8fb4cb96f7c15f9c39b3854595733f728e1963bc");
		let without_prefix = derive_wallet_id("8fb4cb96f7c15f9c39b3854595733f728e1963bc");
		assert_eq!(with_prefix, without_prefix);
		assert_ne!(
			with_prefix,
			derive_wallet_id("0x8fb4cb96f7c15f9c39b3854595733f728e1963bd")
		);
	}

	#[test]
	fn wallet_id_unavailable_for_empty_address() {
		assert_eq!(derive_wallet_id(""), None);
		assert_eq!(derive_wallet_id("0x"), None);
	}

	#[test]
	fn random_addresses_always_produce_well_formed_ids() {
		let mut rng = rand::rng();
		for _ in 0..64 {
			let mut bytes = [0u8; 20];
			rng.fill_bytes(&mut bytes);
			let address = format!("0x{}", hex::encode(bytes));
			let id = derive_wallet_id(&address).expect("wallet id");
			assert_wallet_id_shape(&id);
		}
	}

	#[test]
	fn derives_address_from_public_key() {
		// secp256k1 generator point, whose address is well known
		let public_key = hex::decode(concat!(
			"04",
			"79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
			"483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
		))
		.expect("hex");
		let account = Account::from_public_key(&public_key).expect("account");
		assert_eq!(account.address(), "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
		assert!(account.is_own_address("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"));
		assert!(account.wallet_id().is_some());
	}

	#[test]
	fn rejects_malformed_public_key() {
		let error = Account::from_public_key(&[0u8; 33]).unwrap_err();
		assert!(matches!(error, WalletError::IdentityUnavailable(_)));
	}
}
