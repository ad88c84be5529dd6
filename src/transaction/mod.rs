/// Account address parsing and normalization
pub mod address;
/// Transfer request builder
pub mod builder;
/// Seam to the ledger crypto collaborator
pub mod crypto;
/// Signing and broadcasting of transfers
pub mod sender;

pub use address::{Address, AddressError};
pub use builder::{TransactionBuilder, TransactionError};
pub use crypto::{
	CryptoError, KeySource, LedgerCrypto, PrivateKey, SignedTransaction, TokenHandle,
	TransferAsset, TransferRequest,
};
pub use sender::{Sender, Submission};

/// Number of decimal places of the native asset (wei per ether).
pub const NATIVE_DECIMALS: u32 = 18;

/// Gas limit for a plain native transfer.
pub const NATIVE_TRANSFER_GAS_LIMIT: u64 = 48_000;

/// Gas limit for an ERC-20 `transfer` call.
pub const TOKEN_TRANSFER_GAS_LIMIT: u64 = 92_000;
