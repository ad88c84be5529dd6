//! Account wallet: identity, token set, sync state and the send path.

pub mod gas;
pub mod identity;
pub mod manager;
pub mod metadata;
pub mod nonce;
pub mod state;
pub mod sync;
pub mod token;
pub mod types;

pub use gas::GasPolicy;
pub use identity::{Account, derive_wallet_id};
pub use manager::{WalletManager, WalletManagerBuilder};
pub use metadata::{
	FileMetadataStore, InMemoryMetadataStore, MetadataError, MetadataStore, TransactionMetadata,
};
pub use state::WalletSyncState;
pub use sync::{
	CycleStats, FetchKind, LoggingEventHandler, PendingEntry, PendingTransaction, SyncEvent,
	SyncEventHandler,
};
pub use token::Token;
pub use types::*;
