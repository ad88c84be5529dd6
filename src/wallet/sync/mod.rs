//! Wallet Synchronization Module
//!
//! This module provides the logic that keeps a wallet's view of the ledger current. It is
//! composed of several submodules, each responsible for a specific aspect of the sync process:
//!
//! - `scheduler`: Admission of refresh cycles; skips timer ticks and coalesces requests while a cycle runs.
//! - `refresh`: The five concurrent fetches of a cycle and how each result is applied.
//! - `events`: Sync event types and handler traits for notifying the presentation layer.
//! - `progress_tracker`: Records fetch outcomes and summarizes each cycle.
//! - `pending`: Locally submitted records awaiting confirmation.
//! - `reconciler`: Merges pending and confirmed records into one view per currency.
//! - `transaction_processor`: Decodes wire and pending records into view entries.

/// Event system for decoupled communication during sync
pub mod events;
/// Pending transaction tracking
pub mod pending;
/// Tracks refresh cycle outcomes and statistics
pub mod progress_tracker;
/// Pending/confirmed merge
pub mod reconciler;
/// Fetches of a single refresh cycle
pub(crate) mod refresh;
/// Refresh cycle admission state machine
pub mod scheduler;
/// Decoding of records into view entries
pub mod transaction_processor;

pub use events::{EventDispatcher, FetchKind, LoggingEventHandler, SyncEvent, SyncEventHandler};
pub use pending::{PendingEntry, PendingTransaction, PendingTransactionTracker};
pub use progress_tracker::{CycleProgressTracker, CycleStats};
pub use scheduler::{Admission, RefreshTrigger, SyncScheduler};
