//! Wallet manager: the entry point of the presentation layer.
//!
//! Owns the account, the token set, pending state and per-currency sync state, and exposes
//! send, refresh and snapshot operations. All mutable state sits behind one async lock; a
//! second lock serializes sends so nonce allocation and the pending insert of one send never
//! interleave with another.

use crate::config::WalletConfig;
use crate::indexer::{LedgerClient, TokenTransferEvent};
use crate::transaction::{KeySource, LedgerCrypto, Sender, TransactionBuilder, TransferRequest};
use crate::wallet::identity::Account;
use crate::wallet::metadata::{InMemoryMetadataStore, MetadataStore};
use crate::wallet::state::{WalletInner, WalletSyncState};
use crate::wallet::sync::events::{EventDispatcher, SyncEvent, SyncEventHandler};
use crate::wallet::sync::pending::{PendingEntry, PendingTransaction};
use crate::wallet::sync::refresh;
use crate::wallet::sync::scheduler::{Admission, RefreshTrigger, SyncScheduler};
use crate::wallet::{CurrencyCode, Token, WalletError};

use chrono::Utc;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Shared core of a [`WalletManager`], also held by background refresh tasks.
pub(crate) struct WalletCore {
	pub account: Account,
	pub client: Arc<dyn LedgerClient>,
	/// `None` for watch-only wallets.
	pub signer: Option<Sender>,
	pub metadata: Arc<dyn MetadataStore>,
	pub state: Mutex<WalletInner>,
	pub send_lock: Mutex<()>,
	pub scheduler: SyncScheduler,
	pub events: EventDispatcher,
	pub config: WalletConfig,
}

impl WalletCore {
	pub async fn is_alive(&self) -> bool {
		self.state.lock().await.alive
	}

	/// Request a refresh, spawning the cycle when admitted.
	fn trigger(self: &Arc<Self>, trigger: RefreshTrigger) -> Admission {
		let admission = self.scheduler.begin(trigger);
		if let Admission::Start { cycle } = admission {
			tokio::spawn(refresh::run_cycles(self.clone(), cycle));
		}
		admission
	}
}

/// Builder for [`WalletManager`]
pub struct WalletManagerBuilder {
	account: Account,
	client: Arc<dyn LedgerClient>,
	signer: Option<(Arc<dyn LedgerCrypto>, Arc<dyn KeySource>)>,
	metadata: Option<Arc<dyn MetadataStore>>,
	tokens: Vec<Token>,
	config: WalletConfig,
}

impl WalletManagerBuilder {
	/// Enables sending with the given crypto collaborator and key source
	pub fn with_signer(mut self, crypto: Arc<dyn LedgerCrypto>, keys: Arc<dyn KeySource>) -> Self {
		self.signer = Some((crypto, keys));
		self
	}

	pub fn with_metadata_store(mut self, metadata: Arc<dyn MetadataStore>) -> Self {
		self.metadata = Some(metadata);
		self
	}

	pub fn with_tokens(mut self, tokens: Vec<Token>) -> Self {
		self.tokens = tokens;
		self
	}

	pub fn with_config(mut self, config: WalletConfig) -> Self {
		self.config = config;
		self
	}

	pub fn build(self) -> WalletManager {
		let signer = self
			.signer
			.map(|(crypto, keys)| Sender::new(self.client.clone(), crypto, keys));
		let metadata = self
			.metadata
			.unwrap_or_else(|| Arc::new(InMemoryMetadataStore::new()));
		let inner = WalletInner::new(self.tokens, &self.config.gas);

		info!(
			"Created {} wallet for {} (wallet id {})",
			if signer.is_some() { "signing" } else { "watch-only" },
			self.account.address(),
			self.account.wallet_id().unwrap_or("unavailable")
		);

		WalletManager {
			core: Arc::new(WalletCore {
				account: self.account,
				client: self.client,
				signer,
				metadata,
				state: Mutex::new(inner),
				send_lock: Mutex::new(()),
				scheduler: SyncScheduler::new(),
				events: EventDispatcher::new(),
				config: self.config,
			}),
		}
	}
}

/// Account-based wallet with periodic sync and optimistic pending transactions.
pub struct WalletManager {
	core: Arc<WalletCore>,
}

impl WalletManager {
	pub fn builder(account: Account, client: Arc<dyn LedgerClient>) -> WalletManagerBuilder {
		WalletManagerBuilder {
			account,
			client,
			signer: None,
			metadata: None,
			tokens: Vec::new(),
			config: WalletConfig::default(),
		}
	}

	pub fn account(&self) -> &Account {
		&self.core.account
	}

	/// Primary address, lowercase `0x` hex.
	pub fn address(&self) -> &str {
		self.core.account.address()
	}

	pub fn wallet_id(&self) -> Option<&str> {
		self.core.account.wallet_id()
	}

	pub fn is_watch_only(&self) -> bool {
		self.core.signer.is_none()
	}

	pub async fn is_alive(&self) -> bool {
		self.core.is_alive().await
	}

	async fn ensure_alive(&self) -> Result<(), WalletError> {
		if self.core.is_alive().await {
			Ok(())
		} else {
			Err(WalletError::Wiped)
		}
	}

	pub async fn register_event_handler(&self, handler: Arc<dyn SyncEventHandler>) {
		self.core.events.register_handler(handler).await;
	}

	/// Start the periodic refresh timer. The first cycle runs immediately.
	pub async fn start(&self) -> Result<(), WalletError> {
		self.ensure_alive().await?;
		let weak: Weak<WalletCore> = Arc::downgrade(&self.core);
		let period = self.core.config.sync.refresh_interval;

		let handle = tokio::spawn(async move {
			let mut ticker = tokio::time::interval(period);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
			loop {
				ticker.tick().await;
				let Some(core) = weak.upgrade() else {
					break;
				};
				if core.scheduler.is_halted() {
					break;
				}
				core.trigger(RefreshTrigger::Timer);
			}
			debug!("Refresh timer stopped");
		});
		self.core.scheduler.set_timer(handle);
		info!("Refresh timer started with period {:?}", period);
		Ok(())
	}

	/// Run a refresh cycle now and wait for it.
	///
	/// If a cycle is already running the request is coalesced and this waits for the
	/// follow-up cycle, so the returned state always reflects fetches issued after the call.
	pub async fn refresh(&self) -> Result<(), WalletError> {
		self.ensure_alive().await?;
		match self.core.trigger(RefreshTrigger::Manual) {
			Admission::Start { cycle } => self.core.scheduler.wait_for(cycle).await,
			Admission::Coalesced { until } => self.core.scheduler.wait_for(until).await,
			Admission::Skipped => {}
			Admission::Halted => return Err(WalletError::Wiped),
		}
		self.ensure_alive().await
	}

	/// Number of refresh cycles completed so far.
	pub fn completed_cycles(&self) -> u64 {
		self.core.scheduler.completed_cycles()
	}

	fn signer(&self) -> Result<&Sender, WalletError> {
		self.core.signer.as_ref().ok_or_else(|| {
			WalletError::ConfigurationError("wallet is watch-only and cannot sign".to_string())
		})
	}

	/// Send `amount` wei to `to`.
	///
	/// On success the transaction is recorded as pending, the native view is rebuilt and a
	/// refresh is requested. On failure nothing is recorded and the error is returned as is.
	pub async fn send(&self, to: &str, amount: u128) -> Result<PendingTransaction, WalletError> {
		let signer = self.signer()?;
		let _send_guard = self.core.send_lock.lock().await;

		let (nonce, gas_price, gas_limit) = {
			let inner = self.core.state.lock().await;
			if !inner.alive {
				return Err(WalletError::Wiped);
			}
			(
				inner.next_nonce(self.address()),
				inner.gas.gas_price(),
				inner.gas.native_gas_limit(),
			)
		};

		let request = TransactionBuilder::native()
			.with_recipient(to)
			.with_amount(amount)
			.with_gas_price(gas_price)
			.with_gas_limit(gas_limit)
			.with_nonce(nonce)
			.with_chain_id(self.core.config.network.chain_id())
			.build()?;
		let submission = signer.send_tx(&request).await?;
		let pending = self.pending_record(
			&request,
			submission.hash,
			submission.signed.to_hex(),
			request.amount,
		);

		let native = CurrencyCode::native();
		if !self
			.record_pending(vec![(native.clone(), PendingEntry::Native(pending.clone()))])
			.await
		{
			return Ok(pending);
		}
		self.core
			.events
			.dispatch(SyncEvent::TransactionSubmitted {
				currency: native,
				hash: pending.hash.clone(),
			})
			.await;
		self.core.trigger(RefreshTrigger::PostSend);
		Ok(pending)
	}

	/// Send `amount` base units of the token with code `token` to `to`.
	///
	/// Records the contract call as a native pending transaction and a placeholder transfer
	/// event in the token's pending collection.
	pub async fn send_token(
		&self,
		token: &str,
		to: &str,
		amount: u128,
	) -> Result<(PendingTransaction, TokenTransferEvent), WalletError> {
		let signer = self.signer()?;
		let currency = CurrencyCode::new(token);
		let _send_guard = self.core.send_lock.lock().await;

		let (token, nonce, gas_price, gas_limit) = {
			let inner = self.core.state.lock().await;
			if !inner.alive {
				return Err(WalletError::Wiped);
			}
			let token = inner.token(&currency).cloned().ok_or_else(|| {
				WalletError::ConfigurationError(format!("unknown token {currency}"))
			})?;
			(
				token,
				inner.next_nonce(self.address()),
				inner.gas.gas_price(),
				inner.gas.token_gas_limit(),
			)
		};

		let handle = signer.crypto().token_handle(&token.address).map_err(|e| {
			WalletError::ConfigurationError(format!("token {currency}: {e}"))
		})?;

		let request = TransactionBuilder::token(handle)
			.with_recipient(to)
			.with_amount(amount)
			.with_gas_price(gas_price)
			.with_gas_limit(gas_limit)
			.with_nonce(nonce)
			.with_chain_id(self.core.config.network.chain_id())
			.build()?;
		let submission = signer.send_tx(&request).await?;

		let mut pending =
			self.pending_record(&request, submission.hash, submission.signed.to_hex(), 0);
		pending.to = token.address.clone();
		let placeholder = TokenTransferEvent::placeholder(
			&token.address,
			self.address(),
			&request.to,
			amount,
			pending.timestamp,
			&pending.hash,
		);

		if !self
			.record_pending(vec![
				(CurrencyCode::native(), PendingEntry::Native(pending.clone())),
				(currency.clone(), PendingEntry::TokenTransfer(placeholder.clone())),
			])
			.await
		{
			return Ok((pending, placeholder));
		}
		self.core
			.events
			.dispatch(SyncEvent::TransactionSubmitted {
				currency,
				hash: pending.hash.clone(),
			})
			.await;
		self.core.trigger(RefreshTrigger::PostSend);
		Ok((pending, placeholder))
	}

	fn pending_record(
		&self,
		request: &TransferRequest,
		hash: String,
		raw: String,
		value: u128,
	) -> PendingTransaction {
		PendingTransaction {
			hash,
			from: self.address().to_string(),
			to: request.to.clone(),
			value,
			nonce: request.nonce,
			gas_price: request.gas_price,
			gas_limit: request.gas_limit,
			block_number: 0,
			confirmations: 0,
			timestamp: u64::try_from(Utc::now().timestamp()).unwrap_or_default(),
			raw,
		}
	}

	/// Append pending records and rebuild the affected views. Returns false, recording
	/// nothing, if the wallet was wiped while the transaction was in flight.
	async fn record_pending(&self, entries: Vec<(CurrencyCode, PendingEntry)>) -> bool {
		let mut inner = self.core.state.lock().await;
		if !inner.alive {
			warn!("Wallet wiped during submission, not recording pending transaction");
			return false;
		}
		let mut currencies: Vec<CurrencyCode> = Vec::new();
		for (currency, entry) in entries {
			inner.pending.add_pending(&currency, entry);
			if !currencies.contains(&currency) {
				currencies.push(currency);
			}
		}
		for currency in &currencies {
			inner
				.rebuild_view(
					currency,
					self.core.account.primary_address(),
					self.core.metadata.as_ref(),
				)
				.await;
		}
		true
	}

	pub async fn tokens(&self) -> Vec<Token> {
		self.core.state.lock().await.tokens.clone()
	}

	/// Replace the token set and request a refresh.
	pub async fn set_tokens(&self, tokens: Vec<Token>) -> Result<(), WalletError> {
		{
			let mut inner = self.core.state.lock().await;
			if !inner.alive {
				return Err(WalletError::Wiped);
			}
			let dropped = inner.set_tokens(tokens);
			if !dropped.is_empty() {
				debug!("Stopped tracking tokens {:?}", dropped);
			}
		}
		self.core.trigger(RefreshTrigger::TokensChanged);
		Ok(())
	}

	/// Add a token, replacing any token with the same code.
	pub async fn add_token(&self, token: Token) -> Result<(), WalletError> {
		let mut tokens = self.tokens().await;
		tokens.retain(|t| t.currency() != token.currency());
		tokens.push(token);
		self.set_tokens(tokens).await
	}

	pub async fn remove_token(&self, code: &str) -> Result<(), WalletError> {
		let currency = CurrencyCode::new(code);
		let mut tokens = self.tokens().await;
		tokens.retain(|t| t.currency() != currency);
		self.set_tokens(tokens).await
	}

	pub async fn gas_price(&self) -> u128 {
		self.core.state.lock().await.gas.gas_price()
	}

	/// Set the gas price for future sends, clamped to the configured ceiling.
	pub async fn set_gas_price(&self, gas_price: u128) {
		self.core.state.lock().await.gas.set_gas_price(gas_price);
	}

	/// Snapshot of one currency's state.
	pub async fn snapshot(&self, currency: &str) -> Option<WalletSyncState> {
		let currency = CurrencyCode::new(currency);
		self.core.state.lock().await.sync.get(&currency).cloned()
	}

	/// Snapshots of every tracked currency, native first, then tokens in set order.
	pub async fn snapshots(&self) -> Vec<WalletSyncState> {
		let inner = self.core.state.lock().await;
		std::iter::once(CurrencyCode::native())
			.chain(inner.tokens.iter().map(Token::currency))
			.filter_map(|currency| inner.sync.get(&currency).cloned())
			.collect()
	}

	/// Forget pending state and tokens, stop syncing and refuse further commands.
	pub async fn reset_for_wipe(&self) {
		self.core.state.lock().await.wipe();
		self.core.scheduler.halt();
		info!("Wallet {} wiped", self.address());
	}
}

impl Drop for WalletManager {
	fn drop(&mut self) {
		self.core.scheduler.stop_timer();
	}
}
