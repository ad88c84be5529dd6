#![allow(dead_code)]

use eth_wallet_sync::indexer::{IndexerError, LedgerClient, RawTransaction, TokenTransferEvent};
use eth_wallet_sync::transaction::{
	CryptoError, KeySource, LedgerCrypto, PrivateKey, SignedTransaction, TokenHandle,
	TransferAsset, TransferRequest,
};
use eth_wallet_sync::wallet::{
	Account, SyncEvent, SyncEventHandler, Token, WalletError, WalletManager,
};

use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub const SELF_ADDRESS: &str = "0xaaaa000000000000000000000000000000000001";
pub const OTHER_ADDRESS: &str = "0xbbbb000000000000000000000000000000000002";
pub const DAI_CONTRACT: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";

pub fn dai() -> Token {
	Token::new("Dai Stablecoin", "DAI", "DAI", DAI_CONTRACT, 18)
}

/// Hash shared by the mock crypto and the mock node.
pub fn mock_hash(raw: &[u8]) -> String {
	format!("0x{}", hex::encode(Sha256::digest(raw)))
}

pub fn raw_transaction(hash: &str, from: &str, to: &str, nonce: u64, timestamp: u64) -> RawTransaction {
	RawTransaction {
		block_number: 100 + nonce,
		timestamp,
		value: 1_000,
		from: from.to_string(),
		to: to.to_string(),
		confirmations: 1,
		hash: hash.to_string(),
		nonce,
		gas_price: 1_000_000_000,
		gas_limit: 48_000,
		gas_used: 21_000,
		is_error: false,
	}
}

pub fn transfer_event(hash: &str, from: &str, to: &str, amount: u128, timestamp: u64) -> TokenTransferEvent {
	let mut event = TokenTransferEvent::placeholder(DAI_CONTRACT, from, to, amount, timestamp, hash);
	event.is_complete = true;
	event.block_number = Some(100);
	event
}

/// In-memory ledger indexer with per-query failure switches.
#[derive(Clone, Default)]
pub struct MockLedgerClient {
	pub balance: Arc<Mutex<u128>>,
	pub transactions: Arc<Mutex<Vec<RawTransaction>>>,
	pub token_balances: Arc<Mutex<HashMap<String, u128>>>,
	pub token_events: Arc<Mutex<HashMap<String, Vec<TokenTransferEvent>>>>,
	pub block_number: Arc<Mutex<u64>>,
	pub failing_token_balances: Arc<Mutex<HashSet<String>>>,
	pub fail_balance: Arc<Mutex<bool>>,
	pub reject_submissions: Arc<Mutex<Option<String>>>,
	pub submitted: Arc<Mutex<Vec<String>>>,
	pub balance_calls: Arc<AtomicUsize>,
	/// When set, balance and history queries wait for a permit before answering.
	pub fetch_gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
	pub answered_fetches: Arc<AtomicUsize>,
}

impl MockLedgerClient {
	pub fn new() -> Self {
		let client = Self::default();
		*client.block_number.lock().unwrap() = 110;
		client
	}

	pub fn set_balance(&self, balance: u128) {
		*self.balance.lock().unwrap() = balance;
	}

	pub fn set_transactions(&self, transactions: Vec<RawTransaction>) {
		*self.transactions.lock().unwrap() = transactions;
	}

	pub fn set_token_balance(&self, contract: &str, balance: u128) {
		self.token_balances
			.lock()
			.unwrap()
			.insert(contract.to_lowercase(), balance);
	}

	pub fn set_token_events(&self, contract: &str, events: Vec<TokenTransferEvent>) {
		self.token_events
			.lock()
			.unwrap()
			.insert(contract.to_lowercase(), events);
	}

	pub fn fail_token_balance(&self, contract: &str) {
		self.failing_token_balances
			.lock()
			.unwrap()
			.insert(contract.to_lowercase());
	}

	pub fn set_fail_balance(&self, fail: bool) {
		*self.fail_balance.lock().unwrap() = fail;
	}

	pub fn reject_submissions(&self, reason: &str) {
		*self.reject_submissions.lock().unwrap() = Some(reason.to_string());
	}

	pub fn submitted(&self) -> Vec<String> {
		self.submitted.lock().unwrap().clone()
	}

	pub fn balance_calls(&self) -> usize {
		self.balance_calls.load(Ordering::SeqCst)
	}

	/// Hold balance and history queries until permits are added to the returned gate.
	pub fn hold_fetches(&self) -> Arc<Semaphore> {
		let gate = Arc::new(Semaphore::new(0));
		*self.fetch_gate.lock().unwrap() = Some(gate.clone());
		gate
	}

	/// Number of gated queries that have answered.
	pub fn answered_fetches(&self) -> usize {
		self.answered_fetches.load(Ordering::SeqCst)
	}

	async fn pass_gate(&self) {
		let gate = self.fetch_gate.lock().unwrap().clone();
		if let Some(gate) = gate {
			gate.acquire().await.expect("gate open").forget();
		}
		self.answered_fetches.fetch_add(1, Ordering::SeqCst);
	}
}

#[async_trait::async_trait]
impl LedgerClient for MockLedgerClient {
	async fn get_balance(&self, _address: &str) -> Result<u128, IndexerError> {
		self.balance_calls.fetch_add(1, Ordering::SeqCst);
		tokio::task::yield_now().await;
		self.pass_gate().await;
		if *self.fail_balance.lock().unwrap() {
			return Err(IndexerError::HttpStatus(503));
		}
		Ok(*self.balance.lock().unwrap())
	}

	async fn get_transaction_list(&self, _address: &str) -> Result<Vec<RawTransaction>, IndexerError> {
		self.pass_gate().await;
		Ok(self.transactions.lock().unwrap().clone())
	}

	async fn get_token_balance(&self, _address: &str, token: &Token) -> Result<u128, IndexerError> {
		if self.failing_token_balances.lock().unwrap().contains(&token.address) {
			return Err(IndexerError::HttpStatus(502));
		}
		Ok(self
			.token_balances
			.lock()
			.unwrap()
			.get(&token.address)
			.copied()
			.unwrap_or_default())
	}

	async fn get_token_transaction_list(
		&self,
		_address: &str,
		token: &Token,
	) -> Result<Vec<TokenTransferEvent>, IndexerError> {
		Ok(self
			.token_events
			.lock()
			.unwrap()
			.get(&token.address)
			.cloned()
			.unwrap_or_default())
	}

	async fn get_latest_block_number(&self) -> Result<u64, IndexerError> {
		Ok(*self.block_number.lock().unwrap())
	}

	async fn submit_raw_transaction(&self, hex_payload: &str) -> Result<String, IndexerError> {
		if let Some(reason) = self.reject_submissions.lock().unwrap().clone() {
			return Err(IndexerError::RpcError {
				code: -32000,
				message: reason,
			});
		}
		tokio::task::yield_now().await;
		let raw = hex::decode(hex_payload.trim_start_matches("0x")).expect("hex payload");
		self.submitted.lock().unwrap().push(hex_payload.to_string());
		Ok(mock_hash(&raw))
	}
}

/// Crypto collaborator that "signs" by serializing the request fields.
#[derive(Default)]
pub struct MockCrypto {
	pub known_tokens: HashSet<String>,
}

impl MockCrypto {
	pub fn with_token(contract: &str) -> Self {
		Self {
			known_tokens: [contract.to_lowercase()].into_iter().collect(),
		}
	}
}

impl LedgerCrypto for MockCrypto {
	fn token_handle(&self, contract: &str) -> Result<TokenHandle, CryptoError> {
		let contract = contract.to_lowercase();
		if !self.known_tokens.contains(&contract) {
			return Err(CryptoError::UnknownToken(contract));
		}
		Ok(TokenHandle {
			contract,
			decimals: 18,
		})
	}

	fn build_and_sign(
		&self,
		request: &TransferRequest,
		key: &PrivateKey,
	) -> Result<SignedTransaction, CryptoError> {
		let asset = match &request.asset {
			TransferAsset::Native => "native".to_string(),
			TransferAsset::Token(handle) => handle.contract.clone(),
		};
		let raw = format!(
			"{}|{}|{}|{}|{}|{}|{}|{}",
			asset,
			request.to,
			request.amount,
			request.gas_price,
			request.gas_limit,
			request.nonce,
			request.chain_id,
			hex::encode(key.0)
		);
		Ok(SignedTransaction {
			raw: raw.into_bytes(),
		})
	}

	fn raw_transaction_hash(&self, signed: &SignedTransaction) -> String {
		mock_hash(&signed.raw)
	}
}

pub struct StaticKeySource;

impl KeySource for StaticKeySource {
	fn private_key(&self) -> Result<PrivateKey, WalletError> {
		Ok(PrivateKey([7u8; 32]))
	}
}

/// Event handler that keeps every event it sees.
#[derive(Default)]
pub struct RecordingHandler {
	pub events: Mutex<Vec<SyncEvent>>,
}

impl RecordingHandler {
	pub fn events(&self) -> Vec<SyncEvent> {
		self.events.lock().unwrap().clone()
	}
}

#[async_trait::async_trait]
impl SyncEventHandler for RecordingHandler {
	async fn handle(&self, event: &SyncEvent) -> Result<(), WalletError> {
		self.events.lock().unwrap().push(event.clone());
		Ok(())
	}

	fn name(&self) -> &'static str {
		"RecordingHandler"
	}
}

/// Signing wallet tracking DAI, backed by `client`.
pub fn signing_wallet(client: &MockLedgerClient) -> WalletManager {
	let account = Account::watch_only(SELF_ADDRESS).expect("account");
	WalletManager::builder(account, Arc::new(client.clone()))
		.with_signer(
			Arc::new(MockCrypto::with_token(DAI_CONTRACT)),
			Arc::new(StaticKeySource),
		)
		.with_tokens(vec![dai()])
		.build()
}
