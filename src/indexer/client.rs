//!
//! HTTP client for Etherscan-compatible ledger indexers.
//!
//! This module provides an async client for the `account`, `logs` and `proxy` modules of an
//! Etherscan-style API. Read queries are retried with bounded exponential backoff on
//! transient failures; raw transaction submission is never retried here.

use super::LedgerClient;
use super::types::*;
use crate::utils::{parse_quantity, parse_quantity_u64};
use crate::wallet::Token;

use backoff::ExponentialBackoff;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Connection settings for [`EtherscanIndexerClient`].
#[derive(Debug, Clone)]
pub struct IndexerClientConfig {
	/// Base URL of the API, e.g. `https://api.etherscan.io/api`.
	pub base_url: String,
	/// Optional API key appended to every request.
	pub api_key: Option<String>,
	/// Per-request timeout.
	pub request_timeout: Duration,
	/// Upper bound on time spent retrying a single read query.
	pub max_retry_elapsed: Duration,
}

impl Default for IndexerClientConfig {
	fn default() -> Self {
		Self {
			base_url: "https://api.etherscan.io/api".to_string(),
			api_key: None,
			request_timeout: Duration::from_secs(30),
			max_retry_elapsed: Duration::from_secs(10),
		}
	}
}

/// Etherscan-compatible indexer client
#[derive(Clone)]
pub struct EtherscanIndexerClient {
	/// The underlying HTTP client.
	http_client: Client,
	config: IndexerClientConfig,
}

impl EtherscanIndexerClient {
	/// Create a new indexer client.
	///
	/// # Errors
	/// Returns `IndexerError::HttpError` if the HTTP client cannot be constructed.
	pub fn new(config: IndexerClientConfig) -> Result<Self, IndexerError> {
		let http_client = Client::builder()
			.timeout(config.request_timeout)
			.build()?;

		Ok(Self {
			http_client,
			config,
		})
	}

	fn backoff_policy(&self) -> ExponentialBackoff {
		backoff::ExponentialBackoffBuilder::new()
			.with_initial_interval(Duration::from_millis(250))
			.with_max_elapsed_time(Some(self.config.max_retry_elapsed))
			.build()
	}

	/// Issue one GET against the API with the given query parameters.
	async fn get_json(&self, params: &[(&str, String)]) -> Result<serde_json::Value, IndexerError> {
		let mut query: Vec<(&str, String)> = params.to_vec();
		if let Some(key) = &self.config.api_key {
			query.push(("apikey", key.clone()));
		}

		let response = self
			.http_client
			.get(&self.config.base_url)
			.query(&query)
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(IndexerError::HttpStatus(response.status().as_u16()));
		}

		Ok(response.json().await?)
	}

	/// GET with retries on transient failures.
	async fn get_json_with_retry(
		&self,
		params: &[(&str, String)],
	) -> Result<serde_json::Value, IndexerError> {
		backoff::future::retry(self.backoff_policy(), || async {
			self.get_json(params).await.map_err(|e| {
				if e.is_transient() {
					warn!("Transient indexer failure, retrying: {}", e);
					backoff::Error::transient(e)
				} else {
					backoff::Error::permanent(e)
				}
			})
		})
		.await
	}

	/// Execute an `account`/`logs` module query and decode its `result` field.
	///
	/// A `"0"` status whose result is an empty array is the indexer's way of saying
	/// "nothing found" and decodes to an empty list.
	pub async fn execute_query<T: DeserializeOwned>(
		&self,
		params: &[(&str, String)],
	) -> Result<T, IndexerError> {
		let body = self.get_json_with_retry(params).await?;
		let envelope: ApiResponse = serde_json::from_value(body)?;

		if envelope.status != "1" {
			let empty_list = envelope
				.result
				.as_array()
				.map(|items| items.is_empty())
				.unwrap_or(false);
			if !empty_list {
				let reason = envelope
					.result
					.as_str()
					.map(str::to_string)
					.unwrap_or(envelope.message);
				return Err(IndexerError::ApiError(reason));
			}
			debug!("Indexer reported no records: {}", envelope.message);
		}

		Ok(serde_json::from_value(envelope.result)?)
	}

	/// Execute a `proxy` module call and return its string result.
	async fn execute_proxy(
		&self,
		params: &[(&str, String)],
		retry: bool,
	) -> Result<String, IndexerError> {
		let body = if retry {
			self.get_json_with_retry(params).await?
		} else {
			self.get_json(params).await?
		};
		let envelope: RpcResponse = serde_json::from_value(body)?;

		if let Some(error) = envelope.error {
			return Err(IndexerError::RpcError {
				code: error.code,
				message: error.message,
			});
		}

		envelope.result.ok_or(IndexerError::NoData)
	}
}

#[async_trait::async_trait]
impl LedgerClient for EtherscanIndexerClient {
	async fn get_balance(&self, address: &str) -> Result<u128, IndexerError> {
		let raw: String = self
			.execute_query(&[
				("module", "account".to_string()),
				("action", "balance".to_string()),
				("address", address.to_string()),
				("tag", "latest".to_string()),
			])
			.await?;
		parse_quantity(&raw).map_err(IndexerError::InvalidQuantity)
	}

	async fn get_transaction_list(
		&self,
		address: &str,
	) -> Result<Vec<RawTransaction>, IndexerError> {
		let transactions: Vec<RawTransaction> = self
			.execute_query(&[
				("module", "account".to_string()),
				("action", "txlist".to_string()),
				("address", address.to_string()),
				("startblock", "0".to_string()),
				("endblock", "99999999".to_string()),
				("sort", "desc".to_string()),
			])
			.await?;
		debug!(
			"Fetched {} native transactions for {}",
			transactions.len(),
			address
		);
		Ok(transactions)
	}

	async fn get_token_balance(&self, address: &str, token: &Token) -> Result<u128, IndexerError> {
		let raw: String = self
			.execute_query(&[
				("module", "account".to_string()),
				("action", "tokenbalance".to_string()),
				("contractaddress", token.address.clone()),
				("address", address.to_string()),
				("tag", "latest".to_string()),
			])
			.await?;
		parse_quantity(&raw).map_err(IndexerError::InvalidQuantity)
	}

	async fn get_token_transaction_list(
		&self,
		address: &str,
		token: &Token,
	) -> Result<Vec<TokenTransferEvent>, IndexerError> {
		let topic = pad_address_topic(address);
		let events: Vec<TokenTransferEvent> = self
			.execute_query(&[
				("module", "logs".to_string()),
				("action", "getLogs".to_string()),
				("fromBlock", "0".to_string()),
				("toBlock", "latest".to_string()),
				("address", token.address.clone()),
				("topic0", TRANSFER_EVENT_TOPIC.to_string()),
				("topic0_1_opr", "and".to_string()),
				("topic1", topic.clone()),
				("topic1_2_opr", "or".to_string()),
				("topic2", topic),
			])
			.await?;
		debug!(
			"Fetched {} {} transfer events for {}",
			events.len(),
			token.code,
			address
		);
		Ok(events)
	}

	async fn get_latest_block_number(&self) -> Result<u64, IndexerError> {
		let raw = self
			.execute_proxy(
				&[
					("module", "proxy".to_string()),
					("action", "eth_blockNumber".to_string()),
				],
				true,
			)
			.await?;
		parse_quantity_u64(&raw).map_err(IndexerError::InvalidQuantity)
	}

	async fn submit_raw_transaction(&self, hex_payload: &str) -> Result<String, IndexerError> {
		// Not idempotent from the caller's point of view, so never retried
		self.execute_proxy(
			&[
				("module", "proxy".to_string()),
				("action", "eth_sendRawTransaction".to_string()),
				("hex", hex_payload.to_string()),
			],
			false,
		)
		.await
	}
}
