use crate::blockchain::models::{quantity, rpc_methods, Block, RpcErrorObject, RpcRequest};
use crate::config::Config;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use num_bigint::BigUint;
use serde_json::{json, Value};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(#[source] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Block not found: {0}")]
    BlockNotFound(BigUint),

    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL may carry the gateway's API key.
        ClientError::GatewayUnavailable(err.without_url())
    }
}

/// Read access to the chain, as needed by the polling engine.
///
/// Implementations do not cache or retry; every error reaches the caller.
pub trait ChainClient: Send + Sync + 'static {
    /// Number of the most recent block known to the gateway.
    fn latest_block_number(&self) -> impl Future<Output = Result<BigUint, ClientError>> + Send;

    /// Full block `number` including its transaction objects.
    fn block_by_number(
        &self,
        number: &BigUint,
    ) -> impl Future<Output = Result<Block, ClientError>> + Send;
}

/// JSON-RPC client for an Ethereum-compatible HTTP gateway.
pub struct EthClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl EthClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let timeout = Duration::from_secs(config.rpc_timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        let limiter = config
            .rpc_rate_limit
            .and_then(NonZeroU32::new)
            .map(|per_second| RateLimiter::direct(Quota::per_second(per_second)));

        info!(
            "Initializing Ethereum client with gateway: {}, timeout: {:?}, rate limit: {:?}",
            config.gateway_endpoint(), timeout, config.rpc_rate_limit
        );

        Ok(Self {
            http,
            url: config.gateway_url.clone(),
            next_id: AtomicU64::new(1),
            limiter,
        })
    }

    /// Sends one JSON-RPC call and returns its `result` member, which may be `null`.
    async fn call(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        debug!(method, id, "sending gateway request");

        let body = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let response: Value = serde_json::from_slice(&body)
            .map_err(|e| ClientError::MalformedResponse(format!("{method}: {e}")))?;

        if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
            let error: RpcErrorObject = serde_json::from_value(error.clone())
                .map_err(|e| ClientError::MalformedResponse(format!("{method} error object: {e}")))?;
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        match response {
            Value::Object(mut fields) => fields.remove("result").ok_or_else(|| {
                ClientError::MalformedResponse(format!("{method}: missing result field"))
            }),
            _ => Err(ClientError::MalformedResponse(format!(
                "{method}: response is not an object"
            ))),
        }
    }
}

impl ChainClient for EthClient {
    async fn latest_block_number(&self) -> Result<BigUint, ClientError> {
        let result = self.call(rpc_methods::BLOCK_NUMBER, json!([])).await?;
        let raw = result.as_str().ok_or_else(|| {
            ClientError::MalformedResponse(format!("block number is not a string: {result}"))
        })?;
        quantity::decode(raw)
            .ok_or_else(|| ClientError::MalformedResponse(format!("invalid block number: {raw}")))
    }

    async fn block_by_number(&self, number: &BigUint) -> Result<Block, ClientError> {
        let params = json!([quantity::encode(number), true]);
        let result = self.call(rpc_methods::GET_BLOCK_BY_NUMBER, params).await?;
        if result.is_null() {
            return Err(ClientError::BlockNotFound(number.clone()));
        }
        serde_json::from_value(result)
            .map_err(|e| ClientError::MalformedResponse(format!("block {number}: {e}")))
    }
}
