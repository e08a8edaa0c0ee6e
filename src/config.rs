// Runtime configuration for:
// - Ethereum gateway endpoint and request limits
// - Server listening address/port
// - Blockchain polling interval and starting block
// - HTTP request timeout and shutdown grace period

use dotenv::dotenv;
use num_bigint::BigUint;
use num_traits::Zero;
use reqwest::Url;
use std::env;
use std::fmt;
use std::time::Duration;

/// Where the watermark starts when the service boots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartBlock {
    /// Treat every block up to and including this one as already processed.
    Number(BigUint),
    /// Resolve the gateway's current height once at startup.
    Latest,
}

impl StartBlock {
    /// Parses `latest`, a decimal number or a `0x`-prefixed hex number.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("latest") {
            return Some(StartBlock::Latest);
        }

        let number = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
            Some(hex) => BigUint::parse_bytes(hex.as_bytes(), 16)?,
            None => BigUint::parse_bytes(value.as_bytes(), 10)?,
        };
        Some(StartBlock::Number(number))
    }
}

impl Default for StartBlock {
    fn default() -> Self {
        StartBlock::Number(BigUint::zero())
    }
}

#[derive(Clone)]
pub struct Config {
    pub gateway_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub poll_interval: Duration,
    pub rpc_timeout_secs: u64,
    pub rpc_rate_limit: Option<u32>,
    pub start_block: StartBlock,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:8545".to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            poll_interval: Duration::from_secs(5),
            rpc_timeout_secs: 30,
            rpc_rate_limit: None,
            start_block: StartBlock::default(),
            request_timeout: Duration::from_secs(10),
            shutdown_grace: Duration::from_secs(20),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();

        let gateway_url = env::var("ETHEREUM_GATEWAY_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.gateway_url);
        let server_host = env::var("SERVER_HOST").unwrap_or(defaults.server_host);
        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.server_port);
        let poll_interval = env::var("POLL_INTERVAL")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs: &u64| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);
        let rpc_timeout_secs = env::var("RPC_TIMEOUT_SECS")
            .map(|v| v.parse().unwrap_or(defaults.rpc_timeout_secs))
            .unwrap_or(defaults.rpc_timeout_secs);
        let rpc_rate_limit = env::var("RPC_RATE_LIMIT")
            .map(|v| v.parse().ok())
            .unwrap_or(None)
            .filter(|limit: &u32| *limit > 0);
        let start_block = env::var("START_BLOCK")
            .ok()
            .and_then(|v| StartBlock::parse(&v))
            .unwrap_or(defaults.start_block);
        let request_timeout = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs: &u64| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        let shutdown_grace = env::var("SHUTDOWN_GRACE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.shutdown_grace);

        Self {
            gateway_url,
            server_host,
            server_port,
            poll_interval,
            rpc_timeout_secs,
            rpc_rate_limit,
            start_block,
            request_timeout,
            shutdown_grace,
        }
    }

    /// Gateway URL reduced to scheme, host and port, safe to log.
    pub fn gateway_endpoint(&self) -> String {
        redact_url(&self.gateway_url)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

// Hosted gateways carry API keys in the path, query or userinfo.
fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default();
            let mut endpoint = match url.port() {
                Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
                None => format!("{}://{}", url.scheme(), host),
            };
            if url.path() != "/" || url.query().is_some() {
                endpoint.push_str("/...");
            }
            endpoint
        }
        Err(_) => "<invalid url>".to_string(),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gateway_url", &self.gateway_endpoint())
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("poll_interval", &self.poll_interval)
            .field("rpc_timeout_secs", &self.rpc_timeout_secs)
            .field("rpc_rate_limit", &self.rpc_rate_limit)
            .field("start_block", &self.start_block)
            .field("request_timeout", &self.request_timeout)
            .field("shutdown_grace", &self.shutdown_grace)
            .finish()
    }
}
