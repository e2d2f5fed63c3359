//! JSON-RPC calls to the Hive API, falling back across the configured nodes.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::{Error, Result};

/// A JSON-RPC 2.0 call as sent to an API node.
#[derive(Clone, Debug, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(method: &'static str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(result: Value) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Delivers one request to one node.
///
/// Errors for which [`Error::is_endpoint_failure`] holds make [`Upstream`]
/// move on to the next node.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, endpoint: &Url, request: &RpcRequest) -> Result<RpcResponse>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tapintu/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, endpoint: &Url, request: &RpcRequest) -> Result<RpcResponse> {
        let timed_out = |e: reqwest::Error| {
            if e.is_timeout() {
                Error::Timeout {
                    endpoint: endpoint.to_string(),
                }
            } else {
                e.into()
            }
        };

        let response = self
            .client
            .post(endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(timed_out)?
            .error_for_status()?;

        response.json().await.map_err(timed_out)
    }
}

/// The ordered API node list plus the transport used to reach it.
#[derive(Clone)]
pub struct Upstream {
    endpoints: Arc<[Url]>,
    transport: Arc<dyn Transport>,
}

impl Upstream {
    pub fn new(endpoints: Vec<Url>, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoints: endpoints.into(),
            transport,
        }
    }

    /// Sends `method` to each node in turn until one answers.
    ///
    /// A JSON-RPC error from a node is an answer and is returned as
    /// [`Error::Rpc`]. A missing `result` is returned as `Value::Null`.
    pub async fn call(&self, method: &'static str, params: Value) -> Result<Value> {
        let request = RpcRequest::new(method, params);
        let attempts = self.endpoints.len();

        for (i, endpoint) in self.endpoints.iter().enumerate() {
            match self.transport.send(endpoint, &request).await {
                Ok(RpcResponse {
                    error: Some(error), ..
                }) => {
                    warn!(
                        "Node {} rejected {}: {} ({})",
                        endpoint, method, error.message, error.code
                    );
                    return Err(Error::Rpc {
                        code: error.code,
                        message: error.message,
                    });
                }
                Ok(RpcResponse { result, .. }) => {
                    info!("{} succeeded using node {}", method, endpoint);
                    return Ok(result.unwrap_or(Value::Null));
                }
                Err(e) if e.is_endpoint_failure() => {
                    warn!(
                        "Node {} failed for {} (attempt {}/{}): {}",
                        endpoint,
                        method,
                        i + 1,
                        attempts,
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::UpstreamUnavailable { method, attempts })
    }
}
