//! Solana JSON-RPC adapter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::application::ports::{
    HealthProbe, ProviderError, RpcPort, SignedTransaction, SimulationResult,
};
use crate::error::PermanentErrorKind;
use crate::infrastructure::transport::{build_client, classify_send_error, read_json};

/// Preflight simulation rejected the transaction.
const SEND_SIMULATION_FAILED: i64 = -32_002;

/// Connection settings for one RPC node.
#[derive(Debug, Clone)]
pub struct SolanaRpcConfig {
    /// Endpoint URL.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Commitment used for simulation and preflight.
    pub commitment: String,
}

impl SolanaRpcConfig {
    /// Config with a 10s timeout and `confirmed` commitment.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(10),
            commitment: "confirmed".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrioritizationFee {
    prioritization_fee: u64,
}

#[derive(Debug, Deserialize)]
struct SimulateResult {
    value: SimulateValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulateValue {
    err: Option<Value>,
    #[serde(default)]
    logs: Option<Vec<String>>,
    #[serde(default)]
    units_consumed: Option<u64>,
}

/// JSON-RPC client for one Solana node.
#[derive(Debug)]
pub struct SolanaRpcClient {
    client: Client,
    config: SolanaRpcConfig,
    next_id: AtomicU64,
}

impl SolanaRpcClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: SolanaRpcConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.timeout)?,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// Endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ProviderError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_send_error(&e))?;

        let envelope: RpcResponse<T> = read_json(response).await?;
        if let Some(err) = envelope.error {
            tracing::debug!(method, code = err.code, message = %err.message, "RPC error");
            return Err(classify_rpc_error(&err));
        }
        envelope.result.ok_or_else(|| ProviderError::InvalidResponse {
            message: format!("{method}: response has neither result nor error"),
        })
    }
}

fn classify_rpc_error(err: &RpcErrorObject) -> ProviderError {
    let detail = err.data.as_ref().map_or_else(
        || err.message.clone(),
        |data| format!("{} {data}", err.message),
    );
    if err.code == SEND_SIMULATION_FAILED {
        return match ProviderError::from_message(&detail) {
            permanent @ ProviderError::Permanent { .. } => permanent,
            _ => ProviderError::Permanent {
                kind: PermanentErrorKind::Rejected,
                message: err.message.clone(),
            },
        };
    }
    ProviderError::from_message(&detail)
}

#[async_trait]
impl RpcPort for SolanaRpcClient {
    async fn recent_prioritization_fees(
        &self,
        accounts: &[String],
    ) -> Result<Vec<u64>, ProviderError> {
        let fees: Vec<PrioritizationFee> = self
            .call("getRecentPrioritizationFees", json!([accounts]))
            .await?;
        Ok(fees.into_iter().map(|f| f.prioritization_fee).collect())
    }

    async fn simulate_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<SimulationResult, ProviderError> {
        let result: SimulateResult = self
            .call(
                "simulateTransaction",
                json!([
                    transaction.payload,
                    { "encoding": "base64", "commitment": self.config.commitment },
                ]),
            )
            .await?;
        Ok(SimulationResult {
            error: result.value.err.map(|e| e.to_string()),
            units_consumed: result.value.units_consumed,
            logs: result.value.logs.unwrap_or_default(),
        })
    }

    async fn send_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<String, ProviderError> {
        self.call(
            "sendTransaction",
            json!([
                transaction.payload,
                {
                    "encoding": "base64",
                    "skipPreflight": false,
                    "preflightCommitment": self.config.commitment,
                    "maxRetries": 0,
                },
            ]),
        )
        .await
    }
}

#[async_trait]
impl HealthProbe for SolanaRpcClient {
    async fn probe(&self) -> Result<(), ProviderError> {
        let status: String = self.call("getHealth", json!([])).await?;
        if status == "ok" {
            Ok(())
        } else {
            Err(ProviderError::Server {
                status: 200,
                message: format!("node reports {status}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client(server: &MockServer) -> SolanaRpcClient {
        SolanaRpcClient::new(SolanaRpcConfig::new(server.uri())).unwrap()
    }

    fn tx() -> SignedTransaction {
        SignedTransaction {
            payload: "AQID".to_string(),
            signature: "sig".to_string(),
        }
    }

    #[tokio::test]
    async fn reads_prioritization_fees() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "getRecentPrioritizationFees"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": [
                    {"slot": 1, "prioritizationFee": 0},
                    {"slot": 2, "prioritizationFee": 5000}
                ]
            })))
            .mount(&server)
            .await;

        let fees = client(&server)
            .await
            .recent_prioritization_fees(&["MINT".to_string()])
            .await
            .unwrap();
        assert_eq!(fees, vec![0, 5000]);
    }

    #[tokio::test]
    async fn simulation_error_is_reported_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {"context": {"slot": 9}, "value": {
                    "err": {"InstructionError": [0, {"Custom": 1}]},
                    "logs": ["Program log: insufficient funds"],
                    "unitsConsumed": 1200
                }}
            })))
            .mount(&server)
            .await;

        let sim = client(&server).await.simulate_transaction(&tx()).await.unwrap();
        assert!(!sim.succeeded());
        assert_eq!(sim.units_consumed, Some(1200));
        assert_eq!(sim.logs.len(), 1);
    }

    #[tokio::test]
    async fn preflight_failure_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {
                    "code": -32002,
                    "message": "Transaction simulation failed: Attempt to debit an account but found no record of a prior credit."
                }
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.send_transaction(&tx()).await.unwrap_err();
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn http_statuses_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3"))
            .mount(&server)
            .await;

        let err = client(&server).await.send_transaction(&tx()).await.unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn probe_uses_get_health() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "getHealth"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": "ok"
            })))
            .mount(&server)
            .await;

        assert!(client(&server).await.probe().await.is_ok());
    }

    #[tokio::test]
    async fn unhealthy_node_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32005, "message": "Node is behind by 42 slots"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.probe().await.unwrap_err();
        assert!(err.is_transient());
    }
}
