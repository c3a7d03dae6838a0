//! Remote signing service adapter.
//!
//! Key material stays with the signing service; the engine only sends the
//! unsigned payload and the wallet it expects to sign with.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    ProviderError, SignedTransaction, SignerPort, UnsignedTransaction,
};
use crate::infrastructure::transport::{build_client, classify_send_error, read_json};

/// Remote signer settings.
#[derive(Debug, Clone)]
pub struct RemoteSignerConfig {
    /// Signing service base URL.
    pub endpoint: String,
    /// Wallet public key.
    pub public_key: String,
    /// Bearer token, if the service requires one.
    pub auth_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest<'a> {
    public_key: &'a str,
    transaction: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignResponse {
    signed_transaction: String,
    signature: String,
}

/// HTTP client for a remote signing service.
#[derive(Debug)]
pub struct RemoteSigner {
    client: Client,
    config: RemoteSignerConfig,
}

impl RemoteSigner {
    /// Create a signer client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: RemoteSignerConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.timeout)?,
            config,
        })
    }
}

#[async_trait]
impl SignerPort for RemoteSigner {
    fn public_key(&self) -> &str {
        &self.config.public_key
    }

    async fn sign(
        &self,
        transaction: &UnsignedTransaction,
    ) -> Result<SignedTransaction, ProviderError> {
        let mut request = self
            .client
            .post(format!("{}/sign", self.config.endpoint))
            .json(&SignRequest {
                public_key: &self.config.public_key,
                transaction: &transaction.payload,
            });
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| classify_send_error(&e))?;
        let signed: SignResponse = read_json(response).await?;
        if signed.signature.is_empty() {
            return Err(ProviderError::InvalidResponse {
                message: "signer returned an empty signature".to_string(),
            });
        }
        Ok(SignedTransaction {
            payload: signed.signed_transaction,
            signature: signed.signature,
        })
    }
}
