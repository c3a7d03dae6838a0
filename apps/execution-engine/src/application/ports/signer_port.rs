//! Wallet/Signer Port (Driven Port)
//!
//! The engine never holds key material; it hands payloads to the signer.

use async_trait::async_trait;

use super::{ProviderError, SignedTransaction, UnsignedTransaction};

/// Port for the wallet signer.
#[async_trait]
pub trait SignerPort: Send + Sync {
    /// Public key of the signing wallet.
    fn public_key(&self) -> &str;

    /// Sign a transaction payload.
    async fn sign(&self, transaction: &UnsignedTransaction)
    -> Result<SignedTransaction, ProviderError>;
}
