//! Quote/Swap Aggregator Port (Driven Port)
//!
//! Quotes are pure, retryable queries. Sizes are always expressed in units
//! of the traded token; the adapter picks the swap mode.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProviderError;
use crate::domain::shared::{Side, Token};

/// Quote request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// Traded token.
    pub token: Token,
    /// Buy or sell the token.
    pub side: Side,
    /// Token amount.
    pub amount: Decimal,
    /// Slippage tolerance passed to the route.
    pub slippage_bps: u32,
}

/// Best route for a quote request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Traded token mint.
    pub mint: String,
    /// Side.
    pub side: Side,
    /// Token amount.
    pub amount: Decimal,
    /// Price in quote-token units per token.
    pub price: Decimal,
    /// Route price impact in basis points.
    pub price_impact_bps: Decimal,
    /// Opaque route payload echoed back to build the swap.
    pub route: serde_json::Value,
}

/// Transaction built by the aggregator, not yet signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    /// Base64 wire payload.
    pub payload: String,
    /// Block height after which the transaction expires.
    pub last_valid_block_height: Option<u64>,
}

/// Signed transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Base64 wire payload.
    pub payload: String,
    /// First signature, used as the transaction id.
    pub signature: String,
}

/// Parameters for building a swap transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParams {
    /// Wallet that signs and pays.
    pub user_public_key: String,
    /// Priority fee as compute unit price.
    pub compute_unit_price_micro_lamports: u64,
}

/// Port for a quote/swap aggregator.
#[async_trait]
pub trait QuotePort: Send + Sync {
    /// Best route for the request.
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, ProviderError>;

    /// Build the swap transaction for a quote.
    async fn swap_transaction(
        &self,
        quote: &Quote,
        params: &SwapParams,
    ) -> Result<UnsignedTransaction, ProviderError>;
}
