//! Jupiter swap API adapter.
//!
//! Buys quote in `ExactOut` mode and sells in `ExactIn` mode, so the token
//! amount of every quote equals the requested size.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::application::ports::{
    HealthProbe, ProviderError, Quote, QuotePort, QuoteRequest, SwapParams, UnsignedTransaction,
};
use crate::domain::shared::{Side, Token};
use crate::error::PermanentErrorKind;
use crate::infrastructure::transport::{build_client, classify_send_error, read_json};

const BPS_PER_UNIT: Decimal = dec!(10_000);

/// Connection settings for one Jupiter endpoint.
#[derive(Debug, Clone)]
pub struct JupiterConfig {
    /// Base URL, e.g. `https://lite-api.jup.ag/swap/v1`.
    pub base_url: String,
    /// Token every trade settles against.
    pub quote_token: Token,
    /// Token and amount quoted by the health probe.
    pub probe_token: Token,
    /// Per-request timeout.
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    in_amount: String,
    out_amount: String,
    #[serde(default)]
    price_impact_pct: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    swap_transaction: String,
    #[serde(default)]
    last_valid_block_height: Option<u64>,
}

/// Jupiter quote/swap client.
#[derive(Debug)]
pub struct JupiterQuoteClient {
    client: Client,
    config: JupiterConfig,
}

impl JupiterQuoteClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: JupiterConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.timeout)?,
            config,
        })
    }

    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<Value, ProviderError> {
        let amount = request
            .token
            .to_base_units(request.amount)
            .ok_or_else(|| ProviderError::Permanent {
                kind: PermanentErrorKind::Rejected,
                message: format!("amount {} out of range", request.amount),
            })?;
        let (input, output, mode) = match request.side {
            Side::Buy => (&self.config.quote_token.mint, &request.token.mint, "ExactOut"),
            Side::Sell => (&request.token.mint, &self.config.quote_token.mint, "ExactIn"),
        };

        let amount = amount.to_string();
        let slippage = request.slippage_bps.to_string();

        let response = self
            .client
            .get(format!("{}/quote", self.config.base_url))
            .query(&[
                ("inputMint", input.as_str()),
                ("outputMint", output.as_str()),
                ("amount", amount.as_str()),
                ("slippageBps", slippage.as_str()),
                ("swapMode", mode),
            ])
            .send()
            .await
            .map_err(|e| classify_send_error(&e))?;
        let body: Value = read_json(response).await?;
        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(ProviderError::from_message(error));
        }
        Ok(body)
    }

    fn to_quote(&self, request: &QuoteRequest, raw: Value) -> Result<Quote, ProviderError> {
        let parsed: QuoteResponse =
            serde_json::from_value(raw.clone()).map_err(|e| ProviderError::InvalidResponse {
                message: e.to_string(),
            })?;
        let in_units = parse_units(&parsed.in_amount)?;
        let out_units = parse_units(&parsed.out_amount)?;

        let quote_token = &self.config.quote_token;
        let (token_amount, quote_amount) = match request.side {
            Side::Buy => (
                request.token.from_base_units(out_units),
                quote_token.from_base_units(in_units),
            ),
            Side::Sell => (
                request.token.from_base_units(in_units),
                quote_token.from_base_units(out_units),
            ),
        };
        if token_amount <= Decimal::ZERO {
            return Err(ProviderError::Permanent {
                kind: PermanentErrorKind::InsufficientLiquidity,
                message: "route returned zero token amount".to_string(),
            });
        }

        // Jupiter reports impact as a fraction of one
        let impact = parsed
            .price_impact_pct
            .as_deref()
            .and_then(|s| s.parse::<Decimal>().ok())
            .unwrap_or(Decimal::ZERO)
            .abs();

        Ok(Quote {
            mint: request.token.mint.clone(),
            side: request.side,
            amount: token_amount,
            price: quote_amount / token_amount,
            price_impact_bps: impact * BPS_PER_UNIT,
            route: raw,
        })
    }
}

fn parse_units(raw: &str) -> Result<u64, ProviderError> {
    raw.parse().map_err(|_| ProviderError::InvalidResponse {
        message: format!("bad amount: {raw}"),
    })
}

#[async_trait]
impl QuotePort for JupiterQuoteClient {
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, ProviderError> {
        let raw = self.fetch_quote(request).await?;
        self.to_quote(request, raw)
    }

    async fn swap_transaction(
        &self,
        quote: &Quote,
        params: &SwapParams,
    ) -> Result<UnsignedTransaction, ProviderError> {
        let response = self
            .client
            .post(format!("{}/swap", self.config.base_url))
            .json(&json!({
                "quoteResponse": quote.route,
                "userPublicKey": params.user_public_key,
                "wrapAndUnwrapSol": true,
                "dynamicComputeUnitLimit": true,
                "computeUnitPriceMicroLamports": params.compute_unit_price_micro_lamports,
            }))
            .send()
            .await
            .map_err(|e| classify_send_error(&e))?;
        let swap: SwapResponse = read_json(response).await?;
        Ok(UnsignedTransaction {
            payload: swap.swap_transaction,
            last_valid_block_height: swap.last_valid_block_height,
        })
    }
}

#[async_trait]
impl HealthProbe for JupiterQuoteClient {
    async fn probe(&self) -> Result<(), ProviderError> {
        let request = QuoteRequest {
            token: self.config.probe_token.clone(),
            side: Side::Sell,
            amount: Decimal::new(1, 2),
            slippage_bps: 50,
        };
        self.fetch_quote(&request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(server: &MockServer) -> JupiterConfig {
        JupiterConfig {
            base_url: server.uri(),
            quote_token: Token::new("USDC", 6),
            probe_token: Token::new("SOL", 9),
            timeout: Duration::from_secs(2),
        }
    }

    fn request(side: Side) -> QuoteRequest {
        QuoteRequest {
            token: Token::new("BONK", 5),
            side,
            amount: dec!(1000),
            slippage_bps: 100,
        }
    }

    #[tokio::test]
    async fn buy_quotes_exact_out_and_prices_in_quote_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .and(query_param("swapMode", "ExactOut"))
            .and(query_param("inputMint", "USDC"))
            .and(query_param("amount", "100000000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "inAmount": "25000000",
                "outAmount": "100000000",
                "priceImpactPct": "0.0012",
                "routePlan": []
            })))
            .mount(&server)
            .await;

        let client = JupiterQuoteClient::new(config(&server)).unwrap();
        let quote = client.quote(&request(Side::Buy)).await.unwrap();
        assert_eq!(quote.amount, dec!(1000));
        assert_eq!(quote.price, dec!(0.025));
        assert_eq!(quote.price_impact_bps, dec!(12));
        assert_eq!(quote.route["routePlan"], json!([]));
    }

    #[tokio::test]
    async fn sell_quotes_exact_in() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .and(query_param("swapMode", "ExactIn"))
            .and(query_param("outputMint", "USDC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "inAmount": "100000000",
                "outAmount": "20000000",
                "priceImpactPct": "0"
            })))
            .mount(&server)
            .await;

        let client = JupiterQuoteClient::new(config(&server)).unwrap();
        let quote = client.quote(&request(Side::Sell)).await.unwrap();
        assert_eq!(quote.price, dec!(0.02));
    }

    #[tokio::test]
    async fn no_route_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "Could not find any route"
            })))
            .mount(&server)
            .await;

        let client = JupiterQuoteClient::new(config(&server)).unwrap();
        let err = client.quote(&request(Side::Buy)).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Permanent {
                kind: PermanentErrorKind::InsufficientLiquidity,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn swap_returns_unsigned_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/swap"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "swapTransaction": "AQAB",
                "lastValidBlockHeight": 777
            })))
            .mount(&server)
            .await;

        let client = JupiterQuoteClient::new(config(&server)).unwrap();
        let quote = Quote {
            mint: "BONK".to_string(),
            side: Side::Buy,
            amount: dec!(1),
            price: dec!(1),
            price_impact_bps: Decimal::ZERO,
            route: json!({"inAmount": "1"}),
        };
        let params = SwapParams {
            user_public_key: "wallet".to_string(),
            compute_unit_price_micro_lamports: 50,
        };
        let tx = client.swap_transaction(&quote, &params).await.unwrap();
        assert_eq!(tx.payload, "AQAB");
        assert_eq!(tx.last_valid_block_height, Some(777));
    }

    #[tokio::test]
    async fn server_errors_are_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = JupiterQuoteClient::new(config(&server)).unwrap();
        assert!(client.probe().await.unwrap_err().is_transient());
    }
}
