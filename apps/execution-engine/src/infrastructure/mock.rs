//! Scriptable in-process providers.
//!
//! Used for paper trading and tests. Each mock counts its calls and can be
//! told to fail persistently (`set_down`) or at a specific call index.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::application::ports::{
    HealthProbe, ProviderError, Quote, QuotePort, QuoteRequest, RpcPort, SignedTransaction,
    SignerPort, SimulationResult, SwapParams, UnsignedTransaction,
};

fn down() -> ProviderError {
    ProviderError::Transport {
        message: "connection refused".to_string(),
    }
}

#[derive(Debug, Default)]
struct RpcScript {
    down: bool,
    fees: Vec<u64>,
    simulation_failures: HashMap<usize, String>,
    send_failures: HashMap<usize, ProviderError>,
}

/// Mock blockchain RPC node.
#[derive(Debug, Default)]
pub struct MockRpc {
    script: Mutex<RpcScript>,
    fee_calls: AtomicUsize,
    simulate_calls: AtomicUsize,
    send_calls: AtomicUsize,
}

impl MockRpc {
    /// Healthy node with a quiet fee market.
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Mutex::new(RpcScript {
                fees: vec![1_000; 20],
                ..RpcScript::default()
            }),
            ..Self::default()
        }
    }

    /// Fail every call (and probe) with a transport error.
    pub fn set_down(&self, down: bool) {
        self.script.lock().down = down;
    }

    /// Fee samples returned by `recent_prioritization_fees`.
    pub fn set_fees(&self, fees: Vec<u64>) {
        self.script.lock().fees = fees;
    }

    /// Make the simulation at `call_index` (0-based) report `error`.
    pub fn fail_simulation_at(&self, call_index: usize, error: impl Into<String>) {
        self.script
            .lock()
            .simulation_failures
            .insert(call_index, error.into());
    }

    /// Make the send at `call_index` (0-based) fail with `error`.
    pub fn fail_send_at(&self, call_index: usize, error: ProviderError) {
        self.script.lock().send_failures.insert(call_index, error);
    }

    /// Fee sampling calls made.
    #[must_use]
    pub fn fee_calls(&self) -> usize {
        self.fee_calls.load(Ordering::SeqCst)
    }

    /// Simulation calls made.
    #[must_use]
    pub fn simulate_calls(&self) -> usize {
        self.simulate_calls.load(Ordering::SeqCst)
    }

    /// Send calls made.
    #[must_use]
    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RpcPort for MockRpc {
    async fn recent_prioritization_fees(
        &self,
        _accounts: &[String],
    ) -> Result<Vec<u64>, ProviderError> {
        self.fee_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock();
        if script.down {
            return Err(down());
        }
        Ok(script.fees.clone())
    }

    async fn simulate_transaction(
        &self,
        _transaction: &SignedTransaction,
    ) -> Result<SimulationResult, ProviderError> {
        let n = self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock();
        if script.down {
            return Err(down());
        }
        Ok(SimulationResult {
            error: script.simulation_failures.get(&n).cloned(),
            units_consumed: Some(120_000),
            logs: Vec::new(),
        })
    }

    async fn send_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<String, ProviderError> {
        let n = self.send_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock();
        if script.down {
            return Err(down());
        }
        if let Some(err) = script.send_failures.get(&n) {
            return Err(err.clone());
        }
        Ok(transaction.signature.clone())
    }
}

#[async_trait]
impl HealthProbe for MockRpc {
    async fn probe(&self) -> Result<(), ProviderError> {
        if self.script.lock().down {
            return Err(down());
        }
        Ok(())
    }
}

#[derive(Debug)]
struct QuoteScript {
    down: bool,
    default_price: Decimal,
    prices: HashMap<String, Decimal>,
    price_impact_bps: Decimal,
    mint_failures: HashMap<String, ProviderError>,
    call_failures: HashMap<usize, ProviderError>,
}

/// Mock quote/swap aggregator.
#[derive(Debug)]
pub struct MockQuote {
    script: Mutex<QuoteScript>,
    quote_calls: AtomicUsize,
    swap_calls: AtomicUsize,
}

impl MockQuote {
    /// Aggregator quoting every mint at `price` with 10 bps impact.
    #[must_use]
    pub fn new(price: Decimal) -> Self {
        Self {
            script: Mutex::new(QuoteScript {
                down: false,
                default_price: price,
                prices: HashMap::new(),
                price_impact_bps: Decimal::TEN,
                mint_failures: HashMap::new(),
                call_failures: HashMap::new(),
            }),
            quote_calls: AtomicUsize::new(0),
            swap_calls: AtomicUsize::new(0),
        }
    }

    /// Fail every call (and probe) with a transport error.
    pub fn set_down(&self, down: bool) {
        self.script.lock().down = down;
    }

    /// Price for mints without an override.
    pub fn set_price(&self, price: Decimal) {
        self.script.lock().default_price = price;
    }

    /// Price for one mint.
    pub fn set_mint_price(&self, mint: impl Into<String>, price: Decimal) {
        self.script.lock().prices.insert(mint.into(), price);
    }

    /// Price impact reported on every quote.
    pub fn set_price_impact_bps(&self, impact: Decimal) {
        self.script.lock().price_impact_bps = impact;
    }

    /// Fail every quote for `mint` with `error`.
    pub fn fail_mint(&self, mint: impl Into<String>, error: ProviderError) {
        self.script.lock().mint_failures.insert(mint.into(), error);
    }

    /// Fail the quote at `call_index` (0-based) with `error`.
    pub fn fail_quote_at(&self, call_index: usize, error: ProviderError) {
        self.script.lock().call_failures.insert(call_index, error);
    }

    /// Quote calls made.
    #[must_use]
    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    /// Swap builds made.
    #[must_use]
    pub fn swap_calls(&self) -> usize {
        self.swap_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuotePort for MockQuote {
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, ProviderError> {
        let n = self.quote_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock();
        if script.down {
            return Err(down());
        }
        if let Some(err) = script
            .call_failures
            .get(&n)
            .or_else(|| script.mint_failures.get(&request.token.mint))
        {
            return Err(err.clone());
        }

        let price = script
            .prices
            .get(&request.token.mint)
            .copied()
            .unwrap_or(script.default_price);
        Ok(Quote {
            mint: request.token.mint.clone(),
            side: request.side,
            amount: request.amount,
            price,
            price_impact_bps: script.price_impact_bps,
            route: serde_json::json!({ "source": "mock", "quote": n }),
        })
    }

    async fn swap_transaction(
        &self,
        quote: &Quote,
        _params: &SwapParams,
    ) -> Result<UnsignedTransaction, ProviderError> {
        let n = self.swap_calls.fetch_add(1, Ordering::SeqCst);
        if self.script.lock().down {
            return Err(down());
        }
        Ok(UnsignedTransaction {
            payload: format!("mock-swap-{}-{n}", quote.mint),
            last_valid_block_height: Some(1_000 + n as u64),
        })
    }
}

#[async_trait]
impl HealthProbe for MockQuote {
    async fn probe(&self) -> Result<(), ProviderError> {
        if self.script.lock().down {
            return Err(down());
        }
        Ok(())
    }
}

/// Mock wallet that signs by tagging the payload.
#[derive(Debug)]
pub struct MockSigner {
    public_key: String,
    reject: Mutex<bool>,
    signed: AtomicU64,
}

impl MockSigner {
    /// Signer for `public_key`.
    #[must_use]
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            reject: Mutex::new(false),
            signed: AtomicU64::new(0),
        }
    }

    /// Refuse every signing request.
    pub fn set_reject(&self, reject: bool) {
        *self.reject.lock() = reject;
    }

    /// Transactions signed.
    #[must_use]
    pub fn signed(&self) -> u64 {
        self.signed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignerPort for MockSigner {
    fn public_key(&self) -> &str {
        &self.public_key
    }

    async fn sign(
        &self,
        transaction: &UnsignedTransaction,
    ) -> Result<SignedTransaction, ProviderError> {
        if *self.reject.lock() {
            return Err(ProviderError::Permanent {
                kind: crate::error::PermanentErrorKind::SignatureRejected,
                message: "signing refused".to_string(),
            });
        }
        let n = self.signed.fetch_add(1, Ordering::SeqCst);
        Ok(SignedTransaction {
            payload: transaction.payload.clone(),
            signature: format!("mock-sig-{n}"),
        })
    }
}
