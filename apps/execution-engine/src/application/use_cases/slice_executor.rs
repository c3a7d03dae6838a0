//! Child slice execution.
//!
//! One slice runs quote, price checks, fee estimate, swap build, sign,
//! optional simulation and send. Retryable failures before the send are
//! retried with a fresh quote and exponential backoff. Failed sends are
//! retried with the same signed transaction. Everything else fails the slice.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    ProviderError, Quote, QuotePort, QuoteRequest, RpcPort, SignedTransaction, SignerPort,
    SwapParams,
};
use crate::application::services::{FeeService, PoolError, ProviderPool};
use crate::domain::execution_tactics::{AlgorithmKind, ChildSlice};
use crate::domain::fees::FeeEstimate;
use crate::domain::order_execution::Fill;
use crate::domain::shared::{Side, Token, Urgency};
use crate::error::{ExecutionError, PermanentErrorKind};
use crate::observability::record_slice_outcome;
use crate::resilience::{ExponentialBackoffCalculator, RetryPolicy};

const BPS: Decimal = dec!(10_000);

/// Order-level parameters shared by every slice.
#[derive(Debug, Clone)]
pub struct SliceJob {
    /// Token traded.
    pub token: Token,
    /// Buy or sell.
    pub side: Side,
    /// Caller urgency, drives the fee tier.
    pub urgency: Urgency,
    /// Slippage tolerance against `expected_price`.
    pub max_slippage_bps: u32,
    /// Reference price for slippage checks.
    pub expected_price: Decimal,
    /// Price impact ceiling (iceberg only).
    pub max_price_impact_bps: Option<u32>,
    /// Algorithm label for metrics.
    pub algorithm: AlgorithmKind,
}

impl SliceJob {
    /// Reject a quote outside the slippage tolerance.
    ///
    /// # Errors
    ///
    /// [`ExecutionError::SlippageExceeded`] when a buy quotes above or a sell
    /// quotes below the tolerated band.
    pub fn check_slippage(&self, quoted: Decimal) -> Result<(), ExecutionError> {
        let tolerance = Decimal::from(self.max_slippage_bps) / BPS;
        let breached = match self.side {
            Side::Buy => quoted > self.expected_price * (Decimal::ONE + tolerance),
            Side::Sell => quoted < self.expected_price * (Decimal::ONE - tolerance),
        };
        if breached {
            return Err(ExecutionError::SlippageExceeded {
                expected: self.expected_price,
                quoted,
                max_slippage_bps: self.max_slippage_bps,
            });
        }
        Ok(())
    }

    /// Reject a quote whose impact is above the iceberg ceiling.
    ///
    /// # Errors
    ///
    /// [`ExecutionError::PriceImpactExceeded`].
    pub fn check_price_impact(&self, quote: &Quote) -> Result<(), ExecutionError> {
        match self.max_price_impact_bps {
            Some(max_bps) if quote.price_impact_bps > Decimal::from(max_bps) => {
                Err(ExecutionError::PriceImpactExceeded {
                    impact_bps: quote.price_impact_bps,
                    max_bps,
                })
            }
            _ => Ok(()),
        }
    }
}

/// A signed transaction ready for broadcast, with the quote it was built from.
struct Prepared {
    quote: Quote,
    signed: SignedTransaction,
    fee: FeeEstimate,
}

struct SliceFailure {
    error: ExecutionError,
    retry_after: Option<Duration>,
}

impl SliceFailure {
    fn next_delay(&self, backoff: &mut ExponentialBackoffCalculator) -> Option<Duration> {
        if self.error.is_retryable() {
            backoff.next_backoff_or(self.retry_after)
        } else {
            None
        }
    }
}

impl From<ExecutionError> for SliceFailure {
    fn from(error: ExecutionError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

impl From<PoolError> for SliceFailure {
    fn from(err: PoolError) -> Self {
        let retry_after = err.retry_after();
        Self {
            error: err.into(),
            retry_after,
        }
    }
}

/// Drives child slices through the provider pools.
pub struct SliceExecutor {
    quotes: Arc<ProviderPool<dyn QuotePort>>,
    rpc: Arc<ProviderPool<dyn RpcPort>>,
    signer: Arc<dyn SignerPort>,
    fees: Arc<FeeService>,
    retry: RetryPolicy,
    simulate_before_send: bool,
}

impl std::fmt::Debug for SliceExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliceExecutor")
            .field("quotes", &self.quotes)
            .field("rpc", &self.rpc)
            .field("wallet", &self.signer.public_key())
            .field("simulate_before_send", &self.simulate_before_send)
            .finish_non_exhaustive()
    }
}

impl SliceExecutor {
    /// Create an executor.
    #[must_use]
    pub fn new(
        quotes: Arc<ProviderPool<dyn QuotePort>>,
        rpc: Arc<ProviderPool<dyn RpcPort>>,
        signer: Arc<dyn SignerPort>,
        fees: Arc<FeeService>,
        retry: RetryPolicy,
        simulate_before_send: bool,
    ) -> Self {
        Self {
            quotes,
            rpc,
            signer,
            fees,
            retry,
            simulate_before_send,
        }
    }

    /// Quote pool, shared with the order snapshot and the exit monitor.
    #[must_use]
    pub const fn quotes(&self) -> &Arc<ProviderPool<dyn QuotePort>> {
        &self.quotes
    }

    /// Execute one slice to a terminal state.
    ///
    /// Until a transaction is signed and handed to the RPC pool, retryable
    /// failures start over with a fresh quote. From then on the slice only
    /// resends that same signed transaction, so at most one swap per slice
    /// can land. Cancellation is honoured only before submission.
    ///
    /// # Errors
    ///
    /// Returns the last error once the slice is failed or cancelled.
    #[tracing::instrument(
        name = "order.slice",
        skip_all,
        fields(order_id = %slice.parent, slice = slice.index, algorithm = job.algorithm.as_str())
    )]
    pub async fn execute(
        &self,
        job: &SliceJob,
        slice: &mut ChildSlice,
        cancel: &CancellationToken,
    ) -> Result<Fill, ExecutionError> {
        let mut backoff = ExponentialBackoffCalculator::new(&self.retry);

        let outcome = match self.prepare_with_retry(job, slice, cancel, &mut backoff).await {
            Ok(prepared) => {
                slice.mark_submitted();
                self.send_with_retry(slice, prepared, &mut backoff).await
            }
            Err(error) => Err(error),
        };

        match &outcome {
            Ok(_) => slice.mark_filled(),
            Err(ExecutionError::Cancelled) => slice.mark_cancelled(),
            Err(error) => {
                tracing::warn!(
                    order_id = %slice.parent,
                    slice = slice.index,
                    attempts = slice.attempts,
                    code = %error.code(),
                    error = %error,
                    "Slice failed"
                );
                slice.mark_failed(error.to_info());
            }
        }
        record_slice_outcome(job.algorithm.as_str(), slice.status.as_str(), slice.attempts);
        outcome
    }

    async fn prepare_with_retry(
        &self,
        job: &SliceJob,
        slice: &mut ChildSlice,
        cancel: &CancellationToken,
        backoff: &mut ExponentialBackoffCalculator,
    ) -> Result<Prepared, ExecutionError> {
        loop {
            slice.attempts += 1;
            let failure = match self.prepare(job, slice).await {
                Ok(prepared) => return Ok(prepared),
                Err(failure) => failure,
            };
            let Some(delay) = failure.next_delay(backoff) else {
                return Err(failure.error);
            };

            tracing::debug!(
                order_id = %slice.parent,
                slice = slice.index,
                attempt = slice.attempts,
                delay_ms = delay.as_millis() as u64,
                error = %failure.error,
                "Retrying slice with a fresh quote"
            );
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = cancel.cancelled() => return Err(ExecutionError::Cancelled),
            }
        }
    }

    async fn prepare(&self, job: &SliceJob, slice: &ChildSlice) -> Result<Prepared, SliceFailure> {
        let request = QuoteRequest {
            token: job.token.clone(),
            side: job.side,
            amount: slice.planned_size,
            slippage_bps: job.max_slippage_bps,
        };
        let request = &request;
        let (quote, quote_provider) = self
            .quotes
            .call("quote", |q| async move { q.quote(request).await })
            .await?;

        job.check_slippage(quote.price)?;
        job.check_price_impact(&quote)?;

        let fee = self.fees.estimate(job.urgency, &job.token.mint).await;
        let params = SwapParams {
            user_public_key: self.signer.public_key().to_string(),
            compute_unit_price_micro_lamports: fee.compute_unit_price_micro_lamports,
        };
        let (quote_ref, params) = (&quote, &params);
        let unsigned = self
            .quotes
            .call_on(&quote_provider, "swap", |q| async move {
                q.swap_transaction(quote_ref, params).await
            })
            .await?;

        let signed = self.signer.sign(&unsigned).await.map_err(signer_error)?;

        if self.simulate_before_send {
            self.simulate(&signed).await?;
        }

        Ok(Prepared { quote, signed, fee })
    }

    /// Broadcast `prepared.signed`, resending the same bytes on retryable
    /// failures. Cancellation is ignored: the first send may already have
    /// landed.
    async fn send_with_retry(
        &self,
        slice: &mut ChildSlice,
        prepared: Prepared,
        backoff: &mut ExponentialBackoffCalculator,
    ) -> Result<Fill, ExecutionError> {
        let signed = &prepared.signed;
        loop {
            slice.attempts += 1;
            let failure: SliceFailure = match self
                .rpc
                .call("sendTransaction", |rpc| async move { rpc.send_transaction(signed).await })
                .await
            {
                Ok((signature, rpc_provider)) => {
                    tracing::info!(
                        order_id = %slice.parent,
                        slice = slice.index,
                        size = %slice.planned_size,
                        price = %prepared.quote.price,
                        provider = %rpc_provider,
                        signature = %signature,
                        tier = %prepared.fee.tier,
                        "Slice sent"
                    );
                    return Ok(Fill {
                        slice_index: slice.index,
                        quantity: slice.planned_size,
                        price: prepared.quote.price,
                        signature,
                        provider: rpc_provider,
                        priority_fee_lamports: prepared.fee.priority_fee_lamports,
                        filled_at: Utc::now(),
                    });
                }
                Err(err) => err.into(),
            };

            let Some(delay) = failure.next_delay(backoff) else {
                return Err(unconfirmed_send(&signed.signature, failure.error));
            };
            tracing::debug!(
                order_id = %slice.parent,
                slice = slice.index,
                attempt = slice.attempts,
                signature = %signed.signature,
                delay_ms = delay.as_millis() as u64,
                error = %failure.error,
                "Resending signed transaction"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn simulate(&self, signed: &SignedTransaction) -> Result<(), SliceFailure> {
        let (simulation, _) = self
            .rpc
            .call("simulateTransaction", |rpc| async move {
                rpc.simulate_transaction(signed).await
            })
            .await?;

        let Some(message) = simulation.error else {
            return Ok(());
        };
        let error = match ProviderError::from_message(&message) {
            ProviderError::Permanent { kind, message } => ExecutionError::PermanentOrder { kind, message },
            other => ExecutionError::TransientProvider {
                message: format!("simulation failed: {other}"),
            },
        };
        Err(error.into())
    }
}

/// A send that gave up after retryable failures may still have landed.
fn unconfirmed_send(signature: &str, error: ExecutionError) -> ExecutionError {
    if error.is_retryable() {
        ExecutionError::TransientProvider {
            message: format!("outcome unknown for transaction {signature}: {error}"),
        }
    } else {
        error
    }
}

fn signer_error(err: ProviderError) -> SliceFailure {
    let error = match err {
        ProviderError::Permanent { message, .. } => ExecutionError::PermanentOrder {
            kind: PermanentErrorKind::SignatureRejected,
            message,
        },
        other => ExecutionError::TransientProvider {
            message: format!("signer: {other}"),
        },
    };
    error.into()
}
