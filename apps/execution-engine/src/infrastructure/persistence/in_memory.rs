//! In-memory idempotency store and position repository.
//!
//! Suitable for a single engine process. State does not survive a restart.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tokio::sync::watch;

use crate::domain::order_execution::{IdempotencyClaim, IdempotencyStore, OrderResult};
use crate::domain::position::{Position, PositionError, PositionMutation, PositionRepository};
use crate::domain::shared::{OrderId, PositionId};

enum Record {
    InFlight(watch::Sender<Option<OrderResult>>),
    Done(Box<OrderResult>),
}

/// In-memory implementation of [`IdempotencyStore`].
#[derive(Default)]
pub struct InMemoryIdempotencyStore {
    records: Mutex<HashMap<OrderId, Record>>,
}

impl std::fmt::Debug for InMemoryIdempotencyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIdempotencyStore")
            .field("records", &self.records.lock().len())
            .finish()
    }
}

impl InMemoryIdempotencyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of claimed ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn claim(&self, id: &OrderId) -> IdempotencyClaim {
        match self.records.lock().entry(id.clone()) {
            Entry::Occupied(entry) => match entry.get() {
                Record::InFlight(_) => IdempotencyClaim::InFlight,
                Record::Done(result) => IdempotencyClaim::Completed(result.clone()),
            },
            Entry::Vacant(entry) => {
                entry.insert(Record::InFlight(watch::channel(None).0));
                IdempotencyClaim::Acquired
            }
        }
    }

    async fn complete(&self, id: &OrderId, result: OrderResult) {
        let previous = self
            .records
            .lock()
            .insert(id.clone(), Record::Done(Box::new(result.clone())));
        if let Some(Record::InFlight(tx)) = previous {
            tx.send_replace(Some(result));
        }
    }

    async fn wait(&self, id: &OrderId) -> Option<OrderResult> {
        let mut rx = match self.records.lock().get(id) {
            None => return None,
            Some(Record::Done(result)) => return Some((**result).clone()),
            Some(Record::InFlight(tx)) => tx.subscribe(),
        };
        let delivered = rx.wait_for(Option::is_some).await.ok().and_then(|v| v.clone());
        match delivered {
            Some(result) => Some(result),
            None => self.get(id).await,
        }
    }

    async fn get(&self, id: &OrderId) -> Option<OrderResult> {
        match self.records.lock().get(id) {
            Some(Record::Done(result)) => Some((**result).clone()),
            _ => None,
        }
    }

    async fn is_in_flight(&self, id: &OrderId) -> bool {
        matches!(self.records.lock().get(id), Some(Record::InFlight(_)))
    }
}

#[derive(Debug, Default)]
struct PnlLedger {
    day: Option<NaiveDate>,
    realized: Decimal,
}

type Slot = Arc<tokio::sync::Mutex<Position>>;

/// In-memory implementation of [`PositionRepository`].
///
/// Each position sits behind its own async lock, so updates to one position
/// are serialized while different positions proceed in parallel.
#[derive(Debug, Default)]
pub struct InMemoryPositionRepository {
    positions: RwLock<HashMap<PositionId, Slot>>,
    ledger: Mutex<PnlLedger>,
}

impl InMemoryPositionRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of positions ever stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.read().len()
    }

    /// Check if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.read().is_empty()
    }

    fn slot(&self, id: &PositionId) -> Option<Slot> {
        self.positions.read().get(id).cloned()
    }

    async fn apply(slot: &Slot, mutate: PositionMutation<'_>) -> Result<Position, PositionError> {
        let mut stored = slot.lock().await;
        let mut next = stored.clone();
        mutate(&mut next)?;
        *stored = next.clone();
        Ok(next)
    }

    async fn snapshot(&self) -> Vec<Position> {
        let slots: Vec<Slot> = self.positions.read().values().cloned().collect();
        let mut all = Vec::with_capacity(slots.len());
        for slot in slots {
            all.push(slot.lock().await.clone());
        }
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }
}

#[async_trait]
impl PositionRepository for InMemoryPositionRepository {
    async fn insert(&self, position: Position) -> Result<(), PositionError> {
        match self.positions.write().entry(position.id().clone()) {
            Entry::Occupied(entry) => Err(PositionError::AlreadyExists {
                position_id: entry.key().to_string(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(tokio::sync::Mutex::new(position)));
                Ok(())
            }
        }
    }

    async fn insert_or_update(
        &self,
        candidate: Position,
        mutate: PositionMutation<'_>,
    ) -> Result<(Position, bool), PositionError> {
        let slot = match self.positions.write().entry(candidate.id().clone()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(tokio::sync::Mutex::new(candidate.clone())));
                return Ok((candidate, true));
            }
        };
        Self::apply(&slot, mutate).await.map(|p| (p, false))
    }

    async fn update(
        &self,
        id: &PositionId,
        mutate: PositionMutation<'_>,
    ) -> Result<Position, PositionError> {
        let slot = self.slot(id).ok_or_else(|| PositionError::NotFound {
            position_id: id.to_string(),
        })?;
        Self::apply(&slot, mutate).await
    }

    async fn get(&self, id: &PositionId) -> Result<Option<Position>, PositionError> {
        let Some(slot) = self.slot(id) else {
            return Ok(None);
        };
        let position = slot.lock().await.clone();
        Ok(Some(position))
    }

    async fn active_ids(&self) -> Result<Vec<PositionId>, PositionError> {
        Ok(self
            .snapshot()
            .await
            .into_iter()
            .filter(|p| p.status().is_active())
            .map(|p| p.id().clone())
            .collect())
    }

    async fn active(&self) -> Result<Vec<Position>, PositionError> {
        Ok(self
            .snapshot()
            .await
            .into_iter()
            .filter(|p| p.status().is_active())
            .collect())
    }

    async fn record_realized_pnl(
        &self,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<(), PositionError> {
        let day = at.date_naive();
        let mut ledger = self.ledger.lock();
        if ledger.day != Some(day) {
            ledger.day = Some(day);
            ledger.realized = Decimal::ZERO;
        }
        ledger.realized += amount;
        Ok(())
    }

    async fn daily_realized_pnl(&self, now: DateTime<Utc>) -> Result<Decimal, PositionError> {
        let ledger = self.ledger.lock();
        if ledger.day == Some(now.date_naive()) {
            Ok(ledger.realized)
        } else {
            Ok(Decimal::ZERO)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeDelta;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::order_execution::OrderRequest;
    use crate::domain::position::{ExitPlan, PositionStatus};
    use crate::domain::shared::{Side, Token, Urgency};
    use crate::error::ExecutionError;

    fn position(id: &str) -> Position {
        Position::open(
            PositionId::new(id),
            Token::new("MINT", 6),
            dec!(10),
            dec!(100),
            ExitPlan::default_spot(),
            Utc::now(),
        )
        .unwrap()
    }

    fn result(id: &str) -> OrderResult {
        let request = OrderRequest {
            id: OrderId::new(id),
            token: Token::new("MINT", 6),
            side: Side::Buy,
            size: dec!(1),
            max_slippage_bps: 50,
            urgency: Urgency::Medium,
            algorithm_hint: None,
            expected_price: None,
            position_id: None,
            exit_plan: None,
        };
        OrderResult::failed(&request, &ExecutionError::Cancelled, Utc::now())
    }

    #[tokio::test]
    async fn claim_is_exclusive() {
        let store = InMemoryIdempotencyStore::new();
        let id = OrderId::new("o-1");

        assert_eq!(store.claim(&id).await, IdempotencyClaim::Acquired);
        assert_eq!(store.claim(&id).await, IdempotencyClaim::InFlight);
        assert!(store.is_in_flight(&id).await);

        store.complete(&id, result("o-1")).await;
        assert!(matches!(store.claim(&id).await, IdempotencyClaim::Completed(_)));
        assert!(!store.is_in_flight(&id).await);
    }

    #[tokio::test]
    async fn waiters_receive_the_completed_result() {
        let store = Arc::new(InMemoryIdempotencyStore::new());
        let id = OrderId::new("o-2");
        store.claim(&id).await;

        let waiter = {
            let store = Arc::clone(&store);
            let id = id.clone();
            tokio::spawn(async move { store.wait(&id).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.complete(&id, result("o-2")).await;

        let got = waiter.await.unwrap().unwrap();
        assert_eq!(got.order_id, id);
        assert!(store.wait(&OrderId::new("unknown")).await.is_none());
    }

    #[tokio::test]
    async fn failed_mutation_leaves_position_unchanged() {
        let repo = InMemoryPositionRepository::new();
        repo.insert(position("p1")).await.unwrap();

        let err = repo
            .update(&PositionId::new("p1"), &mut |p| {
                p.reduce(dec!(4), Some(dec!(110)), Utc::now())?;
                Err(PositionError::InvalidPrice {
                    price: "0".to_string(),
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PositionError::InvalidPrice { .. }));

        let stored = repo.get(&PositionId::new("p1")).await.unwrap().unwrap();
        assert_eq!(stored.size(), dec!(10));
    }

    #[tokio::test]
    async fn insert_rejects_duplicates_and_update_requires_existing() {
        let repo = InMemoryPositionRepository::new();
        repo.insert(position("p1")).await.unwrap();
        assert!(matches!(
            repo.insert(position("p1")).await,
            Err(PositionError::AlreadyExists { .. })
        ));
        assert!(matches!(
            repo.update(&PositionId::new("nope"), &mut |_| Ok(())).await,
            Err(PositionError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn insert_or_update_applies_mutation_to_existing() {
        let repo = InMemoryPositionRepository::new();
        let (_, inserted) = repo
            .insert_or_update(position("p1"), &mut |_| Ok(()))
            .await
            .unwrap();
        assert!(inserted);

        let (stored, inserted) = repo
            .insert_or_update(position("p1"), &mut |p| {
                p.apply_entry_fill(dec!(10), dec!(120), Utc::now())
            })
            .await
            .unwrap();
        assert!(!inserted);
        assert_eq!(stored.size(), dec!(20));
        assert_eq!(stored.entry_price(), dec!(110));
    }

    #[tokio::test]
    async fn closed_positions_are_not_active() {
        let repo = InMemoryPositionRepository::new();
        repo.insert(position("a")).await.unwrap();
        repo.insert(position("b")).await.unwrap();
        let closed = repo
            .update(&PositionId::new("b"), &mut |p| {
                p.reduce(dec!(10), Some(dec!(100)), Utc::now()).map(|_| ())
            })
            .await
            .unwrap();
        assert_eq!(closed.status(), PositionStatus::Closed);

        let ids = repo.active_ids().await.unwrap();
        assert_eq!(ids, vec![PositionId::new("a")]);
        assert_eq!(repo.active().await.unwrap().len(), 1);
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn daily_pnl_resets_on_utc_date_change() {
        let repo = InMemoryPositionRepository::new();
        let today = Utc::now();
        repo.record_realized_pnl(dec!(-40), today).await.unwrap();
        repo.record_realized_pnl(dec!(-60), today).await.unwrap();
        assert_eq!(repo.daily_realized_pnl(today).await.unwrap(), dec!(-100));

        let tomorrow = today + TimeDelta::days(1);
        assert_eq!(repo.daily_realized_pnl(tomorrow).await.unwrap(), Decimal::ZERO);
        repo.record_realized_pnl(dec!(5), tomorrow).await.unwrap();
        assert_eq!(repo.daily_realized_pnl(tomorrow).await.unwrap(), dec!(5));
    }
}
