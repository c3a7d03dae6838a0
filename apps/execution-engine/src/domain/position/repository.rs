//! Position Repository Trait
//!
//! Positions are mutated only through [`PositionRepository::update`], which
//! serializes writers per position. Different positions never contend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::aggregate::Position;
use super::errors::PositionError;
use crate::domain::shared::PositionId;

/// Mutation applied under the per-position lock.
pub type PositionMutation<'a> =
    &'a mut (dyn FnMut(&mut Position) -> Result<(), PositionError> + Send);

/// Repository trait for Position persistence and the realized P&L ledger.
#[async_trait]
pub trait PositionRepository: Send + Sync {
    /// Insert a new position.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::AlreadyExists`] if the id is taken.
    async fn insert(&self, position: Position) -> Result<(), PositionError>;

    /// Insert `candidate` if absent, otherwise apply `mutate` to the stored
    /// position. Returns the stored position and whether it was inserted.
    ///
    /// # Errors
    ///
    /// Propagates the mutation's error.
    async fn insert_or_update(
        &self,
        candidate: Position,
        mutate: PositionMutation<'_>,
    ) -> Result<(Position, bool), PositionError>;

    /// Apply `mutate` under the position's lock and return the result.
    /// The stored position is left unchanged if `mutate` fails.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::NotFound`] or the mutation's error.
    async fn update(
        &self,
        id: &PositionId,
        mutate: PositionMutation<'_>,
    ) -> Result<Position, PositionError>;

    /// Fetch a position.
    ///
    /// # Errors
    ///
    /// Returns error if the lookup fails.
    async fn get(&self, id: &PositionId) -> Result<Option<Position>, PositionError>;

    /// Ids of open and closing positions.
    ///
    /// # Errors
    ///
    /// Returns error if the lookup fails.
    async fn active_ids(&self) -> Result<Vec<PositionId>, PositionError>;

    /// Snapshot of open and closing positions.
    ///
    /// # Errors
    ///
    /// Returns error if the lookup fails.
    async fn active(&self) -> Result<Vec<Position>, PositionError>;

    /// Add realized P&L to the ledger for the UTC day of `at`.
    ///
    /// # Errors
    ///
    /// Returns error if the ledger cannot be written.
    async fn record_realized_pnl(
        &self,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<(), PositionError>;

    /// Realized P&L for the UTC day of `now`; zero after a date change.
    ///
    /// # Errors
    ///
    /// Returns error if the ledger cannot be read.
    async fn daily_realized_pnl(&self, now: DateTime<Utc>) -> Result<Decimal, PositionError>;
}
