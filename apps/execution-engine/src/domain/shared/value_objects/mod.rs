//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.
//! Value objects are compared by value, not identity.

mod identifiers;
mod side;
mod token;
mod urgency;

pub use identifiers::{OrderId, PositionId, ProviderId};
pub use side::Side;
pub use token::Token;
pub use urgency::Urgency;
