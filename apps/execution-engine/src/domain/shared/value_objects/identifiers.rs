//! Strongly-typed identifiers.
//!
//! Orders, positions and providers live in separate keyed stores and refer to
//! each other only through these ids.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a random identifier (UUID v4).
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Borrow the inner string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(OrderId, "Caller-supplied order id, also the idempotency key.");
define_id!(PositionId, "Identifier of an open or historical position.");
define_id!(ProviderId, "Identifier of a configured RPC or quote provider.");

impl PositionId {
    /// Position opened by the fills of a buy order.
    #[must_use]
    pub fn for_order(order_id: &OrderId) -> Self {
        Self(format!("pos-{order_id}"))
    }
}

impl OrderId {
    /// Deterministic id of an exit order.
    ///
    /// The attempt number keeps a retried exit from hitting the cached result
    /// of a previous failed attempt.
    #[must_use]
    pub fn for_exit(position_id: &PositionId, trigger: &str, attempt: u32) -> Self {
        Self(format!("exit-{position_id}-{trigger}-{attempt}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_new_and_display() {
        let id = OrderId::new("ord-123");
        assert_eq!(id.as_str(), "ord-123");
        assert_eq!(format!("{id}"), "ord-123");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(ProviderId::generate(), ProviderId::generate());
    }

    #[test]
    fn position_id_derives_from_order() {
        let order = OrderId::new("ord-7");
        assert_eq!(PositionId::for_order(&order).as_str(), "pos-ord-7");
    }

    #[test]
    fn exit_ids_differ_per_attempt() {
        let pos = PositionId::new("pos-1");
        let first = OrderId::for_exit(&pos, "stop_loss", 1);
        let second = OrderId::for_exit(&pos, "stop_loss", 2);
        assert_eq!(first.as_str(), "exit-pos-1-stop_loss-1");
        assert_ne!(first, second);
    }

    #[test]
    fn serde_is_transparent() {
        let id = ProviderId::new("helius");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"helius\"");
        let parsed: ProviderId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
