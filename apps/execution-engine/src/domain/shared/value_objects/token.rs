//! SPL token reference.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A token mint and its decimal precision.
///
/// Engine sizes are expressed in whole-token units as [`Decimal`]; providers
/// speak integer base units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Mint address.
    pub mint: String,
    /// Decimal places of the mint.
    pub decimals: u8,
}

impl Token {
    /// Create a token reference.
    #[must_use]
    pub fn new(mint: impl Into<String>, decimals: u8) -> Self {
        Self {
            mint: mint.into(),
            decimals,
        }
    }

    /// Truncate an amount to the mint's precision.
    #[must_use]
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(
            u32::from(self.decimals),
            rust_decimal::RoundingStrategy::ToZero,
        )
    }

    /// Convert whole-token units to base units, truncating dust.
    ///
    /// Returns `None` for negative amounts or on overflow.
    #[must_use]
    pub fn to_base_units(&self, amount: Decimal) -> Option<u64> {
        if amount.is_sign_negative() {
            return None;
        }
        let scale = 10u64.checked_pow(u32::from(self.decimals))?;
        amount
            .checked_mul(Decimal::from(scale))?
            .trunc()
            .to_u64()
    }

    /// Convert base units to whole-token units.
    #[must_use]
    pub fn from_base_units(&self, units: u64) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(units), u32::from(self.decimals))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc() -> Token {
        Token::new("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", 6)
    }

    #[test]
    fn base_unit_conversion() {
        let token = usdc();
        assert_eq!(token.to_base_units(Decimal::new(12_345, 3)), Some(12_345_000));
        assert_eq!(token.from_base_units(12_345_000), Decimal::new(12_345, 3));
    }

    #[test]
    fn base_units_truncate_dust() {
        let token = usdc();
        assert_eq!(token.to_base_units(Decimal::new(1_000_000_9, 7)), Some(100_000_0));
    }

    #[test]
    fn negative_amounts_rejected() {
        assert_eq!(usdc().to_base_units(Decimal::new(-1, 0)), None);
    }

    #[test]
    fn round_truncates_to_precision() {
        let token = Token::new("mint", 2);
        assert_eq!(token.round(Decimal::new(12_349, 3)), Decimal::new(1_234, 2));
    }
}
