use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

const EMPTY_PLACEHOLDER: &str = "--";

/// `value` at `dp` decimals, halves rounded away from zero. `round_dp` alone rounds
/// half to even, which shows `0.12345` as `0.1234`.
pub fn fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.p$}", p = dp as usize)
}

/// Decimal extension trait
pub trait DecimalExt {
    fn format_price(&self) -> String;
    fn format_percent(&self) -> String;
}

impl DecimalExt for Decimal {
    fn format_price(&self) -> String {
        // penny stocks get an extra digit
        if self.abs() < Decimal::ONE {
            fixed(*self, 4)
        } else {
            fixed(*self, 2)
        }
    }

    /// Formats a value that is already expressed in percent (e.g. `1.25` -> `+1.25%`).
    fn format_percent(&self) -> String {
        if self.is_sign_negative() && !self.is_zero() {
            format!("{}%", fixed(*self, 2))
        } else {
            format!("+{}%", fixed(*self, 2))
        }
    }
}

/// Lossy bridge from the `f64` numbers the backend sends.
pub fn decimal(value: f64) -> Option<Decimal> {
    value.is_finite().then(|| Decimal::from_f64(value)).flatten()
}

pub fn price_or_placeholder(value: Option<f64>) -> String {
    value
        .and_then(decimal)
        .map_or_else(|| EMPTY_PLACEHOLDER.to_string(), |v| v.format_price())
}

pub fn percent_or_placeholder(value: Option<f64>) -> String {
    value
        .and_then(decimal)
        .map_or_else(|| EMPTY_PLACEHOLDER.to_string(), |v| v.format_percent())
}
