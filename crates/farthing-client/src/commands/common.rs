use std::path::Path;

use crate::ClientResult;
use crate::setup::{SetupContext, ensure_initialized, ensure_initialized_at};

pub(crate) fn load_setup(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    match home_override {
        Some(home) => ensure_initialized_at(home),
        None => ensure_initialized(),
    }
}

/// Renders a minor-unit amount as a decimal string using the currency's
/// divisor, e.g. (-5000, 100) -> "-50.00". Divisors are powers of ten.
pub(crate) fn format_minor(amount: i64, divisor: i64) -> String {
    if divisor <= 1 {
        return amount.to_string();
    }

    let fraction_width = divisor.to_string().len() - 1;
    let sign = if amount < 0 { "-" } else { "" };
    let magnitude = amount.unsigned_abs();
    let divisor = divisor.unsigned_abs();
    let whole = magnitude / divisor;
    let fraction = magnitude % divisor;

    format!("{sign}{whole}.{fraction:0fraction_width$}")
}
