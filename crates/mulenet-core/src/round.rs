//! Decimal rounding for report values.
//!
//! Scores are rounded to one decimal and money to two. Rounding works on the
//! exact decimal expansion of the binary value, so `round_to(2.675, 2)` is
//! `2.67` (the stored value sits just below the midpoint). Multiplying by a
//! power of ten and calling `f64::round` rounds that input up instead.

/// Round `value` to `places` decimal digits.
///
/// Non-finite inputs are returned unchanged.
#[must_use]
pub fn round_to(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let rendered = format!("{value:.places$}");
    rendered.parse::<f64>().unwrap_or(value)
}

/// Round a score to one decimal.
#[must_use]
pub fn round_score(value: f64) -> f64 {
    round_to(value, 1)
}

/// Round a monetary amount to two decimals.
#[must_use]
pub fn round_money(value: f64) -> f64 {
    round_to(value, 2)
}
