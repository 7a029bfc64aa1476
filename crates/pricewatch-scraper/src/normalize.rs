//! Conversion of storefront price text into decimal values.
//!
//! Storefronts render prices as `"$1,234.56"`, `"MXN 549.00"`, or as several
//! spans that join to `"$549.00"`. Commas are treated as thousands separators
//! and `.` as the only decimal separator.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::NormalizationError;

/// Parses currency-formatted text into a non-negative decimal.
///
/// Commas are removed, then everything except ASCII digits and `.` is
/// dropped: `"$1,234.56"` becomes `1234.56`.
///
/// # Errors
///
/// - [`NormalizationError::NoDigits`]: the text has no digit at all.
/// - [`NormalizationError::Negative`]: a minus sign is attached to the number,
///   directly or through a currency marker (`-5`, `$ -5`, `-$5`, `MXN -5`).
/// - [`NormalizationError::MultipleDecimalSeparators`]: more than one `.`
///   survives filtering (e.g. `"1.234.56"`).
/// - [`NormalizationError::Unrepresentable`]: too many digits for a `Decimal`.
pub fn normalize(raw: &str) -> Result<Decimal, NormalizationError> {
    let without_commas = raw.replace(',', "");

    let Some(first_digit) = without_commas.find(|c: char| c.is_ascii_digit()) else {
        return Err(NormalizationError::NoDigits {
            raw: raw.to_owned(),
        });
    };

    if has_sign(&without_commas[..first_digit]) {
        return Err(NormalizationError::Negative {
            raw: raw.to_owned(),
        });
    }

    let filtered: String = without_commas
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if filtered.matches('.').count() > 1 {
        return Err(NormalizationError::MultipleDecimalSeparators {
            raw: raw.to_owned(),
        });
    }

    let trimmed = filtered.trim_end_matches('.');
    let canonical = if trimmed.starts_with('.') {
        format!("0{trimmed}")
    } else {
        trimmed.to_owned()
    };

    Decimal::from_str(&canonical).map_err(|e| NormalizationError::Unrepresentable {
        raw: raw.to_owned(),
        reason: e.to_string(),
    })
}

/// Symbols that may sit between a minus sign and the amount.
const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '¢', '₡', '₩', '₱', '₲', '₹'];

/// Whether the text before the first digit ends in a sign for that number.
///
/// A minus counts when only whitespace separates it from the digits, or when
/// it is glued to the currency marker in front of them. Hyphens inside labels
/// (`Pre-venta $549`, `Precio - $549`) are not signs.
fn has_sign(prefix: &str) -> bool {
    let is_minus = |s: &str| s.ends_with(['-', '\u{2212}']);

    let rest = prefix.trim_end();
    if is_minus(rest) {
        return true;
    }
    strip_currency_marker(rest).is_some_and(is_minus)
}

fn strip_currency_marker(s: &str) -> Option<&str> {
    let without_symbols = s.trim_end_matches(CURRENCY_SYMBOLS);
    if without_symbols.len() < s.len() {
        return Some(without_symbols);
    }
    let code_start = s.len().checked_sub(3)?;
    let code = s.get(code_start..)?;
    code.bytes()
        .all(|b| b.is_ascii_uppercase())
        .then(|| &s[..code_start])
}

/// Divides `price` by `divisor`, rounding to cents with banker's rounding.
///
/// Returns `None` for a non-positive divisor or on overflow.
#[must_use]
pub fn unit_price(price: Decimal, divisor: Decimal) -> Option<Decimal> {
    if divisor <= Decimal::ZERO {
        return None;
    }
    price
        .checked_div(divisor)
        .map(|v| v.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
