use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

static PRICE_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[₹,\s]").expect("valid price pattern"));

/// Error returned when a price argument cannot be turned into a [`Decimal`].
#[derive(Debug, Error)]
pub enum ParsePriceError {
    #[error("price is empty")]
    Empty,

    #[error("invalid price '{input}': {source}")]
    Invalid {
        input: String,
        #[source]
        source: rust_decimal::Error,
    },

    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
}

/// Parses a price as shoppers write it.
///
/// A leading `₹`, comma thousands separators and whitespace are ignored,
/// so `"₹1,234.50"` parses as `1234.50`.
pub fn parse_price(s: &str) -> Result<Decimal, ParsePriceError> {
    let normalized = PRICE_NOISE.replace_all(s, "");
    if normalized.is_empty() {
        return Err(ParsePriceError::Empty);
    }
    let price: Decimal = normalized.parse().map_err(|e| {
        tracing::error!(input = %s, "invalid price: {}", e);
        ParsePriceError::Invalid {
            input: s.to_string(),
            source: e,
        }
    })?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ParsePriceError::Negative(price));
    }
    Ok(price)
}

/// Clap value parser for price arguments.
pub fn price_arg(s: &str) -> Result<Decimal, String> {
    parse_price(s).map_err(|e| e.to_string())
}

/// Formats an amount as rupees with comma thousands separators and at most
/// two decimal places, e.g. `₹12,345.5`.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    match fraction {
        Some(fraction) => format!("{sign}₹{grouped}.{fraction}"),
        None => format!("{sign}₹{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_price_accepts_rupee_sign_and_commas() {
        assert_eq!(parse_price("₹1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_price("1,25,000").unwrap(), dec!(125000));
    }

    #[test]
    fn parse_price_trims_whitespace() {
        assert_eq!(parse_price("  ₹ 800 ").unwrap(), dec!(800));
    }

    #[test]
    fn parse_price_rejects_empty() {
        assert!(matches!(parse_price(""), Err(ParsePriceError::Empty)));
        assert!(matches!(parse_price(" ₹ "), Err(ParsePriceError::Empty)));
    }

    #[test]
    fn parse_price_rejects_garbage() {
        assert!(matches!(
            parse_price("twelve"),
            Err(ParsePriceError::Invalid { .. })
        ));
    }

    #[test]
    fn parse_price_rejects_negative() {
        assert!(matches!(
            parse_price("-5"),
            Err(ParsePriceError::Negative(_))
        ));
    }

    #[test]
    fn format_money_groups_thousands() {
        assert_eq!(format_money(dec!(3150)), "₹3,150");
        assert_eq!(format_money(dec!(1234567.5)), "₹1,234,567.5");
        assert_eq!(format_money(dec!(999)), "₹999");
    }

    #[test]
    fn format_money_rounds_to_paise() {
        assert_eq!(format_money(dec!(12.345)), "₹12.35");
        assert_eq!(format_money(dec!(200.00)), "₹200");
    }

    #[test]
    fn format_money_zero_and_negative() {
        assert_eq!(format_money(Decimal::ZERO), "₹0");
        assert_eq!(format_money(dec!(-1500)), "-₹1,500");
    }
}
