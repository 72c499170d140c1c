//! Text formatting for label fields.
//!
//! | Helper | Example |
//! |--------|---------|
//! | [`money`] | `105` → `105.00` |
//! | [`signed`] | `105` → `+105.00`, `-3` → `-3.00` |
//! | [`negated`] | `5` → `-5.00`, `0` → `+0.00` |
//! | [`percentage`] | `5` → `5%` |
//! | [`quantity`] | `3.000` → `3` |
//! | [`truncate`] | `("ABCDEFGH", 6)` → `ABC...` |
//! | [`date`] | `2024-03-07` → `07/03/24` |

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};

/// Round to two fractional digits, half away from zero. Negative zero
/// collapses to zero.
pub fn round_money(value: Decimal) -> Decimal {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() { Decimal::ZERO } else { rounded }
}

/// Currency with exactly two fractional digits.
pub fn money(value: Decimal) -> String {
    format!("{:.2}", round_money(value))
}

/// Currency with an explicit sign: `+` for zero and positive values.
pub fn signed(value: Decimal) -> String {
    let rounded = round_money(value);
    if rounded.is_sign_negative() {
        money(rounded)
    } else {
        format!("+{}", money(rounded))
    }
}

/// Currency rendered as a deduction regardless of the stored sign.
///
/// A deduction that rounds to zero prints as `+0.00`, matching [`signed`].
pub fn negated(value: Decimal) -> String {
    signed(-round_money(value).abs())
}

/// Integer percentage suffix.
pub fn percentage(rate: Decimal) -> String {
    let whole = rate.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("{}%", whole.normalize())
}

/// Quantity without trailing fractional zeros.
pub fn quantity(value: Decimal) -> String {
    if value.is_zero() {
        return "0".to_string();
    }
    value.normalize().to_string()
}

/// Fit `text` into a column of `budget` characters.
///
/// Longer text keeps its first `budget - 3` characters followed by `...`.
/// The result never exceeds `budget` characters, so a budget under 4
/// leaves only part of the ellipsis.
pub fn truncate(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    if budget < ELLIPSIS.len() {
        return ELLIPSIS[..budget].to_string();
    }
    let kept: String = text.chars().take(budget - ELLIPSIS.len()).collect();
    format!("{}{}", kept, ELLIPSIS)
}

const ELLIPSIS: &str = "...";

/// Render a stored date as `dd/mm/yy`.
///
/// Accepts ISO dates, RFC 3339 timestamps and naive `T`/space separated
/// timestamps. Anything else is returned unchanged.
pub fn date(raw: &str) -> String {
    let raw = raw.trim();
    parse_date(raw)
        .map(|d| d.format("%d/%m/%y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money() {
        assert_eq!(money(dec!(105)), "105.00");
        assert_eq!(money(dec!(1.5)), "1.50");
        assert_eq!(money(dec!(2.345)), "2.35");
        assert_eq!(money(dec!(-2.345)), "-2.35");
        assert_eq!(money(dec!(-0.001)), "0.00");
    }

    #[test]
    fn test_signed() {
        assert_eq!(signed(dec!(105.00)), "+105.00");
        assert_eq!(signed(dec!(0)), "+0.00");
        assert_eq!(signed(dec!(-3)), "-3.00");
        assert_eq!(signed(dec!(-0.004)), "+0.00");
    }

    #[test]
    fn test_negated() {
        assert_eq!(negated(dec!(5)), "-5.00");
        assert_eq!(negated(dec!(-5)), "-5.00");
        assert_eq!(negated(dec!(-2.345)), "-2.35");
    }

    #[test]
    fn test_zero_deduction_is_not_negative() {
        assert_eq!(negated(dec!(0)), "+0.00");
        assert_eq!(negated(dec!(0.004)), "+0.00");
        assert_eq!(negated(dec!(-0.004)), "+0.00");
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(dec!(5)), "5%");
        assert_eq!(percentage(dec!(5.00)), "5%");
        assert_eq!(percentage(dec!(0)), "0%");
        assert_eq!(percentage(dec!(12.5)), "13%");
    }

    #[test]
    fn test_quantity() {
        assert_eq!(quantity(dec!(3)), "3");
        assert_eq!(quantity(dec!(3.000)), "3");
        assert_eq!(quantity(dec!(2.50)), "2.5");
        assert_eq!(quantity(dec!(0.00)), "0");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("SHORT", 10), "SHORT");
        assert_eq!(truncate("EXACTLYTEN", 10), "EXACTLYTEN");
        assert_eq!(truncate("ABCDEFGHIJK", 10), "ABCDEFG...");
    }

    #[test]
    fn test_truncate_never_exceeds_budget() {
        assert_eq!(truncate("ABCDEF", 3), "...");
        assert_eq!(truncate("ABCDEF", 2), "..");
        assert_eq!(truncate("ABCDEF", 1), ".");
        assert_eq!(truncate("ABCDEF", 0), "");
        for budget in 0..8 {
            assert!(truncate("ABCDEFGHIJ", budget).chars().count() <= budget);
        }
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("شارع الملك فهد", 7), "شارع...");
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(date("2024-03-07"), "07/03/24");
        assert_eq!(date("2024-03-07T10:15:00Z"), "07/03/24");
        assert_eq!(date("2024-03-07T10:15:00+04:00"), "07/03/24");
        assert_eq!(date("2024-03-07 10:15:00"), "07/03/24");
        assert_eq!(date("2024-03-07T10:15:00.250"), "07/03/24");
    }

    #[test]
    fn test_unparseable_date_is_verbatim() {
        assert_eq!(date("next week"), "next week");
        assert_eq!(date(""), "");
    }
}
