//! Display formatting shared by the layout, the HTML views and API stats.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::Amount;

/// Shown in place of a missing date.
pub const DATE_PLACEHOLDER: &str = "DD Mon YYYY";

/// Two decimals with `,` thousands grouping and no currency symbol,
/// e.g. `1,234.50`. Negative values keep their sign.
pub fn format_currency(value: Amount) -> String {
    format_decimal(value.value())
}

pub fn format_decimal(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, dec_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}.{}", grouped, dec_part)
    } else {
        format!("{}.{}", grouped, dec_part)
    }
}

/// `DD Mon YYYY`, e.g. `05 Mar 2026`.
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%d %b %Y").to_string(),
        None => DATE_PLACEHOLDER.to_string(),
    }
}

/// Quantity as typed: no trailing zeros, no grouping.
pub fn format_quantity(value: Amount) -> String {
    value.value().normalize().to_string()
}
