// src/format.rs

use chrono::{DateTime, Utc};

/// Currency the way the dashboard shows it: dot-grouped thousands, comma
/// decimals, MZN suffix.
pub fn format_currency(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let integer = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}{},{:02} MZN", sign, grouped, fraction)
}

pub fn format_date(value: &DateTime<Utc>) -> String {
    value.format("%d/%m/%Y").to_string()
}

/// Missing dates render as an empty cell, like the original tables.
pub fn format_date_opt(value: &Option<DateTime<Utc>>) -> String {
    value.as_ref().map(format_date).unwrap_or_default()
}

pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.format("%d/%m/%Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn currency_groups_thousands_with_dots_and_comma_decimals() {
        assert_eq!(format_currency(0.0), "0,00 MZN");
        assert_eq!(format_currency(950.5), "950,50 MZN");
        assert_eq!(format_currency(1234.56), "1.234,56 MZN");
        assert_eq!(format_currency(1_250_000.0), "1.250.000,00 MZN");
        assert_eq!(format_currency(-75.25), "-75,25 MZN");
    }

    #[test]
    fn dates_render_day_first() {
        let date = Utc.with_ymd_and_hms(2024, 3, 7, 16, 45, 0).unwrap();
        assert_eq!(format_date(&date), "07/03/2024");
        assert_eq!(format_datetime(&date), "07/03/2024 16:45");
        assert_eq!(format_date_opt(&None), "");
        assert_eq!(format_date_opt(&Some(date)), "07/03/2024");
    }
}
