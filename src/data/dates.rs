//! Tolerant order-date parsing.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Four-digit-year date layouts, ISO first, then US month-first.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%Y%m%d",
];

const SHORT_YEAR_FORMATS: &[&str] = &["%m/%d/%y", "%m-%d-%y", "%d-%b-%y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Year-and-month layouts, read as the first day of that month.
const MONTH_FORMATS: &[&str] = &["%Y-%m", "%Y/%m", "%m/%Y", "%b %Y", "%B %Y", "%b-%Y"];

/// Full-year layouts happily read "23" as the year 23 AD.
const MIN_PLAUSIBLE_YEAR: i32 = 1000;

fn plausible(date: &NaiveDate) -> bool {
    date.year() >= MIN_PLAUSIBLE_YEAR
}

/// Parse a date string in any of the supported layouts.
///
/// Returns `None` for empty or unrecognised input; never panics.
pub fn parse_order_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .find(plausible)
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .filter_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
                .find(plausible)
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            SHORT_YEAR_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        })
        .or_else(|| first_of_month(text))
}

fn first_of_month(text: &str) -> Option<NaiveDate> {
    let dated = format!("1 {text}");
    MONTH_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(&dated, &format!("%d {fmt}")).ok())
        .find(plausible)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn parses_iso_and_us_layouts() {
        assert_eq!(parse_order_date("2023-01-05"), ymd(2023, 1, 5));
        assert_eq!(parse_order_date("1/5/2023"), ymd(2023, 1, 5));
        assert_eq!(parse_order_date("11/08/2016"), ymd(2016, 11, 8));
        assert_eq!(parse_order_date("05-01-2023"), ymd(2023, 5, 1));
        assert_eq!(parse_order_date(" 2023/12/31 "), ymd(2023, 12, 31));
    }

    #[test]
    fn parses_month_names_and_times() {
        assert_eq!(parse_order_date("Jan 5, 2023"), ymd(2023, 1, 5));
        assert_eq!(parse_order_date("05-Jan-2023"), ymd(2023, 1, 5));
        assert_eq!(parse_order_date("2023-01-05 13:45:00"), ymd(2023, 1, 5));
        assert_eq!(parse_order_date("2023-01-05T13:45:00+02:00"), ymd(2023, 1, 5));
    }

    #[test]
    fn two_digit_years_land_in_this_century() {
        assert_eq!(parse_order_date("1/5/23"), ymd(2023, 1, 5));
    }

    #[test]
    fn year_and_month_only_reads_as_first_of_month() {
        assert_eq!(parse_order_date("2023-01"), ymd(2023, 1, 1));
        assert_eq!(parse_order_date("2023/11"), ymd(2023, 11, 1));
        assert_eq!(parse_order_date("Jan 2023"), ymd(2023, 1, 1));
        assert_eq!(parse_order_date("March 2024"), ymd(2024, 3, 1));
        assert_eq!(parse_order_date("2023-13"), None);
    }

    #[test]
    fn malformed_text_yields_none() {
        assert_eq!(parse_order_date("bad-date"), None);
        assert_eq!(parse_order_date(""), None);
        assert_eq!(parse_order_date("2023-13-45"), None);
        assert_eq!(parse_order_date("   "), None);
    }
}
