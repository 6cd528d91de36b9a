use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

const ISO_DATE_FORMATS: [&str; 1] = ["%Y-%m-%d"];
const ISO_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const DAY_FIRST_DATETIME_FORMATS: [&str; 4] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];
const DAY_FIRST_DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%d.%m.%Y"];
const MONTH_FIRST_DATETIME_FORMATS: [&str; 2] = ["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"];
const MONTH_FIRST_DATE_FORMATS: [&str; 1] = ["%m/%d/%Y"];

/// Parse an ISO `YYYY-MM-DD` value, ignoring a trailing time-of-day part.
///
/// Accepts `2024-01-07`, `2024-01-07 00:00:00`, and `2024-01-07T12:30:00`.
/// Returns `None` when parsing fails.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    parse_iso_timestamp(raw).map(|timestamp| timestamp.date())
}

/// Parse an ISO date or date-time; plain dates resolve to midnight.
pub fn parse_iso_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    parse_with(value, &ISO_DATETIME_FORMATS, &ISO_DATE_FORMATS)
}

/// Parse a day-first timestamp such as `31/10/2025 07:18:50`.
///
/// Also accepts `31/10/2025`, `31.10.2025 07:18`, and ISO values. Returns
/// `None` when no format matches.
pub fn parse_day_first_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    parse_with(value, &DAY_FIRST_DATETIME_FORMATS, &DAY_FIRST_DATE_FORMATS)
        .or_else(|| parse_iso_timestamp(value))
}

/// Parse a month-first timestamp such as `11/23/2025`.
///
/// Also accepts a trailing `HH:MM[:SS]` part and ISO values. Returns `None`
/// when no format matches.
pub fn parse_month_first_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    parse_with(value, &MONTH_FIRST_DATETIME_FORMATS, &MONTH_FIRST_DATE_FORMATS)
        .or_else(|| parse_iso_timestamp(value))
}

/// `date - days`, clamped to the earliest representable date.
pub fn days_before(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// `date + days`, clamped to the latest representable date.
pub fn days_after(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

fn parse_with(
    value: &str,
    datetime_formats: &[&str],
    date_formats: &[&str],
) -> Option<NaiveDateTime> {
    if value.is_empty() {
        return None;
    }
    for format in datetime_formats {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
            return Some(timestamp);
        }
    }
    for format in date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date.and_time(NaiveTime::default()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn parses_iso_dates_with_and_without_time() {
        assert_eq!(parse_iso_date("2024-01-07"), Some(ymd(2024, 1, 7)));
        assert_eq!(parse_iso_date(" 2024-01-07 00:00:00 "), Some(ymd(2024, 1, 7)));
        assert_eq!(parse_iso_date("2024-01-07T23:59:59"), Some(ymd(2024, 1, 7)));
        assert_eq!(parse_iso_date("2024-13-07"), None);
        assert_eq!(parse_iso_date("07/01/2024"), None);
        assert_eq!(parse_iso_date(""), None);
    }

    #[test]
    fn parses_day_first_timestamps() {
        let parsed = parse_day_first_timestamp("31/10/2025 07:18:50").unwrap();
        assert_eq!(parsed.date(), ymd(2025, 10, 31));
        assert_eq!(parsed.time(), NaiveTime::from_hms_opt(7, 18, 50).unwrap());

        assert_eq!(
            parse_day_first_timestamp("06/02/2023").map(|ts| ts.date()),
            Some(ymd(2023, 2, 6))
        );
        assert_eq!(
            parse_day_first_timestamp("06.02.2023 04:17").map(|ts| ts.date()),
            Some(ymd(2023, 2, 6))
        );
        assert_eq!(
            parse_day_first_timestamp("2023-02-06 04:17:00").map(|ts| ts.date()),
            Some(ymd(2023, 2, 6))
        );
        assert_eq!(parse_day_first_timestamp("32/01/2023"), None);
        assert_eq!(parse_day_first_timestamp("not a date"), None);
    }

    #[test]
    fn parses_month_first_timestamps() {
        assert_eq!(
            parse_month_first_timestamp("11/23/2025").map(|ts| ts.date()),
            Some(ymd(2025, 11, 23))
        );
        assert_eq!(
            parse_month_first_timestamp("02/01/2024 16:00").map(|ts| ts.date()),
            Some(ymd(2024, 2, 1))
        );
        assert_eq!(
            parse_month_first_timestamp("2024-02-01").map(|ts| ts.date()),
            Some(ymd(2024, 2, 1))
        );
        assert_eq!(parse_month_first_timestamp("23/11/2025"), None);
    }

    #[test]
    fn day_shifts_clamp_at_calendar_edges() {
        assert_eq!(days_before(ymd(2024, 3, 1), 1), ymd(2024, 2, 29));
        assert_eq!(days_after(ymd(2024, 1, 5), 2), ymd(2024, 1, 7));
        assert_eq!(days_before(NaiveDate::MIN, 5), NaiveDate::MIN);
        assert_eq!(days_after(NaiveDate::MAX, 5), NaiveDate::MAX);
        assert_eq!(days_before(ymd(2024, 1, 5), 0), ymd(2024, 1, 5));
    }
}
