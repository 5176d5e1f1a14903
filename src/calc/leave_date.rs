use chrono::{Datelike, NaiveDate};

/// Parses a strict `YYYY[./-]MM[./-]DD` date. Anything else, including dates
/// that do not exist on the calendar, yields `None`.
pub fn parse(text: &str) -> Option<NaiveDate> {
    let bytes = text.as_bytes();
    if bytes.len() != 10 {
        return None;
    }
    let is_sep = |b: u8| matches!(b, b'.' | b'/' | b'-');
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, &b)| matches!(i, 4 | 7) || b.is_ascii_digit());
    if !digits_ok || !is_sep(bytes[4]) || !is_sep(bytes[7]) {
        return None;
    }

    let number = |range: std::ops::Range<usize>| -> Option<u32> {
        std::str::from_utf8(&bytes[range]).ok()?.parse().ok()
    };
    let year = number(0..4)? as i32;
    let month = number(5..7)?;
    let day = number(8..10)?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    // Only accept what was literally asked for.
    if date.year() != year || date.month() != month || date.day() != day {
        return None;
    }
    Some(date)
}

/// Zero-padded `YYYY.MM.DD`.
pub fn format(date: NaiveDate) -> String {
    date.format("%Y.%m.%d").to_string()
}

/// ISO form used by the settings store.
pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Inclusive number of days from `start` to `end`, or `None` when the range is
/// reversed.
pub fn duration_days(start: NaiveDate, end: NaiveDate) -> Option<i64> {
    if start > end {
        return None;
    }
    Some((end - start).num_days() + 1)
}
