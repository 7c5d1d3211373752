//! Date-range labels such as `"1/12/2025 – 7/12/2025"`.

use std::{cmp::Reverse, sync::LazyLock};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;

use super::store::Newsletter;

static TRAILING_END_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[–—-]\s*(\d{1,2})/(\d{1,2})/(\d{4})\s*$").expect("valid end date regex")
});

/// Joins the two picker dates the way the newsletter form displays them.
pub fn format_label(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} – {}", format_day(start), format_day(end))
}

fn format_day(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.day(), date.month(), date.year())
}

/// The `D/M/YYYY` date after the range dash, if the label has one and it is a real date.
pub fn end_date(label: &str) -> Option<NaiveDate> {
    let captures = TRAILING_END_DATE.captures(label)?;
    let day = captures.get(1)?.as_str().parse().ok()?;
    let month = captures.get(2)?.as_str().parse().ok()?;
    let year = captures.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Ordering key: the label's end date at midnight UTC, else the creation time.
pub fn sort_key(label: &str, created_at: DateTime<Utc>) -> DateTime<Utc> {
    end_date(label)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(created_at)
}

pub fn sort_newest_first(newsletters: &mut [Newsletter]) {
    newsletters.sort_by_key(|n| {
        (
            Reverse(sort_key(&n.date, n.created_at)),
            Reverse(n.created_at),
            Reverse(n.id),
        )
    });
}
