//! Date-range pagination for the `blast` endpoint
//!
//! Sailthru silently truncates `blast` listings for large ranges, so ranges are
//! requested as consecutive windows of at most a few weeks each.

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

pub const DEFAULT_PAGE_SIZE_DAYS: u32 = 30;

/// Explicit limit sent with every listing; without it the API returns a
/// short default page.
pub const DEFAULT_RESULT_LIMIT: u64 = 999_999;

/// Half-open date range `[start, end)` requested in one API call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Query parameters for sent campaigns within this window
    pub fn blast_params(&self, result_limit: u64, list_name: Option<&str>) -> Value {
        let mut params = json!({
            "status": "sent",
            "start_date": self.start.format("%Y-%m-%d").to_string(),
            "end_date": self.end.format("%Y-%m-%d").to_string(),
            "limit": result_limit,
        });
        if let Some(list_name) = list_name {
            params["list"] = json!(list_name);
        }
        params
    }
}

/// Split `[start, end)` into consecutive windows of at most `page_size_days`,
/// the last one clipped to `end`. Empty when `start >= end`.
pub fn date_windows(start: NaiveDate, end: NaiveDate, page_size_days: u32) -> Vec<DateWindow> {
    let step = Duration::days(i64::from(page_size_days.max(1)));
    let mut windows = Vec::new();
    let mut window_start = start;

    while window_start < end {
        let window_end = window_start
            .checked_add_signed(step)
            .map_or(end, |next| next.min(end));
        windows.push(DateWindow {
            start: window_start,
            end: window_end,
        });
        window_start = window_end;
    }

    windows
}
