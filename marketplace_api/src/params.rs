//! Request parameters for the bulk listing pull.
//!
//! A [`DateWindow`] pins down the search range: a `from`/`to` pair plus the
//! [`WindowDimension`] that says which listing timestamp the range applies
//! to. Because the dimension is a single enum value, only one time filter can
//! ever be active on a request; there is no stale filter key to clear.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Value, json};
use tracing::{info, warn};

/// Hard cap the marketplace places on page size.
pub const MAX_ENTRIES_PER_PAGE: u32 = 200;

/// Page size used when the caller asks for more than the API allows.
pub const DEFAULT_ENTRIES_PER_PAGE: u32 = 100;

/// Which listing timestamp a [`DateWindow`] filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDimension {
    /// Listings started within the window.
    Start,
    /// Listings modified within the window.
    Mod,
    /// Listings ending within the window.
    End,
}

impl WindowDimension {
    /// Prefix for the wire-level filter keys, e.g. `StartTimeFrom`.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Mod => "Mod",
            Self::End => "End",
        }
    }
}

/// An inclusive date range expanded to full days.
#[derive(Debug, Clone, Copy)]
pub struct DateWindow {
    /// Beginning of the range, at the absolute start of its day.
    pub from: NaiveDateTime,
    /// End of the range, at the absolute end of its day.
    pub to: NaiveDateTime,
    /// Which listing timestamp the range filters on.
    pub dimension: WindowDimension,
}

impl DateWindow {
    /// Builds a window covering `start` through `start + days`, inclusive.
    ///
    /// `from` is pinned to 00:00:00.000 of the start day and `to` to
    /// 23:59:59.999 of the stop day. Negative `days` are supported; the two
    /// endpoints are swapped so that `from <= to` always holds.
    pub fn new(start: NaiveDate, days: i64, dimension: WindowDimension) -> Self {
        let stop = start + Duration::days(days);

        let mut from = start.and_time(NaiveTime::MIN);
        // Last representable millisecond of the stop day.
        let mut to = (stop + Duration::days(1)).and_time(NaiveTime::MIN) - Duration::milliseconds(1);

        if to < from {
            info!("stop date is before start date, swapping places");
            std::mem::swap(&mut from, &mut to);
        }

        Self {
            from,
            to,
            dimension,
        }
    }

    /// Formats a timestamp the way the marketplace expects: UTC ISO-8601
    /// with millisecond precision and a trailing `Z`.
    pub fn format_timestamp(ts: NaiveDateTime) -> String {
        ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }
}

/// Parameters for one page of the bulk seller-list call.
#[derive(Debug, Clone)]
pub struct SellerListParams {
    /// The date window to search within.
    pub window: DateWindow,
    /// Detail level requested from the API. `ItemReturnDescription` gives
    /// us the listing description HTML on the bulk call.
    pub detail_level: String,
    /// Items per page, capped at [`MAX_ENTRIES_PER_PAGE`].
    pub entries_per_page: u32,
    /// 1-based page cursor, advanced by the caller between calls.
    pub page_number: u32,
}

impl SellerListParams {
    /// Builds params for the first page of a pull.
    pub fn new(window: DateWindow, entries_per_page: u32) -> Self {
        let entries_per_page = if entries_per_page > MAX_ENTRIES_PER_PAGE {
            warn!(
                requested = entries_per_page,
                max = MAX_ENTRIES_PER_PAGE,
                default = DEFAULT_ENTRIES_PER_PAGE,
                "too many entries requested per page, using default"
            );
            DEFAULT_ENTRIES_PER_PAGE
        } else {
            entries_per_page
        };

        Self {
            window,
            detail_level: "ItemReturnDescription".to_string(),
            entries_per_page,
            page_number: 1,
        }
    }

    /// Serializes the params into the request body the API expects.
    pub fn request_body(&self) -> Value {
        let prefix = self.window.dimension.prefix();
        let mut body = serde_json::Map::new();
        body.insert(
            format!("{prefix}TimeFrom"),
            Value::String(DateWindow::format_timestamp(self.window.from)),
        );
        body.insert(
            format!("{prefix}TimeTo"),
            Value::String(DateWindow::format_timestamp(self.window.to)),
        );
        body.insert(
            "DetailLevel".to_string(),
            Value::String(self.detail_level.clone()),
        );
        body.insert(
            "Pagination".to_string(),
            json!({
                "EntriesPerPage": self.entries_per_page,
                "PageNumber": self.page_number,
            }),
        );
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn window_expands_to_full_days() {
        let w = DateWindow::new(d(2020, 2, 1), 3, WindowDimension::Start);
        assert_eq!(
            DateWindow::format_timestamp(w.from),
            "2020-02-01T00:00:00.000Z"
        );
        assert_eq!(
            DateWindow::format_timestamp(w.to),
            "2020-02-04T23:59:59.999Z"
        );
    }

    #[test]
    fn negative_days_swap_endpoints() {
        let w = DateWindow::new(d(2020, 2, 10), -5, WindowDimension::Mod);
        assert!(w.from <= w.to);
        assert_eq!(
            DateWindow::format_timestamp(w.from),
            "2020-02-05T23:59:59.999Z"
        );
        assert_eq!(
            DateWindow::format_timestamp(w.to),
            "2020-02-10T00:00:00.000Z"
        );
    }

    proptest! {
        #[test]
        fn from_never_after_to(days in -3650i64..3650) {
            let w = DateWindow::new(d(2020, 6, 15), days, WindowDimension::End);
            prop_assert!(w.from <= w.to);
        }
    }

    #[test]
    fn oversized_page_size_falls_back_to_default() {
        let w = DateWindow::new(d(2020, 2, 1), 0, WindowDimension::Start);
        let p = SellerListParams::new(w, 500);
        assert_eq!(p.entries_per_page, DEFAULT_ENTRIES_PER_PAGE);
        let p = SellerListParams::new(w, 200);
        assert_eq!(p.entries_per_page, 200);
    }

    #[test]
    fn body_uses_dimension_prefixed_keys() {
        let w = DateWindow::new(d(2020, 2, 1), 1, WindowDimension::Mod);
        let body = SellerListParams::new(w, 100).request_body();
        let obj = body.as_object().unwrap();
        assert!(obj.contains_key("ModTimeFrom"));
        assert!(obj.contains_key("ModTimeTo"));
        assert!(!obj.contains_key("StartTimeFrom"));
        assert_eq!(body["Pagination"]["EntriesPerPage"], 100);
        assert_eq!(body["Pagination"]["PageNumber"], 1);
    }
}
