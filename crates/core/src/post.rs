//! Post status constants and publish-date helpers.
//!
//! Posts are owned by the authoring subsystem; the comment core only reads
//! them. The read path exposes a post solely when it is published and the
//! requested `year/month/day` matches its publish date (UTC).

use chrono::{Datelike, NaiveDate};

use crate::types::Timestamp;

/// Post is being written and is invisible on the read path.
pub const POST_STATUS_DRAFT: &str = "draft";

/// Post is visible on the read path.
pub const POST_STATUS_PUBLISHED: &str = "published";

/// Build the calendar date addressed by a `/{year}/{month}/{day}/` URL.
///
/// Returns `None` for impossible dates (month 13, February 30th, ...), which
/// the read path treats as "not found".
pub fn publish_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Format a publish timestamp as the `YYYY/MM/DD` URL segment.
pub fn date_path(publish: Timestamp) -> String {
    format!(
        "{:04}/{:02}/{:02}",
        publish.year(),
        publish.month(),
        publish.day()
    )
}
