//! Sample identifier formatting.
//!
//! Sample ids are human-readable and sort in creation order:
//! `WQ-YYYYMMDD-NNNNNN`, where the numeric tail comes from a database
//! sequence. The format only promises uniqueness and stability; consumers
//! must not parse meaning out of it beyond ordering.

use chrono::NaiveDate;

/// Prefix for every sample id.
pub const SAMPLE_ID_PREFIX: &str = "WQ";

/// Format a sample id from the collection date and a sequence number.
///
/// The sequence tail is zero-padded to six digits.
pub fn format_sample_id(collected_on: NaiveDate, seq: i64) -> String {
    format!(
        "{SAMPLE_ID_PREFIX}-{}-{seq:06}",
        collected_on.format("%Y%m%d")
    )
}
