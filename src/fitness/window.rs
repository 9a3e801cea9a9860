//! Millisecond query windows ending now.

// self
use crate::_prelude::*;

/// Milliseconds in one window day.
pub const DAY_MILLIS: i64 = 86_400_000;

/// Half-open aggregation window in Unix epoch milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
	/// Inclusive start.
	pub start_millis: i64,
	/// Exclusive end.
	pub end_millis: i64,
}
impl QueryWindow {
	/// Window ending at `now` and spanning exactly `days` days.
	pub fn ending_at(now: OffsetDateTime, days: NonZeroU32) -> Self {
		let end_millis = (now.unix_timestamp_nanos() / 1_000_000) as i64;
		let start_millis = end_millis - i64::from(days.get()) * DAY_MILLIS;

		Self { start_millis, end_millis }
	}

	/// Window ending now.
	pub fn last_days(days: NonZeroU32) -> Self {
		Self::ending_at(OffsetDateTime::now_utc(), days)
	}

	/// Width of the window in milliseconds.
	pub fn duration_millis(&self) -> i64 {
		self.end_millis - self.start_millis
	}
}
