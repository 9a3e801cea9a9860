//! Data streams the tools aggregate and their bucket sizes.

// self
use crate::{_prelude::*, fitness::window::DAY_MILLIS};

const HOUR_MILLIS: i64 = 3_600_000;

/// One aggregatable Google Fitness data stream plus how the tools bucket and describe it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataSource {
	/// `dataTypeName` sent in `aggregateBy`.
	pub data_type_name: &'static str,
	/// `dataSourceId` sent in `aggregateBy`.
	pub data_source_id: &'static str,
	/// Bucket width in milliseconds.
	pub bucket_millis: i64,
	/// Human-readable label used in envelope messages.
	pub label: &'static str,
}
impl DataSource {
	/// Daily step counts from the merged estimated-steps stream.
	pub const STEPS: Self = Self {
		data_type_name: "com.google.step_count.delta",
		data_source_id: "derived:com.google.step_count.delta:com.google.android.gms:estimated_steps",
		bucket_millis: DAY_MILLIS,
		label: "걸음 수",
	};
	/// Hourly heart-rate summaries from the merged BPM stream.
	pub const HEART_RATE: Self = Self {
		data_type_name: "com.google.heart_rate.bpm",
		data_source_id: "derived:com.google.heart_rate.bpm:com.google.android.gms:merge_heart_rate_bpm",
		bucket_millis: HOUR_MILLIS,
		label: "심박수",
	};

	/// Message returned alongside a successful aggregation over `days`.
	pub fn success_message(&self, days: NonZeroU32) -> String {
		format!("{days}일간의 {} 데이터를 성공적으로 가져왔습니다.", self.label)
	}
}
impl Display for DataSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.data_type_name)
	}
}
