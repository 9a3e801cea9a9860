//! `{success, data, message}` envelope returned by every Fitness query.

// self
use crate::_prelude::*;

/// Normalized result of a Fitness query.
///
/// `data` is the provider's aggregation response passed through untouched; it is omitted from
/// the serialized form on failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
	/// Whether the upstream call succeeded.
	pub success: bool,
	/// Raw provider response.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
	/// Human-readable summary.
	pub message: String,
}
impl ResponseEnvelope {
	/// Successful envelope carrying `data`.
	pub fn success(data: Value, message: impl Into<String>) -> Self {
		Self { success: true, data: Some(data), message: message.into() }
	}

	/// Failure envelope carrying the stringified error.
	pub fn failure(error: impl Display) -> Self {
		Self { success: false, data: None, message: format!("오류 발생: {error}") }
	}

	/// JSON object form, identical to the serde representation.
	pub fn to_json(&self) -> Value {
		let mut object = serde_json::Map::new();

		object.insert("success".into(), Value::Bool(self.success));

		if let Some(data) = &self.data {
			object.insert("data".into(), data.clone());
		}

		object.insert("message".into(), Value::String(self.message.clone()));

		Value::Object(object)
	}
}
