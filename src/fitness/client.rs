//! Thin `users.dataset.aggregate` client.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	fitness::{DataSource, FitnessError, QueryWindow},
};

/// JSON body of `POST users/me/dataset:aggregate`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRequest {
	/// Streams to aggregate.
	pub aggregate_by: Vec<AggregateBy>,
	/// Time bucketing.
	pub bucket_by_time: BucketByTime,
	/// Inclusive window start (epoch milliseconds).
	pub start_time_millis: i64,
	/// Exclusive window end (epoch milliseconds).
	pub end_time_millis: i64,
}
impl AggregateRequest {
	/// Builds the request for `source` over `window`.
	pub fn new(source: &DataSource, window: QueryWindow) -> Self {
		Self {
			aggregate_by: vec![AggregateBy {
				data_type_name: source.data_type_name.into(),
				data_source_id: source.data_source_id.into(),
			}],
			bucket_by_time: BucketByTime { duration_millis: source.bucket_millis },
			start_time_millis: window.start_millis,
			end_time_millis: window.end_millis,
		}
	}
}

/// One `aggregateBy` entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateBy {
	/// Fitness data type.
	pub data_type_name: String,
	/// Fully qualified data source id.
	pub data_source_id: String,
}

/// `bucketByTime` entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketByTime {
	/// Bucket width in milliseconds.
	pub duration_millis: i64,
}

/// Calls the Fitness REST API with a bearer token.
#[derive(Clone, Debug)]
pub struct FitnessClient {
	http: ReqwestClient,
	aggregate_url: Url,
}
impl FitnessClient {
	/// Creates a client rooted at `api_base` (for example `https://www.googleapis.com/fitness/v1/`).
	pub fn new(http: ReqwestClient, api_base: &Url) -> Result<Self, ConfigError> {
		let aggregate_url = api_base.join("users/me/dataset:aggregate").map_err(|source| {
			ConfigError::InvalidApiBase { url: api_base.to_string(), source }
		})?;

		Ok(Self { http, aggregate_url })
	}

	/// Endpoint used for aggregation requests.
	pub fn aggregate_url(&self) -> &Url {
		&self.aggregate_url
	}

	/// Posts `request` and returns the decoded JSON response.
	pub async fn aggregate(
		&self,
		access_token: &TokenSecret,
		request: &AggregateRequest,
	) -> Result<Value, FitnessError> {
		let response = self
			.http
			.post(self.aggregate_url.clone())
			.bearer_auth(access_token.expose())
			.json(request)
			.send()
			.await
			.map_err(FitnessError::Network)?;
		let status = response.status();
		let body = response.bytes().await.map_err(FitnessError::Network)?;

		if !status.is_success() {
			return Err(FitnessError::Status {
				status: status.as_u16(),
				body: String::from_utf8_lossy(&body).into_owned(),
			});
		}

		let mut de = serde_json::Deserializer::from_slice(&body);

		serde_path_to_error::deserialize(&mut de).map_err(FitnessError::Decode)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn request_serializes_in_camel_case() {
		let window = QueryWindow { start_millis: 1_000, end_millis: 86_401_000 };
		let body = serde_json::to_value(AggregateRequest::new(&DataSource::STEPS, window))
			.expect("Aggregate request should serialize.");

		assert_eq!(
			body,
			serde_json::json!({
				"aggregateBy": [{
					"dataTypeName": "com.google.step_count.delta",
					"dataSourceId": "derived:com.google.step_count.delta:com.google.android.gms:estimated_steps"
				}],
				"bucketByTime": { "durationMillis": 86_400_000 },
				"startTimeMillis": 1_000,
				"endTimeMillis": 86_401_000
			})
		);
	}

	#[test]
	fn aggregate_url_keeps_the_version_segment() {
		let base =
			Url::parse("https://www.googleapis.com/fitness/v1/").expect("API base should parse.");
		let client = FitnessClient::new(ReqwestClient::new(), &base)
			.expect("Fitness client should build.");

		assert_eq!(
			client.aggregate_url().as_str(),
			"https://www.googleapis.com/fitness/v1/users/me/dataset:aggregate"
		);
	}
}
