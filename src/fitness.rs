//! Google Fitness aggregation queries wrapped in response envelopes.
//!
//! Credential failures propagate out of [`FitnessService::aggregate`]; anything that goes
//! wrong after a credential is in hand becomes a failure [`ResponseEnvelope`].

pub mod client;
pub mod envelope;
pub mod source;
pub mod window;

pub use client::*;
pub use envelope::*;
pub use source::*;
pub use window::*;

// self
use crate::{
	_prelude::*,
	config::FitnessConfig,
	flows::CredentialManager,
	http::{ReqwestHttpClient, TokenHttpClient},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Upstream Fitness API failures.
#[derive(Debug, ThisError)]
pub enum FitnessError {
	/// The request never produced a response.
	#[error("Fitness API request failed: {0}")]
	Network(#[source] ReqwestError),
	/// The API answered with a non-success status.
	#[error("Fitness API returned HTTP {status}: {body}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Response body, lossily decoded.
		body: String,
	},
	/// The success body was not JSON.
	#[error("Fitness API returned an undecodable body: {0}")]
	Decode(#[source] serde_path_to_error::Error<serde_json::Error>),
}

/// Step-count and heart-rate queries on top of a [`CredentialManager`].
#[derive(Debug)]
pub struct FitnessService<C = ReqwestHttpClient>
where
	C: ?Sized + TokenHttpClient,
{
	manager: CredentialManager<C>,
	client: FitnessClient,
}
impl<C> FitnessService<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Combines a credential manager and a Fitness client.
	pub fn new(manager: CredentialManager<C>, client: FitnessClient) -> Self {
		Self { manager, client }
	}

	/// Credential manager backing the queries.
	pub fn manager(&self) -> &CredentialManager<C> {
		&self.manager
	}

	/// Daily step counts for the last `days` days.
	pub async fn get_steps(&self, days: NonZeroU32) -> Result<ResponseEnvelope> {
		self.aggregate(days, &DataSource::STEPS).await
	}

	/// Hourly heart-rate summaries for the last `days` days.
	pub async fn get_heart_rate(&self, days: NonZeroU32) -> Result<ResponseEnvelope> {
		self.aggregate(days, &DataSource::HEART_RATE).await
	}

	/// Aggregates `source` over the window ending now.
	pub async fn aggregate(&self, days: NonZeroU32, source: &DataSource) -> Result<ResponseEnvelope> {
		const KIND: FlowKind = FlowKind::Aggregate;

		let window = QueryWindow::last_days(days);
		let credential = self.manager.acquire().await?;
		let span = FlowSpan::new(KIND, "aggregate");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let request = AggregateRequest::new(source, window);
		let result = span.instrument(self.client.aggregate(&credential.access_token, &request)).await;

		obs::record_result(KIND, &result);

		Ok(match result {
			Ok(data) => ResponseEnvelope::success(data, source.success_message(days)),
			Err(e) => {
				tracing::error!(source = %source, error = %e, "Fitness aggregation failed.");

				ResponseEnvelope::failure(e)
			},
		})
	}
}
impl FitnessService<ReqwestHttpClient> {
	/// Wires the production service from `config`.
	pub fn from_config(config: &FitnessConfig) -> Result<Self> {
		let http_client = Arc::new(ReqwestHttpClient::new()?);
		let client = FitnessClient::new(http_client.client().clone(), &config.api_base_url()?)?;
		let manager = CredentialManager::from_config(config, http_client)?;

		Ok(Self::new(manager, client))
	}
}
