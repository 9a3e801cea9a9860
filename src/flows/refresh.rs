//! `grant_type=refresh_token` against the token endpoint recorded in the credential.
//!
//! The refresh uses the client identity persisted with the credential, so the client secrets
//! file is not needed on this path. Exactly one grant is attempted per call; failures are
//! returned to the caller untouched.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::Credential,
	flows::CredentialManager,
	http::TokenHttpClient,
	oauth::TokenFacade,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C> CredentialManager<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Exchanges the refresh token of `current` for a new access token.
	pub(crate) async fn refresh(&self, current: &Credential) -> Result<Credential> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span
			.instrument(async {
				let facade = TokenFacade::new(&current.client, None, self.http_client.clone())?;

				facade.refresh(self.strategy.as_ref(), current).await
			})
			.await;

		match &result {
			Ok(refreshed) => {
				self.refresh_metrics.record_success();
				tracing::info!(expires_at = %refreshed.expires_at, "Refreshed the access token.");
			},
			Err(e) => {
				self.refresh_metrics.record_failure();
				tracing::warn!(error = %e, "Refreshing the access token failed.");
			},
		}

		obs::record_result(KIND, &result);

		result
	}
}
