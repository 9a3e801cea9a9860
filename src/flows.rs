//! Credential lifecycle: load, reuse, refresh, or re-authorize, then persist.

pub mod authorization;
pub mod refresh;

pub use authorization::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialStatus, DEFAULT_REFRESH_THRESHOLD, ScopeSet},
	config::FitnessConfig,
	http::{ReqwestHttpClient, TokenHttpClient},
	provider::{DefaultProviderStrategy, ProviderStrategy},
	store::{CredentialStore, FileStore},
};

/// Owns the single persisted credential and hands out usable access tokens.
///
/// [`CredentialManager::acquire`] runs under an async mutex, so callers inside one process
/// never refresh twice or interleave writes to the token store.
pub struct CredentialManager<C = ReqwestHttpClient>
where
	C: ?Sized + TokenHttpClient,
{
	/// HTTP client used for token endpoint calls.
	pub http_client: Arc<C>,
	/// Where the credential is persisted.
	pub store: Arc<dyn CredentialStore>,
	/// Interactive flow used when nothing can be refreshed.
	pub flow: Arc<dyn AuthorizationFlow>,
	/// Token endpoint error classifier.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// Scopes requested when the interactive flow runs.
	pub scope: ScopeSet,
	/// Window before expiry that already counts as expired.
	pub refresh_threshold: Duration,
	/// Counters for refresh grants.
	pub refresh_metrics: Arc<RefreshMetrics>,
	guard: AsyncMutex<()>,
}
impl<C> CredentialManager<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Assembles a manager from explicit parts with the default threshold and strategy.
	pub fn with_parts(
		http_client: Arc<C>,
		store: Arc<dyn CredentialStore>,
		flow: Arc<dyn AuthorizationFlow>,
		scope: ScopeSet,
	) -> Self {
		Self {
			http_client,
			store,
			flow,
			strategy: Arc::new(DefaultProviderStrategy),
			scope,
			refresh_threshold: DEFAULT_REFRESH_THRESHOLD,
			refresh_metrics: Default::default(),
			guard: AsyncMutex::new(()),
		}
	}

	/// Overrides the refresh threshold.
	pub fn with_refresh_threshold(mut self, threshold: Duration) -> Self {
		self.refresh_threshold = threshold;

		self
	}

	/// Overrides the token endpoint error classifier.
	pub fn with_strategy(mut self, strategy: Arc<dyn ProviderStrategy>) -> Self {
		self.strategy = strategy;

		self
	}

	/// Returns a credential that is valid right now.
	///
	/// A stored valid credential is returned without touching the store. An expired one is
	/// refreshed once when it carries a refresh token; otherwise (or when nothing is stored)
	/// the interactive flow runs. Any refreshed or newly issued credential is saved before it
	/// is returned. Errors are never retried.
	pub async fn acquire(&self) -> Result<Credential> {
		let _singleflight = self.guard.lock().await;
		let now = OffsetDateTime::now_utc();
		let credential = match self.store.load().await? {
			Some(stored) => match stored.status_at(now, self.refresh_threshold) {
				CredentialStatus::Valid => {
					tracing::debug!(expires_at = %stored.expires_at, "Reusing the stored credential.");

					return Ok(stored);
				},
				CredentialStatus::Refreshable => self.refresh(&stored).await?,
				CredentialStatus::Expired => {
					tracing::warn!(
						expires_at = %stored.expires_at,
						"Stored credential expired without a refresh token; consent is required again."
					);

					self.flow.obtain(&self.scope).await?
				},
			},
			None => {
				tracing::info!("No stored credential; starting the consent flow.");

				self.flow.obtain(&self.scope).await?
			},
		};

		self.store.save(credential.clone()).await?;

		Ok(credential)
	}
}
impl CredentialManager<ReqwestHttpClient> {
	/// Builds the production manager: file store, loopback consent, shared reqwest client.
	pub fn from_config(config: &FitnessConfig, http_client: Arc<ReqwestHttpClient>) -> Result<Self> {
		let store = Arc::new(FileStore::new(&config.token_file));
		let flow = Arc::new(LoopbackFlow::new(config, http_client.clone()));

		Ok(Self::with_parts(http_client, store, flow, config.scope_set()?)
			.with_refresh_threshold(config.refresh_threshold()))
	}
}
impl<C> Debug for CredentialManager<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialManager")
			.field("scope", &self.scope)
			.field("refresh_threshold", &self.refresh_threshold)
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}
