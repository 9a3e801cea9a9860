//! Interactive consent: the pluggable [`AuthorizationFlow`] seam and its loopback implementation.
//!
//! [`LoopbackFlow`] follows the installed-app pattern: bind a local listener, show the consent
//! URL, wait for the browser redirect, then exchange the code (with its PKCE verifier) for a
//! credential. There is no timeout; the user is the slow path.

pub mod callback;
pub mod session;

pub use callback::Redirect;
pub use session::*;

// crates.io
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	auth::{ClientSecrets, Credential, ScopeSet},
	config::FitnessConfig,
	error::{ConfigError, TransportError},
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::TokenFacade,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{DefaultProviderStrategy, ProviderStrategy},
};

/// Boxed future returned by [`AuthorizationFlow::obtain`].
pub type AuthorizationFuture<'a> = Pin<Box<dyn Future<Output = Result<Credential>> + 'a + Send>>;

/// Callback that presents the consent URL to the user.
pub type ConsentPrompt = Arc<dyn Fn(&Url) + Send + Sync>;

/// Obtains a brand-new credential through user interaction.
pub trait AuthorizationFlow
where
	Self: Send + Sync,
{
	/// Runs the flow for `scope` and returns the issued credential.
	fn obtain<'a>(&'a self, scope: &'a ScopeSet) -> AuthorizationFuture<'a>;
}

/// Installed-app consent flow with a loopback redirect listener.
pub struct LoopbackFlow<C = ReqwestHttpClient>
where
	C: ?Sized + TokenHttpClient,
{
	credentials_file: PathBuf,
	callback_host: String,
	callback_port: u16,
	http_client: Arc<C>,
	strategy: Arc<dyn ProviderStrategy>,
	prompt: ConsentPrompt,
}
impl<C> LoopbackFlow<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a flow using the paths and listener address in `config`.
	pub fn new(config: &FitnessConfig, http_client: Arc<C>) -> Self {
		Self {
			credentials_file: config.credentials_file.clone(),
			callback_host: config.callback_host.clone(),
			callback_port: config.callback_port,
			http_client,
			strategy: Arc::new(DefaultProviderStrategy),
			prompt: Arc::new(print_consent_url),
		}
	}

	/// Replaces how the consent URL is shown (stderr by default).
	pub fn with_prompt(mut self, prompt: impl Fn(&Url) + Send + Sync + 'static) -> Self {
		self.prompt = Arc::new(prompt);

		self
	}

	/// Replaces the token endpoint error classifier.
	pub fn with_strategy(mut self, strategy: Arc<dyn ProviderStrategy>) -> Self {
		self.strategy = strategy;

		self
	}

	async fn run(&self, scope: &ScopeSet) -> Result<Credential> {
		let secrets = ClientSecrets::load(&self.credentials_file)?;
		let descriptor = secrets.descriptor()?;
		let bind_address = format!("{}:{}", self.callback_host, self.callback_port);
		let listener = TcpListener::bind(&bind_address).await.map_err(|source| {
			TransportError::CallbackListener { address: bind_address.clone(), source }
		})?;
		let port = listener
			.local_addr()
			.map_err(|source| TransportError::CallbackListener { address: bind_address, source })?
			.port();
		let redirect_uri = Url::parse(&format!("http://{}:{port}/", self.callback_host))
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let session =
			AuthorizationSession::start(&descriptor, &secrets.client_id, scope.clone(), redirect_uri);

		tracing::info!(redirect_uri = %session.redirect_uri, "Waiting for the user to grant consent.");
		(self.prompt)(&session.authorize_url);

		let (code, state) = match callback::wait_for_redirect(&listener).await? {
			Redirect::Code { code, state } => (code, state),
			Redirect::Denied { reason, .. } => return Err(Error::AuthorizationDenied { reason }),
		};

		drop(listener);
		session.validate_state(state.as_deref())?;

		let facade =
			TokenFacade::new(&secrets.oauth_client(), Some(&session.redirect_uri), self.http_client.clone())?;

		facade
			.exchange_code(
				self.strategy.as_ref(),
				&code,
				session.pkce_verifier(),
				&session.scope,
				&session.redirect_uri,
			)
			.await
	}
}
impl<C> AuthorizationFlow for LoopbackFlow<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn obtain<'a>(&'a self, scope: &'a ScopeSet) -> AuthorizationFuture<'a> {
		Box::pin(async move {
			const KIND: FlowKind = FlowKind::Authorization;

			let span = FlowSpan::new(KIND, "obtain");

			obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

			let result = span.instrument(self.run(scope)).await;

			match &result {
				Ok(credential) =>
					tracing::info!(expires_at = %credential.expires_at, "Authorization complete."),
				Err(e) => tracing::warn!(error = %e, "Authorization failed."),
			}

			obs::record_result(KIND, &result);

			result
		})
	}
}
impl<C> Debug for LoopbackFlow<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoopbackFlow")
			.field("credentials_file", &self.credentials_file)
			.field("callback_host", &self.callback_host)
			.field("callback_port", &self.callback_port)
			.finish()
	}
}

fn print_consent_url(url: &Url) {
	eprintln!("Open this URL in a browser to authorize Google Fitness access:\n\n{url}\n");
}
