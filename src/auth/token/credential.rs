//! Delegated-authorization credentials, their validity predicate, and a builder.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, token::secret::TokenSecret},
};

/// How long before the recorded expiry a credential already counts as expired.
///
/// Matches the threshold Google's own client libraries use so a token is never sent with only
/// seconds left on it.
pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::seconds(225);

/// Lifecycle status of a credential at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
	/// Access token can be used as-is.
	Valid,
	/// Access token expired (or is inside the refresh threshold) and a refresh token exists.
	Refreshable,
	/// Access token expired and nothing can renew it without user interaction.
	Expired,
}

/// Errors produced by [`CredentialBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CredentialBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
}

/// OAuth client identity a credential was issued to; needed to refresh it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthClient {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret, absent for public clients.
	pub client_secret: Option<TokenSecret>,
	/// Token endpoint used for refreshes.
	pub token_uri: Url,
}
impl OAuthClient {
	/// Creates a client identity for the provided id and token endpoint.
	pub fn new(client_id: impl Into<String>, token_uri: Url) -> Self {
		Self { client_id: client_id.into(), client_secret: None, token_uri }
	}

	/// Attaches a confidential client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}
}

/// Token material granted by the provider plus the client it belongs to.
#[derive(Clone)]
pub struct Credential {
	/// Client identity the tokens were issued to.
	pub client: OAuthClient,
	/// Scopes granted to this credential.
	pub scope: ScopeSet,
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the access token stops being accepted.
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Returns a builder for a credential issued to `client`.
	pub fn builder(client: OAuthClient, scope: ScopeSet) -> CredentialBuilder {
		CredentialBuilder::new(client, scope)
	}

	/// Computes the lifecycle status at `instant`, treating the last `threshold` before
	/// expiry as already expired.
	pub fn status_at(&self, instant: OffsetDateTime, threshold: Duration) -> CredentialStatus {
		if instant < self.expires_at - threshold {
			CredentialStatus::Valid
		} else if self.refresh_token.is_some() {
			CredentialStatus::Refreshable
		} else {
			CredentialStatus::Expired
		}
	}

	/// Returns `true` if the access token is usable at `instant`.
	pub fn is_valid_at(&self, instant: OffsetDateTime, threshold: Duration) -> bool {
		matches!(self.status_at(instant, threshold), CredentialStatus::Valid)
	}

	/// Returns `true` if the access token is usable right now with the default threshold.
	pub fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc(), DEFAULT_REFRESH_THRESHOLD)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("client_id", &self.client.client_id)
			.field("scope", &self.scope)
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Credential`].
#[derive(Clone, Debug)]
pub struct CredentialBuilder {
	client: OAuthClient,
	scope: ScopeSet,
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl CredentialBuilder {
	fn new(client: OAuthClient, scope: ScopeSet) -> Self {
		Self {
			client,
			scope,
			access_token: None,
			refresh_token: None,
			issued_at: None,
			expires_at: None,
			expires_in: None,
		}
	}

	/// Sets the instant `expires_in` is measured from (defaults to now).
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides an optional refresh token value.
	pub fn maybe_refresh_token(mut self, token: Option<TokenSecret>) -> Self {
		self.refresh_token = token;

		self
	}

	/// Consumes the builder and produces a [`Credential`].
	pub fn build(self) -> Result<Credential, CredentialBuilderError> {
		let access_token = self.access_token.ok_or(CredentialBuilderError::MissingAccessToken)?;
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => self.issued_at.unwrap_or_else(OffsetDateTime::now_utc) + delta,
			(None, None) => return Err(CredentialBuilderError::MissingExpiry),
		};

		Ok(Credential {
			client: self.client,
			scope: self.scope,
			access_token,
			refresh_token: self.refresh_token,
			expires_at,
		})
	}
}
