//! Token endpoint facade over the `oauth2` crate: code exchange and refresh.

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthType, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, PkceCodeVerifier, RedirectUrl, RefreshToken, RequestTokenError,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{Credential, OAuthClient, ScopeSet},
	error::{ConfigError, TransientError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{GrantType, ProviderErrorContext, ProviderErrorKind, ProviderStrategy},
};

type TokenOnlyClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Executes token endpoint grants for one OAuth client.
pub(crate) struct TokenFacade<C>
where
	C: ?Sized + TokenHttpClient,
{
	oauth_client: TokenOnlyClient,
	identity: OAuthClient,
	http_client: Arc<C>,
}
impl<C> TokenFacade<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Configures a facade for `identity`, sending client credentials in the request body.
	pub(crate) fn new(
		identity: &OAuthClient,
		redirect_uri: Option<&Url>,
		http_client: Arc<C>,
	) -> Result<Self> {
		let token_url = TokenUrl::new(identity.token_uri.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(identity.client_id.clone()))
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		if let Some(secret) = &identity.client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.expose().to_owned()));
		}
		if let Some(redirect) = redirect_uri {
			let redirect_url = RedirectUrl::new(redirect.to_string())
				.map_err(|source| ConfigError::InvalidRedirect { source })?;

			oauth_client = oauth_client.set_redirect_uri(redirect_url);
		}

		Ok(Self { oauth_client, identity: identity.clone(), http_client })
	}

	/// Performs `grant_type=refresh_token` for `credential`.
	///
	/// The returned credential keeps the previous refresh token when the provider does not
	/// rotate it.
	pub(crate) async fn refresh(
		&self,
		strategy: &dyn ProviderStrategy,
		credential: &Credential,
	) -> Result<Credential> {
		let Some(refresh_token) = credential.refresh_token.as_ref() else {
			return Err(Error::InvalidGrant {
				reason: "Credential does not carry a refresh token".into(),
			});
		};
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.request_async(&handle)
			.await
			.map_err(|err| {
				self.map_request_error(strategy, GrantType::RefreshToken, meta.take(), err)
			})?;
		let mut refreshed = self.credential_from_response(&credential.scope, &response)?;

		if refreshed.refresh_token.is_none() {
			refreshed.refresh_token = credential.refresh_token.clone();
		}

		Ok(refreshed)
	}

	/// Exchanges an authorization code (plus its PKCE verifier) for a credential.
	pub(crate) async fn exchange_code(
		&self,
		strategy: &dyn ProviderStrategy,
		code: &str,
		pkce_verifier: &str,
		requested_scope: &ScopeSet,
		redirect_uri: &Url,
	) -> Result<Credential> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let redirect_url = RedirectUrl::new(redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_owned()))
			.set_redirect_uri(Cow::Owned(redirect_url))
			.request_async(&handle)
			.await
			.map_err(|err| {
				self.map_request_error(strategy, GrantType::AuthorizationCode, meta.take(), err)
			})?;

		self.credential_from_response(requested_scope, &response)
	}

	fn credential_from_response(
		&self,
		requested_scope: &ScopeSet,
		response: &BasicTokenResponse,
	) -> Result<Credential> {
		let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
		let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

		if expires_in <= 0 {
			return Err(ConfigError::NonPositiveExpiresIn.into());
		}

		// Google may grant a subset of the requested scopes.
		let granted = match response.scopes() {
			Some(scopes) => ScopeSet::new(scopes.iter().map(|scope| scope.to_string()))
				.map_err(ConfigError::from)?,
			None => requested_scope.clone(),
		};
		let mut builder = Credential::builder(self.identity.clone(), granted)
			.access_token(response.access_token().secret().to_owned())
			.issued_at(OffsetDateTime::now_utc())
			.expires_in(Duration::seconds(expires_in));

		if let Some(refresh) = response.refresh_token() {
			builder = builder.refresh_token(refresh.secret().to_owned());
		}

		builder.build().map_err(|e| ConfigError::from(e).into())
	}

	fn map_request_error(
		&self,
		strategy: &dyn ProviderStrategy,
		grant: GrantType,
		meta: Option<ResponseMetadata>,
		err: BasicRequestTokenError<HttpClientError<C::TransportError>>,
	) -> Error {
		let meta = meta.as_ref();

		match err {
			RequestTokenError::ServerResponse(response) =>
				map_server_response_error(strategy, grant, &response, meta),
			RequestTokenError::Request(error) =>
				self.http_client.map_transport_error(grant, meta, error),
			RequestTokenError::Parse(source, _body) => TransientError::TokenResponseParse {
				source,
				status: meta.and_then(|m| m.status),
			}
			.into(),
			RequestTokenError::Other(message) => TransientError::TokenEndpoint {
				message,
				status: meta.and_then(|m| m.status),
				retry_after: meta.and_then(|m| m.retry_after),
			}
			.into(),
		}
	}
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	response: &BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let mut ctx =
		ProviderErrorContext::new(grant).with_oauth_error(response.error().as_ref().to_string());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta.and_then(|m| m.status) {
		ctx = ctx.with_http_status(status);
	}

	let reason = match response.error_description() {
		Some(description) =>
			format!("{}: {}", response.error().as_ref(), description.trim_end_matches('.')),
		None => response.error().as_ref().to_string(),
	};

	match strategy.classify_token_error(&ctx) {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason },
		ProviderErrorKind::Transient => TransientError::TokenEndpoint {
			message: reason,
			status: meta.and_then(|m| m.status),
			retry_after: meta.and_then(|m| m.retry_after),
		}
		.into(),
	}
}
