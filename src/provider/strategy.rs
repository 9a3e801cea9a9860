//! Classification of token endpoint failures.
//!
//! Google reports a revoked or expired refresh token as `invalid_grant` with an
//! `error_description` such as "Token has been expired or revoked."; a deleted OAuth client as
//! `invalid_client` or `unauthorized_client`. Strategies map those onto [`ProviderErrorKind`]
//! without depending on any HTTP client types.

// self
use crate::{_prelude::*, provider::descriptor::GrantType};

/// Strategy hook that classifies token endpoint errors.
pub trait ProviderStrategy: Send + Sync {
	/// Maps OAuth error fields and HTTP metadata into the crate's error taxonomy.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Provider rejected the authorization grant (bad code, revoked refresh token).
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Requested scopes exceed what the token covers.
	InsufficientScope,
	/// Failure is temporary.
	Transient,
}

/// Primitive context handed to [`ProviderStrategy::classify_token_error`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// Grant type associated with the failing request.
	pub grant_type: GrantType,
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// Provider-supplied OAuth `error` field.
	pub oauth_error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
}
impl ProviderErrorContext {
	/// Creates a new context scoped to the provided grant type.
	pub fn new(grant_type: GrantType) -> Self {
		Self { grant_type, http_status: None, oauth_error: None, error_description: None }
	}

	/// Adds an HTTP status code (e.g., 400, 401, 500).
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}
}

/// Default strategy: structured OAuth fields first, then description text, then HTTP status.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		ctx.oauth_error
			.as_deref()
			.and_then(match_exact_value)
			.or_else(|| ctx.error_description.as_deref().and_then(classify_text))
			.unwrap_or_else(|| classify_status(ctx.http_status))
	}
}

fn match_exact_value(value: &str) -> Option<ProviderErrorKind> {
	if value.eq_ignore_ascii_case("invalid_grant") || value.eq_ignore_ascii_case("access_denied") {
		Some(ProviderErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(ProviderErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(ProviderErrorKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(ProviderErrorKind::Transient)
	} else {
		None
	}
}

fn classify_text(text: &str) -> Option<ProviderErrorKind> {
	let lowered = text.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant")
			|| text.contains("expired or revoked")
			|| text.contains("bad request") =>
			Some(ProviderErrorKind::InvalidGrant),
		text if text.contains("invalid_client") => Some(ProviderErrorKind::InvalidClient),
		text if text.contains("insufficient_scope") || text.contains("invalid_scope") =>
			Some(ProviderErrorKind::InsufficientScope),
		text if text.contains("temporarily_unavailable") => Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::InsufficientScope,
		_ => ProviderErrorKind::Transient,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn oauth_error_field_wins() {
		let ctx = ProviderErrorContext::new(GrantType::RefreshToken)
			.with_http_status(401)
			.with_oauth_error("invalid_grant")
			.with_error_description("Token has been expired or revoked.");

		assert_eq!(DefaultProviderStrategy.classify_token_error(&ctx), ProviderErrorKind::InvalidGrant);

		let ctx = ProviderErrorContext::new(GrantType::AuthorizationCode)
			.with_http_status(400)
			.with_oauth_error("unauthorized_client");

		assert_eq!(
			DefaultProviderStrategy.classify_token_error(&ctx),
			ProviderErrorKind::InvalidClient
		);
	}

	#[test]
	fn description_then_status_fallbacks() {
		let ctx = ProviderErrorContext::new(GrantType::RefreshToken)
			.with_oauth_error("unknown_thing")
			.with_error_description("Token has been expired or revoked.");

		assert_eq!(DefaultProviderStrategy.classify_token_error(&ctx), ProviderErrorKind::InvalidGrant);

		let ctx = ProviderErrorContext::new(GrantType::RefreshToken).with_http_status(403);

		assert_eq!(
			DefaultProviderStrategy.classify_token_error(&ctx),
			ProviderErrorKind::InsufficientScope
		);

		let ctx = ProviderErrorContext::new(GrantType::RefreshToken).with_http_status(503);

		assert_eq!(DefaultProviderStrategy.classify_token_error(&ctx), ProviderErrorKind::Transient);
	}
}
