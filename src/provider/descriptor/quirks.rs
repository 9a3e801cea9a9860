// self
use crate::_prelude::*;

/// Provider-specific quirks that influence how the consent URL is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Appends `access_type=offline` so the provider issues a refresh token.
	pub offline_access: bool,
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { offline_access: false, scope_delimiter: ' ' }
	}
}
impl ProviderQuirks {
	/// Quirks for Google's OAuth 2.0 endpoints.
	pub fn google() -> Self {
		Self { offline_access: true, ..Self::default() }
	}
}
