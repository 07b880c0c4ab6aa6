//! Provider descriptor data structures and the authorize-URL helper.

/// Builder API for assembling provider descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, auth::ProviderId};

const GOOGLE_AUTHORIZATION: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the browser is redirected to.
	pub authorization: Url,
	/// Token endpoint used for the code exchange.
	pub token: Url,
	/// Profile endpoint queried with the issued access token.
	pub userinfo: Url,
}

/// Immutable provider descriptor consumed by the social-login flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier, recorded as the user's linked provider.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Scopes requested on the authorize redirect.
	pub scopes: Vec<String>,
	/// Additional query parameters appended to the authorize URL.
	pub extra_authorize_params: Vec<(String, String)>,
	/// Client authentication mechanism for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Google preset: OpenID profile scopes, offline access, forced consent prompt.
	pub fn google() -> Result<Self, ProviderDescriptorError> {
		let id = ProviderId::new("google").map_err(ProviderDescriptorError::InvalidId)?;

		Self::builder(id)
			.authorization_endpoint(parse_endpoint("authorization", GOOGLE_AUTHORIZATION)?)
			.token_endpoint(parse_endpoint("token", GOOGLE_TOKEN)?)
			.userinfo_endpoint(parse_endpoint("userinfo", GOOGLE_USERINFO)?)
			.scopes(["openid", "email", "profile"])
			.extra_authorize_param("access_type", "offline")
			.extra_authorize_param("prompt", "consent")
			.client_auth_method(ClientAuthMethod::ClientSecretPost)
			.build()
	}

	/// Builds the browser redirect for an authorization-code request.
	pub fn authorize_url(&self, client_id: &str, redirect_uri: &Url, state: &str) -> Url {
		let mut url = self.endpoints.authorization.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("client_id", client_id);
		pairs.append_pair("redirect_uri", redirect_uri.as_str());
		pairs.append_pair("response_type", "code");

		if !self.scopes.is_empty() {
			pairs.append_pair("scope", &self.scopes.join(" "));
		}

		pairs.append_pair("state", state);

		for (key, value) in &self.extra_authorize_params {
			pairs.append_pair(key, value);
		}

		drop(pairs);

		url
	}
}

fn parse_endpoint(endpoint: &'static str, raw: &str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(raw).map_err(|_| ProviderDescriptorError::InvalidEndpointUrl { endpoint })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn google_preset_builds_expected_authorize_url() {
		let google = ProviderDescriptor::google().expect("Google preset should build.");
		let redirect = Url::parse("https://id.example.com/auth/google/callback")
			.expect("Redirect fixture should parse.");
		let url = google.authorize_url("g-client", &redirect, "st4te");
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert!(url.as_str().starts_with(GOOGLE_AUTHORIZATION));
		assert_eq!(pairs.get("client_id"), Some(&"g-client".into()));
		assert_eq!(pairs.get("redirect_uri"), Some(&redirect.as_str().into()));
		assert_eq!(pairs.get("response_type"), Some(&"code".into()));
		assert_eq!(pairs.get("scope"), Some(&"openid email profile".into()));
		assert_eq!(pairs.get("state"), Some(&"st4te".into()));
		assert_eq!(pairs.get("access_type"), Some(&"offline".into()));
		assert_eq!(pairs.get("prompt"), Some(&"consent".into()));
		assert_eq!(google.client_auth_method, ClientAuthMethod::ClientSecretPost);
	}
}
