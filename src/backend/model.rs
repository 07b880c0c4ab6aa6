//! Wire models of the authorization backend's admin API.

// crates.io
use serde::{Deserializer, de::DeserializeOwned};
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, auth::Secret, store::ClientRecord};

/// `token_endpoint_auth_method` for confidential clients.
pub const AUTH_METHOD_CLIENT_SECRET_POST: &str = "client_secret_post";
/// `token_endpoint_auth_method` for public clients.
pub const AUTH_METHOD_NONE: &str = "none";

/// OAuth client as registered in the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Client {
	/// Client identifier.
	pub client_id: String,
	/// Display name.
	#[serde(default, deserialize_with = "null_as_default")]
	pub client_name: String,
	/// Client secret; omitted for public clients and in most backend responses.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_secret: Option<Secret>,
	/// Allowed redirect URIs.
	#[serde(default, deserialize_with = "null_as_default")]
	pub redirect_uris: Vec<String>,
	/// Allowed grant types.
	#[serde(default, deserialize_with = "null_as_default")]
	pub grant_types: Vec<String>,
	/// Allowed response types.
	#[serde(default, deserialize_with = "null_as_default")]
	pub response_types: Vec<String>,
	/// Space-delimited scope list.
	#[serde(default, deserialize_with = "null_as_default")]
	pub scope: String,
	/// Token endpoint authentication method.
	#[serde(default, deserialize_with = "null_as_default")]
	pub token_endpoint_auth_method: String,
}
impl OAuth2Client {
	/// Projects a local registration into its mirrored backend form.
	pub fn mirror_of(record: &ClientRecord) -> Self {
		let (client_secret, auth_method) = if record.public {
			(None, AUTH_METHOD_NONE)
		} else {
			(Some(record.client_secret.clone()), AUTH_METHOD_CLIENT_SECRET_POST)
		};

		Self {
			client_id: record.client_id.to_string(),
			client_name: record.name.clone(),
			client_secret,
			redirect_uris: record.redirect_uris.clone(),
			grant_types: record.grant_types.clone(),
			response_types: vec!["code".into()],
			scope: record.scopes.join(" "),
			token_endpoint_auth_method: auth_method.into(),
		}
	}
}

/// In-flight login transaction reported by the backend.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LoginRequest {
	/// Challenge identifying the transaction.
	pub challenge: String,
	/// Scopes requested by the relying party.
	#[serde(default, deserialize_with = "null_as_default")]
	pub requested_scope: Vec<String>,
	/// Audiences requested by the relying party.
	#[serde(
		default,
		alias = "requested_access_token_audience",
		deserialize_with = "null_as_default"
	)]
	pub requested_audience: Vec<String>,
	/// Authenticated subject when the backend already holds a session.
	#[serde(default, deserialize_with = "null_as_default")]
	pub subject: String,
	/// Requesting OAuth client.
	#[serde(default)]
	pub client: Option<OAuth2Client>,
	/// Original authorization request URL.
	#[serde(default, deserialize_with = "null_as_default")]
	pub request_url: String,
	/// Backend login session id.
	#[serde(default)]
	pub session_id: Option<String>,
	/// Whether the backend already authenticated the user.
	#[serde(default)]
	pub skip: bool,
}
impl LoginRequest {
	/// Requesting client id, if the backend reported one.
	pub fn client_id(&self) -> Option<&str> {
		self.client.as_ref().map(|client| client.client_id.as_str()).filter(|id| !id.is_empty())
	}
}

/// Body of an accept-login call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AcceptLogin {
	/// Subject to authenticate; always the local user id.
	pub subject: String,
	/// Whether the backend should remember the session.
	pub remember: bool,
	/// Session lifetime in seconds; `0` means browser session.
	pub remember_for: i64,
	/// Authentication context class reference.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub acr: Option<String>,
	/// Context carried into the consent stage.
	pub context: Map<String, Value>,
}

/// Body of a reject-login or reject-consent call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RejectRequest {
	/// OAuth error code.
	pub error: String,
	/// Human-readable description.
	pub error_description: String,
}
impl RejectRequest {
	/// Creates a rejection body.
	pub fn new(error: impl Into<String>, description: impl Into<String>) -> Self {
		Self { error: error.into(), error_description: description.into() }
	}
}

/// Response of every accept/reject call.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RedirectResponse {
	/// Where the browser must go next.
	pub redirect_to: String,
}

/// In-flight consent transaction reported by the backend.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ConsentRequest {
	/// Challenge identifying the transaction.
	pub challenge: String,
	/// Scopes requested by the relying party.
	#[serde(default, deserialize_with = "null_as_default")]
	pub requested_scope: Vec<String>,
	/// Audiences requested by the relying party.
	#[serde(
		default,
		alias = "requested_access_token_audience",
		deserialize_with = "null_as_default"
	)]
	pub requested_audience: Vec<String>,
	/// Authenticated subject.
	#[serde(default, deserialize_with = "null_as_default")]
	pub subject: String,
	/// Requesting OAuth client.
	#[serde(default)]
	pub client: Option<OAuth2Client>,
	/// Login challenge that preceded this consent.
	#[serde(default)]
	pub login_challenge: Option<String>,
	/// Backend login session id.
	#[serde(default)]
	pub login_session_id: Option<String>,
	/// Authentication context class reference.
	#[serde(default)]
	pub acr: Option<String>,
	/// Context attached when the login was accepted.
	#[serde(default)]
	pub context: Option<Map<String, Value>>,
}

/// Claims attached to the tokens issued after consent.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConsentSession {
	/// Access-token claims.
	pub access_token: Map<String, Value>,
	/// ID-token claims.
	pub id_token: Map<String, Value>,
}

/// Body of an accept-consent call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AcceptConsent {
	/// Scopes the user granted.
	pub grant_scope: Vec<String>,
	/// Audiences granted to the access token.
	pub grant_access_token_audience: Vec<String>,
	/// Whether the backend should remember the decision.
	pub remember: bool,
	/// Decision lifetime in seconds.
	pub remember_for: i64,
	/// Token claims.
	pub session: ConsentSession,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + DeserializeOwned,
{
	Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
