//! Identity-provider facade: authorization-code exchange and profile lookup.
//!
//! The code exchange runs through the `oauth2` crate on top of the shared reqwest stack; the
//! profile lookup is a plain bearer-authenticated GET. Every failure lands in
//! [`Error::ProviderExchange`] or, for network-level problems, [`Error::Transport`].

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId as OAuthClientId, ClientSecret, EndpointNotSet,
	EndpointSet, HttpClientError, RedirectUrl, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
use reqwest::header::ACCEPT;
// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::{ConfigError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::{ClientAuthMethod, ProviderDescriptor},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

const TARGET: &str = "identity provider";

/// Profile returned by the provider's userinfo endpoint.
///
/// Accepts both the v2 (`id`, `verified_email`) and the OpenID Connect (`sub`,
/// `email_verified`) spellings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
	/// Provider-side subject identifier.
	#[serde(alias = "sub")]
	pub id: String,
	/// Email address; the local account is matched on it.
	#[serde(default)]
	pub email: String,
	/// Whether the provider verified the address.
	#[serde(default, alias = "email_verified")]
	pub verified_email: bool,
	/// Display name.
	#[serde(default)]
	pub name: String,
	/// Given name.
	#[serde(default)]
	pub given_name: String,
	/// Family name.
	#[serde(default)]
	pub family_name: String,
	/// Avatar URL.
	#[serde(default)]
	pub picture: Option<String>,
}
impl UserProfile {
	/// Best display name: given and family names joined, falling back to `name`.
	pub fn display_name(&self) -> String {
		let joined = format!("{} {}", self.given_name, self.family_name);
		let joined = joined.trim();

		if joined.is_empty() { self.name.trim().to_owned() } else { joined.to_owned() }
	}
}

/// Client credentials presented to the identity provider.
#[derive(Clone, Copy, Debug)]
pub struct ProviderCredentials<'a> {
	/// Provider client identifier.
	pub client_id: &'a str,
	/// Provider client secret.
	pub client_secret: &'a Secret,
}

/// `oauth2`-backed exchange client bound to one descriptor, credential pair, and redirect.
pub(crate) struct ProviderFacade<'a> {
	oauth_client: ConfiguredBasicClient,
	http_client: &'a ReqwestHttpClient,
	timeout: Duration,
}
impl<'a> ProviderFacade<'a> {
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		credentials: ProviderCredentials<'_>,
		redirect_uri: &Url,
		http_client: &'a ReqwestHttpClient,
		timeout: Duration,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidUrl { field: "provider authorization", source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidUrl { field: "provider token", source })?;
		let redirect_url = RedirectUrl::new(redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidUrl { field: "provider redirect", source })?;
		let mut oauth_client =
			BasicClient::new(OAuthClientId::new(credentials.client_id.to_owned()))
				.set_client_secret(ClientSecret::new(credentials.client_secret.expose().to_owned()))
				.set_auth_uri(auth_url)
				.set_token_uri(token_url)
				.set_redirect_uri(redirect_url);

		if matches!(descriptor.client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, http_client, timeout })
	}

	/// Exchanges an authorization code and returns the access token.
	pub(crate) async fn exchange_code(&self, code: &str) -> Result<Secret> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone(), self.timeout);
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		Ok(Secret::new(response.access_token().secret().to_owned()))
	}
}

/// Fetches the user profile with the provider-issued access token.
pub(crate) async fn fetch_profile(
	http_client: &ReqwestHttpClient,
	userinfo: &Url,
	access_token: &Secret,
	timeout: Duration,
) -> Result<UserProfile> {
	let response = http_client
		.get(userinfo.clone())
		.bearer_auth(access_token.expose())
		.header(ACCEPT, "application/json")
		.timeout(timeout.unsigned_abs())
		.send()
		.await
		.map_err(|e| TransportError::from_reqwest(TARGET, e))?;
	let status = response.status();
	let body = response.text().await.map_err(|e| TransportError::from_reqwest(TARGET, e))?;

	if !status.is_success() {
		return Err(Error::ProviderExchange {
			reason: "userinfo endpoint rejected the access token".into(),
			status: Some(status.as_u16()),
		});
	}

	let deserializer = &mut serde_json::Deserializer::from_str(&body);
	let profile: UserProfile =
		serde_path_to_error::deserialize(deserializer).map_err(|e| Error::ProviderExchange {
			reason: format!("userinfo response is malformed at `{}`", e.path()),
			status: Some(status.as_u16()),
		})?;

	if profile.email.trim().is_empty() {
		return Err(Error::ProviderExchange {
			reason: "userinfo response carries no email address".into(),
			status: Some(status.as_u16()),
		});
	}

	Ok(profile)
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, status),
		RequestTokenError::Request(error) => map_transport_error(error),
		RequestTokenError::Parse(error, _body) => Error::ProviderExchange {
			reason: format!("token response is malformed at `{}`", error.path()),
			status,
		},
		RequestTokenError::Other(message) => Error::ProviderExchange {
			reason: format!("token endpoint returned an unexpected response: {message}"),
			status,
		},
	}
}

fn map_server_response_error(response: BasicErrorResponse, status: Option<u16>) -> Error {
	let reason = match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	};

	Error::ProviderExchange { reason, status }
}

fn map_transport_error(err: HttpClientError<ReqwestError>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => TransportError::from_reqwest(TARGET, *inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => Error::ProviderExchange {
			reason: format!("HTTP client error while calling the token endpoint: {message}"),
			status: None,
		},
		_ => Error::ProviderExchange {
			reason: "HTTP client error while calling the token endpoint".into(),
			status: None,
		},
	}
}
