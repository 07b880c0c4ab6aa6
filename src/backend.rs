//! Typed client over the authorization backend's admin API.
//!
//! Every call is a single HTTP round trip bounded by the configured timeout. Nothing here
//! retries: replaying an accept or reject against a challenge risks resolving it twice.

pub mod model;

pub use model::*;

// crates.io
use reqwest::{Method, RequestBuilder, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{BackendError, ConfigError, TransportError},
	http::ReqwestHttpClient,
	obs,
};

const TARGET: &str = "authorization backend";

const LOGIN_REQUEST: &[&str] = &["admin", "oauth2", "auth", "requests", "login"];
const CONSENT_REQUEST: &[&str] = &["admin", "oauth2", "auth", "requests", "consent"];
const LOGIN_SESSIONS: &[&str] = &["admin", "oauth2", "auth", "sessions", "login"];
const CONSENT_SESSIONS: &[&str] = &["admin", "oauth2", "auth", "sessions", "consent"];
const CLIENTS: &[&str] = &["admin", "clients"];

/// Admin API client for the authorization backend.
#[derive(Clone, Debug)]
pub struct AdminClient {
	http: ReqwestHttpClient,
	admin_url: Url,
	timeout: Duration,
}
impl AdminClient {
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(30);

	/// Creates a client rooted at `admin_url`.
	pub fn new(admin_url: Url, http: ReqwestHttpClient) -> Self {
		Self { http, admin_url, timeout: Self::DEFAULT_TIMEOUT }
	}

	/// Overrides the per-request timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Admin base URL, reported in operator diagnostics.
	pub fn admin_url(&self) -> &Url {
		&self.admin_url
	}

	/// Fetches a login transaction.
	pub async fn get_login_request(&self, challenge: &str) -> Result<LoginRequest> {
		const OP: &str = "get_login_request";

		let url = self.challenge_url(LOGIN_REQUEST, None, challenge)?;
		let body = self.call(OP, Method::GET, url, None, &[200]).await?;

		decode(OP, &body)
	}

	/// Accepts a login transaction.
	pub async fn accept_login_request(
		&self,
		challenge: &str,
		body: &AcceptLogin,
	) -> Result<RedirectResponse> {
		const OP: &str = "accept_login_request";

		let url = self.challenge_url(LOGIN_REQUEST, Some("accept"), challenge)?;
		let body = self.call(OP, Method::PUT, url, Some(encode(body)?), &[200]).await?;

		decode(OP, &body)
	}

	/// Rejects a login transaction.
	pub async fn reject_login_request(
		&self,
		challenge: &str,
		body: &RejectRequest,
	) -> Result<RedirectResponse> {
		const OP: &str = "reject_login_request";

		let url = self.challenge_url(LOGIN_REQUEST, Some("reject"), challenge)?;
		let body = self.call(OP, Method::PUT, url, Some(encode(body)?), &[200]).await?;

		decode(OP, &body)
	}

	/// Fetches a consent transaction.
	pub async fn get_consent_request(&self, challenge: &str) -> Result<ConsentRequest> {
		const OP: &str = "get_consent_request";

		let url = self.challenge_url(CONSENT_REQUEST, None, challenge)?;
		let body = self.call(OP, Method::GET, url, None, &[200]).await?;

		decode(OP, &body)
	}

	/// Accepts a consent transaction.
	pub async fn accept_consent_request(
		&self,
		challenge: &str,
		body: &AcceptConsent,
	) -> Result<RedirectResponse> {
		const OP: &str = "accept_consent_request";

		let url = self.challenge_url(CONSENT_REQUEST, Some("accept"), challenge)?;
		let body = self.call(OP, Method::PUT, url, Some(encode(body)?), &[200]).await?;

		decode(OP, &body)
	}

	/// Rejects a consent transaction.
	pub async fn reject_consent_request(
		&self,
		challenge: &str,
		body: &RejectRequest,
	) -> Result<RedirectResponse> {
		const OP: &str = "reject_consent_request";

		let url = self.challenge_url(CONSENT_REQUEST, Some("reject"), challenge)?;
		let body = self.call(OP, Method::PUT, url, Some(encode(body)?), &[200]).await?;

		decode(OP, &body)
	}

	/// Revokes every login and consent session of `subject`.
	///
	/// Both revocations are attempted even when the first fails; `204` and `404` count as
	/// success. The first failure is reported.
	pub async fn revoke_user_sessions(&self, subject: &str) -> Result<()> {
		let login = self.revoke("login", LOGIN_SESSIONS, subject).await;
		let consent = self.revoke("consent", CONSENT_SESSIONS, subject).await;

		login.and(consent)
	}

	/// Registers a client; the backend must answer `201`.
	pub async fn create_client(&self, client: &OAuth2Client) -> Result<OAuth2Client> {
		const OP: &str = "create_client";

		let url = self.endpoint(CLIENTS, &[])?;
		let body = self.call(OP, Method::POST, url, Some(encode(client)?), &[201]).await?;

		decode(OP, &body)
	}

	/// Fetches a registered client.
	pub async fn get_client(&self, client_id: &str) -> Result<OAuth2Client> {
		const OP: &str = "get_client";

		let url = self.endpoint(CLIENTS, &[client_id])?;
		let body = self.call(OP, Method::GET, url, None, &[200]).await?;

		decode(OP, &body)
	}

	/// Replaces a registered client.
	pub async fn update_client(&self, client: &OAuth2Client) -> Result<OAuth2Client> {
		const OP: &str = "update_client";

		let url = self.endpoint(CLIENTS, &[&client.client_id])?;
		let body = self.call(OP, Method::PUT, url, Some(encode(client)?), &[200]).await?;

		decode(OP, &body)
	}

	/// Deletes a registered client; an already missing client counts as deleted.
	pub async fn delete_client(&self, client_id: &str) -> Result<()> {
		let url = self.endpoint(CLIENTS, &[client_id])?;

		self.call("delete_client", Method::DELETE, url, None, &[204, 404]).await.map(|_| ())
	}

	async fn revoke(&self, which: &'static str, base: &[&str], subject: &str) -> Result<()> {
		let mut url = self.endpoint(base, &[])?;

		url.query_pairs_mut().append_pair("subject", subject);

		self.call("revoke_user_sessions", Method::DELETE, url, None, &[204, 404])
			.await
			.map(|_| ())
			.map_err(|e| BackendError::Revocation { which, reason: e.to_string() }.into())
	}

	fn challenge_url(&self, base: &[&str], action: Option<&str>, challenge: &str) -> Result<Url> {
		if challenge.is_empty() {
			return Err(Error::invalid_input("challenge is required"));
		}

		let mut url = self.endpoint(base, action.as_slice())?;

		url.query_pairs_mut().append_pair("challenge", challenge);

		Ok(url)
	}

	fn endpoint(&self, base: &[&str], tail: &[&str]) -> Result<Url> {
		let mut url = self.admin_url.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::InvalidUrl {
				field: "backend admin",
				source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
			})?
			.pop_if_empty()
			.extend(base)
			.extend(tail);

		Ok(url)
	}

	async fn call(
		&self,
		operation: &'static str,
		method: Method,
		url: Url,
		body: Option<Vec<u8>>,
		expected: &[u16],
	) -> Result<String> {
		let mut request: RequestBuilder =
			self.http.request(method, url).timeout(self.timeout.unsigned_abs());

		if let Some(body) = body {
			request = request.header(CONTENT_TYPE, "application/json").body(body);
		}

		let response =
			request.send().await.map_err(|e| TransportError::from_reqwest(TARGET, e))?;
		let status = response.status().as_u16();
		let text = response.text().await.map_err(|e| TransportError::from_reqwest(TARGET, e))?;

		tracing::debug!(operation, status, "Authorization backend call completed.");
		obs::record_backend_response(operation, status);

		if expected.contains(&status) {
			Ok(text)
		} else {
			Err(BackendError::UnexpectedStatus { operation, status, body: text }.into())
		}
	}
}

fn encode<T>(body: &T) -> Result<Vec<u8>>
where
	T: Serialize,
{
	serde_json::to_vec(body).map_err(|source| ConfigError::RequestEncode { source }.into())
}

fn decode<T>(operation: &'static str, body: &str) -> Result<T>
where
	T: DeserializeOwned,
{
	let deserializer = &mut serde_json::Deserializer::from_str(body);

	serde_path_to_error::deserialize(deserializer)
		.map_err(|source| BackendError::MalformedResponse { operation, source }.into())
}
