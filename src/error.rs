//! Engine-level error types plus the browser-safe projection used by HTTP front-ends.

// self
use crate::_prelude::*;

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const CHALLENGE_DIAGNOSTIC_LEN: usize = 50;

/// Canonical engine error exposed by public APIs.
///
/// Credential failures are deliberately absent: a wrong password or an unknown email is a
/// normal [`PasswordLoginOutcome::Rejected`](crate::flows::PasswordLoginOutcome::Rejected)
/// value, never an error.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Directory or state-store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Authorization backend answered with an unexpected status or body.
	#[error(transparent)]
	Backend(#[from] BackendError),

	/// Caller supplied a missing or malformed parameter.
	#[error("Invalid request: {reason}.")]
	InvalidInput {
		/// Which parameter was rejected and why.
		reason: String,
	},
	/// The requesting OAuth client was never onboarded locally.
	#[error("OAuth client `{client_id}` is not registered.")]
	ClientNotRegistered {
		/// Client identifier reported by the authorization backend or the caller.
		client_id: String,
	},
	/// Tenant does not exist or has been deactivated.
	#[error("Tenant does not exist or is inactive.")]
	TenantUnavailable,
	/// Local client record does not exist.
	#[error("OAuth client record was not found.")]
	ClientNotFound,
	/// The backend subject does not resolve to a local user.
	#[error("Session subject does not resolve to a known user.")]
	UnknownSubject,
	/// Callback `state` differs from the CSRF cookie.
	#[error("State parameter does not match.")]
	StateMismatch,
	/// Callback `state` is unknown, expired, or already consumed.
	#[error("Invalid state parameter; restart the login flow.")]
	InvalidState,
	/// Identity provider reported an error on the redirect.
	#[error("Identity provider returned `{error}`.")]
	ProviderDenied {
		/// Provider error code, passed through verbatim.
		error: String,
		/// Provider error description, if any.
		description: Option<String>,
	},
	/// Code exchange or profile fetch against the identity provider failed.
	#[error("Identity provider exchange failed: {reason}.")]
	ProviderExchange {
		/// Provider- or engine-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl Error {
	pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
		Self::InvalidInput { reason: reason.into() }
	}

	/// Returns `true` when the failure came from talking to the authorization backend.
	pub fn is_backend_failure(&self) -> bool {
		matches!(self, Self::Transport(_) | Self::Backend(_))
	}
}

/// Configuration and validation failures raised by the engine.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A configured URL cannot be parsed or joined.
	#[error("The {field} URL is invalid.")]
	InvalidUrl {
		/// Which setting carried the URL.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	InvalidDescriptor(#[from] crate::provider::ProviderDescriptorError),
	/// A duration setting is zero or negative.
	#[error("The {field} duration must be positive.")]
	NonPositiveDuration {
		/// Offending setting name.
		field: &'static str,
	},
	/// A setting holds a value outside its accepted range.
	#[error("The {field} setting is invalid: {reason}.")]
	InvalidSetting {
		/// Offending setting name.
		field: &'static str,
		/// What the setting must satisfy.
		reason: &'static str,
	},
	/// Neither client-specific nor platform credentials exist for the identity provider.
	#[error("No identity provider credentials are configured.")]
	MissingProviderCredentials,
	/// Request body could not be serialized.
	#[error("Request body could not be encoded.")]
	RequestEncode {
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// Password hashing failed.
	#[error("Password hash could not be computed.")]
	PasswordHash {
		/// Underlying bcrypt failure.
		#[source]
		source: bcrypt::BcryptError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {target}.")]
	Network {
		/// Which remote was being called.
		target: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The remote did not answer within the configured timeout.
	#[error("Request to {target} timed out.")]
	Timeout {
		/// Which remote was being called.
		target: &'static str,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during an outbound request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		target: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { target, source: Box::new(src) }
	}

	pub(crate) fn from_reqwest(target: &'static str, e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout { target } } else { Self::network(target, e) }
	}
}

/// Authorization backend responses that do not match the admin API contract.
#[derive(Debug, ThisError)]
pub enum BackendError {
	/// The backend answered with a status other than the expected one.
	#[error("Authorization backend rejected {operation} with HTTP {status}: {body}.")]
	UnexpectedStatus {
		/// Admin operation label (for example `get_login_request`).
		operation: &'static str,
		/// HTTP status code returned by the backend.
		status: u16,
		/// Raw response body, useful for operators.
		body: String,
	},
	/// The backend answered with JSON that does not match the expected shape.
	#[error("Authorization backend returned malformed JSON for {operation}.")]
	MalformedResponse {
		/// Admin operation label.
		operation: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Session revocation failed for at least one of the login or consent session sets.
	#[error("Failed to revoke {which} sessions: {reason}.")]
	Revocation {
		/// `login` or `consent`.
		which: &'static str,
		/// First failure observed.
		reason: String,
	},
}
impl BackendError {
	/// HTTP status reported by the backend, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::UnexpectedStatus { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Browser-safe error payload. End users see a generic message; operators get
/// [`Diagnostics`] through logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
	/// HTTP status the front-end should answer with.
	#[serde(skip)]
	pub status: u16,
	/// Machine-readable error code.
	pub error: String,
	/// Human-readable message safe to show to end users.
	pub error_description: String,
	/// Machine-readable hint for clients that want to react programmatically.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub hint: Option<&'static str>,
}
impl ErrorResponse {
	fn new(status: u16, error: impl Into<String>, description: impl Into<String>) -> Self {
		Self { status, error: error.into(), error_description: description.into(), hint: None }
	}

	fn with_hint(mut self, hint: &'static str) -> Self {
		self.hint = Some(hint);

		self
	}

	/// Builds the operator-facing detail for a failed challenge transaction.
	pub fn diagnostics(error: &Error, admin_url: &Url, challenge: &str) -> Diagnostics {
		Diagnostics {
			error: error.to_string(),
			admin_url: admin_url.to_string(),
			challenge: truncate_challenge(challenge),
		}
	}
}
impl From<&Error> for ErrorResponse {
	fn from(err: &Error) -> Self {
		match err {
			Error::Storage(_) => Self::new(500, "server_error", "An internal error occurred."),
			Error::Config(_) =>
				Self::new(500, "server_error", "The identity service is misconfigured."),
			Error::Transport(_) => Self::new(
				502,
				"server_error",
				"The authorization service is temporarily unavailable.",
			)
			.with_hint("authorization_backend_unavailable"),
			Error::Backend(_) => Self::new(
				500,
				"server_error",
				"The authorization service could not process the request.",
			)
			.with_hint("authorization_backend_error"),
			Error::InvalidInput { reason } => Self::new(400, "invalid_request", reason.clone()),
			Error::ClientNotRegistered { .. } => Self::new(
				400,
				"unauthorized_client",
				"The requesting application is not registered.",
			)
			.with_hint("client_not_registered"),
			Error::TenantUnavailable =>
				Self::new(400, "invalid_tenant", "Tenant does not exist or is inactive."),
			Error::ClientNotFound => Self::new(404, "not_found", "Client not found."),
			Error::UnknownSubject => Self::new(400, "login_required", "Please login again.")
				.with_hint("restart_flow"),
			Error::StateMismatch =>
				Self::new(400, "state_mismatch", "State parameter does not match.")
					.with_hint("restart_flow"),
			Error::InvalidState => Self::new(
				400,
				"invalid_state",
				"Invalid or expired state parameter. Please start the login again.",
			)
			.with_hint("restart_flow"),
			Error::ProviderDenied { error, description } =>
				Self::new(400, error.clone(), description.clone().unwrap_or_default()),
			Error::ProviderExchange { .. } => Self::new(
				502,
				"oauth_callback_failed",
				"Failed to process the identity provider callback.",
			),
		}
	}
}

/// Operator-facing failure detail; never sent to browsers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
	/// Full error message chain head.
	pub error: String,
	/// Admin URL of the authorization backend.
	pub admin_url: String,
	/// Challenge truncated for log hygiene.
	pub challenge: String,
}

/// Truncates a challenge to 50 characters plus `...` for logs.
pub fn truncate_challenge(challenge: &str) -> String {
	match challenge.char_indices().nth(CHALLENGE_DIAGNOSTIC_LEN) {
		Some((idx, _)) => format!("{}...", &challenge[..idx]),
		None => challenge.to_owned(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn transport_failures_map_to_5xx_with_hint() {
		let err = Error::from(TransportError::Timeout { target: "authorization backend" });
		let response = ErrorResponse::from(&err);

		assert_eq!(response.status, 502);
		assert_eq!(response.hint, Some("authorization_backend_unavailable"));
		assert!(err.is_backend_failure());

		let payload =
			serde_json::to_value(&response).expect("Error response should serialize to JSON.");

		assert!(payload.get("status").is_none(), "Status must stay out of the JSON body.");
	}

	#[test]
	fn state_errors_carry_stable_codes() {
		assert_eq!(ErrorResponse::from(&Error::StateMismatch).error, "state_mismatch");
		assert_eq!(ErrorResponse::from(&Error::InvalidState).error, "invalid_state");
	}

	#[test]
	fn provider_denied_is_passed_through() {
		let err = Error::ProviderDenied {
			error: "access_denied".into(),
			description: Some("User cancelled.".into()),
		};
		let response = ErrorResponse::from(&err);

		assert_eq!(response.error, "access_denied");
		assert_eq!(response.error_description, "User cancelled.");
	}

	#[test]
	fn challenges_are_truncated_for_diagnostics() {
		let long = "c".repeat(80);

		assert_eq!(truncate_challenge(&long), format!("{}...", "c".repeat(50)));
		assert_eq!(truncate_challenge("short"), "short");

		let admin = Url::parse("http://localhost:4445").expect("Admin URL fixture should parse.");
		let diagnostics = ErrorResponse::diagnostics(&Error::InvalidState, &admin, &long);

		assert_eq!(diagnostics.admin_url, "http://localhost:4445/");
		assert!(diagnostics.challenge.ends_with("..."));
	}
}
