//! Engine configuration with defaults and validation.
//!
//! [`EngineConfig`] deserializes from any serde format (durations as whole seconds) or can be
//! assembled through [`EngineConfigBuilder`]. Both paths end in [`EngineConfig::validate`].

// self
use crate::{_prelude::*, auth::Secret, error::ConfigError};

const DEFAULT_ADMIN_URL: &str = "http://localhost:4445";
const DEFAULT_SOCIAL_REDIRECT: &str = "http://localhost:8080/auth/google/callback";
const DEFAULT_CLIENT_ID_PREFIX: &str = "authgate_";

/// Platform-wide identity provider credentials used when a client has no override.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLoginConfig {
	/// Provider client identifier.
	pub client_id: Option<String>,
	/// Provider client secret.
	pub client_secret: Option<Secret>,
	/// Callback URL registered with the provider.
	pub redirect_uri: Url,
}
impl SocialLoginConfig {
	/// Returns the id/secret pair when both are present and non-empty.
	pub fn credentials(&self) -> Option<(&str, &Secret)> {
		match (self.client_id.as_deref(), self.client_secret.as_ref()) {
			(Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
			_ => None,
		}
	}
}
impl Default for SocialLoginConfig {
	fn default() -> Self {
		Self {
			client_id: None,
			client_secret: None,
			redirect_uri: default_url(DEFAULT_SOCIAL_REDIRECT),
		}
	}
}

/// Runtime settings of the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Base URL of the authorization backend's admin API.
	pub backend_admin_url: Url,
	/// Per-request timeout for admin API calls.
	#[serde(with = "seconds")]
	pub backend_timeout: Duration,
	/// Per-request timeout for identity provider token and profile calls.
	#[serde(with = "seconds")]
	pub provider_timeout: Duration,
	/// Lifetime of social-login state entries.
	///
	/// The engine never reads this value itself because the [`StateStore`](crate::store::StateStore)
	/// owns expiry. Build the in-memory store with
	/// [`MemoryStateStore::from_config`](crate::store::MemoryStateStore::from_config) or pass it
	/// to your own implementation.
	#[serde(with = "seconds")]
	pub state_ttl: Duration,
	/// How long the backend remembers an SSO-approved or social login.
	#[serde(with = "seconds")]
	pub sso_remember_for: Duration,
	/// How long the backend remembers a password login when "remember me" is set.
	#[serde(with = "seconds")]
	pub login_remember_for: Duration,
	/// Prefix of generated OAuth client identifiers.
	pub client_id_prefix: String,
	/// bcrypt cost used for decoy hashing and new password hashes.
	pub password_hash_cost: u32,
	/// Whether the CSRF cookie carries the `Secure` attribute.
	pub secure_cookies: bool,
	/// Platform-wide identity provider credentials.
	pub social: SocialLoginConfig,
}
impl EngineConfig {
	/// Creates a builder seeded with defaults.
	pub fn builder() -> EngineConfigBuilder {
		EngineConfigBuilder::default()
	}

	/// Checks every setting; called by [`EngineConfigBuilder::build`] and the engine.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !matches!(self.backend_admin_url.scheme(), "http" | "https")
			|| self.backend_admin_url.cannot_be_a_base()
		{
			return Err(ConfigError::InvalidSetting {
				field: "backend_admin_url",
				reason: "must be an absolute http(s) URL",
			});
		}

		for (field, value) in [
			("backend_timeout", self.backend_timeout),
			("provider_timeout", self.provider_timeout),
			("state_ttl", self.state_ttl),
			("sso_remember_for", self.sso_remember_for),
			("login_remember_for", self.login_remember_for),
		] {
			if !value.is_positive() {
				return Err(ConfigError::NonPositiveDuration { field });
			}
		}

		if self.client_id_prefix.is_empty()
			|| self.client_id_prefix.chars().any(char::is_whitespace)
		{
			return Err(ConfigError::InvalidSetting {
				field: "client_id_prefix",
				reason: "must be non-empty and free of whitespace",
			});
		}
		if !(4..=31).contains(&self.password_hash_cost) {
			return Err(ConfigError::InvalidSetting {
				field: "password_hash_cost",
				reason: "bcrypt cost must be between 4 and 31",
			});
		}

		Ok(())
	}
}
impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			backend_admin_url: default_url(DEFAULT_ADMIN_URL),
			backend_timeout: Duration::seconds(30),
			provider_timeout: Duration::seconds(10),
			state_ttl: Duration::minutes(15),
			sso_remember_for: Duration::seconds(3600),
			login_remember_for: Duration::seconds(3600),
			client_id_prefix: DEFAULT_CLIENT_ID_PREFIX.into(),
			password_hash_cost: bcrypt::DEFAULT_COST,
			secure_cookies: true,
			social: SocialLoginConfig::default(),
		}
	}
}

/// Builder for [`EngineConfig`].
#[derive(Clone, Debug, Default)]
pub struct EngineConfigBuilder(EngineConfig);
impl EngineConfigBuilder {
	/// Sets the admin API base URL.
	pub fn backend_admin_url(mut self, url: Url) -> Self {
		self.0.backend_admin_url = url;

		self
	}

	/// Sets the admin API timeout.
	pub fn backend_timeout(mut self, timeout: Duration) -> Self {
		self.0.backend_timeout = timeout;

		self
	}

	/// Sets the identity provider timeout.
	pub fn provider_timeout(mut self, timeout: Duration) -> Self {
		self.0.provider_timeout = timeout;

		self
	}

	/// Sets the state lifetime.
	pub fn state_ttl(mut self, ttl: Duration) -> Self {
		self.0.state_ttl = ttl;

		self
	}

	/// Sets the SSO remember duration.
	pub fn sso_remember_for(mut self, duration: Duration) -> Self {
		self.0.sso_remember_for = duration;

		self
	}

	/// Sets the password-login remember duration.
	pub fn login_remember_for(mut self, duration: Duration) -> Self {
		self.0.login_remember_for = duration;

		self
	}

	/// Sets the generated client id prefix.
	pub fn client_id_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.0.client_id_prefix = prefix.into();

		self
	}

	/// Sets the bcrypt cost.
	pub fn password_hash_cost(mut self, cost: u32) -> Self {
		self.0.password_hash_cost = cost;

		self
	}

	/// Toggles the `Secure` cookie attribute.
	pub fn secure_cookies(mut self, secure: bool) -> Self {
		self.0.secure_cookies = secure;

		self
	}

	/// Sets the platform-wide identity provider credentials.
	pub fn social_credentials(
		mut self,
		client_id: impl Into<String>,
		client_secret: impl Into<Secret>,
	) -> Self {
		self.0.social.client_id = Some(client_id.into());
		self.0.social.client_secret = Some(client_secret.into());

		self
	}

	/// Sets the platform-wide provider callback URL.
	pub fn social_redirect_uri(mut self, url: Url) -> Self {
		self.0.social.redirect_uri = url;

		self
	}

	/// Validates and returns the configuration.
	pub fn build(self) -> Result<EngineConfig, ConfigError> {
		self.0.validate()?;

		Ok(self.0)
	}
}

fn default_url(raw: &'static str) -> Url {
	// Both callers pass compile-time constants covered by `defaults_are_valid`.
	Url::parse(raw).unwrap_or_else(|_| unreachable!("{raw} is a valid URL"))
}

pub(crate) mod seconds {
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer};
	use time::Duration;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.whole_seconds())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}
