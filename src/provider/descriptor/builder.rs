// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, ProviderId},
	provider::{ClientAuthMethod, ProviderDescriptor, ProviderEndpoints},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Authorization endpoint is required for the browser redirect.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is required for the code exchange.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Profile endpoint is required to resolve the user.
	#[error("Missing userinfo endpoint.")]
	MissingUserinfoEndpoint,
	/// At least one scope must be requested.
	#[error("Descriptor must request at least one scope.")]
	NoScopes,
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A preset endpoint could not be parsed.
	#[error("The {endpoint} endpoint URL is invalid.")]
	InvalidEndpointUrl {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
	},
	/// The descriptor identifier is invalid.
	#[error(transparent)]
	InvalidId(IdentifierError),
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// Authorization endpoint the browser is sent to.
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint used for the code exchange.
	pub token_endpoint: Option<Url>,
	/// Profile endpoint queried after the exchange.
	pub userinfo_endpoint: Option<Url>,
	/// Requested scopes.
	pub scopes: Vec<String>,
	/// Extra authorize-URL query parameters.
	pub extra_authorize_params: Vec<(String, String)>,
	/// Client authentication method for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			authorization_endpoint: None,
			token_endpoint: None,
			userinfo_endpoint: None,
			scopes: Vec::new(),
			extra_authorize_params: Vec::new(),
			client_auth_method: ClientAuthMethod::default(),
		}
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the userinfo endpoint.
	pub fn userinfo_endpoint(mut self, url: Url) -> Self {
		self.userinfo_endpoint = Some(url);

		self
	}

	/// Replaces the requested scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Appends an authorize-URL query parameter.
	pub fn extra_authorize_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra_authorize_params.push((key.into(), value.into()));

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let userinfo =
			self.userinfo_endpoint.ok_or(ProviderDescriptorError::MissingUserinfoEndpoint)?;
		let descriptor = ProviderDescriptor {
			id: self.id,
			endpoints: ProviderEndpoints { authorization, token, userinfo },
			scopes: self.scopes,
			extra_authorize_params: self.extra_authorize_params,
			client_auth_method: self.client_auth_method,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		if self.scopes.iter().all(|scope| scope.trim().is_empty()) {
			return Err(ProviderDescriptorError::NoScopes);
		}

		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("userinfo", &self.endpoints.userinfo)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn id() -> ProviderId {
		ProviderId::new("mock").expect("Provider fixture should be valid.")
	}

	fn url(raw: &str) -> Url {
		Url::parse(raw).expect("URL fixture should parse.")
	}

	#[test]
	fn builder_requires_all_endpoints() {
		let err = ProviderDescriptor::builder(id())
			.authorization_endpoint(url("https://idp.example.com/authorize"))
			.token_endpoint(url("https://idp.example.com/token"))
			.scopes(["openid"])
			.build()
			.expect_err("Missing userinfo endpoint must be rejected.");

		assert_eq!(err, ProviderDescriptorError::MissingUserinfoEndpoint);
	}

	#[test]
	fn plain_http_is_only_allowed_on_loopback() {
		let local = ProviderDescriptor::builder(id())
			.authorization_endpoint(url("http://127.0.0.1:9000/authorize"))
			.token_endpoint(url("http://localhost:9000/token"))
			.userinfo_endpoint(url("http://[::1]:9000/userinfo"))
			.scopes(["openid"])
			.build();

		assert!(local.is_ok());

		let err = ProviderDescriptor::builder(id())
			.authorization_endpoint(url("https://idp.example.com/authorize"))
			.token_endpoint(url("http://idp.example.com/token"))
			.userinfo_endpoint(url("https://idp.example.com/userinfo"))
			.scopes(["openid"])
			.build()
			.expect_err("Remote plain HTTP must be rejected.");

		assert!(matches!(err, ProviderDescriptorError::InsecureEndpoint { endpoint: "token", .. }));
	}

	#[test]
	fn empty_scope_lists_are_rejected() {
		let err = ProviderDescriptor::builder(id())
			.authorization_endpoint(url("https://idp.example.com/authorize"))
			.token_endpoint(url("https://idp.example.com/token"))
			.userinfo_endpoint(url("https://idp.example.com/userinfo"))
			.build()
			.expect_err("Empty scopes must be rejected.");

		assert_eq!(err, ProviderDescriptorError::NoScopes);
	}
}
