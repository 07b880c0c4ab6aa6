//! Login, consent, social-login, and client-registry orchestration.
//!
//! [`Engine`] owns the backend admin client, the identity-provider descriptor, the state store,
//! and the tenant/client/user directories. Each operation lives in its own submodule and
//! returns a typed outcome that a thin HTTP layer renders without further decisions.

pub mod consent;
pub mod login;
pub mod registry;
pub mod social;

mod common;

pub use consent::*;
pub use login::*;
pub use registry::*;
pub use social::*;

// self
use crate::{
	_prelude::*,
	auth::PasswordVerifier,
	backend::AdminClient,
	config::EngineConfig,
	http::ReqwestHttpClient,
	provider::ProviderDescriptor,
	store::{ClientDirectory, MemoryDirectory, StateStore, TenantDirectory, UserDirectory},
};

/// Directory handles consumed by the engine.
#[derive(Clone)]
pub struct Directories {
	/// Tenant lookups.
	pub tenants: Arc<dyn TenantDirectory>,
	/// Local OAuth client registrations.
	pub clients: Arc<dyn ClientDirectory>,
	/// Tenant-scoped user accounts.
	pub users: Arc<dyn UserDirectory>,
}
impl Directories {
	/// Uses one value that implements every directory trait.
	pub fn shared<D>(directory: Arc<D>) -> Self
	where
		D: 'static + TenantDirectory + ClientDirectory + UserDirectory,
	{
		Self { tenants: directory.clone(), clients: directory.clone(), users: directory }
	}
}
impl From<MemoryDirectory> for Directories {
	fn from(directory: MemoryDirectory) -> Self {
		Self::shared(Arc::new(directory))
	}
}
impl Debug for Directories {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Directories(..)")
	}
}

/// Orchestrates every login, consent, and registry operation against one backend.
#[derive(Clone)]
pub struct Engine {
	/// Authorization backend admin client.
	pub admin: AdminClient,
	/// HTTP client used for identity-provider calls.
	pub http_client: ReqwestHttpClient,
	/// One-time OAuth state store; constructed once and shared.
	pub state_store: Arc<dyn StateStore>,
	/// Tenant/client/user directories.
	pub directories: Directories,
	/// Identity provider used by social login.
	pub provider: ProviderDescriptor,
	/// Validated runtime settings.
	pub config: EngineConfig,
	/// bcrypt verifier for password logins.
	pub passwords: PasswordVerifier,
}
impl Engine {
	/// Creates an engine with a redirect-free reqwest client and the Google provider preset.
	pub fn new(
		config: EngineConfig,
		directories: impl Into<Directories>,
		state_store: Arc<dyn StateStore>,
	) -> Result<Self> {
		Self::with_http_client(
			config,
			directories,
			state_store,
			ReqwestHttpClient::without_redirects()?,
		)
	}

	/// Creates an engine that reuses the caller-provided HTTP client.
	pub fn with_http_client(
		config: EngineConfig,
		directories: impl Into<Directories>,
		state_store: Arc<dyn StateStore>,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		config.validate()?;

		let admin = AdminClient::new(config.backend_admin_url.clone(), http_client.clone())
			.with_timeout(config.backend_timeout);
		let provider = ProviderDescriptor::google().map_err(crate::error::ConfigError::from)?;
		let passwords = PasswordVerifier::new(config.password_hash_cost);

		Ok(Self {
			admin,
			http_client,
			state_store,
			directories: directories.into(),
			provider,
			config,
			passwords,
		})
	}

	/// Replaces the identity provider descriptor.
	pub fn with_provider(mut self, provider: ProviderDescriptor) -> Self {
		self.provider = provider;

		self
	}
}
impl Debug for Engine {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Engine")
			.field("admin", &self.admin)
			.field("provider", &self.provider.id)
			.field("config", &self.config)
			.finish()
	}
}
