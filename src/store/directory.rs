//! Tenant, client, and user records plus the lookup contracts the engine reads through.
//!
//! User lookups are always tenant-scoped: the same email may exist once per tenant, and no
//! email-only lookup is offered.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, RecordId, Secret, TenantId, UserId},
	store::StoreFuture,
};

/// Tenant isolation boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
	/// Tenant identifier.
	pub id: TenantId,
	/// Display name.
	pub name: String,
	/// URL-safe slug.
	pub slug: String,
	/// Inactive tenants cannot register clients.
	pub active: bool,
}

/// Local user record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	/// User identifier and backend `subject`.
	pub id: UserId,
	/// Owning tenant.
	pub tenant_id: TenantId,
	/// Primary email, unique per tenant.
	pub email: String,
	/// bcrypt hash; `None` for accounts created through social login.
	pub password_hash: Option<String>,
	/// Display name.
	pub name: String,
	/// Avatar URL.
	pub avatar_url: Option<String>,
	/// Whether the email has been verified.
	pub email_verified: bool,
	/// Inactive users cannot sign in.
	pub active: bool,
	/// Identity provider that created or last linked the account (`local`, `google`).
	pub provider: String,
	/// Subject identifier at the linked identity provider.
	pub provider_subject: Option<String>,
	/// Picture URL reported by the identity provider.
	pub picture: Option<String>,
	/// Last successful login.
	pub last_login_at: Option<OffsetDateTime>,
	/// Creation instant.
	pub created_at: OffsetDateTime,
}
impl User {
	/// Builds an active local user with a fresh identifier.
	pub fn new(tenant_id: TenantId, email: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: UserId::generate(),
			tenant_id,
			email: email.into(),
			password_hash: None,
			name: name.into(),
			avatar_url: None,
			email_verified: false,
			active: true,
			provider: "local".into(),
			provider_subject: None,
			picture: None,
			last_login_at: None,
			created_at: OffsetDateTime::now_utc(),
		}
	}

	/// Attaches a bcrypt hash.
	pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
		self.password_hash = Some(hash.into());

		self
	}
}

/// Per-client identity provider credentials overriding the platform default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleOAuthSettings {
	/// Whether the client-specific credentials should be used.
	pub enabled: bool,
	/// Provider client identifier.
	pub client_id: Option<String>,
	/// Provider client secret.
	pub client_secret: Option<Secret>,
	/// Redirect URI registered with the provider; falls back to the platform redirect.
	pub redirect_uri: Option<Url>,
}
impl GoogleOAuthSettings {
	/// Returns the client id/secret pair when the override is enabled and complete.
	pub fn credentials(&self) -> Option<(&str, &Secret)> {
		if !self.enabled {
			return None;
		}

		match (self.client_id.as_deref(), self.client_secret.as_ref()) {
			(Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
			_ => None,
		}
	}
}

/// Locally stored OAuth client registration; the system of record for the backend mirror.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
	/// Local primary key.
	pub id: RecordId,
	/// Owning tenant.
	pub tenant_id: TenantId,
	/// OAuth client identifier shared with the backend.
	pub client_id: ClientId,
	/// OAuth client secret shared with the backend.
	pub client_secret: Secret,
	/// Display name.
	pub name: String,
	/// Optional description.
	pub description: Option<String>,
	/// Optional homepage.
	pub website: Option<String>,
	/// Optional logo URL.
	pub logo: Option<String>,
	/// Allowed redirect URIs.
	pub redirect_uris: Vec<String>,
	/// Allowed grant types.
	pub grant_types: Vec<String>,
	/// Allowed scopes.
	pub scopes: Vec<String>,
	/// Public clients authenticate without a secret.
	pub public: bool,
	/// Inactive clients fail credential validation.
	pub active: bool,
	/// Client-specific identity provider credentials.
	pub google_oauth: GoogleOAuthSettings,
	/// Creation instant.
	pub created_at: OffsetDateTime,
	/// Last modification instant.
	pub updated_at: OffsetDateTime,
}

/// Tenant lookups.
pub trait TenantDirectory
where
	Self: Send + Sync,
{
	/// Fetches a tenant by id.
	fn find_tenant(&self, id: TenantId) -> StoreFuture<'_, Option<Tenant>>;
}

/// Client registration CRUD.
pub trait ClientDirectory
where
	Self: Send + Sync,
{
	/// Fetches a registration by its local key.
	fn find_client(&self, id: RecordId) -> StoreFuture<'_, Option<ClientRecord>>;

	/// Fetches a registration by OAuth client id.
	fn find_by_client_id<'a>(&'a self, client_id: &'a str) -> StoreFuture<'a, Option<ClientRecord>>;

	/// Lists the registrations of a tenant.
	fn list_clients(&self, tenant: TenantId) -> StoreFuture<'_, Vec<ClientRecord>>;

	/// Counts every stored registration.
	fn count_clients(&self) -> StoreFuture<'_, usize>;

	/// Inserts a new registration; fails with [`StoreError::Conflict`] on a duplicate client id.
	///
	/// [`StoreError::Conflict`]: crate::store::StoreError::Conflict
	fn insert_client(&self, record: ClientRecord) -> StoreFuture<'_, ()>;

	/// Replaces an existing registration.
	fn update_client(&self, record: ClientRecord) -> StoreFuture<'_, ()>;

	/// Deletes a registration, returning whether a row existed.
	fn delete_client(&self, id: RecordId) -> StoreFuture<'_, bool>;
}

/// Tenant-scoped user lookups and writes.
pub trait UserDirectory
where
	Self: Send + Sync,
{
	/// Fetches a user by id.
	fn find_user(&self, id: UserId) -> StoreFuture<'_, Option<User>>;

	/// Fetches a user by email inside one tenant.
	fn find_by_email<'a>(&'a self, tenant: TenantId, email: &'a str)
	-> StoreFuture<'a, Option<User>>;

	/// Inserts a new user; fails with a conflict when the email is taken inside the tenant.
	fn insert_user(&self, user: User) -> StoreFuture<'_, ()>;

	/// Replaces an existing user.
	fn update_user(&self, user: User) -> StoreFuture<'_, ()>;

	/// Stamps the last-login instant.
	fn record_login(&self, id: UserId, at: OffsetDateTime) -> StoreFuture<'_, ()>;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn google_credentials_require_enabled_and_complete_pair() {
		let mut settings = GoogleOAuthSettings {
			enabled: false,
			client_id: Some("g-id".into()),
			client_secret: Some(Secret::new("g-secret")),
			redirect_uri: None,
		};

		assert!(settings.credentials().is_none(), "Disabled overrides must be ignored.");

		settings.enabled = true;

		assert_eq!(settings.credentials().map(|(id, _)| id), Some("g-id"));

		settings.client_secret = Some(Secret::new(""));

		assert!(settings.credentials().is_none(), "Empty secrets must be ignored.");
	}
}
