//! Thread-safe in-memory directory for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{RecordId, TenantId, UserId},
	store::{
		ClientDirectory, ClientRecord, StoreError, StoreFuture, Tenant, TenantDirectory, User,
		UserDirectory,
	},
};

#[derive(Debug, Default)]
struct Tables {
	tenants: HashMap<TenantId, Tenant>,
	clients: HashMap<RecordId, ClientRecord>,
	users: HashMap<UserId, User>,
}

type TableMap = Arc<RwLock<Tables>>;

/// Directory backend that keeps tenants, clients, and users in-process.
///
/// Emails compare ASCII case-insensitively inside a tenant.
#[derive(Clone, Debug, Default)]
pub struct MemoryDirectory(TableMap);
impl MemoryDirectory {
	/// Seeds or replaces a tenant.
	pub fn put_tenant(&self, tenant: Tenant) {
		self.0.write().tenants.insert(tenant.id, tenant);
	}

	/// Seeds or replaces a user.
	pub fn put_user(&self, user: User) {
		self.0.write().users.insert(user.id, user);
	}

	/// Seeds or replaces a client registration.
	pub fn put_client(&self, record: ClientRecord) {
		self.0.write().clients.insert(record.id, record);
	}

	/// Number of stored users.
	pub fn user_count(&self) -> usize {
		self.0.read().users.len()
	}

	fn insert_client_now(map: TableMap, record: ClientRecord) -> Result<(), StoreError> {
		let mut guard = map.write();

		if guard.clients.values().any(|existing| existing.client_id == record.client_id) {
			return Err(StoreError::Conflict {
				message: format!("client id {} already exists", record.client_id),
			});
		}

		guard.clients.insert(record.id, record);

		Ok(())
	}

	fn update_client_now(map: TableMap, record: ClientRecord) -> Result<(), StoreError> {
		let mut guard = map.write();

		match guard.clients.get_mut(&record.id) {
			Some(existing) => {
				*existing = record;

				Ok(())
			},
			None => Err(StoreError::Missing { message: format!("client record {}", record.id) }),
		}
	}

	fn find_by_email_now(map: TableMap, tenant: TenantId, email: &str) -> Option<User> {
		map.read()
			.users
			.values()
			.find(|user| user.tenant_id == tenant && user.email.eq_ignore_ascii_case(email))
			.cloned()
	}

	fn insert_user_now(map: TableMap, user: User) -> Result<(), StoreError> {
		let mut guard = map.write();

		if guard.users.values().any(|existing| {
			existing.tenant_id == user.tenant_id && existing.email.eq_ignore_ascii_case(&user.email)
		}) {
			return Err(StoreError::Conflict {
				message: format!("email already registered in tenant {}", user.tenant_id),
			});
		}

		guard.users.insert(user.id, user);

		Ok(())
	}

	fn update_user_now(map: TableMap, user: User) -> Result<(), StoreError> {
		let mut guard = map.write();

		match guard.users.get_mut(&user.id) {
			Some(existing) => {
				*existing = user;

				Ok(())
			},
			None => Err(StoreError::Missing { message: format!("user {}", user.id) }),
		}
	}

	fn record_login_now(map: TableMap, id: UserId, at: OffsetDateTime) -> Result<(), StoreError> {
		match map.write().users.get_mut(&id) {
			Some(user) => {
				user.last_login_at = Some(at);

				Ok(())
			},
			None => Err(StoreError::Missing { message: format!("user {id}") }),
		}
	}
}
impl TenantDirectory for MemoryDirectory {
	fn find_tenant(&self, id: TenantId) -> StoreFuture<'_, Option<Tenant>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().tenants.get(&id).cloned()) })
	}
}
impl ClientDirectory for MemoryDirectory {
	fn find_client(&self, id: RecordId) -> StoreFuture<'_, Option<ClientRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().clients.get(&id).cloned()) })
	}

	fn find_by_client_id<'a>(&'a self, client_id: &'a str) -> StoreFuture<'a, Option<ClientRecord>> {
		let map = self.0.clone();

		Box::pin(async move {
			Ok(map.read().clients.values().find(|record| &*record.client_id == client_id).cloned())
		})
	}

	fn list_clients(&self, tenant: TenantId) -> StoreFuture<'_, Vec<ClientRecord>> {
		let map = self.0.clone();

		Box::pin(async move {
			let mut records = map
				.read()
				.clients
				.values()
				.filter(|record| record.tenant_id == tenant)
				.cloned()
				.collect::<Vec<_>>();

			records.sort_by_key(|record| record.created_at);

			Ok(records)
		})
	}

	fn count_clients(&self) -> StoreFuture<'_, usize> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().clients.len()) })
	}

	fn insert_client(&self, record: ClientRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::insert_client_now(map, record) })
	}

	fn update_client(&self, record: ClientRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::update_client_now(map, record) })
	}

	fn delete_client(&self, id: RecordId) -> StoreFuture<'_, bool> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().clients.remove(&id).is_some()) })
	}
}
impl UserDirectory for MemoryDirectory {
	fn find_user(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().users.get(&id).cloned()) })
	}

	fn find_by_email<'a>(
		&'a self,
		tenant: TenantId,
		email: &'a str,
	) -> StoreFuture<'a, Option<User>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::find_by_email_now(map, tenant, email)) })
	}

	fn insert_user(&self, user: User) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::insert_user_now(map, user) })
	}

	fn update_user(&self, user: User) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::update_user_now(map, user) })
	}

	fn record_login(&self, id: UserId, at: OffsetDateTime) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::record_login_now(map, id, at) })
	}
}
