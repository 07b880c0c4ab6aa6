//! Client registry: the local store is the system of record and every change is mirrored into
//! the authorization backend.
//!
//! Creation is the only step with a compensating action: when the backend refuses the mirror,
//! the local row is deleted again. Updates, deletions, and secret rotation mirror best-effort
//! and log drift with `tracing::warn!`.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{ClientId, RecordId, Secret, TenantId},
	backend::OAuth2Client,
	flows::Engine,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{ClientRecord, GoogleOAuthSettings},
};

const CLIENT_ID_BYTES: usize = 16;
const CLIENT_ID_SUFFIX_LEN: usize = 22;
const CLIENT_SECRET_BYTES: usize = 32;

/// Registration request for a new OAuth client.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewClient {
	/// Owning tenant.
	pub tenant_id: Option<TenantId>,
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
	/// Caller-chosen client id; generated when absent.
	pub client_id: Option<String>,
	/// Caller-chosen client secret; generated when absent.
	pub client_secret: Option<Secret>,
	/// Per-client identity provider override.
	pub google_oauth: GoogleOAuthSettings,
}

/// Partial update of a client registration; `None` keeps the stored value.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClientUpdate {
	/// New display name.
	pub name: Option<String>,
	/// New description.
	pub description: Option<String>,
	/// New homepage.
	pub website: Option<String>,
	/// New logo URL.
	pub logo: Option<String>,
	/// New redirect URIs.
	pub redirect_uris: Option<Vec<String>>,
	/// New grant types.
	pub grant_types: Option<Vec<String>>,
	/// New scopes.
	pub scopes: Option<Vec<String>>,
	/// New public flag.
	pub public: Option<bool>,
	/// New active flag.
	pub active: Option<bool>,
	/// New identity provider override.
	pub google_oauth: Option<GoogleOAuthSettings>,
}

impl Engine {
	/// Registers a client locally and in the backend; rolls the local row back when the
	/// backend refuses.
	pub async fn create_client(&self, request: NewClient) -> Result<ClientRecord> {
		const KIND: FlowKind = FlowKind::ClientRegistry;

		let span = FlowSpan::new(KIND, "create_client");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				validate_new_client(&request)?;

				let tenant_id = request.tenant_id.ok_or(Error::TenantUnavailable)?;

				match self.directories.tenants.find_tenant(tenant_id).await? {
					Some(tenant) if tenant.active => {},
					_ => return Err(Error::TenantUnavailable),
				}

				let (client_id, client_secret) = self.client_credentials_for(&request)?;
				let now = OffsetDateTime::now_utc();
				let record = ClientRecord {
					id: RecordId::generate(),
					tenant_id,
					client_id,
					client_secret,
					name: request.name.trim().to_owned(),
					description: request.description,
					website: request.website,
					logo: request.logo,
					redirect_uris: request.redirect_uris,
					grant_types: request.grant_types,
					scopes: request.scopes,
					public: request.public,
					active: true,
					google_oauth: request.google_oauth,
					created_at: now,
					updated_at: now,
				};

				self.directories.clients.insert_client(record.clone()).await?;

				if let Err(e) = self.admin.create_client(&OAuth2Client::mirror_of(&record)).await {
					let rollback = self.directories.clients.delete_client(record.id).await;

					if let Err(rollback) = rollback {
						tracing::error!(
							client = %record.client_id,
							error = %rollback,
							"Failed to roll back local client after mirror failure."
						);
					}

					return Err(e);
				}

				tracing::info!(
					client = %record.client_id,
					tenant = %tenant_id,
					"Client created and mirrored."
				);

				Ok(record)
			})
			.await;

		obs::finish(KIND, result)
	}

	/// Applies a partial update locally, then mirrors it best-effort.
	pub async fn update_client(&self, id: RecordId, update: ClientUpdate) -> Result<ClientRecord> {
		const KIND: FlowKind = FlowKind::ClientRegistry;

		let span = FlowSpan::new(KIND, "update_client");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut record = self.load_client(id).await?;

				apply_update(&mut record, update)?;

				record.updated_at = OffsetDateTime::now_utc();

				self.directories.clients.update_client(record.clone()).await?;
				self.mirror_update(&record).await;

				Ok(record)
			})
			.await;

		obs::finish(KIND, result)
	}

	/// Deletes a client. The local row is removed even when the backend refuses.
	pub async fn delete_client(&self, id: RecordId) -> Result<()> {
		const KIND: FlowKind = FlowKind::ClientRegistry;

		let span = FlowSpan::new(KIND, "delete_client");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let record = self.load_client(id).await?;

				if let Err(e) = self.admin.delete_client(&record.client_id).await {
					tracing::warn!(
						client = %record.client_id,
						error = %e,
						"Failed to delete client from the authorization backend."
					);
				}

				self.directories.clients.delete_client(id).await?;

				Ok(())
			})
			.await;

		obs::finish(KIND, result)
	}

	/// Rotates the client secret locally, then mirrors it best-effort.
	pub async fn regenerate_client_secret(&self, id: RecordId) -> Result<ClientRecord> {
		const KIND: FlowKind = FlowKind::ClientRegistry;

		let span = FlowSpan::new(KIND, "regenerate_client_secret");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut record = self.load_client(id).await?;

				record.client_secret = generate_client_secret();
				record.updated_at = OffsetDateTime::now_utc();

				self.directories.clients.update_client(record.clone()).await?;
				self.mirror_update(&record).await;

				Ok(record)
			})
			.await;

		obs::finish(KIND, result)
	}

	/// Loads one client registration.
	pub async fn get_client(&self, id: RecordId) -> Result<ClientRecord> {
		self.load_client(id).await
	}

	/// Lists the clients of a tenant.
	pub async fn list_clients(&self, tenant: TenantId) -> Result<Vec<ClientRecord>> {
		Ok(self.directories.clients.list_clients(tenant).await?)
	}

	/// Authenticates a client by id and secret.
	///
	/// Unknown and inactive clients give [`Error::ClientNotFound`]. Public clients skip the
	/// secret check. Secrets are compared through their SHA-256 digests.
	pub async fn validate_client_credentials(
		&self,
		client_id: &str,
		client_secret: &Secret,
	) -> Result<ClientRecord> {
		let record = self
			.directories
			.clients
			.find_by_client_id(client_id)
			.await?
			.filter(|record| record.active)
			.ok_or(Error::ClientNotFound)?;

		if record.public {
			return Ok(record);
		}

		let expected = Sha256::digest(record.client_secret.expose().as_bytes());
		let presented = Sha256::digest(client_secret.expose().as_bytes());

		if expected != presented {
			return Err(Error::invalid_input("invalid client credentials"));
		}

		Ok(record)
	}

	async fn load_client(&self, id: RecordId) -> Result<ClientRecord> {
		self.directories.clients.find_client(id).await?.ok_or(Error::ClientNotFound)
	}

	async fn mirror_update(&self, record: &ClientRecord) {
		if let Err(e) = self.admin.update_client(&OAuth2Client::mirror_of(record)).await {
			tracing::warn!(
				client = %record.client_id,
				error = %e,
				"Failed to mirror client update; backend registration may be stale."
			);
		}
	}

	fn client_credentials_for(&self, request: &NewClient) -> Result<(ClientId, Secret)> {
		let requested_id = request.client_id.as_deref().filter(|id| !id.is_empty());
		let requested_secret = request.client_secret.as_ref().filter(|secret| !secret.is_empty());

		if let (Some(id), Some(secret)) = (requested_id, requested_secret) {
			let id = ClientId::new(id).map_err(|e| Error::invalid_input(e.to_string()))?;

			return Ok((id, secret.clone()));
		}

		let mut suffix = URL_SAFE_NO_PAD.encode(rand::random::<[u8; CLIENT_ID_BYTES]>());

		suffix.truncate(CLIENT_ID_SUFFIX_LEN);

		let id = ClientId::new(format!("{}{suffix}", self.config.client_id_prefix))
			.map_err(|e| Error::invalid_input(e.to_string()))?;

		Ok((id, generate_client_secret()))
	}
}

fn generate_client_secret() -> Secret {
	Secret::new(URL_SAFE_NO_PAD.encode(rand::random::<[u8; CLIENT_SECRET_BYTES]>()))
}

fn validate_new_client(request: &NewClient) -> Result<()> {
	if request.name.trim().is_empty() {
		return Err(Error::invalid_input("name is required"));
	}

	validate_lists(&request.redirect_uris, &request.grant_types, &request.scopes)?;
	validate_google(&request.google_oauth)
}

fn validate_lists(
	redirect_uris: &[String],
	grant_types: &[String],
	scopes: &[String],
) -> Result<()> {
	if redirect_uris.is_empty() {
		return Err(Error::invalid_input("at least one redirect URI is required"));
	}
	if let Some(bad) = redirect_uris.iter().find(|uri| Url::parse(uri).is_err()) {
		return Err(Error::invalid_input(format!("redirect URI `{bad}` is not an absolute URL")));
	}
	if grant_types.is_empty() {
		return Err(Error::invalid_input("at least one grant type is required"));
	}
	if scopes.is_empty() {
		return Err(Error::invalid_input("at least one scope is required"));
	}

	Ok(())
}

fn validate_google(settings: &GoogleOAuthSettings) -> Result<()> {
	if settings.enabled && settings.credentials().is_none() {
		return Err(Error::invalid_input(
			"Google client id and secret are required when Google login is enabled",
		));
	}

	Ok(())
}

fn apply_update(record: &mut ClientRecord, update: ClientUpdate) -> Result<()> {
	if let Some(name) = update.name {
		if name.trim().is_empty() {
			return Err(Error::invalid_input("name is required"));
		}

		record.name = name.trim().to_owned();
	}
	if let Some(description) = update.description {
		record.description = Some(description);
	}
	if let Some(website) = update.website {
		record.website = Some(website);
	}
	if let Some(logo) = update.logo {
		record.logo = Some(logo);
	}
	if let Some(redirect_uris) = update.redirect_uris {
		record.redirect_uris = redirect_uris;
	}
	if let Some(grant_types) = update.grant_types {
		record.grant_types = grant_types;
	}
	if let Some(scopes) = update.scopes {
		record.scopes = scopes;
	}
	if let Some(public) = update.public {
		record.public = public;
	}
	if let Some(active) = update.active {
		record.active = active;
	}
	if let Some(google_oauth) = update.google_oauth {
		validate_google(&google_oauth)?;

		record.google_oauth = google_oauth;
	}

	validate_lists(&record.redirect_uris, &record.grant_types, &record.scopes)
}
