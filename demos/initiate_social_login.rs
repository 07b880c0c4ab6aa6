//! Starts a social login against the Google preset with an in-memory directory and state store,
//! then prints the provider redirect and the CSRF cookie a front-end would set.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use time::OffsetDateTime;
use url::Url;
// self
use authgate::{
	auth::{ClientId, RecordId, Secret, TenantId},
	config::EngineConfig,
	flows::Engine,
	store::{ClientRecord, GoogleOAuthSettings, MemoryDirectory, MemoryStateStore, Tenant},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let directory = MemoryDirectory::default();
	let tenant = Tenant {
		id: TenantId::generate(),
		name: "Acme".into(),
		slug: "acme".into(),
		active: true,
	};
	let now = OffsetDateTime::now_utc();
	let client = ClientRecord {
		id: RecordId::generate(),
		tenant_id: tenant.id,
		client_id: ClientId::new("authgate_demo_portal")?,
		client_secret: Secret::from("demo-portal-secret"),
		name: "Acme Portal".into(),
		description: None,
		website: None,
		logo: None,
		redirect_uris: vec!["https://portal.acme.example/callback".into()],
		grant_types: vec!["authorization_code".into()],
		scopes: vec!["openid".into(), "email".into()],
		public: false,
		active: true,
		google_oauth: GoogleOAuthSettings::default(),
		created_at: now,
		updated_at: now,
	};

	directory.put_tenant(tenant);
	directory.put_client(client.clone());

	let config = EngineConfig::builder()
		.backend_admin_url(Url::parse("http://localhost:4445")?)
		.social_credentials("demo-google-client", "demo-google-secret")
		.social_redirect_uri(Url::parse("https://id.acme.example/auth/google/callback")?)
		.build()?;
	let state_store = Arc::new(MemoryStateStore::from_config(&config));
	let engine = Engine::new(config, directory, state_store.clone())?;
	// The login challenge normally arrives from the authorization backend's login redirect.
	let redirect =
		engine.initiate_social_login("demo-login-challenge", Some(&client.client_id)).await?;

	println!("Send your user to {}.", redirect.authorize_url);
	println!("Set-Cookie: {}", redirect.cookie.to_header_value());
	println!("Pending states: {}.", state_store.len());

	Ok(())
}
