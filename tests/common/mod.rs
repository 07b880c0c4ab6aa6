//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use authgate::{
	auth::{ClientId, RecordId, Secret, TenantId},
	config::EngineConfig,
	flows::Engine,
	http::ReqwestHttpClient,
	provider::{ClientAuthMethod, ProviderDescriptor},
	reqwest::Client as ReqwestClient,
	store::{ClientRecord, GoogleOAuthSettings, MemoryDirectory, MemoryStateStore, Tenant, User},
	url::Url,
};
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};

pub const PORTAL_CLIENT_ID: &str = "authgate_portal";
pub const ALICE_EMAIL: &str = "alice@acme.test";
pub const ALICE_PASSWORD: &str = "correct horse battery staple";
pub const PLATFORM_PROVIDER_ID: &str = "platform-google-client";
pub const PLATFORM_PROVIDER_SECRET: &str = "platform-google-secret";
pub const STATE_TTL: Duration = Duration::minutes(10);

/// Engine wired to a mock server that plays both the admin API and the identity provider.
pub struct Fixture {
	pub engine: Engine,
	pub directory: MemoryDirectory,
	pub state_store: Arc<MemoryStateStore>,
	pub acme: Tenant,
	pub globex: Tenant,
	pub portal: ClientRecord,
	pub alice: User,
	pub bob: User,
}

/// Builds a reqwest client that accepts the self-signed certificates produced by `httpmock`.
pub fn test_http_client() -> ReqwestHttpClient {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

pub fn tenant(slug: &str) -> Tenant {
	Tenant { id: TenantId::generate(), name: slug.to_uppercase(), slug: slug.into(), active: true }
}

pub fn client_record(tenant: TenantId, client_id: &str) -> ClientRecord {
	let now = OffsetDateTime::now_utc();

	ClientRecord {
		id: RecordId::generate(),
		tenant_id: tenant,
		client_id: ClientId::new(client_id).expect("Client fixture identifier should be valid."),
		client_secret: Secret::from("portal-secret"),
		name: "Acme Portal".into(),
		description: None,
		website: None,
		logo: None,
		redirect_uris: vec!["https://portal.acme.test/callback".into()],
		grant_types: vec!["authorization_code".into(), "refresh_token".into()],
		scopes: vec!["openid".into(), "email".into(), "profile".into()],
		public: false,
		active: true,
		google_oauth: GoogleOAuthSettings::default(),
		created_at: now,
		updated_at: now,
	}
}

pub fn provider_descriptor(server: &MockServer) -> ProviderDescriptor {
	let id = "mock-google".parse().expect("Provider fixture identifier should be valid.");

	ProviderDescriptor::builder(id)
		.authorization_endpoint(
			Url::parse(&server.url("/o/oauth2/v2/auth"))
				.expect("Mock authorization endpoint should parse successfully."),
		)
		.token_endpoint(
			Url::parse(&server.url("/token"))
				.expect("Mock token endpoint should parse successfully."),
		)
		.userinfo_endpoint(
			Url::parse(&server.url("/userinfo"))
				.expect("Mock userinfo endpoint should parse successfully."),
		)
		.scopes(["openid", "email", "profile"])
		.extra_authorize_param("access_type", "offline")
		.extra_authorize_param("prompt", "consent")
		.client_auth_method(ClientAuthMethod::ClientSecretPost)
		.build()
		.expect("Mock provider descriptor should build successfully.")
}

pub fn fixture(server: &MockServer) -> Fixture {
	let directory = MemoryDirectory::default();
	let acme = tenant("acme");
	let globex = tenant("globex");
	let portal = client_record(acme.id, PORTAL_CLIENT_ID);
	let alice_hash =
		bcrypt::hash(ALICE_PASSWORD, 4).expect("Password fixture hash should be computed.");
	let mut alice = User::new(acme.id, ALICE_EMAIL, "Alice Example").with_password_hash(alice_hash);

	alice.email_verified = true;

	let bob = User::new(globex.id, "bob@globex.test", "Bob Example");

	directory.put_tenant(acme.clone());
	directory.put_tenant(globex.clone());
	directory.put_client(portal.clone());
	directory.put_user(alice.clone());
	directory.put_user(bob.clone());

	let config = EngineConfig::builder()
		.backend_admin_url(
			Url::parse(&server.base_url()).expect("Mock admin URL should parse successfully."),
		)
		.password_hash_cost(4)
		.state_ttl(STATE_TTL)
		.secure_cookies(false)
		.social_credentials(PLATFORM_PROVIDER_ID, PLATFORM_PROVIDER_SECRET)
		.social_redirect_uri(
			Url::parse("https://id.acme.test/auth/google/callback")
				.expect("Platform redirect fixture should parse."),
		)
		.build()
		.expect("Test configuration should validate.");
	let state_store = Arc::new(MemoryStateStore::from_config(&config));
	let engine = Engine::with_http_client(
		config,
		directory.clone(),
		state_store.clone(),
		test_http_client(),
	)
	.expect("Engine should build for tests.")
	.with_provider(provider_descriptor(server));

	Fixture { engine, directory, state_store, acme, globex, portal, alice, bob }
}

/// Login request payload as the admin API returns it.
pub fn login_request(challenge: &str, skip: bool, subject: &str) -> serde_json::Value {
	serde_json::json!({
		"challenge": challenge,
		"requested_scope": ["openid", "email"],
		"requested_access_token_audience": ["https://api.acme.test"],
		"subject": subject,
		"skip": skip,
		"client": { "client_id": PORTAL_CLIENT_ID, "client_name": "Acme Portal" },
		"request_url": "https://id.acme.test/oauth2/auth?client_id=authgate_portal",
		"session_id": null
	})
}

pub const LOGIN_REQUEST_PATH: &str = "/admin/oauth2/auth/requests/login";
pub const LOGIN_ACCEPT_PATH: &str = "/admin/oauth2/auth/requests/login/accept";
pub const LOGIN_REJECT_PATH: &str = "/admin/oauth2/auth/requests/login/reject";
pub const CONSENT_REQUEST_PATH: &str = "/admin/oauth2/auth/requests/consent";
pub const CONSENT_ACCEPT_PATH: &str = "/admin/oauth2/auth/requests/consent/accept";
pub const CONSENT_REJECT_PATH: &str = "/admin/oauth2/auth/requests/consent/reject";
pub const LOGIN_SESSIONS_PATH: &str = "/admin/oauth2/auth/sessions/login";
pub const CONSENT_SESSIONS_PATH: &str = "/admin/oauth2/auth/sessions/consent";
pub const CLIENTS_PATH: &str = "/admin/clients";
