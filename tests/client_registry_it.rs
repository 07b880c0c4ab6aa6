mod common;

// crates.io
use authgate::{
	error::Error,
	auth::{RecordId, Secret},
	flows::{ClientUpdate, NewClient},
	store::{ClientDirectory, Tenant},
};
use httpmock::prelude::*;
use serde_json::json;
// self
use common::*;

fn new_client(tenant: &Tenant) -> NewClient {
	NewClient {
		tenant_id: Some(tenant.id),
		name: "Acme Dashboard".into(),
		redirect_uris: vec!["https://dash.acme.test/callback".into()],
		grant_types: vec!["authorization_code".into(), "refresh_token".into()],
		scopes: vec!["openid".into(), "email".into()],
		..Default::default()
	}
}

fn client_path(client_id: &str) -> String {
	format!("{CLIENTS_PATH}/{client_id}")
}

#[tokio::test]
async fn created_clients_are_generated_and_mirrored() {
	let server = MockServer::start_async().await;
	let fx = fixture(&server);
	let mirror = server
		.mock_async(|when, then| {
			when.method(POST).path(CLIENTS_PATH).json_body_includes(
				json!({
					"client_name": "Acme Dashboard",
					"redirect_uris": ["https://dash.acme.test/callback"],
					"grant_types": ["authorization_code", "refresh_token"],
					"response_types": ["code"],
					"scope": "openid email",
					"token_endpoint_auth_method": "client_secret_post"
				})
				.to_string(),
			);
			then.status(201).json_body(json!({ "client_id": "echo" }));
		})
		.await;
	let record = fx.engine.create_client(new_client(&fx.acme)).await.expect("Create should succeed.");

	assert!(record.client_id.starts_with("authgate_"));
	assert_eq!(record.client_id.len(), "authgate_".len() + 22);
	assert!(!record.client_secret.is_empty());
	assert!(record.active);
	assert_eq!(record.tenant_id, fx.acme.id);

	mirror.assert_async().await;

	let stored = fx.engine.get_client(record.id).await.expect("Created client should be stored.");

	assert_eq!(stored, record);
}

#[tokio::test]
async fn caller_supplied_credentials_are_kept_and_public_clients_use_none() {
	let server = MockServer::start_async().await;
	let fx = fixture(&server);
	let mirror = server
		.mock_async(|when, then| {
			when.method(POST).path(CLIENTS_PATH).json_body_includes(
				json!({ "client_id": "acme_spa", "token_endpoint_auth_method": "none" }).to_string(),
			);
			then.status(201).json_body(json!({ "client_id": "acme_spa" }));
		})
		.await;
	let record = fx
		.engine
		.create_client(NewClient {
			client_id: Some("acme_spa".into()),
			client_secret: Some(Secret::from("spa-secret")),
			public: true,
			..new_client(&fx.acme)
		})
		.await
		.expect("Create should succeed.");

	assert_eq!(&*record.client_id, "acme_spa");
	assert_eq!(record.client_secret.expose(), "spa-secret");

	mirror.assert_async().await;
}

#[tokio::test]
async fn mirror_failure_rolls_back_the_local_row() {
	let server = MockServer::start_async().await;
	let fx = fixture(&server);
	let before = fx.directory.count_clients().await.expect("Count should not fail.");

	server
		.mock_async(|when, then| {
			when.method(POST).path(CLIENTS_PATH);
			then.status(409).json_body(json!({ "error": "resource_conflict" }));
		})
		.await;

	let err = fx
		.engine
		.create_client(new_client(&fx.acme))
		.await
		.expect_err("Mirror failure must fail the create.");

	assert!(err.is_backend_failure());
	assert_eq!(fx.directory.count_clients().await.expect("Count should not fail."), before);
}

#[tokio::test]
async fn invalid_requests_never_reach_the_backend() {
	let server = MockServer::start_async().await;
	let fx = fixture(&server);
	let mirror = server
		.mock_async(|when, then| {
			when.method(POST).path(CLIENTS_PATH);
			then.status(201).json_body(json!({ "client_id": "never" }));
		})
		.await;
	let err = fx
		.engine
		.create_client(NewClient { redirect_uris: vec!["not a url".into()], ..new_client(&fx.acme) })
		.await
		.expect_err("Relative redirect URIs must be rejected.");

	assert!(matches!(err, Error::InvalidInput { .. }));

	let mut retired = tenant("retired");

	retired.active = false;
	fx.directory.put_tenant(retired.clone());

	let err = fx
		.engine
		.create_client(new_client(&retired))
		.await
		.expect_err("Inactive tenants cannot register clients.");

	assert!(matches!(err, Error::TenantUnavailable));

	let err = fx
		.engine
		.create_client(NewClient { tenant_id: None, ..new_client(&fx.acme) })
		.await
		.expect_err("A tenant is required.");

	assert!(matches!(err, Error::TenantUnavailable));

	mirror.assert_calls_async(0).await;
}

#[tokio::test]
async fn updates_apply_locally_even_when_the_mirror_fails() {
	let server = MockServer::start_async().await;
	let fx = fixture(&server);
	let mirror = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path(client_path(PORTAL_CLIENT_ID))
				.json_body_includes(json!({ "client_name": "Acme Portal v2" }).to_string());
			then.status(500).body("unavailable");
		})
		.await;
	let updated = fx
		.engine
		.update_client(fx.portal.id, ClientUpdate {
			name: Some("Acme Portal v2".into()),
			active: Some(false),
			..Default::default()
		})
		.await
		.expect("Update should succeed despite the mirror failure.");

	assert_eq!(updated.name, "Acme Portal v2");
	assert!(!updated.active);
	assert!(updated.updated_at >= fx.portal.updated_at);

	mirror.assert_async().await;

	let stored = fx.engine.get_client(fx.portal.id).await.expect("Client should still exist.");

	assert_eq!(stored.name, "Acme Portal v2");

	let err = fx
		.engine
		.update_client(RecordId::generate(), ClientUpdate::default())
		.await
		.expect_err("Unknown records cannot be updated.");

	assert!(matches!(err, Error::ClientNotFound));
}

#[tokio::test]
async fn deletes_remove_the_local_row_even_when_the_mirror_fails() {
	let server = MockServer::start_async().await;
	let fx = fixture(&server);
	let mirror = server
		.mock_async(|when, then| {
			when.method(DELETE).path(client_path(PORTAL_CLIENT_ID));
			then.status(503).body("maintenance");
		})
		.await;

	fx.engine.delete_client(fx.portal.id).await.expect("Delete should succeed locally.");

	mirror.assert_async().await;

	assert!(matches!(fx.engine.get_client(fx.portal.id).await, Err(Error::ClientNotFound)));
	assert!(fx.engine.list_clients(fx.acme.id).await.expect("Listing should succeed.").is_empty());
}

#[tokio::test]
async fn regenerated_secrets_replace_the_old_one() {
	let server = MockServer::start_async().await;
	let fx = fixture(&server);
	let mirror = server
		.mock_async(|when, then| {
			when.method(PUT).path(client_path(PORTAL_CLIENT_ID));
			then.status(200).json_body(json!({ "client_id": PORTAL_CLIENT_ID }));
		})
		.await;
	let rotated = fx
		.engine
		.regenerate_client_secret(fx.portal.id)
		.await
		.expect("Secret rotation should succeed.");

	assert_ne!(rotated.client_secret, fx.portal.client_secret);
	assert_eq!(rotated.client_secret.expose().len(), 43);

	mirror.assert_async().await;

	let err = fx
		.engine
		.validate_client_credentials(PORTAL_CLIENT_ID, &fx.portal.client_secret)
		.await
		.expect_err("The old secret must stop working.");

	assert!(matches!(err, Error::InvalidInput { .. }));

	fx.engine
		.validate_client_credentials(PORTAL_CLIENT_ID, &rotated.client_secret)
		.await
		.expect("The new secret should validate.");
}

#[tokio::test]
async fn credential_validation_honours_state_and_visibility() {
	let server = MockServer::start_async().await;
	let fx = fixture(&server);

	fx.engine
		.validate_client_credentials(PORTAL_CLIENT_ID, &Secret::from("portal-secret"))
		.await
		.expect("Correct credentials should validate.");

	let err = fx
		.engine
		.validate_client_credentials("ghost", &Secret::from("x"))
		.await
		.expect_err("Unknown clients must fail.");

	assert!(matches!(err, Error::ClientNotFound));

	let mut public = client_record(fx.acme.id, "acme_public");

	public.public = true;
	fx.directory.put_client(public);
	fx.engine
		.validate_client_credentials("acme_public", &Secret::from("anything"))
		.await
		.expect("Public clients skip the secret check.");

	let mut disabled = client_record(fx.acme.id, "acme_disabled");

	disabled.active = false;
	fx.directory.put_client(disabled);

	let err = fx
		.engine
		.validate_client_credentials("acme_disabled", &Secret::from("portal-secret"))
		.await
		.expect_err("Inactive clients must fail.");

	assert!(matches!(err, Error::ClientNotFound));
}
