mod common;

// crates.io
use authgate::{
	error::Error,
	auth::TenantId,
	backend::{AdminClient, OAuth2Client, RejectRequest},
	error::BackendError,
	url::Url,
};
use httpmock::prelude::*;
use serde_json::json;
use time::Duration;
// self
use common::*;

fn admin(server: &MockServer) -> AdminClient {
	AdminClient::new(
		Url::parse(&server.base_url()).expect("Mock admin URL should parse successfully."),
		test_http_client(),
	)
	.with_timeout(Duration::seconds(5))
}

#[tokio::test]
async fn revocation_attempts_both_session_sets() {
	let server = MockServer::start_async().await;
	let client = admin(&server);
	let login = server
		.mock_async(|when, then| {
			when.method(DELETE).path(LOGIN_SESSIONS_PATH).query_param("subject", "user-1");
			then.status(500).body("boom");
		})
		.await;
	let consent = server
		.mock_async(|when, then| {
			when.method(DELETE).path(CONSENT_SESSIONS_PATH).query_param("subject", "user-1");
			then.status(204);
		})
		.await;
	let err = client
		.revoke_user_sessions("user-1")
		.await
		.expect_err("A failed login revocation must be reported.");

	assert!(matches!(err, Error::Backend(BackendError::Revocation { which: "login", .. })));

	login.assert_async().await;
	consent.assert_async().await;
}

#[tokio::test]
async fn missing_sessions_count_as_revoked() {
	let server = MockServer::start_async().await;
	let client = admin(&server);

	server
		.mock_async(|when, then| {
			when.method(DELETE).path(LOGIN_SESSIONS_PATH);
			then.status(404).json_body(json!({ "error": "Not Found" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(DELETE).path(CONSENT_SESSIONS_PATH);
			then.status(204);
		})
		.await;

	client.revoke_user_sessions("user-2").await.expect("404 should count as revoked.");
}

#[tokio::test]
async fn challenges_are_sent_as_query_parameters() {
	let server = MockServer::start_async().await;
	let client = admin(&server);
	let reject = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path(LOGIN_REJECT_PATH)
				.query_param("challenge", "a b&c")
				.header("content-type", "application/json");
			then.status(200).json_body(json!({ "redirect_to": "https://rp.test/cb" }));
		})
		.await;
	let redirect = client
		.reject_login_request("a b&c", &RejectRequest::new("login_required", "Please login again"))
		.await
		.expect("Reject should succeed.");

	assert_eq!(redirect.redirect_to, "https://rp.test/cb");

	reject.assert_async().await;

	let err = client.get_login_request("").await.expect_err("Empty challenges must be rejected.");

	assert!(matches!(err, Error::InvalidInput { .. }));
}

#[tokio::test]
async fn unexpected_statuses_and_bodies_are_typed() {
	let server = MockServer::start_async().await;
	let client = admin(&server);

	server
		.mock_async(|when, then| {
			when.method(GET).path(LOGIN_REQUEST_PATH).query_param("challenge", "gone");
			then.status(410).body("expired");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(CONSENT_REQUEST_PATH).query_param("challenge", "garbled");
			then.status(200).json_body(json!({ "challenge": 42 }));
		})
		.await;

	match client.get_login_request("gone").await {
		Err(Error::Backend(e)) => assert_eq!(e.status(), Some(410)),
		other => panic!("Expected an unexpected-status error, got {other:?}."),
	}

	let err = client
		.get_consent_request("garbled")
		.await
		.expect_err("Malformed bodies must be rejected.");

	assert!(matches!(
		err,
		Error::Backend(BackendError::MalformedResponse { operation: "get_consent_request", .. })
	));
}

#[tokio::test]
async fn client_creation_requires_201() {
	let server = MockServer::start_async().await;
	let client = admin(&server);

	server
		.mock_async(|when, then| {
			when.method(POST).path(CLIENTS_PATH);
			then.status(200).json_body(json!({ "client_id": "x" }));
		})
		.await;

	let err = client
		.create_client(&OAuth2Client::mirror_of(&client_record(TenantId::generate(), "x")))
		.await
		.expect_err("Only 201 counts as created.");

	assert!(matches!(err, Error::Backend(BackendError::UnexpectedStatus { status: 200, .. })));
}

#[tokio::test]
async fn fetched_clients_tolerate_null_fields() {
	let server = MockServer::start_async().await;
	let client = admin(&server);
	let fetch = server
		.mock_async(|when, then| {
			when.method(GET).path(format!("{CLIENTS_PATH}/authgate_portal"));
			then.status(200).json_body(json!({
				"client_id": "authgate_portal",
				"client_name": "Acme Portal",
				"redirect_uris": null,
				"grant_types": ["authorization_code"],
				"scope": "openid email",
				"token_endpoint_auth_method": "client_secret_post"
			}));
		})
		.await;
	let fetched = client.get_client("authgate_portal").await.expect("Fetching should succeed.");

	assert_eq!(fetched.client_name, "Acme Portal");
	assert!(fetched.redirect_uris.is_empty());
	assert!(fetched.client_secret.is_none());
	assert_eq!(fetched.scope, "openid email");

	fetch.assert_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path(format!("{CLIENTS_PATH}/ghost"));
			then.status(404).json_body(json!({ "error": "Not Found" }));
		})
		.await;

	match client.get_client("ghost").await {
		Err(Error::Backend(e)) => assert_eq!(e.status(), Some(404)),
		other => panic!("Expected a 404 backend error, got {other:?}."),
	}
}
