//! Login orchestration: SSO skip handling and email/password authentication.
//!
//! [`Engine::login_challenge`] decides between auto-approval (a remembered session whose user
//! belongs to the requesting client's tenant), a login form, and clearing a stale session.
//! [`Engine::password_login`] verifies credentials inside the client's tenant only.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, Secret, TenantId},
	backend::RejectRequest,
	flows::Engine,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const INVALID_CREDENTIALS: &str = "invalid_credentials";
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Data needed to render the login form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginPrompt {
	/// Login challenge to post back with the credentials.
	pub challenge: String,
	/// Requesting client.
	pub client_id: ClientId,
	/// Display name of the requesting client.
	pub client_name: String,
	/// Scopes the client asked for.
	pub requested_scope: Vec<String>,
	/// Tenant the credentials will be checked against.
	pub tenant_id: TenantId,
}

/// Result of [`Engine::login_challenge`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
	/// The remembered session was accepted; follow the redirect.
	AutoApproved {
		/// Backend redirect.
		redirect_to: String,
	},
	/// The user must authenticate.
	LoginForm(LoginPrompt),
	/// The remembered subject no longer resolves; its sessions were revoked and the login
	/// rejected.
	Rejected {
		/// Backend redirect.
		redirect_to: String,
		/// Whether backend sessions were cleared.
		session_cleared: bool,
	},
}

/// Submitted login form.
#[derive(Clone, Debug, Deserialize)]
pub struct PasswordLogin {
	/// Login challenge echoed from the form.
	pub challenge: String,
	/// Email as typed by the user.
	pub email: String,
	/// Password as typed by the user.
	pub password: Secret,
	/// "Remember me" checkbox.
	#[serde(default)]
	pub remember: bool,
}

/// Normalized rejection payload; identical for every credential failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CredentialsRejected {
	/// User-facing message.
	pub error: &'static str,
	/// Backend redirect produced by the rejection.
	pub redirect_to: String,
}

/// Result of [`Engine::password_login`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PasswordLoginOutcome {
	/// Credentials verified and the login accepted.
	Accepted {
		/// Backend redirect.
		redirect_to: String,
	},
	/// Credentials were not accepted.
	Rejected(CredentialsRejected),
}

impl Engine {
	/// Handles an inbound login challenge.
	pub async fn login_challenge(&self, challenge: &str) -> Result<LoginOutcome> {
		const KIND: FlowKind = FlowKind::LoginChallenge;

		let span = FlowSpan::new(KIND, "login_challenge");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = self.admin.get_login_request(challenge).await?;
				let client = self.registered_client(request.client_id()).await?;

				if request.skip && !request.subject.is_empty() {
					let Some(user) = self.subject_user(&request.subject).await? else {
						return self.clear_stale_session(challenge, &request.subject).await;
					};

					if user.tenant_id == client.tenant_id {
						let redirect = self
							.accept_login_for(
								challenge,
								&user,
								true,
								self.config.sso_remember_for,
								&[],
							)
							.await?;

						tracing::info!(user = %user.id, "Auto-approved remembered login.");

						return Ok(LoginOutcome::AutoApproved {
							redirect_to: redirect.redirect_to,
						});
					}

					tracing::info!(
						user = %user.id,
						client = %client.client_id,
						"Remembered user belongs to another tenant; asking for credentials."
					);
				}

				Ok(LoginOutcome::LoginForm(LoginPrompt {
					challenge: request.challenge,
					client_id: client.client_id,
					client_name: client.name,
					requested_scope: request.requested_scope,
					tenant_id: client.tenant_id,
				}))
			})
			.await;

		obs::finish(KIND, result)
	}

	/// Verifies submitted credentials inside the requesting client's tenant.
	pub async fn password_login(&self, form: PasswordLogin) -> Result<PasswordLoginOutcome> {
		const KIND: FlowKind = FlowKind::PasswordLogin;

		let span = FlowSpan::new(KIND, "password_login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = self.admin.get_login_request(&form.challenge).await?;
				let client = self.registered_client(request.client_id()).await?;
				let user = self
					.directories
					.users
					.find_by_email(client.tenant_id, form.email.trim())
					.await?
					.filter(|user| user.active);
				let hash = user.as_ref().and_then(|user| user.password_hash.as_deref());
				let verified = self.passwords.verify(&form.password, hash).await;
				let Some(user) = user.filter(|_| verified) else {
					let redirect = self
						.admin
						.reject_login_request(
							&form.challenge,
							&RejectRequest::new(INVALID_CREDENTIALS, INVALID_CREDENTIALS_MESSAGE),
						)
						.await?;

					return Ok(PasswordLoginOutcome::Rejected(CredentialsRejected {
						error: INVALID_CREDENTIALS_MESSAGE,
						redirect_to: redirect.redirect_to,
					}));
				};
				let redirect = self
					.accept_login_for(
						&form.challenge,
						&user,
						form.remember,
						self.config.login_remember_for,
						&[],
					)
					.await?;

				self.record_login_best_effort(user.id).await;

				Ok(PasswordLoginOutcome::Accepted { redirect_to: redirect.redirect_to })
			})
			.await;

		obs::finish(KIND, result)
	}

	async fn clear_stale_session(&self, challenge: &str, subject: &str) -> Result<LoginOutcome> {
		if let Err(e) = self.admin.revoke_user_sessions(subject).await {
			tracing::warn!(error = %e, "Failed to revoke sessions of an unknown subject.");
		}

		let body = RejectRequest::new("login_required", "Please login again");
		let redirect = self.admin.reject_login_request(challenge, &body).await?;

		Ok(LoginOutcome::Rejected { redirect_to: redirect.redirect_to, session_cleared: true })
	}
}
