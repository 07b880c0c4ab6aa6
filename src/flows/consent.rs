//! Consent orchestration.
//!
//! The session claims are derived from the user record at decision time, never from the
//! login context the backend echoes back.

// self
use crate::{
	_prelude::*,
	auth::TenantScopedIdentity,
	backend::{AcceptConsent, ConsentSession, RejectRequest},
	flows::Engine,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::User,
};

/// User summary shown on the consent screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsentUser {
	/// Email address.
	pub email: String,
	/// Display name.
	pub name: String,
}

/// Data needed to render the consent screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsentPrompt {
	/// Consent challenge to post back with the decision.
	pub challenge: String,
	/// Display name of the requesting client.
	pub client_name: String,
	/// Scopes the client asked for.
	pub requested_scope: Vec<String>,
	/// The user being asked.
	pub user: ConsentUser,
}

/// User's consent decision.
#[derive(Clone, Debug, Deserialize)]
pub struct ConsentDecision {
	/// Consent challenge echoed from the form.
	pub challenge: String,
	/// Scopes the user agreed to.
	pub grant_scope: Vec<String>,
	/// Whether the backend should remember the decision.
	#[serde(default)]
	pub remember: bool,
	/// How long a remembered decision stays valid, in whole seconds on the wire.
	#[serde(default, with = "crate::config::seconds")]
	pub remember_for: Duration,
}

/// Result of a consent decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsentOutcome {
	/// Consent granted; follow the redirect.
	Accepted {
		/// Backend redirect.
		redirect_to: String,
	},
	/// Consent denied; follow the redirect.
	Rejected {
		/// Backend redirect.
		redirect_to: String,
	},
}
impl ConsentOutcome {
	/// Backend redirect regardless of the decision.
	pub fn redirect_to(&self) -> &str {
		match self {
			Self::Accepted { redirect_to } | Self::Rejected { redirect_to } => redirect_to,
		}
	}
}

impl Engine {
	/// Loads what the consent screen needs.
	pub async fn consent_prompt(&self, challenge: &str) -> Result<ConsentPrompt> {
		const KIND: FlowKind = FlowKind::Consent;

		let span = FlowSpan::new(KIND, "consent_prompt");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = self.admin.get_consent_request(challenge).await?;
				let user = self.consent_subject(&request.subject).await?;

				Ok(ConsentPrompt {
					challenge: request.challenge,
					client_name: request
						.client
						.map(|client| client.client_name)
						.unwrap_or_default(),
					requested_scope: request.requested_scope,
					user: ConsentUser { email: user.email, name: user.name },
				})
			})
			.await;

		obs::finish(KIND, result)
	}

	/// Grants consent with claims derived from the current user record.
	pub async fn accept_consent(&self, decision: ConsentDecision) -> Result<ConsentOutcome> {
		const KIND: FlowKind = FlowKind::Consent;

		let span = FlowSpan::new(KIND, "accept_consent");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = self.admin.get_consent_request(&decision.challenge).await?;
				let user = self.consent_subject(&request.subject).await?;
				let identity = TenantScopedIdentity::from_user(&user);
				let body = AcceptConsent {
					grant_scope: decision.grant_scope,
					grant_access_token_audience: request.requested_audience,
					remember: decision.remember,
					remember_for: if decision.remember {
						decision.remember_for.whole_seconds()
					} else {
						0
					},
					session: ConsentSession {
						access_token: identity.access_token_claims(),
						id_token: identity.id_token_claims(),
					},
				};
				let redirect =
					self.admin.accept_consent_request(&decision.challenge, &body).await?;

				Ok(ConsentOutcome::Accepted { redirect_to: redirect.redirect_to })
			})
			.await;

		obs::finish(KIND, result)
	}

	/// Denies consent.
	pub async fn reject_consent(&self, challenge: &str) -> Result<ConsentOutcome> {
		const KIND: FlowKind = FlowKind::Consent;

		let span = FlowSpan::new(KIND, "reject_consent");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				// Confirms the challenge exists before resolving it.
				self.admin.get_consent_request(challenge).await?;

				let body = RejectRequest::new("access_denied", "User denied consent");
				let redirect = self.admin.reject_consent_request(challenge, &body).await?;

				Ok(ConsentOutcome::Rejected { redirect_to: redirect.redirect_to })
			})
			.await;

		obs::finish(KIND, result)
	}

	async fn consent_subject(&self, subject: &str) -> Result<User> {
		self.subject_user(subject).await?.ok_or(Error::UnknownSubject)
	}
}
