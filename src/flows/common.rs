//! Shared helpers for flow implementations (client/tenant resolution, subject lookup,
//! provider credentials).

// self
use crate::{
	_prelude::*,
	auth::{Secret, TenantScopedIdentity, UserId},
	backend::{AcceptLogin, RedirectResponse},
	error::ConfigError,
	flows::Engine,
	oauth::ProviderCredentials,
	store::{ClientRecord, User},
};

/// Provider credentials plus the callback URL they were registered with.
pub(crate) struct ResolvedProvider<'a> {
	pub(crate) credentials: ProviderCredentials<'a>,
	pub(crate) redirect_uri: &'a Url,
}

impl Engine {
	/// Loads the local registration for a client id reported by the backend or the caller.
	pub(crate) async fn registered_client(&self, client_id: Option<&str>) -> Result<ClientRecord> {
		let Some(client_id) = client_id.filter(|id| !id.is_empty()) else {
			return Err(Error::ClientNotRegistered { client_id: String::new() });
		};

		self.directories
			.clients
			.find_by_client_id(client_id)
			.await?
			.ok_or_else(|| Error::ClientNotRegistered { client_id: client_id.to_owned() })
	}

	/// Resolves a backend `subject` to an active local user.
	///
	/// Unparseable subjects, unknown users, and deactivated users all resolve to `None`.
	pub(crate) async fn subject_user(&self, subject: &str) -> Result<Option<User>> {
		let Ok(user_id) = subject.parse::<UserId>() else {
			return Ok(None);
		};
		let user = self.directories.users.find_user(user_id).await?;

		Ok(user.filter(|user| user.active))
	}

	/// Accepts a login for `user` and returns the backend redirect.
	pub(crate) async fn accept_login_for(
		&self,
		challenge: &str,
		user: &User,
		remember: bool,
		remember_for: Duration,
		extra_context: &[(&str, &str)],
	) -> Result<RedirectResponse> {
		let mut context = TenantScopedIdentity::from_user(user).login_context();

		for (key, value) in extra_context {
			context.insert((*key).to_owned(), (*value).into());
		}

		let body = AcceptLogin {
			subject: user.id.to_string(),
			remember,
			remember_for: if remember { remember_for.whole_seconds() } else { 0 },
			acr: None,
			context,
		};

		self.admin.accept_login_request(challenge, &body).await
	}

	/// Updates the user's last-login timestamp; failures are logged and swallowed.
	pub(crate) async fn record_login_best_effort(&self, user_id: UserId) {
		if let Err(e) =
			self.directories.users.record_login(user_id, OffsetDateTime::now_utc()).await
		{
			tracing::warn!(user = %user_id, error = %e, "Failed to record last login.");
		}
	}

	/// Picks the client-specific provider credentials when enabled and complete, otherwise the
	/// platform default.
	pub(crate) fn provider_for<'a>(
		&'a self,
		client: Option<&'a ClientRecord>,
	) -> Result<ResolvedProvider<'a>> {
		let settings = client.map(|client| &client.google_oauth);

		if let Some((settings, (client_id, client_secret))) =
			settings.and_then(|settings| settings.credentials().map(|pair| (settings, pair)))
		{
			return Ok(ResolvedProvider {
				credentials: ProviderCredentials { client_id, client_secret },
				redirect_uri: settings
					.redirect_uri
					.as_ref()
					.unwrap_or(&self.config.social.redirect_uri),
			});
		}

		let (client_id, client_secret): (&str, &Secret) =
			self.config.social.credentials().ok_or(ConfigError::MissingProviderCredentials)?;

		Ok(ResolvedProvider {
			credentials: ProviderCredentials { client_id, client_secret },
			redirect_uri: &self.config.social.redirect_uri,
		})
	}
}
