//! Social login through an external identity provider.
//!
//! [`Engine::initiate_social_login`] stores a one-time state tied to the login challenge and
//! hands back the provider redirect plus the CSRF cookie. [`Engine::complete_social_login`]
//! checks the callback against both, exchanges the code, links or creates the tenant-scoped
//! user, and accepts the original login challenge.

// crates.io
use cookie::{Cookie, SameSite};
// self
use crate::{
	_prelude::*,
	auth::{ClientId, TenantId, UserId},
	flows::Engine,
	oauth::{self, ProviderFacade, UserProfile},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{StateEntry, User, generate_state},
};

/// Name of the CSRF cookie that mirrors the OAuth `state`.
pub const STATE_COOKIE_NAME: &str = "oauth_state";

const STATE_COOKIE_MAX_AGE: Duration = Duration::minutes(10);

/// CSRF cookie carrying the OAuth `state` across the provider round trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateCookie {
	/// Cookie value; empty on the clearing variant.
	pub value: String,
	/// Lifetime; zero on the clearing variant.
	pub max_age: Duration,
	/// Whether the `Secure` attribute is set.
	pub secure: bool,
}
impl StateCookie {
	/// Cookie carrying `state`.
	pub fn new(state: impl Into<String>, secure: bool) -> Self {
		Self { value: state.into(), max_age: STATE_COOKIE_MAX_AGE, secure }
	}

	/// Expiring variant sent after the callback has been handled.
	pub fn clearing(secure: bool) -> Self {
		Self { value: String::new(), max_age: Duration::ZERO, secure }
	}

	/// Builds the cookie for frameworks that speak the `cookie` crate.
	pub fn to_cookie(&self) -> Cookie<'static> {
		Cookie::build((STATE_COOKIE_NAME, self.value.clone()))
			.path("/")
			.max_age(self.max_age)
			.http_only(true)
			.same_site(SameSite::Lax)
			.secure(self.secure)
			.build()
	}

	/// Renders a `Set-Cookie` header value.
	pub fn to_header_value(&self) -> String {
		self.to_cookie().to_string()
	}
}

/// Everything the front-end needs to send the browser to the provider.
#[derive(Clone, Debug)]
pub struct SocialRedirect {
	/// Provider authorize URL.
	pub authorize_url: Url,
	/// Generated state; also embedded in the URL and the cookie.
	pub state: String,
	/// CSRF cookie to set on the redirect response.
	pub cookie: StateCookie,
}

/// Query parameters and cookie received on the provider callback.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SocialCallback {
	/// Authorization code.
	pub code: Option<String>,
	/// Returned `state`.
	pub state: Option<String>,
	/// Value of the `oauth_state` cookie.
	#[serde(skip)]
	pub cookie_state: Option<String>,
	/// Provider error code.
	pub error: Option<String>,
	/// Provider error description.
	pub error_description: Option<String>,
}

/// Result of a completed social login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocialLoginOutcome {
	/// Backend redirect.
	pub redirect_to: String,
	/// Local user the login was accepted for.
	pub user_id: UserId,
	/// Whether the user was created by this login.
	pub created: bool,
}

impl Engine {
	/// Starts a social login for `login_challenge`.
	pub async fn initiate_social_login(
		&self,
		login_challenge: &str,
		client_id: Option<&ClientId>,
	) -> Result<SocialRedirect> {
		const KIND: FlowKind = FlowKind::SocialLogin;

		let span = FlowSpan::new(KIND, "initiate_social_login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if login_challenge.is_empty() {
					return Err(Error::invalid_input("login_challenge is required"));
				}

				let client = match client_id {
					Some(id) => Some(self.registered_client(Some(id.as_ref())).await?),
					None => None,
				};
				let provider = self.provider_for(client.as_ref())?;
				let state = generate_state();

				self.state_store
					.put(state.clone(), StateEntry::new(login_challenge, client_id.cloned()))
					.await?;

				let authorize_url = self.provider.authorize_url(
					provider.credentials.client_id,
					provider.redirect_uri,
					&state,
				);
				let cookie = StateCookie::new(state.clone(), self.config.secure_cookies);

				Ok(SocialRedirect { authorize_url, state, cookie })
			})
			.await;

		obs::finish(KIND, result)
	}

	/// Handles the provider callback and accepts the original login challenge.
	pub async fn complete_social_login(
		&self,
		callback: SocialCallback,
	) -> Result<SocialLoginOutcome> {
		const KIND: FlowKind = FlowKind::SocialLogin;

		let span = FlowSpan::new(KIND, "complete_social_login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if let Some(error) = callback.error {
					return Err(Error::ProviderDenied {
						error,
						description: callback.error_description,
					});
				}

				let (Some(code), Some(state)) = (
					callback.code.filter(|code| !code.is_empty()),
					callback.state.filter(|state| !state.is_empty()),
				) else {
					return Err(Error::invalid_input("code and state are required"));
				};

				if callback.cookie_state.as_deref() != Some(state.as_str()) {
					return Err(Error::StateMismatch);
				}

				let entry = self.state_store.take_once(&state).await?.ok_or(Error::InvalidState)?;
				let request = self.admin.get_login_request(&entry.login_challenge).await?;
				let tenant = self.registered_client(request.client_id()).await?.tenant_id;
				let state_client = match &entry.client_id {
					Some(id) => Some(self.registered_client(Some(id.as_ref())).await?),
					None => None,
				};
				let provider = self.provider_for(state_client.as_ref())?;
				let facade = ProviderFacade::from_descriptor(
					&self.provider,
					provider.credentials,
					provider.redirect_uri,
					&self.http_client,
					self.config.provider_timeout,
				)?;
				let access_token = facade.exchange_code(&code).await?;
				let profile = oauth::fetch_profile(
					&self.http_client,
					&self.provider.endpoints.userinfo,
					&access_token,
					self.config.provider_timeout,
				)
				.await?;
				let (user, created) = self.link_or_create_user(tenant, &profile).await?;

				self.record_login_best_effort(user.id).await;

				let redirect = self
					.accept_login_for(
						&entry.login_challenge,
						&user,
						true,
						self.config.sso_remember_for,
						&[("provider", self.provider.id.as_ref())],
					)
					.await?;

				tracing::info!(user = %user.id, created, "Social login accepted.");

				Ok(SocialLoginOutcome {
					redirect_to: redirect.redirect_to,
					user_id: user.id,
					created,
				})
			})
			.await;

		obs::finish(KIND, result)
	}

	async fn link_or_create_user(
		&self,
		tenant: TenantId,
		profile: &UserProfile,
	) -> Result<(User, bool)> {
		let email = profile.email.trim();
		let provider = self.provider.id.to_string();

		if let Some(mut user) = self.directories.users.find_by_email(tenant, email).await? {
			if !user.active {
				return Err(Error::invalid_input("the account is disabled"));
			}

			user.provider = provider;
			user.provider_subject = Some(profile.id.clone());
			user.email_verified = user.email_verified || profile.verified_email;

			if profile.picture.is_some() {
				user.picture = profile.picture.clone();
				user.avatar_url = profile.picture.clone();
			}

			self.directories.users.update_user(user.clone()).await?;

			return Ok((user, false));
		}

		let mut user = User::new(tenant, email, profile.display_name());

		user.provider = provider;
		user.provider_subject = Some(profile.id.clone());
		user.email_verified = profile.verified_email;
		user.picture = profile.picture.clone();
		user.avatar_url = profile.picture.clone();

		self.directories.users.insert_user(user.clone()).await?;

		Ok((user, true))
	}
}
