//! Tenant-bound principal derived fresh for every login and consent decision.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	auth::{TenantId, UserId},
	store::User,
};

/// Authenticated principal plus its tenant binding. Never cached across requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TenantScopedIdentity {
	/// Stable user identifier used as the backend `subject`.
	pub user_id: UserId,
	/// Tenant the user belongs to.
	pub tenant_id: TenantId,
	/// Primary email.
	pub email: String,
	/// Display name.
	pub name: String,
	/// Whether the email has been verified.
	pub email_verified: bool,
}
impl TenantScopedIdentity {
	/// Derives the identity from a directory record.
	pub fn from_user(user: &User) -> Self {
		Self {
			user_id: user.id,
			tenant_id: user.tenant_id,
			email: user.email.clone(),
			name: user.name.clone(),
			email_verified: user.email_verified,
		}
	}

	/// Context attached to an accepted login and handed to the consent stage.
	pub fn login_context(&self) -> Map<String, Value> {
		let mut context = Map::new();

		context.insert("email".into(), self.email.clone().into());
		context.insert("name".into(), self.name.clone().into());
		context.insert("tenant_id".into(), self.tenant_id.to_string().into());

		context
	}

	/// Claims embedded into issued access tokens.
	pub fn access_token_claims(&self) -> Map<String, Value> {
		self.login_context()
	}

	/// Claims embedded into issued ID tokens.
	pub fn id_token_claims(&self) -> Map<String, Value> {
		let mut claims = self.login_context();

		claims.insert("email_verified".into(), self.email_verified.into());

		claims
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn identity() -> TenantScopedIdentity {
		TenantScopedIdentity {
			user_id: UserId::generate(),
			tenant_id: TenantId::generate(),
			email: "a@x.com".into(),
			name: "Ada".into(),
			email_verified: true,
		}
	}

	#[test]
	fn both_claim_sets_embed_the_tenant() {
		let identity = identity();
		let tenant = Value::String(identity.tenant_id.to_string());

		assert_eq!(identity.access_token_claims().get("tenant_id"), Some(&tenant));
		assert_eq!(identity.id_token_claims().get("tenant_id"), Some(&tenant));
	}

	#[test]
	fn only_id_token_claims_carry_email_verification() {
		let identity = identity();

		assert!(identity.access_token_claims().get("email_verified").is_none());
		assert_eq!(identity.id_token_claims().get("email_verified"), Some(&Value::Bool(true)));
		assert_eq!(identity.access_token_claims().len(), 3);
	}
}
