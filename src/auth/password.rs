//! bcrypt password hashing and verification.
//!
//! Verification always spends one bcrypt round, even when the account has no password hash,
//! so response timing does not reveal whether an email is registered.

// std
use std::sync::OnceLock;
// self
use crate::{_prelude::*, auth::Secret, error::ConfigError};

const DECOY_PASSWORD: &str = "authgate-decoy-password";

/// bcrypt-backed password verifier with a lazily computed decoy hash.
#[derive(Clone, Debug)]
pub struct PasswordVerifier {
	cost: u32,
	decoy: Arc<OnceLock<Option<String>>>,
}
impl PasswordVerifier {
	/// Creates a verifier whose decoy hash (and [`hash`](Self::hash) output) uses `cost`.
	pub fn new(cost: u32) -> Self {
		Self { cost, decoy: Default::default() }
	}

	/// Hashes a password with the configured cost.
	pub fn hash(&self, password: &str) -> Result<String> {
		bcrypt::hash(password, self.cost)
			.map_err(|source| ConfigError::PasswordHash { source }.into())
	}

	/// Checks `password` against `hash`; a missing hash always fails after a decoy round.
	pub async fn verify(&self, password: &Secret, hash: Option<&str>) -> bool {
		let password = password.expose().to_owned();
		let hash = hash.map(ToOwned::to_owned);
		let decoy = self.decoy.clone();
		let cost = self.cost;

		tokio::task::spawn_blocking(move || match hash {
			Some(hash) => bcrypt::verify(&password, &hash).unwrap_or(false),
			None => {
				if let Some(decoy) = decoy.get_or_init(|| bcrypt::hash(DECOY_PASSWORD, cost).ok())
				{
					let _ = bcrypt::verify(&password, decoy);
				}

				false
			},
		})
		.await
		.unwrap_or(false)
	}
}
impl Default for PasswordVerifier {
	fn default() -> Self {
		Self::new(bcrypt::DEFAULT_COST)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn verify_accepts_matching_password_only() {
		let verifier = PasswordVerifier::new(4);
		let hash = verifier.hash("right").expect("Hashing a fixture password should succeed.");

		assert!(verifier.verify(&Secret::new("right"), Some(&hash)).await);
		assert!(!verifier.verify(&Secret::new("wrong"), Some(&hash)).await);
	}

	#[tokio::test]
	async fn verify_fails_without_hash_or_with_garbage_hash() {
		let verifier = PasswordVerifier::new(4);

		assert!(!verifier.verify(&Secret::new(DECOY_PASSWORD), None).await);
		assert!(!verifier.verify(&Secret::new("right"), Some("not-a-bcrypt-hash")).await);
	}
}
