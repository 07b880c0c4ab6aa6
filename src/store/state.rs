//! One-time, TTL-bounded OAuth state used to protect the social-login redirect.
//!
//! A state value is consumed exactly once: [`StateStore::take_once`] removes and returns the
//! entry in a single step, so concurrent callbacks carrying the same value see at most one
//! winner. Expired entries are never returned, whether or not a sweep has removed them yet.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::ClientId,
	config::EngineConfig,
	store::{StoreError, StoreFuture},
};

const STATE_BYTES: usize = 32;
const FINGERPRINT_LEN: usize = 12;

type StateMap = Arc<Mutex<HashMap<String, StateEntry>>>;

/// Data remembered between the social-login redirect and its callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateEntry {
	/// Login challenge the callback must resolve.
	pub login_challenge: String,
	/// OAuth client that initiated the redirect, when known.
	pub client_id: Option<ClientId>,
	/// Creation instant used for TTL checks.
	pub created_at: OffsetDateTime,
}
impl StateEntry {
	/// Creates an entry stamped with the current time.
	pub fn new(login_challenge: impl Into<String>, client_id: Option<ClientId>) -> Self {
		Self {
			login_challenge: login_challenge.into(),
			client_id,
			created_at: OffsetDateTime::now_utc(),
		}
	}

	/// Overrides the creation instant.
	pub fn with_created_at(mut self, created_at: OffsetDateTime) -> Self {
		self.created_at = created_at;

		self
	}

	/// Whether the entry is older than `ttl` at `now`.
	pub fn is_expired_at(&self, ttl: Duration, now: OffsetDateTime) -> bool {
		now - self.created_at > ttl
	}
}

/// Storage contract for one-time OAuth state.
pub trait StateStore
where
	Self: Send + Sync,
{
	/// Stores `entry` under `state`, sweeping expired entries first.
	fn put(&self, state: String, entry: StateEntry) -> StoreFuture<'_, ()>;

	/// Atomically removes and returns the live entry for `state`.
	fn take_once<'a>(&'a self, state: &'a str) -> StoreFuture<'a, Option<StateEntry>>;

	/// Physically removes expired entries, returning how many were dropped.
	fn sweep_expired(&self) -> StoreFuture<'_, usize>;
}

/// Process-local [`StateStore`] guarded by a single mutex.
#[derive(Clone, Debug)]
pub struct MemoryStateStore {
	entries: StateMap,
	ttl: Duration,
}
impl MemoryStateStore {
	/// Default lifetime of a state entry.
	pub const DEFAULT_TTL: Duration = Duration::minutes(15);

	/// Creates a store whose entries expire after `ttl`.
	pub fn new(ttl: Duration) -> Self {
		Self { entries: Default::default(), ttl }
	}

	/// Creates a store using [`EngineConfig::state_ttl`].
	pub fn from_config(config: &EngineConfig) -> Self {
		Self::new(config.state_ttl)
	}

	/// Configured entry lifetime.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Number of physically stored entries, including expired ones not yet swept.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Whether nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn put_now(map: StateMap, ttl: Duration, state: String, entry: StateEntry) {
		let now = OffsetDateTime::now_utc();
		let mut guard = map.lock();

		guard.retain(|_, existing| !existing.is_expired_at(ttl, now));
		guard.insert(state, entry);
	}

	fn take_now(map: StateMap, ttl: Duration, state: &str) -> Option<StateEntry> {
		let entry = map.lock().remove(state)?;

		if entry.is_expired_at(ttl, OffsetDateTime::now_utc()) { None } else { Some(entry) }
	}

	fn sweep_now(map: StateMap, ttl: Duration) -> usize {
		let now = OffsetDateTime::now_utc();
		let mut guard = map.lock();
		let before = guard.len();

		guard.retain(|_, existing| !existing.is_expired_at(ttl, now));

		before - guard.len()
	}
}
impl Default for MemoryStateStore {
	fn default() -> Self {
		Self::new(Self::DEFAULT_TTL)
	}
}
impl StateStore for MemoryStateStore {
	fn put(&self, state: String, entry: StateEntry) -> StoreFuture<'_, ()> {
		let map = self.entries.clone();
		let ttl = self.ttl;

		Box::pin(async move {
			if state.is_empty() {
				return Err(StoreError::Backend { message: "state key cannot be empty".into() });
			}

			tracing::debug!(state = %fingerprint(&state), "Stored OAuth state.");

			Self::put_now(map, ttl, state, entry);

			Ok(())
		})
	}

	fn take_once<'a>(&'a self, state: &'a str) -> StoreFuture<'a, Option<StateEntry>> {
		let map = self.entries.clone();
		let ttl = self.ttl;

		Box::pin(async move {
			let entry = Self::take_now(map, ttl, state);

			tracing::debug!(
				state = %fingerprint(state),
				found = entry.is_some(),
				"Consumed OAuth state."
			);

			Ok(entry)
		})
	}

	fn sweep_expired(&self) -> StoreFuture<'_, usize> {
		let map = self.entries.clone();
		let ttl = self.ttl;

		Box::pin(async move { Ok(Self::sweep_now(map, ttl)) })
	}
}

/// Generates a fresh state value: 32 random bytes, base64url without padding.
pub fn generate_state() -> String {
	URL_SAFE_NO_PAD.encode(rand::random::<[u8; STATE_BYTES]>())
}

/// Short, non-reversible label for a state value; safe to log.
pub fn fingerprint(state: &str) -> String {
	let digest = Sha256::digest(state.as_bytes());
	let mut encoded = URL_SAFE_NO_PAD.encode(digest);

	encoded.truncate(FINGERPRINT_LEN);

	encoded
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn generated_states_are_url_safe_and_distinct() {
		let first = generate_state();
		let second = generate_state();

		assert_eq!(first.len(), 43);
		assert_ne!(first, second);
		assert!(first.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
	}

	#[test]
	fn fingerprint_hides_the_raw_value() {
		let state = generate_state();
		let label = fingerprint(&state);

		assert_eq!(label.len(), FINGERPRINT_LEN);
		assert!(!state.contains(&label));
		assert_eq!(label, fingerprint(&state));
	}

	#[tokio::test]
	async fn take_once_returns_entry_exactly_once() {
		let store = MemoryStateStore::default();

		store
			.put("s1".into(), StateEntry::new("lc1", None))
			.await
			.expect("Storing a state entry should succeed.");

		let first = store.take_once("s1").await.expect("First take should not fail.");
		let second = store.take_once("s1").await.expect("Second take should not fail.");

		assert_eq!(first.map(|entry| entry.login_challenge), Some("lc1".into()));
		assert!(second.is_none());
	}

	#[tokio::test]
	async fn expired_entries_are_invisible_before_sweep() {
		let store = MemoryStateStore::default();
		let stale = StateEntry::new("lc-old", None)
			.with_created_at(OffsetDateTime::now_utc() - Duration::minutes(16));

		store.entries.lock().insert("old".into(), stale);

		assert_eq!(store.len(), 1, "Entry should be physically present before any sweep.");
		assert!(store.take_once("old").await.expect("Take should not fail.").is_none());
	}

	#[tokio::test]
	async fn put_sweeps_expired_entries() {
		let store = MemoryStateStore::new(Duration::minutes(15));
		let stale = StateEntry::new("lc-old", None)
			.with_created_at(OffsetDateTime::now_utc() - Duration::hours(1));

		store.entries.lock().insert("old".into(), stale);
		store
			.put("fresh".into(), StateEntry::new("lc-new", None))
			.await
			.expect("Storing a state entry should succeed.");

		assert_eq!(store.len(), 1);
		assert_eq!(store.sweep_expired().await.expect("Sweep should not fail."), 0);
	}

	#[tokio::test]
	async fn empty_state_keys_are_rejected() {
		let store = MemoryStateStore::default();
		let err = store
			.put(String::new(), StateEntry::new("lc", None))
			.await
			.expect_err("Empty keys must be rejected.");

		assert!(matches!(err, StoreError::Backend { .. }));
	}
}
