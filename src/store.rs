//! Persistence contracts consumed by the engine plus in-memory implementations.
//!
//! Tenants, clients, and users live in the host's database; the engine only needs the keyed
//! lookups declared in [`directory`]. The one-time OAuth state used during social login is
//! owned by a [`StateStore`].

pub mod directory;
pub mod memory;
pub mod state;

pub use directory::*;
pub use memory::MemoryDirectory;
pub use state::*;

// self
use crate::_prelude::*;

/// Boxed future returned by every store operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Error type produced by directory and state-store implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// A unique key (client id, tenant-scoped email) is already taken.
	#[error("Conflict: {message}.")]
	Conflict {
		/// Human-readable error payload.
		message: String,
	},
	/// The record to update does not exist.
	#[error("Record not found: {message}.")]
	Missing {
		/// Human-readable error payload.
		message: String,
	},
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
