//! Strongly typed identifiers shared by the directories, the backend client, and the flows.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use uuid::Uuid;
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

macro_rules! def_uuid_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);
		impl $name {
			/// Generates a fresh random (v4) identifier.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Wraps an existing UUID.
			pub const fn from_uuid(value: Uuid) -> Self {
				Self(value)
			}

			/// Returns the wrapped UUID.
			pub const fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				Display::fmt(&self.0, f)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				if s.is_empty() {
					return Err(IdentifierError::Empty { kind: $kind });
				}

				Uuid::parse_str(s).map(Self).map_err(|_| IdentifierError::Malformed { kind: $kind })
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (tenant, user, client).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (tenant, user, client).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (tenant, user, client).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// The identifier is not a UUID.
	#[error("{kind} identifier is not a valid UUID.")]
	Malformed {
		/// Kind of identifier (tenant, user, client record).
		kind: &'static str,
	},
}

def_id! { ClientId, "OAuth client identifier shared with the authorization backend.", "Client" }
def_id! { ProviderId, "Identifier for an identity provider descriptor.", "Provider" }

def_uuid_id! { TenantId, "Unique identifier for a tenant isolation boundary.", "Tenant" }
def_uuid_id! { UserId, "Stable user identifier; always used as the backend `subject`.", "User" }
def_uuid_id! { RecordId, "Primary key of a locally stored OAuth client registration.", "ClientRecord" }

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn client_ids_reject_whitespace_and_empty_values() {
		assert!(ClientId::new(" client").is_err(), "Leading whitespace must be rejected.");
		assert!(ClientId::new("").is_err());

		let client = ClientId::new("authgate_abc").expect("Client fixture should be valid.");

		assert_eq!(client.as_ref(), "authgate_abc");
		assert!(serde_json::from_str::<ClientId>("\"with space\"").is_err());

		let too_long = "a".repeat(IDENTIFIER_MAX_LEN + 1);

		assert!(ClientId::new(&too_long).is_err());
		assert!(ProviderId::new("with space").is_err());
	}

	#[test]
	fn user_ids_parse_backend_subjects() {
		let user = UserId::generate();
		let parsed: UserId =
			user.to_string().parse().expect("Generated user identifier should round-trip.");

		assert_eq!(parsed, user);
		assert_eq!(
			"not-a-uuid".parse::<UserId>(),
			Err(IdentifierError::Malformed { kind: "User" })
		);
		assert_eq!("".parse::<UserId>(), Err(IdentifierError::Empty { kind: "User" }));
	}

	#[test]
	fn uuid_ids_serialize_as_plain_strings() {
		let tenant = TenantId::generate();
		let payload = serde_json::to_string(&tenant).expect("Tenant should serialize.");

		assert_eq!(payload, format!("\"{tenant}\""));
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<ClientId, u8> = HashMap::from_iter([(
			ClientId::new("client-123").expect("Client used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("client-123"), Some(&7));
	}
}
