//! Identity-domain identifiers, redacted secrets, password verification, and the
//! tenant-scoped identity derived for every login and consent decision.

pub mod id;
pub mod identity;
pub mod password;
pub mod secret;

pub use id::*;
pub use identity::*;
pub use password::*;
pub use secret::*;
