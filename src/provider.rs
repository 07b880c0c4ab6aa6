//! Identity-provider descriptors used by social login.
//!
//! A [`ProviderDescriptor`] is validated data: the authorization, token, and userinfo
//! endpoints (HTTPS, or HTTP on loopback hosts), the scopes to request, extra authorize
//! parameters, and the client authentication method for the token endpoint.
//! [`ProviderDescriptor::google`] is the preset used by default.

pub mod descriptor;

pub use descriptor::*;
