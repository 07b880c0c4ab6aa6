//! Observability helpers for engine flows.
//!
//! Every flow runs inside an `authgate.flow` span carrying the `flow` and `stage` fields.
//! With the `metrics` feature enabled, the `authgate_flow_total` counter is incremented for
//! every attempt/success/failure, labeled by `flow` + `outcome`, and
//! `authgate_backend_response_total` counts admin API answers by `operation` and status class.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Inbound login challenge (SSO skip or login form).
	LoginChallenge,
	/// Email/password submission.
	PasswordLogin,
	/// Consent prompt, grant, or denial.
	Consent,
	/// Social-login redirect and callback.
	SocialLogin,
	/// Client registry mutations mirrored into the backend.
	ClientRegistry,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::LoginChallenge => "login_challenge",
			FlowKind::PasswordLogin => "password_login",
			FlowKind::Consent => "consent",
			FlowKind::SocialLogin => "social_login",
			FlowKind::ClientRegistry => "client_registry",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an engine operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the terminal outcome of `result` and hands it back.
pub(crate) fn finish<T>(kind: FlowKind, result: Result<T>) -> Result<T> {
	match &result {
		Ok(_) => record_flow_outcome(kind, FlowOutcome::Success),
		Err(e) => {
			::tracing::warn!(flow = kind.as_str(), error = %e, "Flow failed.");

			record_flow_outcome(kind, FlowOutcome::Failure);
		},
	}

	result
}
