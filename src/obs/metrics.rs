//! Counters emitted through the `metrics` facade; every function is a no-op without the
//! `metrics` feature.

// self
use crate::obs::{FlowKind, FlowOutcome};

/// Bumps `authgate_flow_total{flow, outcome}` for one engine operation stage.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"authgate_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Bumps `authgate_backend_response_total{operation, class}` for every admin API answer,
/// expected or not.
pub fn record_backend_response(operation: &'static str, status: u16) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"authgate_backend_response_total",
			"operation" => operation,
			"class" => status_class(status)
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, status);
	}
}

#[cfg(any(feature = "metrics", test))]
fn status_class(status: u16) -> &'static str {
	match status {
		100..=199 => "1xx",
		200..=299 => "2xx",
		300..=399 => "3xx",
		400..=499 => "4xx",
		_ => "5xx",
	}
}
