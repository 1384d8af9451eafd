// self
use crate::obs::{OpKind, OpOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"dingtalk_openapi_op_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records one `gettoken` round trip made by a token cache.
///
/// Cache hits never reach this counter, so `dingtalk_openapi_token_fetch_total` divided by
/// `dingtalk_openapi_op_total{op="access_token"}` is the cache miss ratio.
pub fn record_token_fetch(outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("dingtalk_openapi_token_fetch_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_are_noops_without_a_global_recorder() {
		record_op_outcome(OpKind::Webhook, OpOutcome::Failure);
		record_token_fetch(OpOutcome::Success);
	}
}
