// self
use crate::{_prelude::*, obs::OpKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// Span for one OpenAPI operation, optionally tagged with the application's client id.
///
/// The client id is the public `AppKey`; secrets and tokens never become span fields.
#[derive(Clone, Debug)]
pub struct OpSpan {
	kind: OpKind,
	stage: &'static str,
	client_id: Option<String>,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a span for an operation that is not bound to a credential (webhooks).
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		Self::build(kind, stage, None)
	}

	/// Creates a span for an operation performed on behalf of `client_id`.
	pub fn for_client(kind: OpKind, stage: &'static str, client_id: &str) -> Self {
		Self::build(kind, stage, Some(client_id.to_owned()))
	}

	fn build(kind: OpKind, stage: &'static str, client_id: Option<String>) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"dingtalk_openapi.op",
				op = kind.as_str(),
				stage,
				client_id = tracing::field::Empty
			);

			if let Some(id) = &client_id {
				span.record("client_id", id.as_str());
			}

			Self { kind, stage, client_id, span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			Self { kind, stage, client_id }
		}
	}

	/// Operation this span covers.
	pub fn kind(&self) -> OpKind {
		self.kind
	}

	/// Call site label.
	pub fn stage(&self) -> &'static str {
		self.stage
	}

	/// Client id recorded on the span, if any.
	pub fn client_id(&self) -> Option<&str> {
		self.client_id.as_deref()
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn client_spans_carry_the_client_id() {
		let span = OpSpan::for_client(OpKind::AccessToken, "access_token", "ding-app-key");

		assert_eq!(span.kind(), OpKind::AccessToken);
		assert_eq!(span.stage(), "access_token");
		assert_eq!(span.client_id(), Some("ding-app-key"));
		assert_eq!(span.instrument(async { 42 }).await, 42);
	}

	#[test]
	fn webhook_spans_have_no_client_id() {
		let span = OpSpan::new(OpKind::Webhook, "send");

		assert!(span.client_id().is_none());
		assert_eq!(span.stage(), "send");
	}
}
