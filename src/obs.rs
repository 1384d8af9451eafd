//! Optional observability helpers for OpenAPI operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `dingtalk_openapi.op` with the `op`
//!   (operation), `stage` (call site), and `client_id` (AppKey, when bound to a credential)
//!   fields, plus debug events on token refreshes.
//! - Enable `metrics` to increment the `dingtalk_openapi_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`, and the
//!   `dingtalk_openapi_token_fetch_total` counter for every `gettoken` round trip.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Token cache lookups and refreshes.
	AccessToken,
	/// Media uploads.
	UploadMedia,
	/// Internal robot group messages.
	RobotMessage,
	/// `chatId` to `openConversationId` conversion.
	OpenConversationId,
	/// Streaming card creation and delivery.
	CardDeliver,
	/// Streaming card content updates.
	CardStreaming,
	/// Custom robot webhook posts.
	Webhook,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::AccessToken => "access_token",
			OpKind::UploadMedia => "upload_media",
			OpKind::RobotMessage => "robot_message",
			OpKind::OpenConversationId => "open_conversation_id",
			OpKind::CardDeliver => "card_deliver",
			OpKind::CardStreaming => "card_streaming",
			OpKind::Webhook => "webhook",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records [`OpOutcome::Success`] or [`OpOutcome::Failure`] for a finished operation.
pub fn record_result<T>(kind: OpKind, result: &Result<T>) {
	match result {
		Ok(_) => record_op_outcome(kind, OpOutcome::Success),
		Err(_) => record_op_outcome(kind, OpOutcome::Failure),
	}
}
