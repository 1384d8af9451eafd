//! Token-free robot webhooks: custom group robots and callback session webhooks.

// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	error::ConfigError,
	http::{self, RawResponse, ReqwestHttpClient},
	message::{Message, ReceivedMessage, ReplyKind},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Posts robot messages to webhook URLs that already embed their credentials.
#[derive(Clone, Debug)]
pub struct WebhookClient {
	http_client: ReqwestHttpClient,
	timeout: Duration,
}
impl WebhookClient {
	/// Creates a client sharing `http_client`, with the default 10 second deadline.
	pub fn new(http_client: ReqwestHttpClient) -> Self {
		Self { http_client, timeout: ClientConfig::DEFAULT_REQUEST_TIMEOUT }
	}

	/// Overrides the per-request deadline.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Posts `payload` as JSON to `url` and checks the `errcode` in the answer.
	pub async fn send<T>(&self, url: &str, payload: &T) -> Result<()>
	where
		T: ?Sized + Serialize,
	{
		const KIND: OpKind = OpKind::Webhook;

		let span = OpSpan::new(KIND, "send");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.post(url, payload).await.and_then(|response| response.ensure_errcode())
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	/// Replies to a callback through its session webhook and returns the HTTP status.
	///
	/// The body is not inspected, so any status the webhook answers with is returned as-is.
	/// Only local and transport failures are errors.
	pub async fn reply(
		&self,
		received: &ReceivedMessage,
		kind: ReplyKind,
		text: impl Into<String>,
	) -> Result<u16> {
		const KIND: OpKind = OpKind::Webhook;

		let span = OpSpan::new(KIND, "reply");
		let message: Message = received.reply_message(kind, text);

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.post(&received.session_webhook, &message).await.map(|response| response.status)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	async fn post<T>(&self, url: &str, payload: &T) -> Result<RawResponse>
	where
		T: ?Sized + Serialize,
	{
		let url = Url::parse(url).map_err(|source| ConfigError::InvalidWebhook { source })?;
		let request = self
			.http_client
			.post(url)
			.header(reqwest::header::CONTENT_TYPE, "application/json")
			.body(http::json_body(payload)?)
			.timeout(http::deadline(self.timeout));

		self.http_client.send("webhook", request).await
	}
}
impl Default for WebhookClient {
	fn default() -> Self {
		Self::new(ReqwestHttpClient::default())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn invalid_urls_fail_before_any_request() {
		let err = WebhookClient::default()
			.send("not a url", &Message::text("hi"))
			.await
			.expect_err("An unparsable webhook should fail.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidWebhook { .. })));
	}

	#[tokio::test]
	async fn empty_session_webhook_is_rejected() {
		let err = WebhookClient::default()
			.reply(&ReceivedMessage::default(), ReplyKind::Text, "hi")
			.await
			.expect_err("A callback without a session webhook cannot be answered.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidWebhook { .. })));
	}
}
