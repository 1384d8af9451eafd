// crates.io
use reqwest::Method;
// self
use crate::{
	_prelude::*,
	client::{self, DingTalkClient},
	error::DecodeError,
	http,
	obs::OpKind,
};

impl DingTalkClient {
	/// Sends `message` to a group through the internal robot `chat/send` API.
	///
	/// `message` is usually a [`Message`](crate::message::Message) but any JSON payload the
	/// platform accepts may be passed.
	pub async fn send_robot_message<M>(&self, chat_id: &str, message: &M) -> Result<()>
	where
		M: Serialize,
	{
		let body = http::json_body(&RobotMessageRequest { chat_id, msg: message })?;
		let client_id = self.credential().client_id();

		client::observed(OpKind::RobotMessage, "send_robot_message", client_id, async move {
			let token = self.access_token().await?;
			let request = self
				.oapi_request(&["chat", "send"], &token, self.config.request_timeout)?
				.header(reqwest::header::CONTENT_TYPE, "application/json")
				.body(body);

			self.http_client.send("chat/send", request).await?.ensure_errcode()
		})
		.await
	}

	/// Converts a legacy `chatId` into the `openConversationId` used by `v1.0` APIs.
	pub async fn open_conversation_id(&self, chat_id: &str) -> Result<String> {
		let client_id = self.credential().client_id();

		client::observed(OpKind::OpenConversationId, "open_conversation_id", client_id, async move {
			let token = self.access_token().await?;
			let request = self.api_request(
				Method::POST,
				&["v1.0", "im", "chat", chat_id, "convertToOpenConversationId"],
				&token,
			)?;
			let response =
				self.http_client.send("v1.0/im/chat/convertToOpenConversationId", request).await?;

			response.ensure_success()?;

			response
				.decode::<OpenConversationIdResponse>()?
				.open_conversation_id
				.filter(|id| !id.is_empty())
				.ok_or_else(|| Error::from(DecodeError::MissingField { field: "openConversationId" }))
		})
		.await
	}
}

#[derive(Serialize)]
struct RobotMessageRequest<'a, M> {
	#[serde(rename = "chatId")]
	chat_id: &'a str,
	msg: &'a M,
}

#[derive(Deserialize)]
struct OpenConversationIdResponse {
	#[serde(default, rename = "openConversationId")]
	open_conversation_id: Option<String>,
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::message::Message;

	#[test]
	fn robot_request_wraps_message_under_msg() {
		let message = Message::text("deploy finished");
		let body = serde_json::to_value(RobotMessageRequest { chat_id: "chat-1", msg: &message })
			.expect("Robot request should serialize.");

		assert_eq!(
			body,
			json!({
				"chatId": "chat-1",
				"msg": {"msgtype": "text", "text": {"content": "deploy finished"}}
			})
		);
	}
}
