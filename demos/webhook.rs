//! Answers a robot callback through its session webhook, then posts an action card to a
//! custom robot webhook. Both endpoints are served by a local mock.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use dingtalk_openapi::{
	message::{Message, ReceivedMessage, ReplyKind},
	webhook::WebhookClient,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let hook_mock = server
		.mock_async(|when, then| {
			when.method(POST);
			then.status(200).json_body(json!({"errcode": 0, "errmsg": "ok"}));
		})
		.await;
	let callback = json!({
		"conversationType": "1",
		"senderNick": "Dana",
		"senderStaffId": "",
		"senderId": "$:LWCP_v1:$demo",
		"sessionWebhook": server.url("/robot/sendBySession?session=demo"),
		"text": {"content": "status?"},
		"msgtype": "text"
	});
	let received: ReceivedMessage = serde_json::from_value(callback)?;
	let webhook = WebhookClient::default();
	let status = webhook.reply(&received, ReplyKind::Text, "All systems nominal.").await?;

	println!("Replied in `{}` with HTTP {status}.", received.chat_title());

	let card = Message::action_card(
		"Incident closed",
		"#### INC-42\nRoot cause: expired certificate.",
		"View report",
		"https://example.com/inc/42",
	);

	webhook.send(&server.url("/robot/send?access_token=demo-hook"), &card).await?;

	hook_mock.assert_calls_async(2).await;

	Ok(())
}
