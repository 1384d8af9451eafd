// crates.io
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
// self
use dingtalk_openapi::{
	auth::Credential,
	client::{
		CreateAndDeliverCardRequest, DingTalkClient, MIME_TYPE_IMAGE_PNG, MediaType,
		StreamingUpdateRequest,
	},
	config::{ClientConfig, Endpoints},
	error::Error,
	message::{ConversationType, Message},
};

async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET).path("/gettoken");
			then.status(200).json_body(json!({
				"errcode": 0,
				"errmsg": "ok",
				"access_token": "TOK",
				"expires_in": 7200
			}));
		})
		.await
}

fn build_client(server: &MockServer) -> DingTalkClient {
	let credential =
		Credential::new("robot-app", "robot-secret").expect("Credential fixture should be valid.");
	let base = Url::parse(&server.url("/")).expect("Mock base URL should parse.");
	let config = ClientConfig::builder()
		.endpoints(Endpoints::single(base))
		.build()
		.expect("Client config should build.");

	DingTalkClient::with_config(credential, config)
}

#[tokio::test]
async fn robot_message_posts_chat_id_and_message() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server).await;
	let send = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/chat/send")
				.query_param("access_token", "TOK")
				.json_body(json!({
					"chatId": "chat-1",
					"msg": {"msgtype": "markdown", "markdown": {"title": "Build", "text": "**green**"}}
				}));
			then.status(200).json_body(json!({"errcode": 0, "errmsg": "ok"}));
		})
		.await;
	let client = build_client(&server);
	let message = Message::markdown("Build", "**green**");

	client.send_robot_message("chat-1", &message).await.expect("Robot message should be sent.");
	client.send_robot_message("chat-1", &message).await.expect("Second send should reuse token.");

	send.assert_calls_async(2).await;
	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn robot_message_errcode_is_a_remote_error() {
	let server = MockServer::start_async().await;

	mock_token(&server).await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/chat/send");
			then.status(200).json_body(json!({"errcode": 33012, "errmsg": "无效的chatId"}));
		})
		.await;

	let err = build_client(&server)
		.send_robot_message("missing", &Message::text("hi"))
		.await
		.expect_err("A rejected chat id should fail.");

	assert!(matches!(err, Error::RemoteApi { code: 33012, .. }));
	assert_eq!(err.remote_message(), Some("无效的chatId"));
}

#[tokio::test]
async fn open_conversation_id_uses_header_token() {
	let server = MockServer::start_async().await;

	mock_token(&server).await;

	let convert = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1.0/im/chat/chat-1/convertToOpenConversationId")
				.header("x-acs-dingtalk-access-token", "TOK");
			then.status(200).json_body(json!({"openConversationId": "cidXYZ=="}));
		})
		.await;
	let id = build_client(&server)
		.open_conversation_id("chat-1")
		.await
		.expect("Conversion should succeed.");

	assert_eq!(id, "cidXYZ==");

	convert.assert_async().await;
}

#[tokio::test]
async fn open_conversation_id_surfaces_http_status() {
	let server = MockServer::start_async().await;

	mock_token(&server).await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/v1.0/im/chat/chat-2/convertToOpenConversationId");
			then.status(400).json_body(json!({
				"code": "invalidParameter.chatId",
				"message": "chatId is invalid",
				"requestid": "r-1"
			}));
		})
		.await;

	let err = build_client(&server)
		.open_conversation_id("chat-2")
		.await
		.expect_err("HTTP 400 should fail.");

	match err {
		Error::HttpStatus { status, code, message } => {
			assert_eq!(status, 400);
			assert_eq!(code.as_deref(), Some("invalidParameter.chatId"));
			assert_eq!(message, "chatId is invalid");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
}

#[tokio::test]
async fn media_upload_returns_media_id() {
	let server = MockServer::start_async().await;

	mock_token(&server).await;

	let upload = server
		.mock_async(|when, then| {
			when.method(POST).path("/media/upload").query_param("access_token", "TOK");
			then.status(200).json_body(json!({
				"errcode": 0,
				"errmsg": "ok",
				"media_id": "@lADOADmaWMzazQKA",
				"created_at": 1605863153573_i64,
				"type": "image"
			}));
		})
		.await;
	let result = build_client(&server)
		.upload_media(vec![0x89, b'P', b'N', b'G'], "chart.png", MediaType::Image, MIME_TYPE_IMAGE_PNG)
		.await
		.expect("Upload should succeed.");

	assert_eq!(result.media_id, "@lADOADmaWMzazQKA");
	assert_eq!(result.created_at, 1_605_863_153_573);
	assert_eq!(result.media_type, "image");

	upload.assert_async().await;
}

#[tokio::test]
async fn media_upload_errcode_is_a_remote_error() {
	let server = MockServer::start_async().await;

	mock_token(&server).await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/media/upload");
			then.status(200).json_body(json!({"errcode": 40005, "errmsg": "不合法的文件类型"}));
		})
		.await;

	let err = build_client(&server)
		.upload_media(b"MZ".to_vec(), "a.exe", MediaType::File, "application/octet-stream")
		.await
		.expect_err("Rejected uploads should fail.");

	assert!(matches!(err, Error::RemoteApi { code: 40005, .. }));
}

#[tokio::test]
async fn card_is_delivered_then_streamed() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server).await;
	let deliver = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1.0/card/instances/createAndDeliver")
				.header("x-acs-dingtalk-access-token", "TOK")
				.json_body(json!({
					"cardTemplateId": "ai.schema",
					"outTrackId": "track-1",
					"cardData": {"cardParamMap": {"content": ""}},
					"callbackType": "STREAM",
					"userIdType": 1,
					"imGroupOpenSpaceModel": {"supportForward": true},
					"imRobotOpenSpaceModel": {"supportForward": true},
					"openSpaceId": "dtv1.card//IM_GROUP.cid",
					"imGroupOpenDeliverModel": {"robotCode": "ding-robot"}
				}));
			then.status(200).json_body(json!({"success": true, "result": {"outTrackId": "track-1"}}));
		})
		.await;
	let stream = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path("/v1.0/card/streaming")
				.header("x-acs-dingtalk-access-token", "TOK");
			then.status(200).json_body(json!({"success": true}));
		})
		.await;
	let client = build_client(&server);
	let request = CreateAndDeliverCardRequest::new("ai.schema", "track-1")
		.robot_code("ding-robot")
		.open_space_id("dtv1.card//IM_GROUP.cid")
		.conversation_type(ConversationType::Group)
		.param("content", "");

	client.create_and_deliver_card(&request).await.expect("Card delivery should succeed.");
	client
		.update_ai_stream_card("track-1", "Thinking", false)
		.await
		.expect("Partial update should succeed.");
	client
		.streaming_update(&StreamingUpdateRequest::ai_content("track-1", "Done.", true))
		.await
		.expect("Final update should succeed.");

	deliver.assert_async().await;
	stream.assert_calls_async(2).await;
	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn streaming_failure_surfaces_http_status() {
	let server = MockServer::start_async().await;

	mock_token(&server).await;
	server
		.mock_async(|when, then| {
			when.method(PUT).path("/v1.0/card/streaming");
			then.status(500).body("upstream unavailable");
		})
		.await;

	let err = build_client(&server)
		.update_ai_stream_card("track-9", "x", true)
		.await
		.expect_err("HTTP 500 should fail.");

	assert!(matches!(err, Error::HttpStatus { status: 500, code: None, .. }));
	assert_eq!(err.remote_message(), Some("upstream unavailable"));
}
