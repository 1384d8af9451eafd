//! Sends a markdown message through the internal robot API against a local mock of DingTalk,
//! showing that the second send reuses the cached access token.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
// self
use dingtalk_openapi::{
	auth::Credential,
	client::DingTalkClient,
	config::{ClientConfig, Endpoints},
	http::ReqwestHttpClient,
	message::{At, Message},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/gettoken");
			then.status(200).json_body(json!({
				"errcode": 0,
				"errmsg": "ok",
				"access_token": "demo-access",
				"expires_in": 7200
			}));
		})
		.await;
	let send_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/chat/send").query_param("access_token", "demo-access");
			then.status(200).json_body(json!({"errcode": 0, "errmsg": "ok"}));
		})
		.await;
	let config =
		ClientConfig::builder().endpoints(Endpoints::single(Url::parse(&server.url("/"))?)).build()?;
	let client = DingTalkClient::with_http_client(
		Credential::new("demo-app-key", "demo-app-secret")?,
		config,
		ReqwestHttpClient::no_redirects()?,
	);
	let message = Message::markdown("Deploy", "### prod\n- api: **green**")
		.with_at(At::users(["manager-01"]));

	client.send_robot_message("chat-demo", &message).await?;
	client.send_robot_message("chat-demo", &message).await?;

	println!("Cache metrics: {:?}.", client.token_cache().metrics());

	token_mock.assert_async().await;
	send_mock.assert_calls_async(2).await;

	Ok(())
}
