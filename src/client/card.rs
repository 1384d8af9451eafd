//! Streaming AI cards delivered through plain `v1.0/card` REST calls.

// crates.io
use reqwest::Method;
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	client::{self, DingTalkClient},
	http,
	message::ConversationType,
	obs::OpKind,
};

/// Parameters for creating a card instance and delivering it to a conversation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateAndDeliverCardRequest {
	/// Card template id from the developer console.
	pub card_template_id: String,
	/// Caller-chosen id used by later streaming updates.
	pub out_track_id: String,
	/// Robot code, required for group delivery.
	pub robot_code: Option<String>,
	/// Target space, e.g. `dtv1.card//IM_GROUP.<openConversationId>`.
	pub open_space_id: Option<String>,
	/// Conversation kind; unknown kinds use group delivery.
	pub conversation_type: Option<ConversationType>,
	/// Initial template parameters.
	pub card_data: BTreeMap<String, String>,
}
impl CreateAndDeliverCardRequest {
	/// Starts a request for `card_template_id` tracked as `out_track_id`.
	pub fn new(card_template_id: impl Into<String>, out_track_id: impl Into<String>) -> Self {
		Self {
			card_template_id: card_template_id.into(),
			out_track_id: out_track_id.into(),
			..Default::default()
		}
	}

	/// Sets the robot code.
	pub fn robot_code(mut self, robot_code: impl Into<String>) -> Self {
		self.robot_code = Some(robot_code.into());

		self
	}

	/// Sets the open space id.
	pub fn open_space_id(mut self, open_space_id: impl Into<String>) -> Self {
		self.open_space_id = Some(open_space_id.into());

		self
	}

	/// Sets the conversation kind.
	pub fn conversation_type(mut self, conversation_type: ConversationType) -> Self {
		self.conversation_type = Some(conversation_type);

		self
	}

	/// Adds one template parameter.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.card_data.insert(key.into(), value.into());

		self
	}

	fn to_body(&self) -> CreateAndDeliverBody<'_> {
		let robot_code = self.robot_code.as_deref().filter(|code| !code.is_empty());
		let (group_deliver, robot_deliver) = match self.conversation_type {
			Some(ConversationType::Private) =>
				(None, Some(RobotDeliverModel { space_type: "IM_GROUP" })),
			Some(ConversationType::Group) | None =>
				(robot_code.map(|robot_code| GroupDeliverModel { robot_code }), None),
		};

		CreateAndDeliverBody {
			card_template_id: &self.card_template_id,
			out_track_id: &self.out_track_id,
			card_data: CardData { card_param_map: &self.card_data },
			callback_type: "STREAM",
			user_id_type: 1,
			im_group_open_space_model: SpaceModel { support_forward: true },
			im_robot_open_space_model: SpaceModel { support_forward: true },
			open_space_id: self.open_space_id.as_deref().filter(|id| !id.is_empty()),
			im_group_open_deliver_model: group_deliver,
			im_robot_open_deliver_model: robot_deliver,
		}
	}
}

/// One incremental update to a streaming card field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamingUpdateRequest {
	/// Track id the card was delivered with.
	pub out_track_id: String,
	/// Template variable to update.
	pub key: String,
	/// New content.
	pub content: String,
	/// Replace the whole value instead of appending.
	pub is_full: bool,
	/// Marks the stream as finished.
	pub is_finalize: bool,
}
impl StreamingUpdateRequest {
	/// Full replacement of the `content` variable used by AI cards.
	pub fn ai_content(
		out_track_id: impl Into<String>,
		content: impl Into<String>,
		is_finalize: bool,
	) -> Self {
		Self {
			out_track_id: out_track_id.into(),
			key: "content".into(),
			content: content.into(),
			is_full: true,
			is_finalize,
		}
	}

	fn to_body(&self, guid: String) -> StreamingUpdateBody<'_> {
		StreamingUpdateBody {
			out_track_id: &self.out_track_id,
			guid,
			key: &self.key,
			content: &self.content,
			is_full: self.is_full,
			is_finalize: self.is_finalize,
			is_error: false,
		}
	}
}

impl DingTalkClient {
	/// Creates a card instance and delivers it to the requested conversation.
	pub async fn create_and_deliver_card(&self, request: &CreateAndDeliverCardRequest) -> Result<()> {
		let body = http::json_body(&request.to_body())?;
		let client_id = self.credential().client_id();

		client::observed(OpKind::CardDeliver, "create_and_deliver_card", client_id, async move {
			let token = self.access_token().await?;
			let request = self
				.api_request(Method::POST, &["v1.0", "card", "instances", "createAndDeliver"], &token)?
				.body(body);

			self.http_client.send("v1.0/card/instances/createAndDeliver", request).await?.ensure_success()
		})
		.await
	}

	/// Pushes one streaming update; every call carries a fresh request guid.
	pub async fn streaming_update(&self, request: &StreamingUpdateRequest) -> Result<()> {
		let body = http::json_body(&request.to_body(Uuid::new_v4().to_string()))?;
		let client_id = self.credential().client_id();

		client::observed(OpKind::CardStreaming, "streaming_update", client_id, async move {
			let token = self.access_token().await?;
			let request =
				self.api_request(Method::PUT, &["v1.0", "card", "streaming"], &token)?.body(body);

			self.http_client.send("v1.0/card/streaming", request).await?.ensure_success()
		})
		.await
	}

	/// Replaces the `content` variable of an AI card, optionally finishing the stream.
	pub async fn update_ai_stream_card(
		&self,
		out_track_id: &str,
		content: &str,
		is_finalize: bool,
	) -> Result<()> {
		self.streaming_update(&StreamingUpdateRequest::ai_content(out_track_id, content, is_finalize))
			.await
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAndDeliverBody<'a> {
	card_template_id: &'a str,
	out_track_id: &'a str,
	card_data: CardData<'a>,
	callback_type: &'static str,
	user_id_type: i32,
	im_group_open_space_model: SpaceModel,
	im_robot_open_space_model: SpaceModel,
	#[serde(skip_serializing_if = "Option::is_none")]
	open_space_id: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	im_group_open_deliver_model: Option<GroupDeliverModel<'a>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	im_robot_open_deliver_model: Option<RobotDeliverModel>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CardData<'a> {
	card_param_map: &'a BTreeMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpaceModel {
	support_forward: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupDeliverModel<'a> {
	robot_code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RobotDeliverModel {
	space_type: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamingUpdateBody<'a> {
	out_track_id: &'a str,
	guid: String,
	key: &'a str,
	content: &'a str,
	is_full: bool,
	is_finalize: bool,
	is_error: bool,
}
