//! Robot message payloads and the callback message model.
//!
//! [`Message`] serializes to the `msgtype`-tagged JSON accepted by robot webhooks, session
//! webhooks, and the internal `chat/send` API. [`ReceivedMessage`] is the payload DingTalk
//! posts to a robot when someone talks to it.

// self
use crate::_prelude::*;

/// Conversation kinds reported by DingTalk (`"1"` private, `"2"` group).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConversationType {
	/// One-on-one chat with the robot.
	Private,
	/// Group chat.
	Group,
}
impl ConversationType {
	/// Wire code used by callbacks and card delivery.
	pub const fn as_code(self) -> &'static str {
		match self {
			Self::Private => "1",
			Self::Group => "2",
		}
	}

	/// Parses a wire code, returning `None` for unknown values.
	pub fn from_code(code: &str) -> Option<Self> {
		match code {
			"1" => Some(Self::Private),
			"2" => Some(Self::Group),
			_ => None,
		}
	}
}

/// Mentions attached to text and markdown messages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct At {
	/// Staff ids to mention.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub at_user_ids: Vec<String>,
	/// Mobile numbers to mention.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub at_mobiles: Vec<String>,
	/// Mentions everyone in the group.
	pub is_at_all: bool,
}
impl At {
	/// Mentions the given staff ids.
	pub fn users<I, S>(ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { at_user_ids: ids.into_iter().map(Into::into).collect(), ..Default::default() }
	}

	/// Mentions the given mobile numbers.
	pub fn mobiles<I, S>(mobiles: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { at_mobiles: mobiles.into_iter().map(Into::into).collect(), ..Default::default() }
	}

	/// Mentions everyone.
	pub fn all() -> Self {
		Self { is_at_all: true, ..Default::default() }
	}
}

/// Body of a `text` message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
	/// Plain text.
	#[serde(default)]
	pub content: String,
}

/// Body of a `markdown` message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownContent {
	/// Title shown in conversation previews.
	pub title: String,
	/// Markdown source.
	pub text: String,
}

/// Body of a `link` message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkContent {
	/// Link title.
	pub title: String,
	/// Summary text.
	pub text: String,
	/// Target opened on click.
	pub message_url: String,
	/// Optional thumbnail.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pic_url: Option<String>,
}

/// Body of a single-button `actionCard` message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCardContent {
	/// Card title.
	pub title: String,
	/// Markdown body.
	pub text: String,
	/// Button label.
	#[serde(rename = "singleTitle")]
	pub single_title: String,
	/// Button target.
	#[serde(rename = "singleURL")]
	pub single_url: String,
}

/// Robot message, tagged by `msgtype` on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "msgtype")]
pub enum Message {
	/// Plain text.
	#[serde(rename = "text")]
	Text {
		/// Text body.
		text: TextContent,
		/// Optional mentions.
		#[serde(default, skip_serializing_if = "Option::is_none")]
		at: Option<At>,
	},
	/// Markdown.
	#[serde(rename = "markdown")]
	Markdown {
		/// Markdown body.
		markdown: MarkdownContent,
		/// Optional mentions.
		#[serde(default, skip_serializing_if = "Option::is_none")]
		at: Option<At>,
	},
	/// Link preview.
	#[serde(rename = "link")]
	Link {
		/// Link body.
		link: LinkContent,
	},
	/// Single-button action card.
	#[serde(rename = "actionCard")]
	ActionCard {
		/// Card body.
		#[serde(rename = "actionCard")]
		action_card: ActionCardContent,
	},
}
impl Message {
	/// Builds a text message.
	pub fn text(content: impl Into<String>) -> Self {
		Self::Text { text: TextContent { content: content.into() }, at: None }
	}

	/// Builds a markdown message.
	pub fn markdown(title: impl Into<String>, text: impl Into<String>) -> Self {
		Self::Markdown { markdown: MarkdownContent { title: title.into(), text: text.into() }, at: None }
	}

	/// Builds a link message without a thumbnail.
	pub fn link(
		title: impl Into<String>,
		text: impl Into<String>,
		message_url: impl Into<String>,
	) -> Self {
		Self::Link {
			link: LinkContent {
				title: title.into(),
				text: text.into(),
				message_url: message_url.into(),
				pic_url: None,
			},
		}
	}

	/// Builds a single-button action card.
	pub fn action_card(
		title: impl Into<String>,
		text: impl Into<String>,
		single_title: impl Into<String>,
		single_url: impl Into<String>,
	) -> Self {
		Self::ActionCard {
			action_card: ActionCardContent {
				title: title.into(),
				text: text.into(),
				single_title: single_title.into(),
				single_url: single_url.into(),
			},
		}
	}

	/// Sets the thumbnail of a link message; other kinds are returned unchanged.
	pub fn with_pic_url(mut self, url: impl Into<String>) -> Self {
		if let Self::Link { link } = &mut self {
			link.pic_url = Some(url.into());
		}

		self
	}

	/// Attaches mentions to text and markdown messages; other kinds are returned unchanged.
	pub fn with_at(mut self, mentions: At) -> Self {
		match &mut self {
			Self::Text { at, .. } | Self::Markdown { at, .. } => *at = Some(mentions),
			Self::Link { .. } | Self::ActionCard { .. } => {},
		}

		self
	}

	/// Wire `msgtype` label.
	pub const fn msg_type(&self) -> &'static str {
		match self {
			Self::Text { .. } => "text",
			Self::Markdown { .. } => "markdown",
			Self::Link { .. } => "link",
			Self::ActionCard { .. } => "actionCard",
		}
	}
}

/// Reply format used by [`ReceivedMessage::reply_message`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReplyKind {
	/// Plain text reply.
	#[default]
	Text,
	/// Markdown reply.
	Markdown,
}
impl ReplyKind {
	/// Maps a `msgtype` label; anything but `"markdown"` falls back to text.
	pub fn from_label(label: &str) -> Self {
		if label == "markdown" { Self::Markdown } else { Self::Text }
	}
}

/// User mentioned in a received message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AtUser {
	/// DingTalk id of the mentioned user.
	pub dingtalk_id: String,
}

/// Message DingTalk delivers to a robot callback.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReceivedMessage {
	/// Conversation identifier.
	pub conversation_id: String,
	/// Users mentioned in the message.
	pub at_users: Vec<AtUser>,
	/// Robot user id in this conversation.
	pub chatbot_user_id: String,
	/// Message id.
	pub msg_id: String,
	/// Sender display name.
	pub sender_nick: String,
	/// Whether the sender is an organization admin.
	pub is_admin: bool,
	/// Sender staff id; empty for users outside the organization.
	pub sender_staff_id: String,
	/// Expiry of [`Self::session_webhook`] in epoch milliseconds.
	pub session_webhook_expired_time: i64,
	/// Creation time in epoch milliseconds.
	pub create_at: i64,
	/// `"1"` for private chats, `"2"` for groups.
	pub conversation_type: String,
	/// Sender id (always present).
	pub sender_id: String,
	/// Group title.
	pub conversation_title: String,
	/// Whether the robot was mentioned.
	pub is_in_at_list: bool,
	/// Short-lived webhook for replying to this conversation.
	pub session_webhook: String,
	/// Text body.
	pub text: TextContent,
	/// Robot code that received the message.
	pub robot_code: String,
	/// Incoming `msgtype`.
	pub msgtype: String,
}
impl ReceivedMessage {
	/// Title used in reply markdown messages.
	pub const REPLY_MARKDOWN_TITLE: &'static str = "Markdown Msg";

	/// Staff id, falling back to the sender id when the staff id is empty.
	pub fn sender_identifier(&self) -> &str {
		if self.sender_staff_id.is_empty() { &self.sender_id } else { &self.sender_staff_id }
	}

	/// Group title, or `"<nick>_私聊"` for private chats.
	pub fn chat_title(&self) -> String {
		if self.conversation_kind() == Some(ConversationType::Private) {
			format!("{}_私聊", self.sender_nick)
		} else {
			self.conversation_title.clone()
		}
	}

	/// Parsed conversation type.
	pub fn conversation_kind(&self) -> Option<ConversationType> {
		ConversationType::from_code(&self.conversation_type)
	}

	/// Expiry of the session webhook, when the callback carried one.
	pub fn session_webhook_expires_at(&self) -> Option<OffsetDateTime> {
		if self.session_webhook_expired_time <= 0 {
			return None;
		}

		OffsetDateTime::from_unix_timestamp_nanos(
			i128::from(self.session_webhook_expired_time) * 1_000_000,
		)
		.ok()
	}

	/// Builds a reply that mentions the sender.
	///
	/// Senders without a staff id are mentioned by nickname in the text. Markdown replies in
	/// group chats append the staff id mention because markdown ignores `at` otherwise.
	pub fn reply_message(&self, kind: ReplyKind, text: impl Into<String>) -> Message {
		let mut text = text.into();
		let staff_id = self.sender_staff_id.as_str();

		if staff_id.is_empty() {
			text = format!("{text}\n\n@{}", self.sender_nick);
		}

		// Senders outside the organization have no staff id and are mentioned by nickname only.
		let at = if staff_id.is_empty() { At::default() } else { At::users([staff_id]) };

		match kind {
			ReplyKind::Text => Message::text(text).with_at(at),
			ReplyKind::Markdown => {
				if !staff_id.is_empty()
					&& self.conversation_kind() != Some(ConversationType::Private)
				{
					text = format!("{text}\n\n@{staff_id}");
				}

				Message::markdown(Self::REPLY_MARKDOWN_TITLE, text).with_at(at)
			},
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn received(staff_id: &str, conversation_type: &str) -> ReceivedMessage {
		ReceivedMessage {
			sender_nick: "Alice".into(),
			sender_staff_id: staff_id.into(),
			sender_id: "$:LWCP_v1:$sender".into(),
			conversation_type: conversation_type.into(),
			conversation_title: "Ops Room".into(),
			session_webhook: "https://oapi.dingtalk.com/robot/sendBySession?session=s".into(),
			..Default::default()
		}
	}

	#[test]
	fn messages_serialize_with_msgtype_tags() {
		let text = serde_json::to_value(Message::text("hello").with_at(At::all()))
			.expect("Text message should serialize.");

		assert_eq!(
			text,
			json!({"msgtype": "text", "text": {"content": "hello"}, "at": {"isAtAll": true}})
		);

		let card = serde_json::to_value(Message::action_card("Task", "### todo", "Open", "https://x"))
			.expect("Action card should serialize.");

		assert_eq!(
			card,
			json!({
				"msgtype": "actionCard",
				"actionCard": {
					"title": "Task",
					"text": "### todo",
					"singleTitle": "Open",
					"singleURL": "https://x"
				}
			})
		);

		let link = serde_json::to_value(
			Message::link("Docs", "Read more", "https://open.dingtalk.com").with_pic_url("https://p"),
		)
		.expect("Link should serialize.");

		assert_eq!(link["link"]["messageUrl"], "https://open.dingtalk.com");
		assert_eq!(link["link"]["picUrl"], "https://p");
	}

	#[test]
	fn with_at_ignores_kinds_without_mentions() {
		let link = Message::link("t", "x", "https://x").with_at(At::all());

		assert!(matches!(link, Message::Link { .. }));
		assert_eq!(link.msg_type(), "link");
	}

	#[test]
	fn callback_payload_decodes_camel_case() {
		let payload = json!({
			"conversationId": "cid",
			"atUsers": [{"dingtalkId": "robot"}],
			"senderNick": "Bob",
			"senderStaffId": "",
			"senderId": "sid",
			"conversationType": "1",
			"sessionWebhook": "https://hook",
			"sessionWebhookExpiredTime": 1735689600000_i64,
			"text": {"content": " hi "},
			"msgtype": "text",
			"unknownField": true
		});
		let message: ReceivedMessage =
			serde_json::from_value(payload).expect("Callback payload should decode.");

		assert_eq!(message.at_users[0].dingtalk_id, "robot");
		assert_eq!(message.sender_identifier(), "sid");
		assert_eq!(message.chat_title(), "Bob_私聊");
		assert_eq!(message.text.content, " hi ");
		assert_eq!(
			message.session_webhook_expires_at().map(OffsetDateTime::unix_timestamp),
			Some(1_735_689_600)
		);
	}

	#[test]
	fn sender_identifier_prefers_staff_id() {
		assert_eq!(received("staff-1", "2").sender_identifier(), "staff-1");
		assert_eq!(received("staff-1", "2").chat_title(), "Ops Room");
	}

	#[test]
	fn text_reply_mentions_nick_without_staff_id() {
		let reply = received("", "2").reply_message(ReplyKind::from_label("unknown"), "done");

		assert_eq!(reply, Message::text("done\n\n@Alice").with_at(At::default()));
		assert_eq!(
			serde_json::to_value(&reply).expect("Reply should serialize.")["at"],
			json!({"isAtAll": false})
		);
	}

	#[test]
	fn markdown_reply_mentions_staff_id_in_groups_only() {
		let group = received("staff-1", "2").reply_message(ReplyKind::Markdown, "**ok**");

		assert_eq!(
			group,
			Message::markdown("Markdown Msg", "**ok**\n\n@staff-1").with_at(At::users(["staff-1"]))
		);

		let private = received("staff-1", "1").reply_message(ReplyKind::Markdown, "**ok**");

		assert_eq!(
			private,
			Message::markdown("Markdown Msg", "**ok**").with_at(At::users(["staff-1"]))
		);
	}
}
