// crates.io
use reqwest::multipart::{Form, Part};
// self
use crate::{
	_prelude::*,
	client::{self, DingTalkClient},
	error::{ConfigError, DecodeError},
	http::ErrorEnvelope,
	obs::OpKind,
};

/// Mime type of PNG images, the most common upload.
pub const MIME_TYPE_IMAGE_PNG: &str = "image/png";

/// Media categories accepted by `media/upload`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
	/// Images (jpg, gif, png, bmp).
	Image,
	/// Voice clips (amr, mp3, wav).
	Voice,
	/// Videos (mp4).
	Video,
	/// Generic files.
	File,
}
impl MediaType {
	/// Form field value.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Image => "image",
			Self::Voice => "voice",
			Self::Video => "video",
			Self::File => "file",
		}
	}
}
impl Display for MediaType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Successful `media/upload` answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUploadResult {
	/// Identifier usable in later messages.
	pub media_id: String,
	/// Upload time in epoch milliseconds.
	#[serde(default)]
	pub created_at: i64,
	/// Echoed media type.
	#[serde(default, rename = "type")]
	pub media_type: String,
}

impl DingTalkClient {
	/// Uploads `content` as a multipart `media` file part.
	///
	/// `mime_type` is validated locally and rejected with
	/// [`ConfigError::InvalidMimeType`] before any network traffic.
	pub async fn upload_media(
		&self,
		content: impl Into<Vec<u8>>,
		filename: impl Into<String>,
		media_type: MediaType,
		mime_type: &str,
	) -> Result<MediaUploadResult> {
		let part = Part::bytes(content.into()).file_name(filename.into()).mime_str(mime_type).map_err(
			|e| ConfigError::InvalidMimeType { mime: mime_type.to_owned(), source: Box::new(e) },
		)?;
		let form = Form::new().part("media", part).text("type", media_type.as_str());
		let client_id = self.credential().client_id();

		client::observed(OpKind::UploadMedia, "upload_media", client_id, async move {
			let token = self.access_token().await?;
			let request = self
				.oapi_request(&["media", "upload"], &token, self.config.upload_timeout)?
				.multipart(form);
			let response = self.http_client.send("media/upload", request).await?;
			let body = response.decode::<MediaUploadResponse>()?;

			ErrorEnvelope { errcode: body.errcode, errmsg: body.errmsg }.check()?;

			let media_id = body
				.media_id
				.filter(|id| !id.is_empty())
				.ok_or(DecodeError::MissingField { field: "media_id" })?;

			Ok(MediaUploadResult { media_id, created_at: body.created_at, media_type: body.kind })
		})
		.await
	}
}

#[derive(Deserialize)]
struct MediaUploadResponse {
	#[serde(default)]
	errcode: i64,
	#[serde(default)]
	errmsg: String,
	#[serde(default)]
	media_id: Option<String>,
	#[serde(default)]
	created_at: i64,
	#[serde(default, rename = "type")]
	kind: String,
}
