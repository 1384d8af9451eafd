//! Transport primitives shared by every OpenAPI call.
//!
//! [`ReqwestHttpClient`] wraps a reqwest [`ReqwestClient`] so one connection pool serves the
//! token issuer and all collaborators. Calls funnel through [`ReqwestHttpClient::send`],
//! which classifies transport failures and hands back a [`RawResponse`]; the response helpers
//! then apply the two error conventions DingTalk uses:
//!
//! - legacy `oapi` endpoints answer HTTP 200 with a non-zero `errcode` on failure;
//! - `v1.0` REST endpoints answer non-2xx statuses with a `{code, message}` body.

// std
use std::ops::Deref;
// crates.io
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, DecodeError, TransportError},
};

/// Header carrying the access token on `v1.0` endpoints.
pub const ACCESS_TOKEN_HEADER: &str = "x-acs-dingtalk-access-token";

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Per-call deadlines come from [`ClientConfig`](crate::config::ClientConfig) and are
/// attached to each request, so a custom client does not need its own timeout.
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that never follows redirects, so tokens are not replayed elsewhere.
	pub fn no_redirects() -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self(client))
	}

	/// Sends `request`, reads the whole body, and labels failures with `endpoint`.
	pub(crate) async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<RawResponse> {
		let response =
			request.send().await.map_err(|e| TransportError::from_reqwest(endpoint, e))?;
		let status = response.status().as_u16();
		let body =
			response.bytes().await.map_err(|e| TransportError::from_reqwest(endpoint, e))?.to_vec();

		Ok(RawResponse { status, body })
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Fully buffered HTTP response.
#[derive(Clone, Debug)]
pub(crate) struct RawResponse {
	pub(crate) status: u16,
	pub(crate) body: Vec<u8>,
}
impl RawResponse {
	/// Decodes the body, recording the failing JSON path on error.
	pub(crate) fn decode<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| DecodeError::Json { source, status: Some(self.status) }.into())
	}

	/// Applies the `oapi` convention: a non-zero `errcode` fails even on HTTP 200.
	pub(crate) fn ensure_errcode(&self) -> Result<()> {
		self.decode::<ErrorEnvelope>()?.check()
	}

	/// Applies the `v1.0` convention: any non-2xx status fails.
	pub(crate) fn ensure_success(&self) -> Result<()> {
		if (200..300).contains(&self.status) {
			return Ok(());
		}

		let parsed = serde_json::from_slice::<RestErrorBody>(&self.body).ok();
		let code = parsed.as_ref().and_then(|body| body.code.clone());
		let message = parsed
			.and_then(|body| body.message)
			.unwrap_or_else(|| String::from_utf8_lossy(&self.body).into_owned());

		Err(Error::HttpStatus { status: self.status, code, message })
	}
}

/// `errcode`/`errmsg` pair present on every `oapi` response.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct ErrorEnvelope {
	#[serde(default)]
	pub(crate) errcode: i64,
	#[serde(default)]
	pub(crate) errmsg: String,
}
impl ErrorEnvelope {
	pub(crate) fn check(self) -> Result<()> {
		if self.errcode == 0 {
			Ok(())
		} else {
			Err(Error::RemoteApi { code: self.errcode, message: self.errmsg })
		}
	}
}

#[derive(Deserialize)]
struct RestErrorBody {
	code: Option<String>,
	message: Option<String>,
}

/// Serializes a request payload.
pub(crate) fn json_body<T>(value: &T) -> Result<Vec<u8>>
where
	T: ?Sized + Serialize,
{
	serde_json::to_vec(value).map_err(|source| ConfigError::RequestEncode { source }.into())
}

/// Converts a configured deadline into the std duration reqwest expects.
pub(crate) fn deadline(timeout: Duration) -> std::time::Duration {
	timeout.unsigned_abs()
}
