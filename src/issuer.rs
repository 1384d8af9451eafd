//! Token issuers: the network seam between [`TokenCache`](crate::cache::TokenCache) and
//! the `gettoken` endpoint.

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	config::ClientConfig,
	error::DecodeError,
	http::{self, ErrorEnvelope, ReqwestHttpClient},
};

/// Boxed future returned by [`TokenIssuer::issue`].
pub type IssueFuture<'a> = Pin<Box<dyn Future<Output = Result<IssuedToken>> + 'a + Send>>;

/// Source of fresh access tokens for a credential.
///
/// Implementations perform exactly one attempt per call; retry policy belongs to callers.
pub trait TokenIssuer
where
	Self: Send + Sync,
{
	/// Requests a new token for `credential`.
	fn issue<'a>(&'a self, credential: &'a Credential) -> IssueFuture<'a>;
}

/// Token plus the lifetime reported by the issuer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedToken {
	/// Bearer token.
	pub access_token: TokenSecret,
	/// Issuer-reported time-to-live.
	pub expires_in: Duration,
}

/// Issuer backed by `GET {oapi}/gettoken?appkey=..&appsecret=..`.
#[derive(Clone, Debug)]
pub struct HttpTokenIssuer {
	http_client: ReqwestHttpClient,
	config: Arc<ClientConfig>,
}
impl HttpTokenIssuer {
	/// Creates an issuer that shares `http_client` and reads endpoints and deadlines from
	/// `config`.
	pub fn new(http_client: ReqwestHttpClient, config: impl Into<Arc<ClientConfig>>) -> Self {
		Self { http_client, config: config.into() }
	}

	async fn fetch(&self, credential: &Credential) -> Result<IssuedToken> {
		let url = self.config.endpoints.oapi_url(&["gettoken"])?;
		let request = self
			.http_client
			.get(url)
			.query(&[
				("appkey", credential.client_id()),
				("appsecret", credential.client_secret().expose()),
			])
			.timeout(http::deadline(self.config.token_timeout));
		let response = self.http_client.send("gettoken", request).await?;
		let body = response.decode::<GetTokenResponse>()?;

		ErrorEnvelope { errcode: body.errcode, errmsg: body.errmsg }.check()?;

		let access_token = body
			.access_token
			.filter(|token| !token.is_empty())
			.ok_or(DecodeError::MissingField { field: "access_token" })?;
		let expires_in = body.expires_in.ok_or(DecodeError::MissingField { field: "expires_in" })?;

		Ok(IssuedToken {
			access_token: TokenSecret::new(access_token),
			expires_in: Duration::seconds(expires_in),
		})
	}
}
impl TokenIssuer for HttpTokenIssuer {
	fn issue<'a>(&'a self, credential: &'a Credential) -> IssueFuture<'a> {
		Box::pin(self.fetch(credential))
	}
}

#[derive(Deserialize)]
struct GetTokenResponse {
	#[serde(default)]
	errcode: i64,
	#[serde(default)]
	errmsg: String,
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	expires_in: Option<i64>,
}
