//! Token-backed DingTalk OpenAPI client.
//!
//! [`DingTalkClient`] owns one credential's [`TokenCache`] and exposes the OpenAPI calls that
//! need an access token. Every call asks the cache first, so repeated calls within a token's
//! lifetime never touch the `gettoken` endpoint.

mod card;
mod manager;
mod media;
mod robot;

pub use card::*;
pub use manager::*;
pub use media::*;

// crates.io
use reqwest::{Method, RequestBuilder};
// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	cache::TokenCache,
	config::ClientConfig,
	http::{self, ACCESS_TOKEN_HEADER, ReqwestHttpClient},
	issuer::HttpTokenIssuer,
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Client for one DingTalk application credential.
#[derive(Debug)]
pub struct DingTalkClient {
	http_client: ReqwestHttpClient,
	config: Arc<ClientConfig>,
	tokens: Arc<TokenCache>,
}
impl DingTalkClient {
	/// Creates a client with the default configuration and HTTP client.
	pub fn new(credential: Credential) -> Self {
		Self::with_config(credential, ClientConfig::default())
	}

	/// Creates a client with a custom configuration.
	pub fn with_config(credential: Credential, config: impl Into<Arc<ClientConfig>>) -> Self {
		Self::with_http_client(credential, config, ReqwestHttpClient::default())
	}

	/// Creates a client that shares `http_client` between token fetches and API calls.
	pub fn with_http_client(
		credential: Credential,
		config: impl Into<Arc<ClientConfig>>,
		http_client: ReqwestHttpClient,
	) -> Self {
		let config = config.into();
		let issuer = HttpTokenIssuer::new(http_client.clone(), config.clone());
		let tokens = TokenCache::new(credential, Arc::new(issuer))
			.with_safety_margin(config.safety_margin)
			.with_refresh_mode(config.refresh_mode);

		Self { http_client, config, tokens: Arc::new(tokens) }
	}

	/// Creates a client around an existing cache, e.g. one driven by a custom issuer.
	pub fn with_token_cache(
		tokens: Arc<TokenCache>,
		config: impl Into<Arc<ClientConfig>>,
		http_client: ReqwestHttpClient,
	) -> Self {
		Self { http_client, config: config.into(), tokens }
	}

	/// Credential this client authenticates with.
	pub fn credential(&self) -> &Credential {
		self.tokens.credential()
	}

	/// Shared token cache.
	pub fn token_cache(&self) -> &Arc<TokenCache> {
		&self.tokens
	}

	/// Active configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Returns a cached or freshly fetched access token.
	pub async fn access_token(&self) -> Result<TokenSecret> {
		self.tokens.access_token().await
	}

	/// Builds a `v1.0` request that carries the token in [`ACCESS_TOKEN_HEADER`].
	fn api_request(
		&self,
		method: Method,
		segments: &[&str],
		token: &TokenSecret,
	) -> Result<RequestBuilder> {
		let url = self.config.endpoints.api_url(segments)?;

		Ok(self
			.http_client
			.request(method, url)
			.header(ACCESS_TOKEN_HEADER, token.expose())
			.header(reqwest::header::CONTENT_TYPE, "application/json")
			.timeout(http::deadline(self.config.request_timeout)))
	}

	/// Builds a legacy `oapi` request that carries the token as a query parameter.
	fn oapi_request(
		&self,
		segments: &[&str],
		token: &TokenSecret,
		timeout: Duration,
	) -> Result<RequestBuilder> {
		let url = self.config.endpoints.oapi_url(segments)?;

		Ok(self
			.http_client
			.post(url)
			.query(&[("access_token", token.expose())])
			.timeout(http::deadline(timeout)))
	}
}

/// Runs `fut` inside an operation span tagged with `client_id` and records its outcome.
async fn observed<T, F>(kind: OpKind, stage: &'static str, client_id: &str, fut: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	let span = OpSpan::for_client(kind, stage, client_id);

	obs::record_op_outcome(kind, OpOutcome::Attempt);

	let result = span.instrument(fut).await;

	obs::record_result(kind, &result);

	result
}
