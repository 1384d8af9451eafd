//! Client configuration: endpoint bases, per-call timeouts, and token-cache tuning.
//!
//! [`ClientConfig`] can be deserialized from any serde format (durations are whole seconds)
//! or assembled with [`ClientConfigBuilder`], which validates the same invariants.

// self
use crate::{_prelude::*, cache::RefreshMode, error::ConfigError};

const DEFAULT_OAPI_BASE: &str = "https://oapi.dingtalk.com/";
const DEFAULT_API_BASE: &str = "https://api.dingtalk.com/";

/// Errors raised while constructing or validating a [`ClientConfig`].
#[derive(Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ClientConfigError {
	/// Endpoints must use HTTP or HTTPS.
	#[error("The {endpoint} endpoint must use HTTP(S): {url}.")]
	UnsupportedScheme {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Endpoints must be able to carry path segments.
	#[error("The {endpoint} endpoint cannot be used as a base URL: {url}.")]
	NotABase {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Timeouts must be strictly positive.
	#[error("The {name} timeout must be positive.")]
	NonPositiveTimeout {
		/// Timeout name.
		name: &'static str,
	},
	/// Safety margin cannot be negative.
	#[error("The token safety margin cannot be negative.")]
	NegativeSafetyMargin,
}

/// Base URLs for the two DingTalk API generations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
	/// Legacy `oapi` host serving `gettoken`, `media/upload`, and `chat/send`.
	pub oapi: Url,
	/// `v1.0` REST host serving conversations and cards.
	pub api: Url,
}
impl Endpoints {
	/// Creates an endpoint set from explicit bases.
	pub fn new(oapi: Url, api: Url) -> Self {
		Self { oapi, api }
	}

	/// Points both API generations at one base, as mock servers and proxies usually do.
	pub fn single(base: Url) -> Self {
		Self { oapi: base.clone(), api: base }
	}

	pub(crate) fn oapi_url(&self, segments: &[&str]) -> Result<Url> {
		join_segments(&self.oapi, segments)
	}

	pub(crate) fn api_url(&self, segments: &[&str]) -> Result<Url> {
		join_segments(&self.api, segments)
	}

	fn validate(&self) -> Result<(), ClientConfigError> {
		validate_endpoint("oapi", &self.oapi)?;
		validate_endpoint("api", &self.api)?;

		Ok(())
	}
}
impl Default for Endpoints {
	fn default() -> Self {
		Self {
			oapi: Url::parse(DEFAULT_OAPI_BASE).expect("Default oapi base URL must parse."),
			api: Url::parse(DEFAULT_API_BASE).expect("Default api base URL must parse."),
		}
	}
}

/// Immutable client configuration consumed by [`DingTalkClient`](crate::client::DingTalkClient).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawClientConfig")]
pub struct ClientConfig {
	/// API base URLs.
	pub endpoints: Endpoints,
	/// Per-attempt deadline for `gettoken`.
	#[serde(with = "whole_seconds")]
	pub token_timeout: Duration,
	/// Per-attempt deadline for media uploads.
	#[serde(with = "whole_seconds")]
	pub upload_timeout: Duration,
	/// Per-attempt deadline for message sends, lookups, and card calls.
	#[serde(with = "whole_seconds")]
	pub request_timeout: Duration,
	/// Window before expiry in which a cached token is treated as stale.
	#[serde(with = "whole_seconds")]
	pub safety_margin: Duration,
	/// How concurrent cache misses are resolved.
	pub refresh_mode: RefreshMode,
}
impl ClientConfig {
	/// Default deadline for token requests and uploads.
	pub const DEFAULT_LONG_TIMEOUT: Duration = Duration::seconds(60);
	/// Default deadline for message and card requests.
	pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::seconds(10);
	/// Default token safety margin.
	pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(60);

	/// Returns a builder seeded with defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	fn validate(&self) -> Result<(), ClientConfigError> {
		self.endpoints.validate()?;

		for (name, value) in [
			("token", self.token_timeout),
			("upload", self.upload_timeout),
			("request", self.request_timeout),
		] {
			if !value.is_positive() {
				return Err(ClientConfigError::NonPositiveTimeout { name });
			}
		}

		if self.safety_margin.is_negative() {
			return Err(ClientConfigError::NegativeSafetyMargin);
		}

		Ok(())
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			endpoints: Endpoints::default(),
			token_timeout: Self::DEFAULT_LONG_TIMEOUT,
			upload_timeout: Self::DEFAULT_LONG_TIMEOUT,
			request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
			safety_margin: Self::DEFAULT_SAFETY_MARGIN,
			refresh_mode: RefreshMode::default(),
		}
	}
}
impl TryFrom<RawClientConfig> for ClientConfig {
	type Error = ClientConfigError;

	fn try_from(raw: RawClientConfig) -> Result<Self, Self::Error> {
		let config = Self {
			endpoints: raw.endpoints,
			token_timeout: raw.token_timeout,
			upload_timeout: raw.upload_timeout,
			request_timeout: raw.request_timeout,
			safety_margin: raw.safety_margin,
			refresh_mode: raw.refresh_mode,
		};

		config.validate()?;

		Ok(config)
	}
}

/// Unvalidated mirror of [`ClientConfig`] used during deserialization.
#[derive(Deserialize)]
#[serde(default)]
struct RawClientConfig {
	endpoints: Endpoints,
	#[serde(with = "whole_seconds")]
	token_timeout: Duration,
	#[serde(with = "whole_seconds")]
	upload_timeout: Duration,
	#[serde(with = "whole_seconds")]
	request_timeout: Duration,
	#[serde(with = "whole_seconds")]
	safety_margin: Duration,
	refresh_mode: RefreshMode,
}
impl Default for RawClientConfig {
	fn default() -> Self {
		let config = ClientConfig::default();

		Self {
			endpoints: config.endpoints,
			token_timeout: config.token_timeout,
			upload_timeout: config.upload_timeout,
			request_timeout: config.request_timeout,
			safety_margin: config.safety_margin,
			refresh_mode: config.refresh_mode,
		}
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
	config: ClientConfig,
}
impl ClientConfigBuilder {
	/// Overrides both endpoint bases.
	pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
		self.config.endpoints = endpoints;

		self
	}

	/// Overrides the `gettoken` deadline.
	pub fn token_timeout(mut self, timeout: Duration) -> Self {
		self.config.token_timeout = timeout;

		self
	}

	/// Overrides the media upload deadline.
	pub fn upload_timeout(mut self, timeout: Duration) -> Self {
		self.config.upload_timeout = timeout;

		self
	}

	/// Overrides the deadline for message, lookup, and card requests.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;

		self
	}

	/// Overrides the token safety margin (defaults to 60 seconds).
	pub fn safety_margin(mut self, margin: Duration) -> Self {
		self.config.safety_margin = margin;

		self
	}

	/// Selects how concurrent cache misses are resolved.
	pub fn refresh_mode(mut self, mode: RefreshMode) -> Self {
		self.config.refresh_mode = mode;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ClientConfigError> {
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ClientConfigError::UnsupportedScheme { endpoint: name, url: url.to_string() });
	}
	if url.cannot_be_a_base() {
		return Err(ClientConfigError::NotABase { endpoint: name, url: url.to_string() });
	}

	Ok(())
}

fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
	let mut url = base.clone();

	{
		let mut path = url
			.path_segments_mut()
			.map_err(|_| ConfigError::InvalidEndpoint { url: base.to_string() })?;

		path.pop_if_empty().extend(segments);
	}

	Ok(url)
}

mod whole_seconds {
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer};
	use time::Duration;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.whole_seconds())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}
