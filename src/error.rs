//! Client-level error types shared by the token cache and every OpenAPI call.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration or request-construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body did not match the expected schema.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// DingTalk answered but reported a non-zero `errcode`.
	#[error("DingTalk API returned errcode {code}: {message}.")]
	RemoteApi {
		/// Platform error code.
		code: i64,
		/// Platform-supplied message, passed through verbatim.
		message: String,
	},
	/// A `v1.0` REST endpoint answered with a non-success HTTP status.
	#[error("DingTalk API responded with HTTP {status}: {message}.")]
	HttpStatus {
		/// HTTP status code.
		status: u16,
		/// Platform error code string, when the body carried one.
		code: Option<String>,
		/// Platform message, or the raw body when it could not be parsed.
		message: String,
	},
}
impl Error {
	/// Returns the platform message for [`Error::RemoteApi`] and [`Error::HttpStatus`].
	pub fn remote_message(&self) -> Option<&str> {
		match self {
			Self::RemoteApi { message, .. } | Self::HttpStatus { message, .. } => Some(message),
			_ => None,
		}
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Endpoint base URL cannot carry path segments.
	#[error("Endpoint `{url}` cannot be used as a base URL.")]
	InvalidEndpoint {
		/// Offending endpoint URL.
		url: String,
	},
	/// Webhook URL could not be parsed.
	#[error("Webhook URL is invalid.")]
	InvalidWebhook {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request payload could not be serialized.
	#[error("Request body could not be encoded as JSON.")]
	RequestEncode {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Media mime type was rejected by the multipart encoder.
	#[error("Mime type `{mime}` is invalid.")]
	InvalidMimeType {
		/// Rejected mime type.
		mime: String,
		/// Underlying validation failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Endpoint path that was being called.
		endpoint: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded its per-attempt deadline.
	#[error("Request to {endpoint} timed out.")]
	Timeout {
		/// Endpoint path that was being called.
		endpoint: String,
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Classifies a reqwest failure for the given endpoint.
	pub fn from_reqwest(endpoint: impl Into<String>, e: ReqwestError) -> Self {
		let endpoint = endpoint.into();

		if e.is_timeout() {
			Self::Timeout { endpoint, source: Box::new(e) }
		} else {
			Self::Network { endpoint, source: Box::new(e) }
		}
	}

	/// Returns `true` when the failure was a deadline expiry.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body was not valid JSON for the expected shape.
	#[error("Response body is malformed for the expected schema.")]
	Json {
		/// Structured parsing failure carrying the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: Option<u16>,
	},
	/// A field required on success was absent or empty.
	#[error("Response body is missing the `{field}` field.")]
	MissingField {
		/// Missing field name.
		field: &'static str,
	},
	/// The reported lifetime cannot be represented as an expiry instant.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn remote_api_error_passes_message_through() {
		let err = Error::RemoteApi { code: 40001, message: "invalid appkey".into() };

		assert_eq!(err.remote_message(), Some("invalid appkey"));
		assert!(err.to_string().contains("invalid appkey"));
		assert!(err.to_string().contains("40001"));
	}

	#[test]
	fn decode_error_exposes_json_path() {
		let mut de = serde_json::Deserializer::from_str("{\"errcode\":\"nope\"}");
		let source = serde_path_to_error::deserialize::<_, crate::http::ErrorEnvelope>(&mut de)
			.expect_err("A string errcode should fail to decode.");

		assert_eq!(source.path().to_string(), "errcode");

		let err: Error = DecodeError::Json { source, status: Some(200) }.into();

		assert!(matches!(err, Error::Decode(DecodeError::Json { status: Some(200), .. })));
		assert!(StdError::source(&err).is_some());
	}
}
