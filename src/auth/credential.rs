//! Application credential (`AppKey` + `AppSecret`) identifying one DingTalk app registration.

// self
use crate::{_prelude::*, auth::TokenSecret};

const CLIENT_ID_MAX_LEN: usize = 128;

/// Error returned when credential validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum CredentialError {
	/// The client identifier was empty or whitespace.
	#[error("Client ID cannot be empty.")]
	EmptyClientId,
	/// The client secret was empty or whitespace.
	#[error("Client secret cannot be empty.")]
	EmptyClientSecret,
	/// The client identifier contains whitespace.
	#[error("Client ID cannot contain whitespace.")]
	ClientIdContainsWhitespace,
	/// The client identifier exceeds the allowed character count.
	#[error("Client ID exceeds {max} characters.")]
	ClientIdTooLong {
		/// Maximum allowed characters.
		max: usize,
	},
}

/// Immutable client identifier + secret pair.
///
/// Created once per client and never mutated. The secret is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCredential")]
pub struct Credential {
	client_id: String,
	client_secret: TokenSecret,
}
impl Credential {
	/// Validates and builds a credential.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, CredentialError> {
		let client_id = client_id.into();
		let client_secret = client_secret.into();

		if client_id.trim().is_empty() {
			return Err(CredentialError::EmptyClientId);
		}
		if client_id.chars().any(char::is_whitespace) {
			return Err(CredentialError::ClientIdContainsWhitespace);
		}
		if client_id.chars().count() > CLIENT_ID_MAX_LEN {
			return Err(CredentialError::ClientIdTooLong { max: CLIENT_ID_MAX_LEN });
		}
		if client_secret.trim().is_empty() {
			return Err(CredentialError::EmptyClientSecret);
		}

		Ok(Self { client_id, client_secret: TokenSecret::new(client_secret) })
	}

	/// Client identifier (`AppKey`).
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Client secret (`AppSecret`). Callers must avoid logging it.
	pub fn client_secret(&self) -> &TokenSecret {
		&self.client_secret
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.finish()
	}
}
impl TryFrom<RawCredential> for Credential {
	type Error = CredentialError;

	fn try_from(raw: RawCredential) -> Result<Self, Self::Error> {
		Self::new(raw.client_id, raw.client_secret)
	}
}

#[derive(Deserialize)]
struct RawCredential {
	client_id: String,
	client_secret: String,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn credential_keeps_fields_and_redacts_secret() {
		let credential = Credential::new("test_client_id", "test_client_secret")
			.expect("Credential fixture should be valid.");

		assert_eq!(credential.client_id(), "test_client_id");
		assert_eq!(credential.client_secret().expose(), "test_client_secret");

		let debug = format!("{credential:?}");

		assert!(debug.contains("test_client_id"));
		assert!(!debug.contains("test_client_secret"));
	}

	#[test]
	fn credential_rejects_blank_parts() {
		assert_eq!(Credential::new(" ", "secret"), Err(CredentialError::EmptyClientId));
		assert_eq!(Credential::new("id", ""), Err(CredentialError::EmptyClientSecret));
		assert_eq!(
			Credential::new("ding key", "secret"),
			Err(CredentialError::ClientIdContainsWhitespace)
		);
		assert!(matches!(
			Credential::new("x".repeat(CLIENT_ID_MAX_LEN + 1), "secret"),
			Err(CredentialError::ClientIdTooLong { .. })
		));
	}

	#[test]
	fn credential_deserializes_with_validation() {
		let credential: Credential =
			serde_json::from_str("{\"client_id\":\"abc\",\"client_secret\":\"xyz\"}")
				.expect("Valid credential JSON should decode.");

		assert_eq!(credential.client_id(), "abc");

		let err = serde_json::from_str::<Credential>("{\"client_id\":\"\",\"client_secret\":\"xyz\"}")
			.expect_err("Empty client id should be rejected.");

		assert!(err.to_string().contains("Client ID cannot be empty"));
	}
}
