//! Cached access-token record and freshness checks.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access token plus the instants that bound its validity.
///
/// Both instants are replaced together with the token on every successful fetch, so a
/// snapshot always describes a single issuance.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
	/// Bearer token handed to downstream requests.
	pub access_token: TokenSecret,
	/// Instant the cache stored the token.
	pub issued_at: OffsetDateTime,
	/// `issued_at` plus the issuer-reported lifetime.
	pub expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Returns `true` while `now + margin` is strictly before the expiry instant.
	pub fn is_fresh_at(&self, now: OffsetDateTime, margin: Duration) -> bool {
		if self.access_token.is_empty() {
			return false;
		}

		match now.checked_add(margin) {
			Some(deadline) => deadline < self.expires_at,
			None => false,
		}
	}

	/// Time left before the expiry instant (negative once expired).
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		self.expires_at - now
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn token(expires_in: i64) -> CachedToken {
		let issued_at = datetime!(2025-01-01 00:00 UTC);

		CachedToken {
			access_token: TokenSecret::new("TOK1"),
			issued_at,
			expires_at: issued_at + Duration::seconds(expires_in),
		}
	}

	#[test]
	fn freshness_respects_margin_boundary() {
		let record = token(7200);
		let margin = Duration::seconds(60);

		assert!(record.is_fresh_at(record.issued_at, margin));
		assert!(record.is_fresh_at(record.issued_at + Duration::seconds(7139), margin));
		assert!(!record.is_fresh_at(record.issued_at + Duration::seconds(7140), margin));
		assert!(!record.is_fresh_at(record.issued_at + Duration::seconds(9000), margin));
	}

	#[test]
	fn short_lifetimes_are_never_fresh() {
		let record = token(30);

		assert!(!record.is_fresh_at(record.issued_at, Duration::seconds(60)));
		assert!(record.is_fresh_at(record.issued_at, Duration::ZERO));
	}

	#[test]
	fn empty_tokens_are_never_fresh() {
		let mut record = token(7200);

		record.access_token = TokenSecret::new("");

		assert!(!record.is_fresh_at(record.issued_at, Duration::seconds(60)));
	}

	#[test]
	fn debug_redacts_token() {
		let debug = format!("{:?}", token(10));

		assert!(!debug.contains("TOK1"));
		assert_eq!(token(10).remaining_at(token(10).issued_at), Duration::seconds(10));
	}
}
