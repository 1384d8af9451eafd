//! Access-token cache with a freshness margin and optional singleflight refreshes.
//!
//! [`TokenCache::access_token`] answers from memory while `now + safety_margin` is before the
//! cached expiry. On a miss it releases the lock, asks its [`TokenIssuer`] for a new token,
//! and then replaces the token/expiry pair in one write, so readers never see a torn pair.
//!
//! In [`RefreshMode::Independent`] (the default) every concurrent miss issues its own
//! request and the last writer wins. [`RefreshMode::SingleFlight`] funnels misses through one
//! async guard; waiters re-check the cache after acquiring it and reuse the fresh token.

mod metrics;

pub use metrics::CacheMetrics;

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, Credential, TokenSecret},
	clock::{Clock, SystemClock},
	error::DecodeError,
	issuer::TokenIssuer,
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Strategy for resolving concurrent cache misses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
	/// Every miss fetches on its own; redundant requests are possible under a cold cache.
	#[default]
	Independent,
	/// Misses wait for one in-flight fetch and share its result.
	SingleFlight,
}

/// In-memory cache for one credential's access token.
pub struct TokenCache {
	credential: Credential,
	issuer: Arc<dyn TokenIssuer>,
	clock: Arc<dyn Clock>,
	safety_margin: Duration,
	refresh_mode: RefreshMode,
	slot: Mutex<Option<CachedToken>>,
	flight: AsyncMutex<()>,
	metrics: CacheMetrics,
}
impl TokenCache {
	/// Default window before expiry in which a cached token counts as stale.
	pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(60);

	/// Creates an empty cache for `credential`, refreshed through `issuer`.
	pub fn new(credential: Credential, issuer: Arc<dyn TokenIssuer>) -> Self {
		Self {
			credential,
			issuer,
			clock: Arc::new(SystemClock),
			safety_margin: Self::DEFAULT_SAFETY_MARGIN,
			refresh_mode: RefreshMode::default(),
			slot: Mutex::new(None),
			flight: AsyncMutex::new(()),
			metrics: CacheMetrics::default(),
		}
	}

	/// Replaces the time source.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Overrides the safety margin; negative values clamp to zero.
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Selects how concurrent misses are resolved.
	pub fn with_refresh_mode(mut self, mode: RefreshMode) -> Self {
		self.refresh_mode = mode;

		self
	}

	/// Credential this cache fetches tokens for.
	pub fn credential(&self) -> &Credential {
		&self.credential
	}

	/// Configured safety margin.
	pub fn safety_margin(&self) -> Duration {
		self.safety_margin
	}

	/// Configured refresh mode.
	pub fn refresh_mode(&self) -> RefreshMode {
		self.refresh_mode
	}

	/// Hit/miss/fetch counters.
	pub fn metrics(&self) -> &CacheMetrics {
		&self.metrics
	}

	/// Snapshot of the cached token, fresh or not.
	pub fn cached(&self) -> Option<CachedToken> {
		self.slot.lock().clone()
	}

	/// Returns a token that stays valid for at least the safety margin, fetching one when the
	/// cache is empty or stale.
	///
	/// Issuer failures propagate unchanged and leave the previous cache contents in place.
	pub async fn access_token(&self) -> Result<TokenSecret> {
		const KIND: OpKind = OpKind::AccessToken;

		let span = OpSpan::for_client(KIND, "access_token", self.credential.client_id());

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				if let Some(token) = self.fresh_token() {
					self.metrics.record_hit();

					return Ok(token);
				}

				self.metrics.record_miss();

				match self.refresh_mode {
					RefreshMode::Independent => self.fetch_and_store().await,
					RefreshMode::SingleFlight => {
						let _singleflight = self.flight.lock().await;

						if let Some(token) = self.fresh_token() {
							self.metrics.record_coalesced();

							return Ok(token);
						}

						self.fetch_and_store().await
					},
				}
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	/// Fetches a new token even if the cached one is still fresh.
	pub async fn force_refresh(&self) -> Result<TokenSecret> {
		const KIND: OpKind = OpKind::AccessToken;

		let span = OpSpan::for_client(KIND, "force_refresh", self.credential.client_id());

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				match self.refresh_mode {
					RefreshMode::Independent => self.fetch_and_store().await,
					RefreshMode::SingleFlight => {
						let _singleflight = self.flight.lock().await;

						self.fetch_and_store().await
					},
				}
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	fn fresh_token(&self) -> Option<TokenSecret> {
		let now = self.clock.now();
		let slot = self.slot.lock();

		slot.as_ref()
			.filter(|cached| cached.is_fresh_at(now, self.safety_margin))
			.map(|cached| cached.access_token.clone())
	}

	async fn fetch_and_store(&self) -> Result<TokenSecret> {
		self.metrics.record_fetch();

		let issued = self.issuer.issue(&self.credential).await.inspect_err(|_e| {
			self.metrics.record_failure();
			obs::record_token_fetch(OpOutcome::Failure);

			#[cfg(feature = "tracing")]
			tracing::warn!(client_id = self.credential.client_id(), error = %_e, "token fetch failed");
		})?;
		let issued_at = self.clock.now();
		let expires_at = issued_at.checked_add(issued.expires_in).ok_or_else(|| {
			self.metrics.record_failure();
			obs::record_token_fetch(OpOutcome::Failure);

			DecodeError::ExpiresInOutOfRange
		})?;

		#[cfg(feature = "tracing")]
		tracing::debug!(
			client_id = self.credential.client_id(),
			expires_in = issued.expires_in.whole_seconds(),
			"access token refreshed"
		);

		obs::record_token_fetch(OpOutcome::Success);

		*self.slot.lock() = Some(CachedToken {
			access_token: issued.access_token.clone(),
			issued_at,
			expires_at,
		});

		Ok(issued.access_token)
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("credential", &self.credential)
			.field("safety_margin", &self.safety_margin)
			.field("refresh_mode", &self.refresh_mode)
			.field("cached", &self.slot.lock().is_some())
			.finish()
	}
}
