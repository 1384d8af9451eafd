//! DingTalk OpenAPI client: a cached access-token core shared by robot messaging, media
//! upload, conversation lookups, streaming AI cards, and token-free webhook robots.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod issuer;
pub mod message;
pub mod obs;
pub mod webhook;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fakes for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{collections::VecDeque, sync::atomic::AtomicUsize};
	// self
	use crate::{
		auth::{Credential, TokenSecret},
		issuer::{IssueFuture, IssuedToken, TokenIssuer},
	};

	/// Scripted issuer that replays queued outcomes and counts every call.
	///
	/// Once the script runs dry the issuer mints `"<prefix>-<n>"` tokens with the fallback
	/// lifetime so concurrency tests can tell every issued value apart.
	#[derive(Debug)]
	pub struct ScriptedIssuer {
		script: Mutex<VecDeque<Result<IssuedToken>>>,
		issued: Mutex<Vec<String>>,
		calls: AtomicUsize,
		prefix: String,
		fallback_ttl: Duration,
		delay: Option<std::time::Duration>,
	}
	impl ScriptedIssuer {
		/// Creates an issuer that mints `"<prefix>-<n>"` tokens valid for `fallback_ttl`.
		pub fn minting(prefix: impl Into<String>, fallback_ttl: Duration) -> Self {
			Self {
				script: Mutex::new(VecDeque::new()),
				issued: Mutex::new(Vec::new()),
				calls: AtomicUsize::new(0),
				prefix: prefix.into(),
				fallback_ttl,
				delay: None,
			}
		}

		/// Queues an outcome that is returned before any minted token.
		pub fn push(self, outcome: Result<IssuedToken>) -> Self {
			self.script.lock().push_back(outcome);

			self
		}

		/// Queues a successful token with the given lifetime in seconds.
		pub fn push_token(self, token: &str, expires_in: i64) -> Self {
			self.push(Ok(IssuedToken {
				access_token: TokenSecret::new(token),
				expires_in: Duration::seconds(expires_in),
			}))
		}

		/// Sleeps before answering, widening race windows in concurrency tests.
		pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
			self.delay = Some(delay);

			self
		}

		/// Number of issue calls observed so far.
		pub fn calls(&self) -> usize {
			self.calls.load(std::sync::atomic::Ordering::SeqCst)
		}

		/// Every token value handed out successfully.
		pub fn issued(&self) -> Vec<String> {
			self.issued.lock().clone()
		}

		fn next_outcome(&self) -> Result<IssuedToken> {
			let n = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
			let outcome = self.script.lock().pop_front().unwrap_or_else(|| {
				Ok(IssuedToken {
					access_token: TokenSecret::new(format!("{}-{n}", self.prefix)),
					expires_in: self.fallback_ttl,
				})
			});

			if let Ok(issued) = &outcome {
				self.issued.lock().push(issued.access_token.expose().to_owned());
			}

			outcome
		}
	}
	impl TokenIssuer for ScriptedIssuer {
		fn issue<'a>(&'a self, _credential: &'a Credential) -> IssueFuture<'a> {
			Box::pin(async move {
				if let Some(delay) = self.delay {
					async_io_sleep(delay).await;
				}

				self.next_outcome()
			})
		}
	}

	/// Runtime-agnostic sleep built on a helper thread so the fake works under any executor.
	async fn async_io_sleep(delay: std::time::Duration) {
		let cell = Arc::new(async_lock::OnceCell::new());
		let setter = cell.clone();

		std::thread::spawn(move || {
			std::thread::sleep(delay);

			let _ = setter.set_blocking(());
		});

		cell.wait().await;
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
