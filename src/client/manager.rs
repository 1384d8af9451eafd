// self
use crate::{
	_prelude::*,
	auth::Credential,
	client::DingTalkClient,
	config::ClientConfig,
	http::ReqwestHttpClient,
};

/// Registry of clients keyed by client id, for services that host several applications.
#[derive(Debug)]
pub struct ClientManager {
	http_client: ReqwestHttpClient,
	config: Arc<ClientConfig>,
	clients: RwLock<HashMap<String, Arc<DingTalkClient>>>,
}
impl ClientManager {
	/// Builds one client per credential with the default configuration.
	pub fn new(credentials: impl IntoIterator<Item = Credential>) -> Self {
		Self::with_config(credentials, ClientConfig::default(), ReqwestHttpClient::default())
	}

	/// Builds one client per credential, all sharing `config` and `http_client`.
	///
	/// A later credential with the same client id replaces an earlier one.
	pub fn with_config(
		credentials: impl IntoIterator<Item = Credential>,
		config: impl Into<Arc<ClientConfig>>,
		http_client: ReqwestHttpClient,
	) -> Self {
		let manager =
			Self { http_client, config: config.into(), clients: RwLock::new(HashMap::new()) };

		for credential in credentials {
			manager.register(credential);
		}

		manager
	}

	/// Looks up the client for `client_id`.
	pub fn client(&self, client_id: &str) -> Option<Arc<DingTalkClient>> {
		self.clients.read().get(client_id).cloned()
	}

	/// Builds and registers a client for `credential`, returning the one it replaced.
	pub fn register(&self, credential: Credential) -> Option<Arc<DingTalkClient>> {
		let client = DingTalkClient::with_http_client(
			credential,
			self.config.clone(),
			self.http_client.clone(),
		);

		self.insert(client)
	}

	/// Registers a prebuilt client, returning the one it replaced.
	pub fn insert(&self, client: DingTalkClient) -> Option<Arc<DingTalkClient>> {
		let client_id = client.credential().client_id().to_owned();

		self.clients.write().insert(client_id, Arc::new(client))
	}

	/// Registered client ids in arbitrary order.
	pub fn client_ids(&self) -> Vec<String> {
		self.clients.read().keys().cloned().collect()
	}

	/// Number of registered clients.
	pub fn len(&self) -> usize {
		self.clients.read().len()
	}

	/// Returns `true` when no client is registered.
	pub fn is_empty(&self) -> bool {
		self.clients.read().is_empty()
	}
}
