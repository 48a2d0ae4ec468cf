pub mod error;
pub mod filter;
pub mod filtered;
pub mod hit;
pub mod reduce;
pub mod search;

pub use error::{Error, ErrorKind, Failure, Result};
pub use filter::MetadataFilter;
pub use filtered::{FilteredOutcome, FilteredSearchRequest, FilteredSearchResults};
pub use hit::{DedupKey, Hit, PageNumber};
pub use search::{SearchOutcome, SearchRequest, SearchResultItem, SearchResults};

use std::{fmt, future::Future, pin::Pin, sync::Arc};

use reqwest::Client;

use anna_config::{Config, Index};
use anna_providers::index::{self, RawHit, SearchRecordsRequest};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
	Dense,
	Sparse,
}
impl IndexKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Dense => "dense",
			Self::Sparse => "sparse",
		}
	}
}
impl fmt::Display for IndexKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

pub trait IndexProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		kind: IndexKind,
		cfg: &'a Index,
		api_key: &'a str,
		request: &'a SearchRecordsRequest,
	) -> BoxFuture<'a, anna_providers::Result<Vec<RawHit>>>;
}

/// Talks to the real index service over one reused HTTP client.
pub struct HttpIndexProvider {
	client: Client,
}
impl HttpIndexProvider {
	pub fn new(client: Client) -> Self {
		Self { client }
	}
}
impl IndexProvider for HttpIndexProvider {
	fn search<'a>(
		&'a self,
		kind: IndexKind,
		cfg: &'a Index,
		api_key: &'a str,
		request: &'a SearchRecordsRequest,
	) -> BoxFuture<'a, anna_providers::Result<Vec<RawHit>>> {
		let target = match kind {
			IndexKind::Dense => &cfg.dense,
			IndexKind::Sparse => &cfg.sparse,
		};

		Box::pin(index::search_records(&self.client, cfg, target, api_key, request))
	}
}

pub struct AnnaService {
	pub cfg: Config,
	pub provider: Arc<dyn IndexProvider>,
	api_key: Option<String>,
}
impl AnnaService {
	pub fn new(cfg: Config) -> anna_providers::Result<Self> {
		let client = anna_providers::build_client(&cfg.index)?;

		Ok(Self::with_provider(cfg, Arc::new(HttpIndexProvider::new(client))))
	}

	/// Resolves the API key once; a missing key is reported per request, not here.
	pub fn with_provider(cfg: Config, provider: Arc<dyn IndexProvider>) -> Self {
		let api_key = cfg.index.resolve_api_key();

		if api_key.is_none() {
			tracing::warn!(
				env = %cfg.index.api_key_env,
				"No vector index API key configured; searches will return configuration errors."
			);
		}

		Self { cfg, provider, api_key }
	}

	fn require_api_key(&self) -> Result<&str> {
		self.api_key.as_deref().ok_or_else(|| Error::MissingConfig {
			message: format!(
				"{} not found in environment variables and index.api_key is not set.",
				self.cfg.index.api_key_env
			),
		})
	}

	fn resolve_namespace(&self, namespace: Option<&str>) -> String {
		namespace
			.map(str::trim)
			.filter(|namespace| !namespace.is_empty())
			.unwrap_or(&self.cfg.index.namespace)
			.to_string()
	}

	async fn query_index(
		&self,
		kind: IndexKind,
		api_key: &str,
		request: &SearchRecordsRequest,
	) -> Result<Vec<Hit>> {
		let raw = self
			.provider
			.search(kind, &self.cfg.index, api_key, request)
			.await
			.map_err(|err| Error::Upstream { index: kind, message: err.to_string() })?;

		Ok(raw.into_iter().map(Hit::from_raw).collect())
	}
}
