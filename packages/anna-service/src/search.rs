use serde::{Deserialize, Serialize};

use anna_config::MAX_SEARCH_TOP_K;
use anna_providers::index::{Rerank, SearchRecordsRequest};

use crate::{
	AnnaService, Error, Failure, IndexKind, MetadataFilter, Result,
	hit::{CHUNK_FIELDS, Hit, PageNumber},
	reduce,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	pub top_k: Option<u32>,
	pub namespace: Option<String>,
	pub source_document_id: Option<String>,
}
impl SearchRequest {
	pub fn new(query: impl Into<String>) -> Self {
		Self { query: query.into(), top_k: None, namespace: None, source_document_id: None }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResultItem {
	pub source_document_id: String,
	pub page_number: PageNumber,
	pub score: f32,
	pub content: String,
	pub clauses_mentioned: Option<Vec<String>>,
	pub tables_mentioned: Option<Vec<String>>,
	pub figures_mentioned: Option<Vec<String>>,
}
impl From<Hit> for SearchResultItem {
	fn from(hit: Hit) -> Self {
		Self {
			source_document_id: hit.source_document_id,
			page_number: hit.page_number,
			score: hit.score,
			content: hit.content,
			clauses_mentioned: hit.clauses_mentioned,
			tables_mentioned: hit.tables_mentioned,
			figures_mentioned: hit.figures_mentioned,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
	pub query: String,
	pub count: usize,
	pub results: Vec<SearchResultItem>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}
impl SearchResults {
	fn empty(query: &str) -> Self {
		Self {
			query: query.to_string(),
			count: 0,
			results: Vec::new(),
			message: Some(format!("No relevant documents found for query: '{query}'")),
		}
	}
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SearchOutcome {
	#[serde(rename = "database_search_results")]
	Results(SearchResults),
	#[serde(rename = "database_search_error")]
	Error(Failure),
}

impl AnnaService {
	/// Hybrid similarity search over the dense and sparse indexes.
	///
	/// Never fails: configuration problems, bad requests and index failures come back as
	/// [`SearchOutcome::Error`]. Either index failing fails the whole request.
	pub async fn search(&self, req: SearchRequest) -> SearchOutcome {
		match self.hybrid_search(&req).await {
			Ok(results) => SearchOutcome::Results(results),
			Err(err) => {
				tracing::warn!(
					error = %err,
					query = %req.query,
					"Engineering database search failed."
				);

				SearchOutcome::Error(Failure::new(req.query, &err))
			},
		}
	}

	async fn hybrid_search(&self, req: &SearchRequest) -> Result<SearchResults> {
		let api_key = self.require_api_key()?;

		if req.query.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		let top_k = req.top_k.unwrap_or(self.cfg.search.default_top_k);

		if top_k == 0 {
			return Err(Error::InvalidRequest {
				message: "top_k must be greater than zero.".to_string(),
			});
		}

		let index_top_k = top_k.min(MAX_SEARCH_TOP_K);
		let filter = req
			.source_document_id
			.as_deref()
			.and_then(|id| MetadataFilter::for_document(id).to_filter());
		let request = SearchRecordsRequest {
			namespace: self.resolve_namespace(req.namespace.as_deref()),
			text: req.query.clone(),
			top_k: index_top_k,
			filter,
			fields: CHUNK_FIELDS.iter().map(|field| field.to_string()).collect(),
			rerank: self.rerank_directive(index_top_k),
		};
		let (dense, sparse) = tokio::try_join!(
			self.query_index(IndexKind::Dense, api_key, &request),
			self.query_index(IndexKind::Sparse, api_key, &request),
		)?;
		let (dense_count, sparse_count) = (dense.len(), sparse.len());
		let mut hits = dense;

		hits.extend(sparse);

		if hits.is_empty() {
			tracing::info!(namespace = %request.namespace, "Hybrid search returned no hits.");

			return Ok(SearchResults::empty(&req.query));
		}

		let ranked = reduce::dedup_rank(hits, index_top_k as usize);

		tracing::info!(
			namespace = %request.namespace,
			dense_hits = dense_count,
			sparse_hits = sparse_count,
			returned = ranked.len(),
			"Hybrid search completed."
		);

		let results: Vec<SearchResultItem> =
			ranked.into_iter().map(SearchResultItem::from).collect();

		Ok(SearchResults { query: req.query.clone(), count: results.len(), results, message: None })
	}

	fn rerank_directive(&self, top_n: u32) -> Option<Rerank> {
		let rerank = &self.cfg.search.rerank;

		rerank.enabled.then(|| Rerank {
			model: rerank.model.clone(),
			top_n,
			rank_fields: rerank.rank_fields.clone(),
		})
	}
}
