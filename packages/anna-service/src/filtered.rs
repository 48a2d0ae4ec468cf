//! Exact metadata retrieval that rebuilds a document passage in reading order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use anna_providers::index::SearchRecordsRequest;

use crate::{
	AnnaService, Error, Failure, IndexKind, MetadataFilter, Result,
	hit::{CHUNK_FIELDS, Hit},
};

pub const CHUNK_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilteredSearchRequest {
	pub query: String,
	pub top_k: Option<u32>,
	pub namespace: Option<String>,
	#[serde(flatten)]
	pub filter: MetadataFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredSearchResults {
	pub query: String,
	pub filters_applied: String,
	pub concatenated_content: String,
	pub chunk_count: usize,
	pub pages_covered: Vec<i64>,
	pub all_clauses_mentioned: Vec<String>,
	pub all_tables_mentioned: Vec<String>,
	pub all_figures_mentioned: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum FilteredOutcome {
	#[serde(rename = "filtered_search_results")]
	Results(FilteredSearchResults),
	#[serde(rename = "filtered_search_error")]
	Error(Failure),
}

/// Orders chunks by `(page, index within page)` and folds them into one block of text.
///
/// Every chunk is kept, including repeats of the same page.
pub fn concatenate(
	query: &str,
	filters_applied: &str,
	mut hits: Vec<Hit>,
) -> FilteredSearchResults {
	if hits.is_empty() {
		return FilteredSearchResults {
			query: query.to_string(),
			filters_applied: filters_applied.to_string(),
			concatenated_content: String::new(),
			chunk_count: 0,
			pages_covered: Vec::new(),
			all_clauses_mentioned: Vec::new(),
			all_tables_mentioned: Vec::new(),
			all_figures_mentioned: Vec::new(),
			message: Some(format!("No chunks matched filters: {filters_applied}")),
		};
	}

	hits.sort_by(Hit::reading_order);

	let mut pages = BTreeSet::new();
	let mut clauses = BTreeSet::new();
	let mut tables = BTreeSet::new();
	let mut figures = BTreeSet::new();

	for hit in &hits {
		if let Some(page) = hit.page_number.known() {
			pages.insert(page);
		}

		clauses.extend(hit.clauses_mentioned.iter().flatten().cloned());
		tables.extend(hit.tables_mentioned.iter().flatten().cloned());
		figures.extend(hit.figures_mentioned.iter().flatten().cloned());
	}

	let concatenated_content =
		hits.iter().map(|hit| hit.content.as_str()).collect::<Vec<_>>().join(CHUNK_SEPARATOR);

	FilteredSearchResults {
		query: query.to_string(),
		filters_applied: filters_applied.to_string(),
		concatenated_content,
		chunk_count: hits.len(),
		pages_covered: pages.into_iter().collect(),
		all_clauses_mentioned: clauses.into_iter().collect(),
		all_tables_mentioned: tables.into_iter().collect(),
		all_figures_mentioned: figures.into_iter().collect(),
		message: None,
	}
}

impl AnnaService {
	/// Fetches every chunk matching the filter from the dense index, without reranking.
	pub async fn filtered_search(&self, req: FilteredSearchRequest) -> FilteredOutcome {
		match self.run_filtered_search(&req).await {
			Ok(results) => FilteredOutcome::Results(results),
			Err(err) => {
				tracing::warn!(
					error = %err,
					filters = %req.filter.describe(),
					"Filtered search failed."
				);

				FilteredOutcome::Error(Failure::new(req.query, &err))
			},
		}
	}

	async fn run_filtered_search(
		&self,
		req: &FilteredSearchRequest,
	) -> Result<FilteredSearchResults> {
		let api_key = self.require_api_key()?;
		let Some(filter) = req.filter.to_filter() else {
			return Err(Error::InvalidRequest {
				message: "At least one metadata filter is required.".to_string(),
			});
		};
		let top_k = req.top_k.unwrap_or(self.cfg.filtered.default_top_k);

		if top_k == 0 {
			return Err(Error::InvalidRequest {
				message: "top_k must be greater than zero.".to_string(),
			});
		}

		let text = if req.query.trim().is_empty() {
			self.cfg.filtered.placeholder_query.clone()
		} else {
			req.query.clone()
		};
		let request = SearchRecordsRequest {
			namespace: self.resolve_namespace(req.namespace.as_deref()),
			text,
			top_k,
			filter: Some(filter),
			fields: CHUNK_FIELDS.iter().map(|field| field.to_string()).collect(),
			rerank: None,
		};
		let hits = self.query_index(IndexKind::Dense, api_key, &request).await?;
		let filters_applied = req.filter.describe();

		tracing::info!(
			namespace = %request.namespace,
			filters = %filters_applied,
			chunks = hits.len(),
			"Filtered search completed."
		);

		Ok(concatenate(&req.query, &filters_applied, hits))
	}
}
