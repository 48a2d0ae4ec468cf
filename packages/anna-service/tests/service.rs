use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use anna_config::{Config, Filtered, Index, IndexTarget, Rerank, Search, Service};
use anna_providers::index::{RawHit, SearchRecordsRequest};
use anna_service::{
	AnnaService, BoxFuture, ErrorKind, FilteredOutcome, FilteredSearchRequest, IndexKind,
	IndexProvider, MetadataFilter, PageNumber, SearchOutcome, SearchRequest,
};

#[derive(Default)]
struct FakeIndex {
	dense: Vec<RawHit>,
	sparse: Vec<RawHit>,
	failing: Option<IndexKind>,
	calls: Mutex<Vec<(IndexKind, SearchRecordsRequest)>>,
}
impl FakeIndex {
	fn new(dense: Vec<RawHit>, sparse: Vec<RawHit>) -> Self {
		Self { dense, sparse, ..Default::default() }
	}

	fn calls(&self) -> Vec<(IndexKind, SearchRecordsRequest)> {
		self.calls.lock().expect("Lock poisoned.").clone()
	}
}
impl IndexProvider for FakeIndex {
	fn search<'a>(
		&'a self,
		kind: IndexKind,
		_cfg: &'a Index,
		_api_key: &'a str,
		request: &'a SearchRecordsRequest,
	) -> BoxFuture<'a, anna_providers::Result<Vec<RawHit>>> {
		self.calls.lock().expect("Lock poisoned.").push((kind, request.clone()));

		let result = if self.failing == Some(kind) {
			Err(anna_providers::Error::InvalidResponse {
				message: "index unavailable".to_string(),
			})
		} else {
			let source = match kind {
				IndexKind::Dense => &self.dense,
				IndexKind::Sparse => &self.sparse,
			};

			Ok(source
				.iter()
				.filter(|hit| {
					request.filter.as_ref().is_none_or(|filter| matches(filter, &hit.fields))
				})
				.take(request.top_k as usize)
				.cloned()
				.collect())
		};

		Box::pin(async move { result })
	}
}

/// Evaluates the `$eq` / `$in` / `$and` subset of the filter language.
fn matches(filter: &Value, fields: &Map<String, Value>) -> bool {
	let Some(obj) = filter.as_object() else {
		return false;
	};

	obj.iter().all(|(key, condition)| {
		if key == "$and" {
			return condition
				.as_array()
				.is_some_and(|parts| parts.iter().all(|part| matches(part, fields)));
		}

		let value = fields.get(key);

		if let Some(expected) = condition.get("$eq") {
			return value.is_some_and(|value| {
				value.as_f64().zip(expected.as_f64()).map_or(value == expected, |(a, b)| a == b)
			});
		}
		if let Some(options) = condition.get("$in").and_then(Value::as_array) {
			return match value {
				Some(Value::Array(items)) => items.iter().any(|item| options.contains(item)),
				Some(other) => options.contains(other),
				None => false,
			};
		}

		false
	})
}

fn raw(doc: &str, page: i64, score: f32, text: &str) -> RawHit {
	raw_with(doc, page, score, serde_json::json!({ "chunk_text": text }))
}

fn raw_with(doc: &str, page: i64, score: f32, extra: Value) -> RawHit {
	let mut fields = extra.as_object().cloned().unwrap_or_default();

	fields.insert("source_document_id".to_string(), Value::from(doc));
	fields.insert("page_number".to_string(), Value::from(page));

	RawHit { id: format!("{doc}-{page}-{score}"), score, fields }
}

fn test_config(api_key: Option<&str>) -> Config {
	Config {
		service: Service { log_level: "info".to_string() },
		index: Index {
			api_key: api_key.map(str::to_string),
			api_key_env: "ANNA_SERVICE_TEST_UNSET_API_KEY".to_string(),
			api_version: "2025-04".to_string(),
			namespace: "anna-medical-namespace".to_string(),
			timeout_ms: 1_000,
			default_headers: Map::new(),
			dense: IndexTarget {
				name: "anna-medical".to_string(),
				host: "http://127.0.0.1:1".to_string(),
			},
			sparse: IndexTarget {
				name: "anna-medical-sparse".to_string(),
				host: "http://127.0.0.1:1".to_string(),
			},
		},
		search: Search {
			default_top_k: 5,
			rerank: Rerank {
				enabled: true,
				model: "bge-reranker-v2-m3".to_string(),
				rank_fields: vec!["chunk_text".to_string()],
			},
		},
		filtered: Filtered { default_top_k: 100, placeholder_query: "document".to_string() },
	}
}

fn service(index: Arc<FakeIndex>) -> AnnaService {
	AnnaService::with_provider(test_config(Some("test-key")), index)
}

fn search_request(query: &str, top_k: u32) -> SearchRequest {
	SearchRequest { top_k: Some(top_k), ..SearchRequest::new(query) }
}

fn expect_results(outcome: SearchOutcome) -> anna_service::SearchResults {
	match outcome {
		SearchOutcome::Results(results) => results,
		SearchOutcome::Error(failure) => panic!("Expected results, got {failure:?}."),
	}
}

#[tokio::test]
async fn duplicate_pages_keep_the_dense_hit() {
	let index = Arc::new(FakeIndex::new(
		vec![raw("AS4100", 1, 0.7, "dense copy")],
		vec![raw("AS4100", 1, 0.9, "sparse copy"), raw("AS4100", 2, 0.8, "page two")],
	));
	let results = expect_results(service(index).search(search_request("clause 6.3", 5)).await);

	assert_eq!(results.count, 2);
	assert_eq!(results.results[0].page_number, PageNumber::Known(2));
	assert_eq!(results.results[1].content, "dense copy");
	assert_eq!(results.results[1].score, 0.7);
}

#[tokio::test]
async fn truncation_happens_after_sorting() {
	let index = Arc::new(FakeIndex::new(
		vec![raw("A", 1, 0.9, "a")],
		vec![raw("A", 1, 0.95, "a again"), raw("B", 2, 0.99, "b")],
	));
	let results = expect_results(service(index).search(search_request("q", 2)).await);
	let ranked: Vec<_> = results
		.results
		.iter()
		.map(|item| (item.source_document_id.as_str(), item.page_number, item.score))
		.collect();

	assert_eq!(ranked, vec![("B", PageNumber::Known(2), 0.99), ("A", PageNumber::Known(1), 0.9)]);
}

#[tokio::test]
async fn results_are_sorted_and_bounded_by_ceiling() {
	let dense = (0..10).map(|page| raw("D", page, page as f32 / 10.0, "dense")).collect();
	let sparse = (0..10).map(|page| raw("S", page, page as f32 / 7.0, "sparse")).collect();
	let index = Arc::new(FakeIndex::new(dense, sparse));
	let results = expect_results(service(index.clone()).search(search_request("q", 50)).await);

	assert_eq!(results.count, 10);
	assert!(results.results.windows(2).all(|pair| pair[0].score >= pair[1].score));

	for (_, request) in index.calls() {
		assert_eq!(request.top_k, 10);
		assert_eq!(request.rerank.as_ref().map(|rerank| rerank.top_n), Some(10));
	}
}

#[tokio::test]
async fn both_indexes_receive_the_same_request() {
	let index = Arc::new(FakeIndex::new(
		vec![raw("AS4100", 3, 0.5, "x"), raw("OTHER", 3, 0.6, "y")],
		Vec::new(),
	));
	let request = SearchRequest {
		top_k: Some(3),
		namespace: Some("corpus-data".to_string()),
		source_document_id: Some("AS4100".to_string()),
		..SearchRequest::new("Table 5.6.1")
	};
	let results = expect_results(service(index.clone()).search(request).await);
	let calls = index.calls();

	assert_eq!(results.count, 1);
	assert_eq!(results.results[0].source_document_id, "AS4100");
	assert_eq!(calls.len(), 2);
	assert!(calls.iter().any(|(kind, _)| *kind == IndexKind::Dense));
	assert!(calls.iter().any(|(kind, _)| *kind == IndexKind::Sparse));

	for (_, request) in calls {
		assert_eq!(request.text, "Table 5.6.1");
		assert_eq!(request.namespace, "corpus-data");
		assert_eq!(
			request.filter,
			Some(serde_json::json!({ "source_document_id": { "$eq": "AS4100" } }))
		);
	}
}

#[tokio::test]
async fn empty_indexes_return_a_no_results_message() {
	let index = Arc::new(FakeIndex::default());
	let outcome = service(index).search(SearchRequest::new("unknown clause")).await;
	let json = serde_json::to_value(&outcome).expect("Failed to serialize outcome.");

	assert_eq!(json["type"], "database_search_results");
	assert_eq!(json["count"], 0);
	assert_eq!(json["results"], serde_json::json!([]));
	assert_eq!(json["message"], "No relevant documents found for query: 'unknown clause'");
}

#[tokio::test]
async fn missing_api_key_fails_before_any_index_call() {
	let index = Arc::new(FakeIndex::new(vec![raw("A", 1, 0.5, "a")], Vec::new()));
	let service = AnnaService::with_provider(test_config(None), index.clone());
	let outcome = service.search(SearchRequest::new("q")).await;

	match outcome {
		SearchOutcome::Error(failure) => {
			assert_eq!(failure.kind, ErrorKind::Configuration);
			assert!(failure.error.contains("ANNA_SERVICE_TEST_UNSET_API_KEY"), "{}", failure.error);
		},
		SearchOutcome::Results(results) => panic!("Expected configuration error, got {results:?}."),
	}

	assert!(index.calls().is_empty());
}

#[tokio::test]
async fn sparse_failure_fails_the_whole_request() {
	let index = Arc::new(FakeIndex {
		dense: vec![raw("A", 1, 0.5, "a")],
		failing: Some(IndexKind::Sparse),
		..Default::default()
	});
	let outcome = service(index).search(SearchRequest::new("q")).await;
	let json = serde_json::to_value(&outcome).expect("Failed to serialize outcome.");

	assert_eq!(json["type"], "database_search_error");
	assert_eq!(json["kind"], "upstream");
	assert_eq!(json["query"], "q");
	assert!(
		json["error"].as_str().is_some_and(|error| error.contains("sparse index")
			&& error.contains("index unavailable")),
		"{json}"
	);
}

#[tokio::test]
async fn dense_failure_fails_the_whole_request() {
	let index = Arc::new(FakeIndex {
		sparse: vec![raw("A", 1, 0.5, "a")],
		failing: Some(IndexKind::Dense),
		..Default::default()
	});
	let outcome = service(index.clone()).search(SearchRequest::new("q")).await;

	match outcome {
		SearchOutcome::Error(failure) => {
			assert_eq!(failure.kind, ErrorKind::Upstream);
			assert!(failure.error.contains("dense index"), "{}", failure.error);
			assert!(!failure.error.contains("sparse index"), "{}", failure.error);
		},
		SearchOutcome::Results(results) => panic!("Expected upstream error, got {results:?}."),
	}

	assert!(index.calls().iter().any(|(kind, _)| *kind == IndexKind::Dense));
}

#[tokio::test]
async fn failed_request_does_not_affect_the_next_one() {
	let index = Arc::new(FakeIndex::new(vec![raw("A", 1, 0.5, "a")], Vec::new()));
	let service = service(index);
	let first = service.search(SearchRequest::new("   ")).await;
	let second = service.search(SearchRequest::new("q")).await;

	assert!(matches!(
		first,
		SearchOutcome::Error(ref failure) if failure.kind == ErrorKind::InvalidRequest
	));
	assert_eq!(expect_results(second).count, 1);
}

#[tokio::test]
async fn unknown_pages_serialize_as_sentinel() {
	let mut hit = raw("A", 1, 0.5, "a");

	hit.fields.remove("page_number");

	let index = Arc::new(FakeIndex::new(vec![hit], Vec::new()));
	let outcome = service(index).search(SearchRequest::new("q")).await;
	let json = serde_json::to_value(&outcome).expect("Failed to serialize outcome.");

	assert_eq!(json["results"][0]["page_number"], "Unknown Page");
	assert_eq!(json["results"][0]["clauses_mentioned"], Value::Null);
}

#[tokio::test]
async fn filtered_search_rebuilds_reading_order_with_placeholder_query() {
	let index = Arc::new(FakeIndex::new(
		vec![
			raw_with(
				"AS4100",
				5,
				0.9,
				serde_json::json!({
					"chunk_text": "5-1",
					"chunk_index_in_page": 1,
					"clauses_mentioned": ["6.3.3"]
				}),
			),
			raw_with(
				"AS4100",
				3,
				0.8,
				serde_json::json!({ "chunk_text": "3-0", "chunk_index_in_page": 0 }),
			),
			raw_with(
				"AS4100",
				5,
				0.7,
				serde_json::json!({
					"chunk_text": "5-0",
					"chunk_index_in_page": 0,
					"clauses_mentioned": ["6.3.1"]
				}),
			),
			raw_with(
				"AS4100",
				4,
				0.6,
				serde_json::json!({ "chunk_text": "4-0", "chunk_index_in_page": 0 }),
			),
		],
		Vec::new(),
	));
	let mut request = FilteredSearchRequest {
		filter: MetadataFilter { page_number: Some(5), ..Default::default() },
		..Default::default()
	};
	let outcome = service(index.clone()).filtered_search(request.clone()).await;
	let FilteredOutcome::Results(results) = outcome else {
		panic!("Expected filtered results.");
	};

	assert_eq!(results.concatenated_content, "5-0\n\n5-1");
	assert_eq!(results.pages_covered, vec![5]);
	assert_eq!(results.all_clauses_mentioned, vec!["6.3.1".to_string(), "6.3.3".to_string()]);
	assert_eq!(results.filters_applied, "page_number=5");

	let calls = index.calls();

	assert_eq!(calls.len(), 1);
	assert_eq!(calls[0].0, IndexKind::Dense);
	assert_eq!(calls[0].1.text, "document");
	assert_eq!(calls[0].1.top_k, 100);
	assert!(calls[0].1.rerank.is_none());

	request.filter.page_number = None;
	request.filter.source_document_id = Some("AS4100".to_string());

	let FilteredOutcome::Results(results) = service(index).filtered_search(request).await else {
		panic!("Expected filtered results.");
	};

	assert_eq!(results.concatenated_content, "3-0\n\n4-0\n\n5-0\n\n5-1");
	assert_eq!(results.pages_covered, vec![3, 4, 5]);
}

#[tokio::test]
async fn filtered_search_matches_any_listed_reference() {
	let index = Arc::new(FakeIndex::new(
		vec![
			raw_with(
				"AS4100",
				2,
				0.1,
				serde_json::json!({ "chunk_text": "t1", "tables_mentioned": ["Table 6.3.3"] }),
			),
			raw_with(
				"AS4100",
				1,
				0.1,
				serde_json::json!({ "chunk_text": "t2", "tables_mentioned": ["Table 5.6.1"] }),
			),
			raw_with("AS4100", 3, 0.1, serde_json::json!({ "chunk_text": "none" })),
		],
		Vec::new(),
	));
	let request = FilteredSearchRequest {
		query: "capacity factors".to_string(),
		filter: MetadataFilter {
			tables_mentioned: vec!["Table 6.3.3".to_string(), "Table 5.6.1".to_string()],
			..Default::default()
		},
		..Default::default()
	};
	let outcome = service(index.clone()).filtered_search(request).await;
	let json = serde_json::to_value(&outcome).expect("Failed to serialize outcome.");

	assert_eq!(json["type"], "filtered_search_results");
	assert_eq!(json["chunk_count"], 2);
	assert_eq!(json["concatenated_content"], "t2\n\nt1");
	assert_eq!(json["all_tables_mentioned"], serde_json::json!(["Table 5.6.1", "Table 6.3.3"]));
	assert_eq!(index.calls()[0].1.text, "capacity factors");
}

#[tokio::test]
async fn filtered_search_without_matches_is_not_an_error() {
	let index = Arc::new(FakeIndex::new(vec![raw("AS4100", 1, 0.1, "a")], Vec::new()));
	let request = FilteredSearchRequest {
		filter: MetadataFilter { page_number: Some(999), ..Default::default() },
		..Default::default()
	};
	let FilteredOutcome::Results(results) = service(index).filtered_search(request).await else {
		panic!("Expected filtered results.");
	};

	assert_eq!(results.chunk_count, 0);
	assert_eq!(results.message.as_deref(), Some("No chunks matched filters: page_number=999"));
}

#[tokio::test]
async fn filtered_search_requires_a_filter() {
	let index = Arc::new(FakeIndex::default());
	let outcome = service(index.clone()).filtered_search(FilteredSearchRequest::default()).await;
	let json = serde_json::to_value(&outcome).expect("Failed to serialize outcome.");

	assert_eq!(json["type"], "filtered_search_error");
	assert_eq!(json["kind"], "invalid_request");
	assert!(index.calls().is_empty());
}

#[test]
fn filtered_request_accepts_flat_filter_fields() {
	let request: FilteredSearchRequest = serde_json::from_value(serde_json::json!({
		"source_document_id": "AS4100",
		"page_number": 41,
		"figures_mentioned": ["Figure 5.6.1"]
	}))
	.expect("Failed to parse request.");

	assert_eq!(request.query, "");
	assert_eq!(request.filter.page_number, Some(41));
	assert_eq!(request.filter.figures_mentioned, vec!["Figure 5.6.1".to_string()]);
}
