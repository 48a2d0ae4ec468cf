//! Client for the index service's integrated-inference "search records" endpoint.
//!
//! The service embeds the query text itself, so dense and sparse indexes accept the same request
//! shape. Hits come back untyped; callers project `fields` into their own structures.

use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct Rerank {
	pub model: String,
	pub top_n: u32,
	pub rank_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SearchRecordsRequest {
	pub namespace: String,
	pub text: String,
	pub top_k: u32,
	pub filter: Option<Value>,
	pub fields: Vec<String>,
	pub rerank: Option<Rerank>,
}
impl SearchRecordsRequest {
	pub fn to_body(&self) -> Value {
		let mut query = serde_json::json!({
			"inputs": { "text": self.text },
			"top_k": self.top_k,
		});

		if let Some(filter) = self.filter.as_ref() {
			query["filter"] = filter.clone();
		}

		let mut body = serde_json::json!({ "query": query });

		if !self.fields.is_empty() {
			body["fields"] = serde_json::json!(self.fields);
		}
		if let Some(rerank) = self.rerank.as_ref() {
			body["rerank"] = serde_json::json!(rerank);
		}

		body
	}
}

/// One hit exactly as the index returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
	pub id: String,
	pub score: f32,
	pub fields: Map<String, Value>,
}

pub async fn search_records(
	client: &Client,
	cfg: &anna_config::Index,
	target: &anna_config::IndexTarget,
	api_key: &str,
	request: &SearchRecordsRequest,
) -> Result<Vec<RawHit>> {
	let url = search_url(&target.host, &request.namespace)?;

	tracing::debug!(
		index = %target.name,
		namespace = %request.namespace,
		top_k = request.top_k,
		filtered = request.filter.is_some(),
		reranked = request.rerank.is_some(),
		"Querying index."
	);

	let res = client
		.post(url)
		.headers(crate::api_headers(api_key, &cfg.api_version, &cfg.default_headers)?)
		.json(&request.to_body())
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_search_response(json)
}

pub fn search_url(host: &str, namespace: &str) -> Result<Url> {
	let mut url = Url::parse(host).map_err(|err| Error::InvalidConfig {
		message: format!("Index host {host:?} is not a valid URL: {err}."),
	})?;

	url.path_segments_mut()
		.map_err(|_| Error::InvalidConfig {
			message: format!("Index host {host:?} cannot be used as a base URL."),
		})?
		.pop_if_empty()
		.extend(["records", "namespaces", namespace, "search"]);

	Ok(url)
}

pub fn parse_search_response(json: Value) -> Result<Vec<RawHit>> {
	if !json.is_object() {
		return Err(Error::InvalidResponse {
			message: "Search response must be a JSON object.".to_string(),
		});
	}

	let Some(hits) = json.get("result").and_then(|result| result.get("hits")) else {
		return Ok(Vec::new());
	};
	let hits = hits.as_array().ok_or_else(|| Error::InvalidResponse {
		message: "Search response result.hits must be an array.".to_string(),
	})?;
	let mut parsed = Vec::with_capacity(hits.len());

	for hit in hits {
		let id = hit.get("_id").and_then(Value::as_str).unwrap_or_default().to_string();
		let score = hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0) as f32;
		let fields = hit.get("fields").and_then(Value::as_object).cloned().unwrap_or_default();

		parsed.push(RawHit { id, score, fields });
	}

	Ok(parsed)
}
