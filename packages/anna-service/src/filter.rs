//! Exact-match metadata filters in the index service's filter language.
//!
//! Each populated field becomes one condition; list fields match when the chunk mentions any of
//! the given references. Conditions on different fields are combined with `$and`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataFilter {
	pub source_document_id: Option<String>,
	pub page_number: Option<i64>,
	pub tables_mentioned: Vec<String>,
	pub figures_mentioned: Vec<String>,
	pub clauses_mentioned: Vec<String>,
}
impl MetadataFilter {
	pub fn for_document(source_document_id: impl Into<String>) -> Self {
		Self { source_document_id: Some(source_document_id.into()), ..Default::default() }
	}

	/// Trims values and drops blanks and repeats.
	pub fn normalized(&self) -> Self {
		Self {
			source_document_id: self
				.source_document_id
				.as_deref()
				.map(str::trim)
				.filter(|id| !id.is_empty())
				.map(str::to_string),
			page_number: self.page_number,
			tables_mentioned: normalize_refs(&self.tables_mentioned),
			figures_mentioned: normalize_refs(&self.figures_mentioned),
			clauses_mentioned: normalize_refs(&self.clauses_mentioned),
		}
	}

	pub fn is_empty(&self) -> bool {
		let normalized = self.normalized();

		normalized.source_document_id.is_none()
			&& normalized.page_number.is_none()
			&& normalized.tables_mentioned.is_empty()
			&& normalized.figures_mentioned.is_empty()
			&& normalized.clauses_mentioned.is_empty()
	}

	/// Renders the filter expression, or `None` when nothing is constrained.
	pub fn to_filter(&self) -> Option<Value> {
		let normalized = self.normalized();
		let mut conditions = Vec::new();

		if let Some(id) = normalized.source_document_id {
			conditions.push(serde_json::json!({ "source_document_id": { "$eq": id } }));
		}
		if let Some(page) = normalized.page_number {
			conditions.push(serde_json::json!({ "page_number": { "$eq": page } }));
		}

		for (field, values) in [
			("tables_mentioned", normalized.tables_mentioned),
			("figures_mentioned", normalized.figures_mentioned),
			("clauses_mentioned", normalized.clauses_mentioned),
		] {
			if !values.is_empty() {
				let mut condition = Map::new();

				condition.insert(field.to_string(), serde_json::json!({ "$in": values }));
				conditions.push(Value::Object(condition));
			}
		}

		match conditions.len() {
			0 => None,
			1 => conditions.pop(),
			_ => Some(serde_json::json!({ "$and": conditions })),
		}
	}

	/// Human-readable summary used in responses, e.g. `page_number=41, tables_mentioned in [6.3]`.
	pub fn describe(&self) -> String {
		let normalized = self.normalized();
		let mut parts = Vec::new();

		if let Some(id) = normalized.source_document_id {
			parts.push(format!("source_document_id={id}"));
		}
		if let Some(page) = normalized.page_number {
			parts.push(format!("page_number={page}"));
		}

		for (field, values) in [
			("tables_mentioned", normalized.tables_mentioned),
			("figures_mentioned", normalized.figures_mentioned),
			("clauses_mentioned", normalized.clauses_mentioned),
		] {
			if !values.is_empty() {
				parts.push(format!("{field} in [{}]", values.join(", ")));
			}
		}

		if parts.is_empty() { "none".to_string() } else { parts.join(", ") }
	}
}

fn normalize_refs(values: &[String]) -> Vec<String> {
	let mut out: Vec<String> = Vec::with_capacity(values.len());

	for value in values {
		let value = value.trim();

		if !value.is_empty() && !out.iter().any(|seen| seen == value) {
			out.push(value.to_string());
		}
	}

	out
}
