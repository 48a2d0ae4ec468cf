//! Typed view of a retrieved chunk.
//!
//! Index responses are untyped maps; they are projected into [`Hit`] right at the provider
//! boundary so that merge and ordering logic only sees fixed fields.

use std::{cmp::Ordering, fmt};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use anna_providers::index::RawHit;

pub const UNKNOWN_DOCUMENT: &str = "Unknown Document";
pub const UNKNOWN_PAGE: &str = "Unknown Page";

/// Metadata fields requested from the index for every chunk.
pub const CHUNK_FIELDS: [&str; 7] = [
	"source_document_id",
	"page_number",
	"chunk_text",
	"clauses_mentioned",
	"tables_mentioned",
	"figures_mentioned",
	"chunk_index_in_page",
];

/// Page a chunk was taken from. Unknown pages order after every known page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageNumber {
	Known(i64),
	Unknown,
}
impl PageNumber {
	pub fn from_value(value: Option<&Value>) -> Self {
		match value {
			Some(Value::Number(number)) => number
				.as_i64()
				.or_else(|| {
					number.as_f64().filter(|page| page.fract() == 0.0).map(|page| page as i64)
				})
				.map(Self::Known)
				.unwrap_or(Self::Unknown),
			Some(Value::String(raw)) =>
				raw.trim().parse().map(Self::Known).unwrap_or(Self::Unknown),
			_ => Self::Unknown,
		}
	}

	pub fn known(self) -> Option<i64> {
		match self {
			Self::Known(page) => Some(page),
			Self::Unknown => None,
		}
	}
}
impl fmt::Display for PageNumber {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Known(page) => write!(f, "{page}"),
			Self::Unknown => f.write_str(UNKNOWN_PAGE),
		}
	}
}
impl Serialize for PageNumber {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			Self::Known(page) => serializer.serialize_i64(*page),
			Self::Unknown => serializer.serialize_str(UNKNOWN_PAGE),
		}
	}
}

/// Two hits with the same key are the same page of the same document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
	pub source_document_id: String,
	pub page_number: PageNumber,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
	pub id: String,
	pub source_document_id: String,
	pub page_number: PageNumber,
	pub score: f32,
	pub content: String,
	pub clauses_mentioned: Option<Vec<String>>,
	pub tables_mentioned: Option<Vec<String>>,
	pub figures_mentioned: Option<Vec<String>>,
	pub chunk_index_in_page: Option<u32>,
}
impl Hit {
	pub fn from_raw(raw: RawHit) -> Self {
		let fields = &raw.fields;

		Self {
			source_document_id: field_str(fields, "source_document_id")
				.unwrap_or_else(|| UNKNOWN_DOCUMENT.to_string()),
			page_number: PageNumber::from_value(fields.get("page_number")),
			score: raw.score,
			content: field_str(fields, "chunk_text").unwrap_or_default(),
			clauses_mentioned: field_refs(fields, "clauses_mentioned"),
			tables_mentioned: field_refs(fields, "tables_mentioned"),
			figures_mentioned: field_refs(fields, "figures_mentioned"),
			chunk_index_in_page: field_index(fields, "chunk_index_in_page"),
			id: raw.id,
		}
	}

	pub fn dedup_key(&self) -> DedupKey {
		DedupKey {
			source_document_id: self.source_document_id.clone(),
			page_number: self.page_number,
		}
	}

	/// Natural reading order: page first, then position within the page.
	pub fn reading_order(&self, other: &Self) -> Ordering {
		self.page_number.cmp(&other.page_number).then_with(|| {
			let lhs = self.chunk_index_in_page.unwrap_or(u32::MAX);
			let rhs = other.chunk_index_in_page.unwrap_or(u32::MAX);

			lhs.cmp(&rhs)
		})
	}
}

fn field_str(fields: &Map<String, Value>, key: &str) -> Option<String> {
	match fields.get(key)? {
		Value::String(raw) => Some(raw.clone()),
		Value::Null => None,
		other => Some(other.to_string()),
	}
}

fn field_refs(fields: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
	match fields.get(key)? {
		Value::Array(items) => Some(
			items
				.iter()
				.filter_map(|item| match item {
					Value::String(raw) => Some(raw.clone()),
					Value::Null => None,
					other => Some(other.to_string()),
				})
				.collect(),
		),
		Value::String(raw) if !raw.trim().is_empty() => Some(vec![raw.clone()]),
		_ => None,
	}
}

fn field_index(fields: &Map<String, Value>, key: &str) -> Option<u32> {
	let value = fields.get(key)?;
	let index = value
		.as_u64()
		.or_else(|| {
			value
				.as_f64()
				.filter(|index| *index >= 0.0 && index.fract() == 0.0)
				.map(|index| index as u64)
		})
		.or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))?;

	u32::try_from(index).ok()
}
