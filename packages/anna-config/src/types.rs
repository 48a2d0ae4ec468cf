use std::env;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub index: Index,
	pub search: Search,
	pub filtered: Filtered,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

/// Connection settings shared by the dense and sparse indexes.
#[derive(Debug, Clone, Deserialize)]
pub struct Index {
	/// Optional. A blank value is treated as absent and `api_key_env` is consulted instead.
	pub api_key: Option<String>,
	#[serde(default = "default_api_key_env")]
	pub api_key_env: String,
	pub api_version: String,
	pub namespace: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	pub dense: IndexTarget,
	pub sparse: IndexTarget,
}
impl Index {
	/// Returns the configured API key, falling back to the `api_key_env` variable.
	pub fn resolve_api_key(&self) -> Option<String> {
		if let Some(key) = self.api_key.as_deref()
			&& !key.trim().is_empty()
		{
			return Some(key.to_string());
		}

		env::var(&self.api_key_env).ok().filter(|key| !key.trim().is_empty())
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexTarget {
	pub name: String,
	/// Base URL of the index data plane, e.g. `https://<index>-<project>.svc.<region>.pinecone.io`.
	pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	pub default_top_k: u32,
	pub rerank: Rerank,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rerank {
	pub enabled: bool,
	pub model: String,
	pub rank_fields: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Filtered {
	pub default_top_k: u32,
	#[serde(default = "default_placeholder_query")]
	pub placeholder_query: String,
}

fn default_api_key_env() -> String {
	"PINECONE_API_KEY".to_string()
}

fn default_placeholder_query() -> String {
	"document".to_string()
}
