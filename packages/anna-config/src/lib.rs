mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Filtered, Index, IndexTarget, Rerank, Search, Service};

use std::{fs, path::Path};

/// Hard ceiling on hits requested from a single index by similarity search.
pub const MAX_SEARCH_TOP_K: u32 = 10;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.index.api_key_env.trim().is_empty() {
		return Err(Error::Validation {
			message: "index.api_key_env must be non-empty.".to_string(),
		});
	}
	if cfg.index.api_version.trim().is_empty() {
		return Err(Error::Validation {
			message: "index.api_version must be non-empty.".to_string(),
		});
	}
	if cfg.index.namespace.trim().is_empty() {
		return Err(Error::Validation {
			message: "index.namespace must be non-empty.".to_string(),
		});
	}
	if cfg.index.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "index.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (label, value) in &cfg.index.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("index.default_headers.{label} must be a string."),
			});
		}
	}

	for (label, target) in [("index.dense", &cfg.index.dense), ("index.sparse", &cfg.index.sparse)]
	{
		if target.name.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label}.name must be non-empty.") });
		}
		if !(target.host.starts_with("http://") || target.host.starts_with("https://")) {
			return Err(Error::Validation {
				message: format!("{label}.host must be an http(s) URL."),
			});
		}
	}

	if cfg.search.default_top_k == 0 || cfg.search.default_top_k > MAX_SEARCH_TOP_K {
		return Err(Error::Validation {
			message: format!("search.default_top_k must be in the range 1-{MAX_SEARCH_TOP_K}."),
		});
	}
	if cfg.search.rerank.enabled {
		if cfg.search.rerank.model.trim().is_empty() {
			return Err(Error::Validation {
				message: "search.rerank.model must be non-empty when enabled.".to_string(),
			});
		}
		if cfg.search.rerank.rank_fields.is_empty() {
			return Err(Error::Validation {
				message: "search.rerank.rank_fields must be non-empty when enabled.".to_string(),
			});
		}
	}
	if cfg.filtered.default_top_k == 0 {
		return Err(Error::Validation {
			message: "filtered.default_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.filtered.placeholder_query.trim().is_empty() {
		return Err(Error::Validation {
			message: "filtered.placeholder_query must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.index.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.index.api_key = None;
	}

	for target in [&mut cfg.index.dense, &mut cfg.index.sparse] {
		while target.host.ends_with('/') {
			target.host.pop();
		}
	}

	cfg.search.rerank.rank_fields.retain(|field| !field.trim().is_empty());
}
