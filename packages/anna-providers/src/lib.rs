pub mod error;
pub mod index;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client,
	header::{HeaderMap, HeaderName, HeaderValue},
};
use serde_json::{Map, Value};

pub const API_KEY_HEADER: &str = "Api-Key";
pub const API_VERSION_HEADER: &str = "X-Pinecone-API-Version";

/// Builds the HTTP client shared by every index call of one service instance.
pub fn build_client(cfg: &anna_config::Index) -> Result<Client> {
	Ok(Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?)
}

pub fn api_headers(
	api_key: &str,
	api_version: &str,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();
	let mut key = HeaderValue::from_str(api_key)?;

	key.set_sensitive(true);
	headers.insert(HeaderName::from_static("api-key"), key);
	headers
		.insert(HeaderName::from_static("x-pinecone-api-version"), api_version.parse()?);

	for (name, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(name.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}
