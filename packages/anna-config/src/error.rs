use std::{io, path::PathBuf};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot read search config {}: {source}", path.display())]
	ReadConfig { path: PathBuf, source: io::Error },
	#[error("Search config {} is not valid TOML: {source}", path.display())]
	ParseConfig { path: PathBuf, source: toml::de::Error },
	/// A key is present but out of range or inconsistent; the message names the dotted key.
	#[error("{message}")]
	Validation { message: String },
}
