use crate::IndexKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Missing configuration: {message}")]
	MissingConfig { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Error searching {index} index: {message}")]
	Upstream { index: IndexKind, message: String },
}
impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::MissingConfig { .. } => ErrorKind::Configuration,
			Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
			Self::Upstream { .. } => ErrorKind::Upstream,
		}
	}

	/// Remediation hint surfaced to the calling agent.
	pub fn details(&self) -> Option<&'static str> {
		match self {
			Self::MissingConfig { .. } => Some("Configure access to the vector index and retry."),
			Self::InvalidRequest { .. } => None,
			Self::Upstream { .. } =>
				Some("Please check the vector index configuration and try again."),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	Configuration,
	InvalidRequest,
	Upstream,
}

/// Failure payload carried by the error variant of every outcome.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Failure {
	pub kind: ErrorKind,
	pub query: String,
	pub error: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<String>,
}
impl Failure {
	pub fn new(query: impl Into<String>, err: &Error) -> Self {
		Self {
			kind: err.kind(),
			query: query.into(),
			error: err.to_string(),
			details: err.details().map(str::to_string),
		}
	}
}
