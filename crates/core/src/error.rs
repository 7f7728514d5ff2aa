//! Error types for stagectl.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for stagectl operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// Launch, connection, or request failure from the runtime.
	#[error(transparent)]
	Runtime(#[from] stagectl_runtime::Error),

	/// A fatal step of an import or scene clear failed.
	#[error("Failed to {step}: {source}")]
	Reconcile {
		step: String,
		#[source]
		source: stagectl_runtime::Error,
	},

	/// Reading or writing a snapshot file failed.
	#[error("Snapshot file {}: {source}", path.display())]
	Snapshot {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// A snapshot document could not be used.
	#[error("Invalid snapshot document: {0}")]
	InvalidDocument(String),
}

impl Error {
	/// The runtime error underneath, if any.
	pub fn runtime(&self) -> Option<&stagectl_runtime::Error> {
		match self {
			Error::Runtime(e) | Error::Reconcile { source: e, .. } => Some(e),
			_ => None,
		}
	}
}

/// Attaches the failing reconcile step to a remote error.
pub(crate) trait ReconcileExt<T> {
	fn step(self, step: impl FnOnce() -> String) -> Result<T>;
}

impl<T> ReconcileExt<T> for stagectl_runtime::Result<T> {
	fn step(self, step: impl FnOnce() -> String) -> Result<T> {
		self.map_err(|source| Error::Reconcile {
			step: step(),
			source,
		})
	}
}
