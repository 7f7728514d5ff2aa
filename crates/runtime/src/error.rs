//! Error types for the controller runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while supervising or talking to the controller.
#[derive(Debug, Error)]
pub enum Error {
	/// Controller executable or a required support file is missing, or the
	/// process could not be spawned.
	#[error("Failed to launch controller: {0}")]
	Launch(String),

	/// No ready session could be established after every retry.
	#[error("Could not connect to controller after {attempts} attempts: {source}")]
	Connection {
		attempts: u32,
		#[source]
		source: Box<Error>,
	},

	/// A single attempt to open the WebSocket failed.
	#[error("Failed to connect to controller: {0}")]
	ConnectionFailed(String),

	/// The server demanded authentication that could not be satisfied.
	#[error("Authentication failed: {0}")]
	AuthenticationFailed(String),

	/// WebSocket-level failure.
	#[error("Transport error: {0}")]
	Transport(String),

	/// Unexpected or malformed frame.
	#[error("Protocol error: {0}")]
	Protocol(String),

	/// The controller answered a request with a failure status.
	#[error("{request_type} failed with code {code}{}", comment.as_ref().map(|c| format!(": {c}")).unwrap_or_default())]
	Remote {
		request_type: String,
		code: u16,
		comment: Option<String>,
	},

	/// Timeout waiting for a response or handshake step.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// The connection closed while a request was in flight.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true for launch failures, which retrying cannot fix.
	pub fn is_launch(&self) -> bool {
		matches!(self, Error::Launch(_))
	}

	/// Returns the controller's status code if this is a remote failure.
	pub fn remote_code(&self) -> Option<u16> {
		match self {
			Error::Remote { code, .. } => Some(*code),
			_ => None,
		}
	}

	/// Returns the innermost cause of a [`Error::Connection`].
	pub fn last_cause(&self) -> &Error {
		match self {
			Error::Connection { source, .. } => source.last_cause(),
			other => other,
		}
	}
}
