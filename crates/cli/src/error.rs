use std::path::PathBuf;

use serde_json::json;
use stagectl_runtime::Error as RuntimeError;
use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("cannot read configuration {}: {source}", path.display())]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid configuration {}: {source}", path.display())]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error(transparent)]
	Core(#[from] stagectl::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl From<RuntimeError> for CliError {
	fn from(err: RuntimeError) -> Self {
		CliError::Core(err.into())
	}
}

/// Category of a runtime failure outside a reconcile step.
fn runtime_code(err: &RuntimeError) -> ErrorCode {
	match err {
		RuntimeError::Launch(_) => ErrorCode::LaunchFailed,
		RuntimeError::Connection { source, .. } if source.is_launch() => ErrorCode::LaunchFailed,
		RuntimeError::Connection { .. }
		| RuntimeError::ConnectionFailed(_)
		| RuntimeError::AuthenticationFailed(_)
		| RuntimeError::Transport(_)
		| RuntimeError::ChannelClosed => ErrorCode::ConnectionFailed,
		RuntimeError::Remote { .. } | RuntimeError::Timeout(_) | RuntimeError::Protocol(_) => {
			ErrorCode::RequestFailed
		}
		RuntimeError::Io(_) => ErrorCode::IoError,
		RuntimeError::Json(_) => ErrorCode::InternalError,
	}
}

fn runtime_details(err: &RuntimeError) -> Option<serde_json::Value> {
	match err {
		RuntimeError::Connection { attempts, source } => Some(json!({
			"attempts": attempts,
			"lastCause": source.last_cause().to_string(),
		})),
		RuntimeError::Remote { request_type, code, .. } => Some(json!({
			"requestType": request_type,
			"status": code,
		})),
		_ => None,
	}
}

impl CliError {
	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::ConfigRead { path, .. } | CliError::ConfigParse { path, .. } => {
				(ErrorCode::InvalidInput, Some(json!({ "path": path })))
			}
			CliError::Core(stagectl::Error::Reconcile { step, source }) => {
				let mut details = json!({ "step": step });
				if let Some(status) = source.remote_code() {
					details["status"] = json!(status);
				}
				(ErrorCode::ReconcileFailed, Some(details))
			}
			CliError::Core(stagectl::Error::Runtime(err)) => (runtime_code(err), runtime_details(err)),
			CliError::Core(stagectl::Error::Snapshot { path, source }) => {
				let code = if source.kind() == std::io::ErrorKind::NotFound {
					ErrorCode::InvalidInput
				} else {
					ErrorCode::IoError
				};
				(code, Some(json!({ "path": path })))
			}
			CliError::Core(stagectl::Error::InvalidDocument(_)) => (ErrorCode::InvalidInput, None),
			CliError::Io(_) => (ErrorCode::IoError, None),
			CliError::Json(_) | CliError::Anyhow(_) => (ErrorCode::InternalError, None),
		};

		CommandError {
			code,
			message: self.to_string(),
			details,
		}
	}
}
