//! Result envelope printed by every command.
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "ok": true,
//!   "command": "export",
//!   "data": { ... },
//!   "timings": { "durationMs": 412 }
//! }
//! ```
//!
//! On failure `data` is replaced by `error: { code, message, details? }`.


use std::io::{self, Write};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Bumped on breaking changes to the envelope.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Pretty JSON envelope
	#[default]
	Json,
	/// Human-readable text
	Text,
}

impl std::str::FromStr for OutputFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"json" => Ok(OutputFormat::Json),
			"text" => Ok(OutputFormat::Text),
			_ => Err(format!("unknown format: {s}")),
		}
	}
}

impl std::fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OutputFormat::Json => write!(f, "json"),
			OutputFormat::Text => write!(f, "text"),
		}
	}
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub schema_version: u32,

	pub ok: bool,

	/// Subcommand name, e.g. "export"
	pub command: String,

	/// Only present on success
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,

	/// Only present on failure
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub timings: Option<Timings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,

	pub message: String,

	/// Failing step, path, or controller status code.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Stable failure categories for scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Controller executable or a support file is missing, or spawning failed
	LaunchFailed,
	/// No ready session after every retry
	ConnectionFailed,
	/// A fatal import or clear step failed
	ReconcileFailed,
	/// A single controller request failed outside an import
	RequestFailed,
	/// File I/O error
	IoError,
	/// Bad configuration, snapshot, or argument
	InvalidInput,
	/// Unknown/internal error
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			ErrorCode::LaunchFailed => "LAUNCH_FAILED",
			ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
			ErrorCode::ReconcileFailed => "RECONCILE_FAILED",
			ErrorCode::RequestFailed => "REQUEST_FAILED",
			ErrorCode::IoError => "IO_ERROR",
			ErrorCode::InvalidInput => "INVALID_INPUT",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		};
		write!(f, "{s}")
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
	pub duration_ms: u64,
}

impl From<Duration> for Timings {
	fn from(duration: Duration) -> Self {
		Self {
			duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
		}
	}
}

pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
	timings: Option<Timings>,
}

impl<T: Serialize> ResultBuilder<T> {
	/// Starts the clock for [`Timings`].
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			start_time: Instant::now(),
			timings: None,
		}
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(mut self, code: ErrorCode, message: impl Into<String>) -> Self {
		self.error = Some(CommandError {
			code,
			message: message.into(),
			details: None,
		});
		self
	}

	pub fn failure(mut self, error: CommandError) -> Self {
		self.error = Some(error);
		self
	}

	/// Overrides the measured duration.
	pub fn timings(mut self, timings: Timings) -> Self {
		self.timings = Some(timings);
		self
	}

	pub fn build(self) -> CommandResult<T> {
		let ok = self.error.is_none() && self.data.is_some();
		let timings = self.timings.unwrap_or_else(|| Timings::from(self.start_time.elapsed()));

		CommandResult {
			schema_version: SCHEMA_VERSION,
			ok,
			command: self.command,
			data: self.data,
			error: self.error,
			timings: Some(timings),
		}
	}
}

pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	if let Err(e) = write_result(&mut io::stdout().lock(), result, format) {
		warn!(target = "stagectl.output", command = %result.command, error = %e, "failed to write result");
	}
}

pub fn write_result<T: Serialize>(out: &mut impl Write, result: &CommandResult<T>, format: OutputFormat) -> io::Result<()> {
	match format {
		OutputFormat::Json => {
			let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
			writeln!(out, "{json}")?;
			out.flush()
		}
		OutputFormat::Text => write_text(out, result),
	}
}

/// Text rendering: the data as pretty JSON, or the error line.
pub fn write_text<T: Serialize>(out: &mut impl Write, result: &CommandResult<T>) -> io::Result<()> {
	if result.ok {
		if let Some(ref data) = result.data {
			let json = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
			writeln!(out, "{json}")?;
		}
	} else if let Some(ref error) = result.error {
		writeln!(out, "Error [{}]: {}", error.code, error.message)?;
		if let Some(ref details) = error.details {
			let json = serde_json::to_string_pretty(details).map_err(io::Error::other)?;
			writeln!(out, "Details: {json}")?;
		}
	}

	if let Some(ref timings) = result.timings {
		writeln!(out, "Completed in {}ms", timings.duration_ms)?;
	}
	Ok(())
}

pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error [{}]: {}", error.code, error.message);
}
