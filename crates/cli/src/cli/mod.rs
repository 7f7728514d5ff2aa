#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;
use crate::styles::cli_styles;

/// Root CLI for stagectl.
#[derive(Parser, Debug)]
#[command(name = "stagectl")]
#[command(about = "Capture-device discovery and scene snapshots for a live production controller")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Configuration file (defaults to the user config directory)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Device hint table, overriding `hintsPath` from the configuration
	#[arg(long, global = true, value_name = "FILE")]
	pub hints: Option<PathBuf>,

	/// Output format: json (default) or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Connect (launching the controller if needed) and report its version.
	Status,
	/// Probe the controller for cameras and microphones.
	Devices,
	/// Report the devices selected by the DefaultCamera*/DefaultMic* inputs.
	NamedDevices,
	/// Classify one capture input offline.
	Classify(ClassifyArgs),
	/// Snapshot scenes, transitions and profiles.
	Export(ExportArgs),
	/// Rebuild scenes, transitions and profiles from a snapshot.
	Import(ImportArgs),
	/// Remove every scene, leaving an empty staging scene on program.
	Clear,
}

impl Commands {
	/// Name used in the output envelope.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Status => "status",
			Commands::Devices => "devices",
			Commands::NamedDevices => "named-devices",
			Commands::Classify(_) => "classify",
			Commands::Export(_) => "export",
			Commands::Import(_) => "import",
			Commands::Clear => "clear",
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
	/// Input kind, e.g. v4l2_input or wasapi_input_capture
	#[arg(long, value_name = "KIND")]
	pub kind: String,

	/// Display name of the input
	#[arg(long, value_name = "NAME")]
	pub name: String,

	/// Device identifier stored in the input settings
	#[arg(long, value_name = "ID")]
	pub device_id: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
	/// Write the snapshot here instead of stdout
	#[arg(short, long, value_name = "FILE")]
	pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
	/// Snapshot file to import
	#[arg(short, long, value_name = "FILE")]
	pub input: PathBuf,

	/// Remove existing scenes before importing
	#[arg(long)]
	pub clear: bool,
}
