mod classify;
mod clear;
mod devices;
mod snapshot;
mod status;

use serde::Serialize;
use stagectl::{HintTable, LocalStudio, SharedHints};
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::Result;
use crate::output::{OutputFormat, ResultBuilder, print_result};

pub use classify::{ClassifyData, classify_record};

/// Runs one subcommand and prints its envelope.
pub async fn dispatch(cli: Cli) -> Result<()> {
	let config = Config::load(cli.config.as_deref())?;
	let hints = load_hints(&config, &cli);
	let format = cli.format;

	let name = cli.command.name();

	match cli.command {
		Commands::Classify(args) => emit(name, classify_record(&args, &hints.current()), format),
		Commands::Status => emit(name, status::execute(&studio(config, hints)).await?, format),
		Commands::Devices => emit(name, devices::execute(&studio(config, hints)).await?, format),
		Commands::NamedDevices => emit(name, devices::execute_named(&studio(config, hints)).await?, format),
		Commands::Export(args) => emit(name, snapshot::export(&studio(config, hints), &args).await?, format),
		Commands::Import(args) => emit(name, snapshot::import(&studio(config, hints), &args).await?, format),
		Commands::Clear => emit(name, clear::execute(&studio(config, hints)).await?, format),
	}
	Ok(())
}

/// Controller-backed commands go through one studio; `classify` never builds it.
fn studio(config: Config, hints: SharedHints) -> LocalStudio {
	LocalStudio::local(config.controller, config.launch, config.retry, hints)
}

fn load_hints(config: &Config, cli: &Cli) -> SharedHints {
	match config.hints_path(cli.hints.as_deref()) {
		Some(path) => SharedHints::load(path),
		None => {
			debug!(target = "stagectl.cli", "no hint file configured");
			SharedHints::new(HintTable::default())
		}
	}
}

fn emit<T: Serialize>(command: &str, data: T, format: OutputFormat) {
	let result = ResultBuilder::new(command).data(data).build();
	print_result(&result, format);
}

#[cfg(test)]
mod tests {
	use clap::Parser;
	use tempfile::TempDir;

	use super::*;

	#[tokio::test]
	async fn classify_dispatches_without_a_controller() {
		let dir = TempDir::new().unwrap();
		let config = dir.path().join("config.json");
		// Unreachable controller: any attempt to connect would fail the command.
		std::fs::write(&config, r#"{ "controller": { "port": 1 }, "retry": { "retries": 1, "baseDelayMs": 0 } }"#)
			.unwrap();

		let cli = Cli::try_parse_from([
			"stagectl",
			"--config",
			config.to_str().unwrap(),
			"classify",
			"--kind",
			"wasapi_input_capture",
			"--name",
			"Headset",
		])
		.unwrap();

		dispatch(cli).await.unwrap();
	}

	#[test]
	fn hints_flag_is_loaded() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("hints.json");
		std::fs::write(&path, r#"{"mobile_apps": ["Iriun"]}"#).unwrap();

		let cli = Cli::try_parse_from(["stagectl", "--hints", path.to_str().unwrap(), "clear"]).unwrap();
		let hints = load_hints(&Config::default(), &cli);
		assert_eq!(hints.current().mobile_apps, vec!["iriun"]);
	}
}
