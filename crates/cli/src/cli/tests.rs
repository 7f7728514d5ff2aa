use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn test_parse_classify_command() {
	let args = vec![
		"stagectl",
		"classify",
		"--kind",
		"v4l2_input",
		"--name",
		"DroidCam Source",
		"--device-id",
		"/dev/video2",
	];
	let cli = Cli::try_parse_from(args).unwrap();

	match cli.command {
		Commands::Classify(args) => {
			assert_eq!(args.kind, "v4l2_input");
			assert_eq!(args.name, "DroidCam Source");
			assert_eq!(args.device_id.as_deref(), Some("/dev/video2"));
		}
		_ => panic!("Expected Classify command"),
	}
}

#[test]
fn test_classify_requires_kind_and_name() {
	assert!(Cli::try_parse_from(["stagectl", "classify", "--name", "Cam"]).is_err());
	assert!(Cli::try_parse_from(["stagectl", "classify", "--kind", "v4l2_input"]).is_err());
}

#[test]
fn test_parse_import_with_clear() {
	let cli = Cli::try_parse_from(["stagectl", "import", "--input", "lecture.json", "--clear"]).unwrap();

	match cli.command {
		Commands::Import(args) => {
			assert_eq!(args.input, PathBuf::from("lecture.json"));
			assert!(args.clear);
		}
		_ => panic!("Expected Import command"),
	}
}

#[test]
fn test_import_requires_input() {
	assert!(Cli::try_parse_from(["stagectl", "import"]).is_err());
}

#[test]
fn test_export_defaults_to_stdout() {
	let cli = Cli::try_parse_from(["stagectl", "export"]).unwrap();
	match cli.command {
		Commands::Export(args) => assert!(args.output.is_none()),
		_ => panic!("Expected Export command"),
	}
}

#[test]
fn test_global_flags_after_subcommand() {
	let cli = Cli::try_parse_from([
		"stagectl",
		"devices",
		"-vv",
		"--format",
		"text",
		"--hints",
		"hints.json",
		"--config",
		"stagectl.json",
	])
	.unwrap();

	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.format, OutputFormat::Text);
	assert_eq!(cli.hints, Some(PathBuf::from("hints.json")));
	assert_eq!(cli.config, Some(PathBuf::from("stagectl.json")));
	assert!(matches!(cli.command, Commands::Devices));
}

#[test]
fn test_default_format_is_json() {
	let cli = Cli::try_parse_from(["stagectl", "status"]).unwrap();
	assert_eq!(cli.format, OutputFormat::Json);
	assert_eq!(cli.verbose, 0);
}

#[test]
fn test_command_names_are_kebab_case() {
	let cli = Cli::try_parse_from(["stagectl", "named-devices"]).unwrap();
	assert_eq!(cli.command.name(), "named-devices");
	assert_eq!(Cli::try_parse_from(["stagectl", "clear"]).unwrap().command.name(), "clear");
}
