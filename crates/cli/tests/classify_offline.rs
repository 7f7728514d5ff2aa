//! Runs the binary for commands that never contact the controller.

use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

fn run(dir: &Path, args: &[&str]) -> (bool, Value, String) {
	let config = dir.join("config.json");
	if !config.exists() {
		std::fs::write(&config, "{}").unwrap();
	}

	let output = Command::new(env!("CARGO_BIN_EXE_stagectl"))
		.current_dir(dir)
		.arg("--config")
		.arg(&config)
		.args(args)
		.env_remove("RUST_LOG")
		.output()
		.expect("failed to execute stagectl");

	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	let parsed = serde_json::from_str(&stdout).unwrap_or(Value::Null);
	(output.status.success(), parsed, stderr)
}

#[test]
fn test_classify_prints_envelope() {
	let dir = TempDir::new().unwrap();
	let hints = dir.path().join("hints.json");
	std::fs::write(&hints, r#"{"mobile_apps": ["droidcam"]}"#).unwrap();

	let (ok, json, stderr) = run(
		dir.path(),
		&[
			"--hints",
			hints.to_str().unwrap(),
			"classify",
			"--kind",
			"v4l2_input",
			"--name",
			"DroidCam Source",
			"--device-id",
			"/dev/video2",
		],
	);

	assert!(ok, "stderr: {stderr}");
	assert_eq!(json["ok"], true);
	assert_eq!(json["command"], "classify");
	assert_eq!(json["data"]["device"]["category"], "camera");
	assert_eq!(json["data"]["device"]["isMobile"], true);
}

#[test]
fn test_malformed_config_is_invalid_input() {
	let dir = TempDir::new().unwrap();
	std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();

	let (ok, json, stderr) = run(dir.path(), &["classify", "--kind", "", "--name", "x"]);

	assert!(!ok);
	assert_eq!(json["ok"], false);
	assert_eq!(json["command"], "classify");
	assert_eq!(json["error"]["code"], "INVALID_INPUT");
	assert!(stderr.contains("Error [INVALID_INPUT]"), "stderr: {stderr}");
}
