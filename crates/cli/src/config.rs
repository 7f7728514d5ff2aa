//! Configuration file loading.
//!
//! The file is JSON with camelCase keys; every section and field is
//! optional and falls back to the runtime defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use stagectl_runtime::{ControllerConfig, LaunchConfig, RetryPolicy};
use tracing::debug;

use crate::error::{CliError, Result};

/// Environment variable consulted when the file carries no password.
pub const PASSWORD_ENV: &str = "STAGECTL_WS_PASSWORD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
	#[serde(default)]
	pub controller: ControllerConfig,
	#[serde(default)]
	pub launch: LaunchConfig,
	#[serde(default)]
	pub retry: RetryPolicy,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub hints_path: Option<PathBuf>,
}

/// `<user config dir>/stagectl/config.json`.
pub fn default_path() -> anyhow::Result<PathBuf> {
	let base = dirs::config_dir().context("no user configuration directory on this platform")?;
	Ok(base.join("stagectl").join("config.json"))
}

impl Config {
	/// Loads `explicit`, or the default path when `None`.
	///
	/// A missing default file yields defaults; a missing explicit file is
	/// an error.
	pub fn load(explicit: Option<&Path>) -> Result<Self> {
		Self::load_with_env(explicit, |key| std::env::var(key).ok())
	}

	pub fn load_with_env(explicit: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let mut config = match explicit {
			Some(path) => Self::read(path)?,
			None => {
				let path = default_path()?;
				if path.is_file() {
					Self::read(&path)?
				} else {
					debug!(target = "stagectl.config", path = %path.display(), "no configuration file, using defaults");
					Self::default()
				}
			}
		};

		if config.controller.password.is_none() {
			config.controller.password = env(PASSWORD_ENV).filter(|p| !p.is_empty());
		}
		Ok(config)
	}

	fn read(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
			path: path.to_path_buf(),
			source,
		})?;
		let config = serde_json::from_str(&text).map_err(|source| CliError::ConfigParse {
			path: path.to_path_buf(),
			source,
		})?;
		debug!(target = "stagectl.config", path = %path.display(), "loaded configuration");
		Ok(config)
	}

	/// `--hints` wins over `hintsPath`.
	pub fn hints_path<'a>(&'a self, flag: Option<&'a Path>) -> Option<&'a Path> {
		flag.or(self.hints_path.as_deref())
	}
}
