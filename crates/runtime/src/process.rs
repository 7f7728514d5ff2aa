//! Local controller process: discovery, launch, and termination.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::sync::Mutex as TokioMutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

const PORT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[cfg(windows)]
fn default_executable() -> PathBuf {
	PathBuf::from(r"C:\Program Files\obs-studio\bin\64bit\obs64.exe")
}

#[cfg(target_os = "macos")]
fn default_executable() -> PathBuf {
	PathBuf::from("/Applications/OBS.app/Contents/MacOS/OBS")
}

#[cfg(not(any(windows, target_os = "macos")))]
fn default_executable() -> PathBuf {
	PathBuf::from("/usr/bin/obs")
}

#[cfg(windows)]
fn default_process_name() -> String {
	"obs64.exe".to_string()
}

#[cfg(target_os = "macos")]
fn default_process_name() -> String {
	"OBS".to_string()
}

#[cfg(not(any(windows, target_os = "macos")))]
fn default_process_name() -> String {
	"obs".to_string()
}

#[cfg(windows)]
fn default_support_files() -> Vec<PathBuf> {
	// The Windows build refuses to start without its locale data.
	vec![PathBuf::from(r"..\..\data\obs-studio\locale\en-US.ini")]
}

#[cfg(not(windows))]
fn default_support_files() -> Vec<PathBuf> {
	Vec::new()
}

fn default_grace_secs() -> u64 {
	5
}

/// How to start and stop the controller application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
	#[serde(default = "default_executable")]
	pub executable: PathBuf,
	#[serde(default)]
	pub args: Vec<String>,
	/// Defaults to the executable's directory.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub working_dir: Option<PathBuf>,
	/// Files that must exist before launching; relative paths resolve
	/// against the working directory.
	#[serde(default = "default_support_files")]
	pub support_files: Vec<PathBuf>,
	/// Image name used to find an instance we did not start ourselves.
	#[serde(default = "default_process_name")]
	pub process_name: String,
	/// Seconds to wait between a polite stop and a forced kill.
	#[serde(default = "default_grace_secs")]
	pub grace_secs: u64,
}

impl Default for LaunchConfig {
	fn default() -> Self {
		Self {
			executable: default_executable(),
			args: Vec::new(),
			working_dir: None,
			support_files: default_support_files(),
			process_name: default_process_name(),
			grace_secs: default_grace_secs(),
		}
	}
}

impl LaunchConfig {
	pub fn grace(&self) -> Duration {
		Duration::from_secs(self.grace_secs)
	}

	pub fn resolved_working_dir(&self) -> PathBuf {
		self.working_dir
			.clone()
			.or_else(|| self.executable.parent().map(Path::to_path_buf))
			.unwrap_or_else(|| PathBuf::from("."))
	}

	/// Checks the executable and every support file.
	///
	/// # Errors
	///
	/// Returns [`Error::Launch`] naming the first missing path.
	pub fn validate(&self) -> Result<()> {
		if !self.executable.is_file() {
			return Err(Error::Launch(format!(
				"executable not found at {}",
				self.executable.display()
			)));
		}

		let cwd = self.resolved_working_dir();
		for file in &self.support_files {
			let path = if file.is_absolute() { file.clone() } else { cwd.join(file) };
			if !path.exists() {
				return Err(Error::Launch(format!(
					"required file not found at {}",
					path.display()
				)));
			}
		}
		Ok(())
	}
}

/// Controller process on this machine.
///
/// Tracks the child it spawned; instances started elsewhere are found by
/// image name.
pub struct LocalController {
	config: LaunchConfig,
	host: String,
	port: u16,
	child: TokioMutex<Option<Child>>,
}

impl LocalController {
	pub fn new(config: LaunchConfig, host: impl Into<String>, port: u16) -> Self {
		Self {
			config,
			host: host.into(),
			port,
			child: TokioMutex::new(None),
		}
	}

	pub fn config(&self) -> &LaunchConfig {
		&self.config
	}

	/// True if our child is alive or a process with the configured image
	/// name exists.
	pub async fn is_running(&self) -> bool {
		if let Some(child) = self.child.lock().await.as_mut() {
			if matches!(child.try_wait(), Ok(None)) {
				return true;
			}
		}
		process_exists(&self.config.process_name).await
	}

	/// True if a TCP connection to the control port succeeds within one second.
	pub async fn is_port_open(&self) -> bool {
		let addr = (self.host.as_str(), self.port);
		matches!(
			tokio::time::timeout(PORT_PROBE_TIMEOUT, TcpStream::connect(addr)).await,
			Ok(Ok(_))
		)
	}

	/// Starts the controller.
	///
	/// # Errors
	///
	/// Returns [`Error::Launch`] if a required path is missing, the spawn
	/// fails, or the process exits immediately.
	pub async fn launch(&self) -> Result<()> {
		self.config.validate()?;
		let cwd = self.config.resolved_working_dir();

		let mut cmd = Command::new(&self.config.executable);
		cmd.args(&self.config.args)
			.current_dir(&cwd)
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::null());

		#[cfg(unix)]
		cmd.process_group(0);

		let mut child = cmd.spawn().map_err(|e| {
			Error::Launch(format!(
				"failed to spawn {}: {e}",
				self.config.executable.display()
			))
		})?;

		tokio::time::sleep(Duration::from_millis(100)).await;

		match child.try_wait() {
			Ok(Some(status)) => {
				return Err(Error::Launch(format!(
					"controller exited immediately with status: {status}"
				)));
			}
			Ok(None) => {}
			Err(e) => {
				return Err(Error::Launch(format!("failed to check process status: {e}")));
			}
		}

		info!(
			target = "stagectl.process",
			executable = %self.config.executable.display(),
			pid = child.id(),
			"launched controller"
		);
		*self.child.lock().await = Some(child);
		Ok(())
	}

	/// Stops the controller: polite signal, up to `grace` to exit, then kill.
	pub async fn terminate(&self, grace: Duration) -> Result<()> {
		if let Some(mut child) = self.child.lock().await.take() {
			if matches!(child.try_wait(), Ok(None)) {
				if let Some(pid) = child.id() {
					signal_pid(pid).await;
				}
				match tokio::time::timeout(grace, child.wait()).await {
					Ok(_) => debug!(target = "stagectl.process", "controller exited"),
					Err(_) => {
						warn!(target = "stagectl.process", "controller ignored stop request; killing");
						child.kill().await?;
					}
				}
				return Ok(());
			}
		}

		let name = &self.config.process_name;
		if !process_exists(name).await {
			return Ok(());
		}

		signal_name(name, false).await;
		let deadline = tokio::time::Instant::now() + grace;
		while tokio::time::Instant::now() < deadline {
			if !process_exists(name).await {
				return Ok(());
			}
			tokio::time::sleep(EXIT_POLL_INTERVAL).await;
		}

		warn!(target = "stagectl.process", process = %name, "controller ignored stop request; killing");
		signal_name(name, true).await;
		Ok(())
	}
}

#[cfg(unix)]
async fn process_exists(name: &str) -> bool {
	Command::new("pgrep")
		.args(["-x", name])
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.status()
		.await
		.map(|s| s.success())
		.unwrap_or(false)
}

#[cfg(windows)]
async fn process_exists(name: &str) -> bool {
	let output = Command::new("tasklist")
		.args(["/FI", &format!("IMAGENAME eq {name}"), "/NH"])
		.output()
		.await;
	match output {
		Ok(out) => String::from_utf8_lossy(&out.stdout)
			.to_ascii_lowercase()
			.contains(&name.to_ascii_lowercase()),
		Err(_) => false,
	}
}

#[cfg(unix)]
async fn signal_pid(pid: u32) {
	match Command::new("kill").args(["-TERM", &pid.to_string()]).status().await {
		Ok(status) if status.success() => {}
		Ok(_) => debug!(target = "stagectl.process", pid, "kill -TERM returned non-zero"),
		Err(e) => debug!(target = "stagectl.process", pid, error = %e, "failed to signal"),
	}
}

#[cfg(windows)]
async fn signal_pid(pid: u32) {
	if let Err(e) = Command::new("taskkill")
		.args(["/PID", &pid.to_string()])
		.status()
		.await
	{
		debug!(target = "stagectl.process", pid, error = %e, "failed to signal");
	}
}

#[cfg(unix)]
async fn signal_name(name: &str, force: bool) {
	let signal = if force { "-KILL" } else { "-TERM" };
	if let Err(e) = Command::new("pkill").args([signal, "-x", name]).status().await {
		debug!(target = "stagectl.process", process = name, error = %e, "pkill failed");
	}
}

#[cfg(windows)]
async fn signal_name(name: &str, force: bool) {
	let mut cmd = Command::new("taskkill");
	cmd.args(["/IM", name]);
	if force {
		cmd.arg("/F");
	}
	if let Err(e) = cmd.status().await {
		debug!(target = "stagectl.process", process = name, error = %e, "taskkill failed");
	}
}
