//! High-level entry point tying the supervisor, hint table and synchronizer
//! together.

use std::path::Path;
use std::sync::Arc;

use stagectl_protocol::SnapshotDocument;
use stagectl_runtime::{
	ControllerConfig, ControllerHost, LaunchConfig, LocalController, LocalSupervisor, RetryPolicy, SessionConnector,
	Supervisor, WebSocketConnector,
};
use tokio::sync::Mutex as TokioMutex;
use tracing::info;

use crate::classify::{ClassifiedDevice, Platform, RawCaptureInput, classify};
use crate::controller::Controller;
use crate::devices::{self, DeviceInventory};
use crate::error::{Error, Result};
use crate::hints::SharedHints;
use crate::sync::{self, ImportSummary};

/// Owns the controller session gate and serializes scene-graph work.
///
/// Enumeration, export, import and clearing each hold the scene-graph lock
/// for their whole run, so their scratch scenes and inputs never
/// interleave. Session acquisition is serialized separately inside the
/// [`Supervisor`].
pub struct Studio<H, C: SessionConnector> {
	supervisor: Supervisor<H, C>,
	hints: SharedHints,
	scene_graph: TokioMutex<()>,
}

/// Studio over a local controller process.
pub type LocalStudio = Studio<LocalController, WebSocketConnector>;

impl LocalStudio {
	pub fn local(controller: ControllerConfig, launch: LaunchConfig, policy: RetryPolicy, hints: SharedHints) -> Self {
		Studio::new(LocalSupervisor::local(controller, launch, policy), hints)
	}
}

impl<H, C> Studio<H, C>
where
	H: ControllerHost,
	C: SessionConnector,
	C::Session: Controller,
{
	pub fn new(supervisor: Supervisor<H, C>, hints: SharedHints) -> Self {
		Self {
			supervisor,
			hints,
			scene_graph: TokioMutex::new(()),
		}
	}

	pub fn hints(&self) -> &SharedHints {
		&self.hints
	}

	/// A ready session, launching or reconnecting the controller as needed.
	pub async fn session(&self) -> Result<Arc<C::Session>> {
		Ok(self.supervisor.get_ready_session().await?)
	}

	/// Classifies one raw record with the current hint table.
	pub fn classify(&self, raw: &RawCaptureInput) -> Option<ClassifiedDevice> {
		let hints = self.hints.current();
		classify(raw, &hints).map(|c| c.describe(&hints))
	}

	/// Rebuilds the hint table from `path`.
	pub fn reload_hints(&self, path: &Path) {
		let table = self.hints.reload(path);
		info!(target = "stagectl.studio", path = %path.display(), empty = table.is_empty(), "reloaded hints");
	}

	pub async fn devices(&self) -> Result<DeviceInventory> {
		let _graph = self.scene_graph.lock().await;
		let session = self.session().await?;
		let hints = self.hints.current();
		devices::enumerate(session.as_ref(), &hints, Platform::host()).await
	}

	pub async fn named_devices(&self) -> Result<DeviceInventory> {
		let _graph = self.scene_graph.lock().await;
		let session = self.session().await?;
		let hints = self.hints.current();
		Ok(devices::named_devices(session.as_ref(), &hints).await)
	}

	pub async fn export(&self) -> Result<SnapshotDocument> {
		let _graph = self.scene_graph.lock().await;
		let session = self.session().await?;
		sync::export(session.as_ref()).await
	}

	/// Imports `doc`, clearing existing scenes first when `clear` is set.
	pub async fn import(&self, doc: &SnapshotDocument, clear: bool) -> Result<ImportSummary> {
		let _graph = self.scene_graph.lock().await;
		let session = self.session().await?;
		if clear {
			sync::clear_scenes(session.as_ref()).await?;
		}
		sync::import(session.as_ref(), doc).await
	}

	/// Removes every scene, leaving a staging anchor as the program scene.
	pub async fn clear_scenes(&self) -> Result<usize> {
		let _graph = self.scene_graph.lock().await;
		let session = self.session().await?;
		sync::clear_scenes(session.as_ref()).await
	}

	/// Exports and writes the snapshot to `path` as pretty JSON.
	pub async fn save_snapshot(&self, path: &Path) -> Result<SnapshotDocument> {
		let doc = self.export().await?;
		write_snapshot(path, &doc).await?;
		Ok(doc)
	}

	/// Reads a snapshot from `path` and imports it.
	pub async fn load_snapshot(&self, path: &Path, clear: bool) -> Result<ImportSummary> {
		let doc = read_snapshot(path).await?;
		self.import(&doc, clear).await
	}
}

pub async fn write_snapshot(path: &Path, doc: &SnapshotDocument) -> Result<()> {
	let text = serde_json::to_string_pretty(doc).map_err(|e| Error::InvalidDocument(e.to_string()))?;
	tokio::fs::write(path, text)
		.await
		.map_err(|source| Error::Snapshot {
			path: path.to_path_buf(),
			source,
		})
}

pub async fn read_snapshot(path: &Path) -> Result<SnapshotDocument> {
	let text = tokio::fs::read_to_string(path)
		.await
		.map_err(|source| Error::Snapshot {
			path: path.to_path_buf(),
			source,
		})?;
	serde_json::from_str(&text).map_err(|e| Error::InvalidDocument(format!("{}: {e}", path.display())))
}
