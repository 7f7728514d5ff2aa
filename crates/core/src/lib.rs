//! stagectl: capture-device classification and scene-graph snapshots for a
//! live production controller (OBS Studio over obs-websocket v5).
//!
//! # Examples
//!
//! ## Snapshot a running controller
//!
//! ```ignore
//! use std::path::Path;
//!
//! use stagectl::{HintTable, LocalStudio, SharedHints};
//! use stagectl_runtime::{ControllerConfig, LaunchConfig, RetryPolicy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let studio = LocalStudio::local(
//!         ControllerConfig::default(),
//!         LaunchConfig::default(),
//!         RetryPolicy::default(),
//!         SharedHints::new(HintTable::default()),
//!     );
//!
//!     let doc = studio.save_snapshot(Path::new("lecture.json")).await?;
//!     println!("{} scenes", doc.scenes.len());
//!
//!     studio.load_snapshot(Path::new("lecture.json"), true).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Classify a device offline
//!
//! ```ignore
//! use stagectl::{HintTable, RawCaptureInput, classify};
//!
//! let hints = HintTable::from_json(r#"{"mobile_apps": ["droidcam"]}"#)?;
//! let raw = RawCaptureInput::new("v4l2_input", "DroidCam Source", Default::default());
//! let device = classify(&raw, &hints).map(|c| c.describe(&hints));
//! ```

pub mod classify;
pub mod controller;
pub mod devices;
pub mod error;
pub mod hints;
pub mod names;
pub mod remote;
pub mod reserved;
pub mod studio;
pub mod sync;

pub use classify::{
	Category, Classification, ClassifiedDevice, Platform, RawCaptureInput, SourceKind, classify, describe_device,
	guess_manufacturer, guess_platform, guess_source, is_mobile_camera,
};
pub use controller::Controller;
pub use devices::DeviceInventory;
pub use error::{Error, Result};
pub use hints::{HintTable, SharedHints};
pub use names::ensure_unique;
pub use studio::{LocalStudio, Studio, read_snapshot, write_snapshot};
pub use sync::{ImportSummary, clear_scenes, export, import};

// Re-export the wire and runtime crates so callers need one dependency.
pub use stagectl_protocol as protocol;
pub use stagectl_runtime as runtime;
