//! Snapshot document: the declarative form of a controller's scene graph.
//!
//! The same shape is produced by export and consumed by import, so files are
//! interchangeable in both directions:
//!
//! ```json
//! {
//!   "namedInputs": [{ "inputName": "DefaultCamera", "inputKind": "dshow_input", "inputSettings": {} }],
//!   "scenes": [{ "name": "Main", "items": [], "filters": [] }],
//!   "currentScene": "Main",
//!   "transitions": [{ "name": "Fade", "kind": "fade_transition", "settings": {} }],
//!   "profiles": [],
//!   "currentProfile": null
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form settings object as reported by the controller.
pub type Settings = Map<String, Value>;

/// Full scene-graph snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
	/// Cross-scene persistent inputs identified by reserved names.
	#[serde(default, alias = "inputs")]
	pub named_inputs: Vec<NamedInput>,
	#[serde(default)]
	pub scenes: Vec<Scene>,
	#[serde(default)]
	pub current_scene: String,
	#[serde(default)]
	pub transitions: Vec<Transition>,
	#[serde(default)]
	pub profiles: Vec<Profile>,
	#[serde(default)]
	pub current_profile: Option<String>,
}

impl SnapshotDocument {
	/// Looks up a scene by name.
	pub fn scene(&self, name: &str) -> Option<&Scene> {
		self.scenes.iter().find(|s| s.name == name)
	}

	/// Looks up a named input by name.
	pub fn named_input(&self, name: &str) -> Option<&NamedInput> {
		self.named_inputs.iter().find(|i| i.input_name == name)
	}
}

/// A reserved, cross-scene input kept outside per-scene item lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedInput {
	pub input_name: String,
	pub input_kind: String,
	#[serde(default)]
	pub input_settings: Settings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
	pub name: String,
	#[serde(default)]
	pub items: Vec<SceneItem>,
	/// Scene-level filters, separate from the filters of placed items.
	#[serde(default)]
	pub filters: Vec<Filter>,
}

/// One placement of a source inside a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneItem {
	pub source_name: String,
	/// `None` when the source is not an input (for example a nested scene).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub input_kind: Option<String>,
	#[serde(default)]
	pub input_settings: Settings,
	#[serde(default)]
	pub transform: Transform,
	/// Filters attached to the item's underlying source.
	#[serde(default)]
	pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
	pub name: String,
	pub kind: String,
	#[serde(default)]
	pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
	pub name: String,
	pub kind: String,
	#[serde(default)]
	pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
	pub name: String,
	pub video: VideoSettings,
	pub audio: AudioSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSettings {
	pub base_width: u32,
	pub base_height: u32,
	pub output_width: u32,
	pub output_height: u32,
	pub fps_numerator: u32,
	pub fps_denominator: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSettings {
	pub sample_rate: u32,
	pub channels: u32,
}

/// Placement transform of a scene item.
///
/// Known writable fields are typed; anything else the controller reports
/// (source dimensions and similar read-only values) is kept in `extra` so a
/// snapshot preserves it verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub position_x: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub position_y: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rotation: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scale_x: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scale_y: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub alignment: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bounds_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bounds_alignment: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bounds_width: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bounds_height: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub crop_left: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub crop_right: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub crop_top: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub crop_bottom: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub crop_to_bounds: Option<bool>,
	#[serde(flatten)]
	pub extra: Settings,
}

/// Bounds type of an item whose size is not constrained.
pub const BOUNDS_NONE: &str = "OBS_BOUNDS_NONE";

impl Transform {
	/// Returns a copy containing only the fields the controller accepts on write.
	///
	/// Bounds sizes below 1 are rejected on write, so they are dropped, as are
	/// the sizes of unbounded items.
	pub fn writable(&self) -> Self {
		let unbounded = self.bounds_type.as_deref() == Some(BOUNDS_NONE);
		let size = |v: Option<f64>| v.filter(|v| !unbounded && *v >= 1.0);
		Self {
			bounds_width: size(self.bounds_width),
			bounds_height: size(self.bounds_height),
			extra: Settings::new(),
			..self.clone()
		}
	}
}
