//! Typed view of the controller's remote API.
//!
//! The synchronizer and device enumeration talk to this trait only; the
//! concrete implementation over a live [`Session`](stagectl_runtime::Session)
//! lives in [`remote`](crate::remote).

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stagectl_protocol::{AudioSettings, Filter, Settings, Transform, VideoSettings};
use stagectl_runtime::Result;

/// Scene names plus the one currently on program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneList {
	pub scenes: Vec<String>,
	pub current: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputInfo {
	pub name: String,
	pub kind: String,
}

/// A placement of a source in a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedItem {
	pub id: i64,
	pub source_name: String,
	/// `None` when the source is not an input (nested scene, group).
	pub input_kind: Option<String>,
}

/// One selectable value of a list property (for example a capture device).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyItem {
	pub name: String,
	pub value: String,
	pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionInfo {
	pub name: String,
	pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileList {
	pub profiles: Vec<String>,
	pub current: String,
}

/// Remote operations needed by export, import and enumeration.
///
/// Every method maps to one controller request, except the audio pair,
/// which reads or writes two profile parameters.
#[async_trait]
pub trait Controller: Send + Sync {
	async fn scene_list(&self) -> Result<SceneList>;
	async fn create_scene(&self, name: &str) -> Result<()>;
	async fn remove_scene(&self, name: &str) -> Result<()>;
	async fn set_current_scene(&self, name: &str) -> Result<()>;

	async fn inputs(&self) -> Result<Vec<InputInfo>>;
	async fn input_settings(&self, input: &str) -> Result<Settings>;
	/// Overlays `settings` on the input's current settings.
	async fn set_input_settings(&self, input: &str, settings: &Settings) -> Result<()>;
	/// Creates an input and places it in `scene`; returns the new item id.
	async fn create_input(&self, scene: &str, input: &str, kind: &str, settings: &Settings) -> Result<i64>;
	async fn property_items(&self, input: &str, property: &str) -> Result<Vec<PropertyItem>>;

	async fn source_filters(&self, source: &str) -> Result<Vec<Filter>>;
	async fn create_source_filter(&self, source: &str, filter: &Filter) -> Result<()>;

	async fn scene_items(&self, scene: &str) -> Result<Vec<PlacedItem>>;
	/// Places an existing source in `scene`; returns the new item id.
	async fn create_scene_item(&self, scene: &str, source: &str) -> Result<i64>;
	async fn scene_item_transform(&self, scene: &str, item_id: i64) -> Result<Transform>;
	async fn set_scene_item_transform(&self, scene: &str, item_id: i64, transform: &Transform) -> Result<()>;

	async fn transitions(&self) -> Result<Vec<TransitionInfo>>;
	/// Name of the current transition and its settings.
	async fn current_transition(&self) -> Result<(String, Settings)>;
	async fn set_current_transition(&self, name: &str) -> Result<()>;
	async fn set_current_transition_settings(&self, settings: &Settings) -> Result<()>;

	async fn profiles(&self) -> Result<ProfileList>;
	async fn create_profile(&self, name: &str) -> Result<()>;
	async fn set_current_profile(&self, name: &str) -> Result<()>;
	async fn video_settings(&self) -> Result<VideoSettings>;
	async fn set_video_settings(&self, video: &VideoSettings) -> Result<()>;
	async fn audio_settings(&self) -> Result<AudioSettings>;
	async fn set_audio_settings(&self, audio: &AudioSettings) -> Result<()>;
}
