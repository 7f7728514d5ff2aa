//! In-memory controller used by unit tests.
//!
//! Enforces the same rules as the real controller where they matter to the
//! synchronizer: unique scene/input/filter names, no removing the current
//! scene, inputs disappear once no scene places them.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use stagectl_protocol::{AudioSettings, Filter, Settings, Transform, VideoSettings};
use stagectl_runtime::{Error, Result};

use super::{Controller, InputInfo, PlacedItem, ProfileList, PropertyItem, SceneList, TransitionInfo};

#[derive(Debug, Clone)]
pub(crate) struct FakeScene {
	pub name: String,
	pub items: Vec<(i64, String)>,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeInput {
	pub name: String,
	pub kind: String,
	pub settings: Settings,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeProfile {
	pub name: String,
	pub video: VideoSettings,
	pub audio: AudioSettings,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeState {
	pub scenes: Vec<FakeScene>,
	pub current_scene: String,
	pub inputs: Vec<FakeInput>,
	pub filters: HashMap<String, Vec<Filter>>,
	pub transforms: HashMap<(String, i64), Transform>,
	pub next_item_id: i64,
	pub transitions: Vec<(String, String, Settings)>,
	pub current_transition: String,
	pub profiles: Vec<FakeProfile>,
	pub current_profile: String,
	/// Keyed by (input kind, property name).
	pub property_items: HashMap<(String, String), Vec<PropertyItem>>,
	pub failing: HashSet<&'static str>,
	pub log: Vec<String>,
}

pub(crate) const HD: VideoSettings = VideoSettings {
	base_width: 1920,
	base_height: 1080,
	output_width: 1280,
	output_height: 720,
	fps_numerator: 30,
	fps_denominator: 1,
};

pub(crate) const STEREO_48K: AudioSettings = AudioSettings {
	sample_rate: 48_000,
	channels: 2,
};

impl Default for FakeState {
	fn default() -> Self {
		Self {
			scenes: vec![FakeScene {
				name: "Scene".into(),
				items: Vec::new(),
			}],
			current_scene: "Scene".into(),
			inputs: Vec::new(),
			filters: HashMap::new(),
			transforms: HashMap::new(),
			next_item_id: 1,
			transitions: vec![
				("Fade".into(), "fade_transition".into(), Settings::new()),
				("Cut".into(), "cut_transition".into(), Settings::new()),
			],
			current_transition: "Fade".into(),
			profiles: vec![FakeProfile {
				name: "Untitled".into(),
				video: HD,
				audio: STEREO_48K,
			}],
			current_profile: "Untitled".into(),
			property_items: HashMap::new(),
			failing: HashSet::new(),
			log: Vec::new(),
		}
	}
}

fn remote(request_type: &str, comment: impl Into<String>) -> Error {
	Error::Remote {
		request_type: request_type.to_string(),
		code: 600,
		comment: Some(comment.into()),
	}
}

impl FakeState {
	fn scene_mut(&mut self, name: &str) -> Option<&mut FakeScene> {
		self.scenes.iter_mut().find(|s| s.name == name)
	}

	fn has_scene(&self, name: &str) -> bool {
		self.scenes.iter().any(|s| s.name == name)
	}

	fn has_input(&self, name: &str) -> bool {
		self.inputs.iter().any(|i| i.name == name)
	}

	fn place(&mut self, scene: &str, source: &str) -> i64 {
		let id = self.next_item_id;
		self.next_item_id += 1;
		if let Some(s) = self.scene_mut(scene) {
			s.items.push((id, source.to_string()));
		}
		id
	}

	fn profile_mut(&mut self) -> Option<&mut FakeProfile> {
		let current = self.current_profile.clone();
		self.profiles.iter_mut().find(|p| p.name == current)
	}

	/// Drops inputs no scene places anymore.
	fn release_orphans(&mut self) {
		let placed: HashSet<String> = self
			.scenes
			.iter()
			.flat_map(|s| s.items.iter().map(|(_, src)| src.clone()))
			.collect();
		self.inputs.retain(|i| placed.contains(&i.name));
		let filters = &mut self.filters;
		let scenes = &self.scenes;
		let inputs = &self.inputs;
		filters.retain(|source, _| {
			scenes.iter().any(|s| &s.name == source) || inputs.iter().any(|i| &i.name == source)
		});
	}
}

#[derive(Default)]
pub(crate) struct FakeController {
	pub state: Mutex<FakeState>,
}

impl FakeController {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_state(state: FakeState) -> Self {
		Self {
			state: Mutex::new(state),
		}
	}

	pub fn add_scene(&self, name: &str) {
		self.state.lock().scenes.push(FakeScene {
			name: name.into(),
			items: Vec::new(),
		});
	}

	/// Adds an input (if new) and places it in `scene`.
	pub fn add_input(&self, scene: &str, name: &str, kind: &str, settings: Settings) -> i64 {
		let mut state = self.state.lock();
		if !state.has_input(name) {
			state.inputs.push(FakeInput {
				name: name.into(),
				kind: kind.into(),
				settings,
			});
		}
		state.place(scene, name)
	}

	pub fn add_filter(&self, source: &str, filter: Filter) {
		self.state
			.lock()
			.filters
			.entry(source.into())
			.or_default()
			.push(filter);
	}

	pub fn set_transform(&self, scene: &str, item_id: i64, transform: Transform) {
		self.state
			.lock()
			.transforms
			.insert((scene.into(), item_id), transform);
	}

	pub fn set_property_items(&self, kind: &str, property: &str, items: Vec<PropertyItem>) {
		self.state
			.lock()
			.property_items
			.insert((kind.into(), property.into()), items);
	}

	pub fn fail(&self, request: &'static str) {
		self.state.lock().failing.insert(request);
	}

	pub fn snapshot(&self) -> FakeState {
		self.state.lock().clone()
	}

	pub fn scene_names(&self) -> Vec<String> {
		self.state.lock().scenes.iter().map(|s| s.name.clone()).collect()
	}

	pub fn sources_in(&self, scene: &str) -> Vec<String> {
		self.state
			.lock()
			.scenes
			.iter()
			.find(|s| s.name == scene)
			.map(|s| s.items.iter().map(|(_, src)| src.clone()).collect())
			.unwrap_or_default()
	}

	fn begin(&self, request: &'static str) -> Result<parking_lot::MutexGuard<'_, FakeState>> {
		let mut state = self.state.lock();
		state.log.push(request.to_string());
		if state.failing.contains(request) {
			return Err(remote(request, "injected failure"));
		}
		Ok(state)
	}
}

#[async_trait]
impl Controller for FakeController {
	async fn scene_list(&self) -> Result<SceneList> {
		let state = self.begin("GetSceneList")?;
		Ok(SceneList {
			scenes: state.scenes.iter().map(|s| s.name.clone()).collect(),
			current: state.current_scene.clone(),
		})
	}

	async fn create_scene(&self, name: &str) -> Result<()> {
		let mut state = self.begin("CreateScene")?;
		if state.has_scene(name) || state.has_input(name) {
			return Err(remote("CreateScene", format!("source {name} already exists")));
		}
		state.scenes.push(FakeScene {
			name: name.into(),
			items: Vec::new(),
		});
		Ok(())
	}

	async fn remove_scene(&self, name: &str) -> Result<()> {
		let mut state = self.begin("RemoveScene")?;
		if state.current_scene == name {
			return Err(remote("RemoveScene", "cannot remove the current program scene"));
		}
		let before = state.scenes.len();
		state.scenes.retain(|s| s.name != name);
		if state.scenes.len() == before {
			return Err(remote("RemoveScene", format!("no scene named {name}")));
		}
		state.transforms.retain(|(scene, _), _| scene != name);
		state.release_orphans();
		Ok(())
	}

	async fn set_current_scene(&self, name: &str) -> Result<()> {
		let mut state = self.begin("SetCurrentProgramScene")?;
		if !state.has_scene(name) {
			return Err(remote("SetCurrentProgramScene", format!("no scene named {name}")));
		}
		state.current_scene = name.into();
		Ok(())
	}

	async fn inputs(&self) -> Result<Vec<InputInfo>> {
		let state = self.begin("GetInputList")?;
		Ok(state
			.inputs
			.iter()
			.map(|i| InputInfo {
				name: i.name.clone(),
				kind: i.kind.clone(),
			})
			.collect())
	}

	async fn input_settings(&self, input: &str) -> Result<Settings> {
		let state = self.begin("GetInputSettings")?;
		state
			.inputs
			.iter()
			.find(|i| i.name == input)
			.map(|i| i.settings.clone())
			.ok_or_else(|| remote("GetInputSettings", format!("no input named {input}")))
	}

	async fn set_input_settings(&self, input: &str, settings: &Settings) -> Result<()> {
		let mut state = self.begin("SetInputSettings")?;
		let target = state
			.inputs
			.iter_mut()
			.find(|i| i.name == input)
			.ok_or_else(|| remote("SetInputSettings", format!("no input named {input}")))?;
		for (k, v) in settings {
			target.settings.insert(k.clone(), v.clone());
		}
		Ok(())
	}

	async fn create_input(&self, scene: &str, input: &str, kind: &str, settings: &Settings) -> Result<i64> {
		let mut state = self.begin("CreateInput")?;
		if !state.has_scene(scene) {
			return Err(remote("CreateInput", format!("no scene named {scene}")));
		}
		if state.has_input(input) || state.has_scene(input) {
			return Err(remote("CreateInput", format!("source {input} already exists")));
		}
		state.inputs.push(FakeInput {
			name: input.into(),
			kind: kind.into(),
			settings: settings.clone(),
		});
		Ok(state.place(scene, input))
	}

	async fn property_items(&self, input: &str, property: &str) -> Result<Vec<PropertyItem>> {
		let state = self.begin("GetInputPropertiesListPropertyItems")?;
		let kind = state
			.inputs
			.iter()
			.find(|i| i.name == input)
			.map(|i| i.kind.clone())
			.ok_or_else(|| remote("GetInputPropertiesListPropertyItems", format!("no input named {input}")))?;
		state
			.property_items
			.get(&(kind, property.to_string()))
			.cloned()
			.ok_or_else(|| remote("GetInputPropertiesListPropertyItems", format!("no list property {property}")))
	}

	async fn source_filters(&self, source: &str) -> Result<Vec<Filter>> {
		let state = self.begin("GetSourceFilterList")?;
		if !state.has_scene(source) && !state.has_input(source) {
			return Err(remote("GetSourceFilterList", format!("no source named {source}")));
		}
		Ok(state.filters.get(source).cloned().unwrap_or_default())
	}

	async fn create_source_filter(&self, source: &str, filter: &Filter) -> Result<()> {
		let mut state = self.begin("CreateSourceFilter")?;
		if !state.has_scene(source) && !state.has_input(source) {
			return Err(remote("CreateSourceFilter", format!("no source named {source}")));
		}
		let list = state.filters.entry(source.into()).or_default();
		if list.iter().any(|f| f.name == filter.name) {
			return Err(remote("CreateSourceFilter", format!("filter {} already exists", filter.name)));
		}
		list.push(filter.clone());
		Ok(())
	}

	async fn scene_items(&self, scene: &str) -> Result<Vec<PlacedItem>> {
		let state = self.begin("GetSceneItemList")?;
		let s = state
			.scenes
			.iter()
			.find(|s| s.name == scene)
			.ok_or_else(|| remote("GetSceneItemList", format!("no scene named {scene}")))?;
		Ok(s.items
			.iter()
			.map(|(id, source)| PlacedItem {
				id: *id,
				source_name: source.clone(),
				input_kind: state
					.inputs
					.iter()
					.find(|i| &i.name == source)
					.map(|i| i.kind.clone()),
			})
			.collect())
	}

	async fn create_scene_item(&self, scene: &str, source: &str) -> Result<i64> {
		let mut state = self.begin("CreateSceneItem")?;
		if !state.has_scene(scene) {
			return Err(remote("CreateSceneItem", format!("no scene named {scene}")));
		}
		if !state.has_input(source) && !state.has_scene(source) {
			return Err(remote("CreateSceneItem", format!("no source named {source}")));
		}
		Ok(state.place(scene, source))
	}

	async fn scene_item_transform(&self, scene: &str, item_id: i64) -> Result<Transform> {
		let state = self.begin("GetSceneItemTransform")?;
		Ok(state
			.transforms
			.get(&(scene.to_string(), item_id))
			.cloned()
			.unwrap_or_default())
	}

	async fn set_scene_item_transform(&self, scene: &str, item_id: i64, transform: &Transform) -> Result<()> {
		let mut state = self.begin("SetSceneItemTransform")?;
		state
			.transforms
			.insert((scene.to_string(), item_id), transform.clone());
		Ok(())
	}

	async fn transitions(&self) -> Result<Vec<TransitionInfo>> {
		let state = self.begin("GetSceneTransitionList")?;
		Ok(state
			.transitions
			.iter()
			.map(|(name, kind, _)| TransitionInfo {
				name: name.clone(),
				kind: kind.clone(),
			})
			.collect())
	}

	async fn current_transition(&self) -> Result<(String, Settings)> {
		let state = self.begin("GetCurrentSceneTransition")?;
		let settings = state
			.transitions
			.iter()
			.find(|(name, _, _)| *name == state.current_transition)
			.map(|(_, _, s)| s.clone())
			.unwrap_or_default();
		Ok((state.current_transition.clone(), settings))
	}

	async fn set_current_transition(&self, name: &str) -> Result<()> {
		let mut state = self.begin("SetCurrentSceneTransition")?;
		if !state.transitions.iter().any(|(n, _, _)| n == name) {
			return Err(remote("SetCurrentSceneTransition", format!("no transition named {name}")));
		}
		state.current_transition = name.into();
		Ok(())
	}

	async fn set_current_transition_settings(&self, settings: &Settings) -> Result<()> {
		let mut state = self.begin("SetCurrentSceneTransitionSettings")?;
		let current = state.current_transition.clone();
		if let Some((_, _, s)) = state.transitions.iter_mut().find(|(n, _, _)| *n == current) {
			*s = settings.clone();
		}
		Ok(())
	}

	async fn profiles(&self) -> Result<ProfileList> {
		let state = self.begin("GetProfileList")?;
		Ok(ProfileList {
			profiles: state.profiles.iter().map(|p| p.name.clone()).collect(),
			current: state.current_profile.clone(),
		})
	}

	async fn create_profile(&self, name: &str) -> Result<()> {
		let mut state = self.begin("CreateProfile")?;
		if state.profiles.iter().any(|p| p.name == name) {
			return Err(remote("CreateProfile", format!("profile {name} already exists")));
		}
		state.profiles.push(FakeProfile {
			name: name.into(),
			video: HD,
			audio: STEREO_48K,
		});
		state.current_profile = name.into();
		Ok(())
	}

	async fn set_current_profile(&self, name: &str) -> Result<()> {
		let mut state = self.begin("SetCurrentProfile")?;
		if !state.profiles.iter().any(|p| p.name == name) {
			return Err(remote("SetCurrentProfile", format!("no profile named {name}")));
		}
		state.current_profile = name.into();
		Ok(())
	}

	async fn video_settings(&self) -> Result<VideoSettings> {
		let mut state = self.begin("GetVideoSettings")?;
		state
			.profile_mut()
			.map(|p| p.video)
			.ok_or_else(|| remote("GetVideoSettings", "no current profile"))
	}

	async fn set_video_settings(&self, video: &VideoSettings) -> Result<()> {
		let mut state = self.begin("SetVideoSettings")?;
		let profile = state
			.profile_mut()
			.ok_or_else(|| remote("SetVideoSettings", "no current profile"))?;
		profile.video = *video;
		Ok(())
	}

	async fn audio_settings(&self) -> Result<AudioSettings> {
		let mut state = self.begin("GetProfileParameter")?;
		state
			.profile_mut()
			.map(|p| p.audio)
			.ok_or_else(|| remote("GetProfileParameter", "no current profile"))
	}

	async fn set_audio_settings(&self, audio: &AudioSettings) -> Result<()> {
		let mut state = self.begin("SetProfileParameter")?;
		let profile = state
			.profile_mut()
			.ok_or_else(|| remote("SetProfileParameter", "no current profile"))?;
		profile.audio = *audio;
		Ok(())
	}
}
