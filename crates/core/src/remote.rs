//! [`Controller`] over a live obs-websocket [`Session`].

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use stagectl_protocol::{AudioSettings, Filter, Settings, Transform, VideoSettings};
use stagectl_runtime::{Error, Result, Session};

use crate::controller::{Controller, InputInfo, PlacedItem, ProfileList, PropertyItem, SceneList, TransitionInfo};

/// Channel-setup names used by the controller's audio profile section.
const CHANNEL_SETUPS: [(u32, &str); 7] = [
	(1, "Mono"),
	(2, "Stereo"),
	(3, "2.1"),
	(4, "4.0"),
	(5, "4.1"),
	(6, "5.1"),
	(8, "7.1"),
];

pub(crate) fn channel_setup_name(channels: u32) -> Option<&'static str> {
	CHANNEL_SETUPS
		.iter()
		.find(|(count, _)| *count == channels)
		.map(|(_, name)| *name)
}

pub(crate) fn channel_count(setup: &str) -> Option<u32> {
	CHANNEL_SETUPS
		.iter()
		.find(|(_, name)| *name == setup)
		.map(|(count, _)| *count)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneListResponse {
	#[serde(default)]
	current_program_scene_name: Option<String>,
	scenes: Vec<SceneEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneEntry {
	scene_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputListResponse {
	inputs: Vec<InputEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputEntry {
	input_name: String,
	input_kind: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputSettingsResponse {
	#[serde(default)]
	input_settings: Settings,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneItemIdResponse {
	scene_item_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyItemsResponse {
	property_items: Vec<PropertyItemEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyItemEntry {
	#[serde(default)]
	item_name: String,
	#[serde(default = "enabled")]
	item_enabled: bool,
	#[serde(default)]
	item_value: Value,
}

fn enabled() -> bool {
	true
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterListResponse {
	filters: Vec<FilterEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterEntry {
	filter_name: String,
	filter_kind: String,
	#[serde(default)]
	filter_settings: Option<Settings>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneItemListResponse {
	scene_items: Vec<SceneItemEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneItemEntry {
	scene_item_id: i64,
	source_name: String,
	#[serde(default)]
	input_kind: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransformResponse {
	scene_item_transform: Transform,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransitionListResponse {
	transitions: Vec<TransitionEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransitionEntry {
	transition_name: String,
	transition_kind: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentTransitionResponse {
	transition_name: String,
	#[serde(default)]
	transition_settings: Option<Settings>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileListResponse {
	current_profile_name: String,
	profiles: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileParameterResponse {
	#[serde(default)]
	parameter_value: Option<String>,
	#[serde(default)]
	default_parameter_value: Option<String>,
}

/// Property item values are strings for device lists but may be numbers
/// for other list properties.
fn value_string(value: Value) -> String {
	match value {
		Value::String(s) => s,
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

async fn request<T: DeserializeOwned>(session: &Session, request_type: &str, data: Value) -> Result<T> {
	session.call_as(request_type, data).await
}

async fn send(session: &Session, request_type: &str, data: Value) -> Result<()> {
	session.call(request_type, data).await.map(|_| ())
}

async fn audio_parameter(session: &Session, name: &str) -> Result<String> {
	let response: ProfileParameterResponse = request(
		session,
		"GetProfileParameter",
		json!({ "parameterCategory": "Audio", "parameterName": name }),
	)
	.await?;
	response
		.parameter_value
		.or(response.default_parameter_value)
		.ok_or_else(|| Error::Protocol(format!("audio parameter {name} is unset")))
}

async fn set_audio_parameter(session: &Session, name: &str, value: &str) -> Result<()> {
	send(
		session,
		"SetProfileParameter",
		json!({ "parameterCategory": "Audio", "parameterName": name, "parameterValue": value }),
	)
	.await
}

#[async_trait]
impl Controller for Session {
	async fn scene_list(&self) -> Result<SceneList> {
		let response: SceneListResponse = request(self, "GetSceneList", Value::Null).await?;
		Ok(SceneList {
			scenes: response.scenes.into_iter().map(|s| s.scene_name).collect(),
			current: response.current_program_scene_name.unwrap_or_default(),
		})
	}

	async fn create_scene(&self, name: &str) -> Result<()> {
		send(self, "CreateScene", json!({ "sceneName": name })).await
	}

	async fn remove_scene(&self, name: &str) -> Result<()> {
		send(self, "RemoveScene", json!({ "sceneName": name })).await
	}

	async fn set_current_scene(&self, name: &str) -> Result<()> {
		send(self, "SetCurrentProgramScene", json!({ "sceneName": name })).await
	}

	async fn inputs(&self) -> Result<Vec<InputInfo>> {
		let response: InputListResponse = request(self, "GetInputList", Value::Null).await?;
		Ok(response
			.inputs
			.into_iter()
			.map(|i| InputInfo {
				name: i.input_name,
				kind: i.input_kind,
			})
			.collect())
	}

	async fn input_settings(&self, input: &str) -> Result<Settings> {
		let response: InputSettingsResponse = request(self, "GetInputSettings", json!({ "inputName": input })).await?;
		Ok(response.input_settings)
	}

	async fn set_input_settings(&self, input: &str, settings: &Settings) -> Result<()> {
		send(
			self,
			"SetInputSettings",
			json!({ "inputName": input, "inputSettings": settings, "overlay": true }),
		)
		.await
	}

	async fn create_input(&self, scene: &str, input: &str, kind: &str, settings: &Settings) -> Result<i64> {
		let response: SceneItemIdResponse = request(
			self,
			"CreateInput",
			json!({
				"sceneName": scene,
				"inputName": input,
				"inputKind": kind,
				"inputSettings": settings,
				"sceneItemEnabled": true,
			}),
		)
		.await?;
		Ok(response.scene_item_id)
	}

	async fn property_items(&self, input: &str, property: &str) -> Result<Vec<PropertyItem>> {
		let response: PropertyItemsResponse = request(
			self,
			"GetInputPropertiesListPropertyItems",
			json!({ "inputName": input, "propertyName": property }),
		)
		.await?;
		Ok(response
			.property_items
			.into_iter()
			.map(|item| PropertyItem {
				name: item.item_name,
				value: value_string(item.item_value),
				enabled: item.item_enabled,
			})
			.collect())
	}

	async fn source_filters(&self, source: &str) -> Result<Vec<Filter>> {
		let response: FilterListResponse = request(self, "GetSourceFilterList", json!({ "sourceName": source })).await?;
		Ok(response
			.filters
			.into_iter()
			.map(|f| Filter {
				name: f.filter_name,
				kind: f.filter_kind,
				settings: f.filter_settings.unwrap_or_default(),
			})
			.collect())
	}

	async fn create_source_filter(&self, source: &str, filter: &Filter) -> Result<()> {
		send(
			self,
			"CreateSourceFilter",
			json!({
				"sourceName": source,
				"filterName": filter.name,
				"filterKind": filter.kind,
				"filterSettings": filter.settings,
			}),
		)
		.await
	}

	async fn scene_items(&self, scene: &str) -> Result<Vec<PlacedItem>> {
		let response: SceneItemListResponse = request(self, "GetSceneItemList", json!({ "sceneName": scene })).await?;
		Ok(response
			.scene_items
			.into_iter()
			.map(|item| PlacedItem {
				id: item.scene_item_id,
				source_name: item.source_name,
				input_kind: item.input_kind,
			})
			.collect())
	}

	async fn create_scene_item(&self, scene: &str, source: &str) -> Result<i64> {
		let response: SceneItemIdResponse = request(
			self,
			"CreateSceneItem",
			json!({ "sceneName": scene, "sourceName": source, "sceneItemEnabled": true }),
		)
		.await?;
		Ok(response.scene_item_id)
	}

	async fn scene_item_transform(&self, scene: &str, item_id: i64) -> Result<Transform> {
		let response: TransformResponse = request(
			self,
			"GetSceneItemTransform",
			json!({ "sceneName": scene, "sceneItemId": item_id }),
		)
		.await?;
		Ok(response.scene_item_transform)
	}

	async fn set_scene_item_transform(&self, scene: &str, item_id: i64, transform: &Transform) -> Result<()> {
		send(
			self,
			"SetSceneItemTransform",
			json!({ "sceneName": scene, "sceneItemId": item_id, "sceneItemTransform": transform }),
		)
		.await
	}

	async fn transitions(&self) -> Result<Vec<TransitionInfo>> {
		let response: TransitionListResponse = request(self, "GetSceneTransitionList", Value::Null).await?;
		Ok(response
			.transitions
			.into_iter()
			.map(|t| TransitionInfo {
				name: t.transition_name,
				kind: t.transition_kind,
			})
			.collect())
	}

	async fn current_transition(&self) -> Result<(String, Settings)> {
		let response: CurrentTransitionResponse = request(self, "GetCurrentSceneTransition", Value::Null).await?;
		Ok((
			response.transition_name,
			response.transition_settings.unwrap_or_default(),
		))
	}

	async fn set_current_transition(&self, name: &str) -> Result<()> {
		send(self, "SetCurrentSceneTransition", json!({ "transitionName": name })).await
	}

	async fn set_current_transition_settings(&self, settings: &Settings) -> Result<()> {
		send(
			self,
			"SetCurrentSceneTransitionSettings",
			json!({ "transitionSettings": settings }),
		)
		.await
	}

	async fn profiles(&self) -> Result<ProfileList> {
		let response: ProfileListResponse = request(self, "GetProfileList", Value::Null).await?;
		Ok(ProfileList {
			profiles: response.profiles,
			current: response.current_profile_name,
		})
	}

	async fn create_profile(&self, name: &str) -> Result<()> {
		send(self, "CreateProfile", json!({ "profileName": name })).await
	}

	async fn set_current_profile(&self, name: &str) -> Result<()> {
		send(self, "SetCurrentProfile", json!({ "profileName": name })).await
	}

	async fn video_settings(&self) -> Result<VideoSettings> {
		request(self, "GetVideoSettings", Value::Null).await
	}

	async fn set_video_settings(&self, video: &VideoSettings) -> Result<()> {
		send(self, "SetVideoSettings", serde_json::to_value(video)?).await
	}

	async fn audio_settings(&self) -> Result<AudioSettings> {
		let rate = audio_parameter(self, "SampleRate").await?;
		let sample_rate = rate
			.trim()
			.parse()
			.map_err(|_| Error::Protocol(format!("unexpected sample rate {rate:?}")))?;
		let setup = audio_parameter(self, "ChannelSetup").await?;
		let channels = channel_count(&setup).ok_or_else(|| Error::Protocol(format!("unknown channel setup {setup:?}")))?;
		Ok(AudioSettings {
			sample_rate,
			channels,
		})
	}

	async fn set_audio_settings(&self, audio: &AudioSettings) -> Result<()> {
		let setup = channel_setup_name(audio.channels)
			.ok_or_else(|| Error::Protocol(format!("unsupported channel count {}", audio.channels)))?;
		set_audio_parameter(self, "SampleRate", &audio.sample_rate.to_string()).await?;
		set_audio_parameter(self, "ChannelSetup", setup).await
	}
}
