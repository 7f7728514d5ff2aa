//! Snapshot export.

use stagectl_protocol::{Filter, NamedInput, Profile, Scene, SceneItem, Settings, SnapshotDocument, Transition};
use tracing::{debug, info, warn};

use crate::controller::Controller;
use crate::error::Result;
use crate::reserved::{is_device_scene, is_named_input, is_staging_scene};

/// Value of an optional read, or its empty default with the cause logged.
fn or_empty<T: Default>(result: stagectl_runtime::Result<T>, what: &str, source: &str) -> T {
	match result {
		Ok(value) => value,
		Err(e) => {
			warn!(target = "stagectl.sync", what, source, error = %e, "partial read failed; using empty value");
			T::default()
		}
	}
}

fn is_scratch_scene(name: &str) -> bool {
	is_staging_scene(name) || is_device_scene(name)
}

/// Reads the controller's live scene graph into a snapshot.
///
/// Scene-level filters, item filters, item settings, transitions, named
/// inputs and profiles are each read best-effort and degrade to empty on
/// failure. The scene list, item lists and item transforms are required.
///
/// Reading profile and transition settings switches the controller's
/// current profile and transition; both are restored afterwards.
pub async fn export<C: Controller + ?Sized>(ctl: &C) -> Result<SnapshotDocument> {
	let scene_list = ctl.scene_list().await?;
	let named_inputs = capture_named_inputs(ctl).await;

	let mut scenes = Vec::with_capacity(scene_list.scenes.len());
	for name in scene_list.scenes.iter().filter(|n| !is_scratch_scene(n)) {
		scenes.push(export_scene(ctl, name).await?);
	}

	let current_scene = program_scene(scene_list.current, &scenes);
	let transitions = export_transitions(ctl).await;
	let (profiles, current_profile) = export_profiles(ctl).await;

	info!(
		target = "stagectl.sync",
		scenes = scenes.len(),
		named_inputs = named_inputs.len(),
		transitions = transitions.len(),
		profiles = profiles.len(),
		"exported snapshot"
	);

	Ok(SnapshotDocument {
		named_inputs,
		scenes,
		current_scene,
		transitions,
		profiles,
		current_profile,
	})
}

/// The program scene if it was exported, else the first exported scene.
fn program_scene(current: String, scenes: &[Scene]) -> String {
	if scenes.iter().any(|s| s.name == current) {
		return current;
	}
	let fallback = scenes.first().map(|s| s.name.clone()).unwrap_or_default();
	debug!(target = "stagectl.sync", current = %current, fallback = %fallback, "program scene not exported");
	fallback
}

async fn export_scene<C: Controller + ?Sized>(ctl: &C, name: &str) -> Result<Scene> {
	let filters: Vec<Filter> = or_empty(ctl.source_filters(name).await, "scene filters", name);

	let placed = ctl.scene_items(name).await?;
	let mut items = Vec::with_capacity(placed.len());
	for item in placed {
		// Named inputs keep their settings in `namedInputs` only.
		let input_settings = match &item.input_kind {
			Some(_) if !is_named_input(&item.source_name) => or_empty(
				ctl.input_settings(&item.source_name).await,
				"input settings",
				&item.source_name,
			),
			_ => Settings::new(),
		};
		let transform = ctl.scene_item_transform(name, item.id).await?;
		let filters = or_empty(
			ctl.source_filters(&item.source_name).await,
			"item filters",
			&item.source_name,
		);

		items.push(SceneItem {
			source_name: item.source_name,
			input_kind: item.input_kind,
			input_settings,
			transform,
			filters,
		});
	}

	debug!(target = "stagectl.sync", scene = name, items = items.len(), "exported scene");
	Ok(Scene {
		name: name.to_string(),
		items,
		filters,
	})
}

/// Reserved cross-scene inputs with their current settings.
pub(crate) async fn capture_named_inputs<C: Controller + ?Sized>(ctl: &C) -> Vec<NamedInput> {
	let inputs = or_empty(ctl.inputs().await, "input list", "controller");

	let mut named = Vec::new();
	for input in inputs.into_iter().filter(|i| is_named_input(&i.name)) {
		match ctl.input_settings(&input.name).await {
			Ok(input_settings) => named.push(NamedInput {
				input_name: input.name,
				input_kind: input.kind,
				input_settings,
			}),
			Err(e) => {
				warn!(target = "stagectl.sync", input = %input.name, error = %e, "skipping named input");
			}
		}
	}
	named
}

async fn export_transitions<C: Controller + ?Sized>(ctl: &C) -> Vec<Transition> {
	let list = match ctl.transitions().await {
		Ok(list) => list,
		Err(e) => {
			warn!(target = "stagectl.sync", error = %e, "transition list unavailable");
			return Vec::new();
		}
	};
	let original = match ctl.current_transition().await {
		Ok((name, _)) => name,
		Err(e) => {
			warn!(target = "stagectl.sync", error = %e, "current transition unavailable");
			return Vec::new();
		}
	};

	let mut transitions = Vec::with_capacity(list.len());
	let mut failure = None;
	for info in list {
		let read = async {
			ctl.set_current_transition(&info.name).await?;
			ctl.current_transition().await
		};
		match read.await {
			Ok((_, settings)) => transitions.push(Transition {
				name: info.name,
				kind: info.kind,
				settings,
			}),
			Err(e) => {
				failure = Some(e);
				break;
			}
		}
	}

	if let Err(e) = ctl.set_current_transition(&original).await {
		warn!(target = "stagectl.sync", transition = %original, error = %e, "failed to restore current transition");
	}

	match failure {
		Some(e) => {
			warn!(target = "stagectl.sync", error = %e, "transition settings unavailable");
			Vec::new()
		}
		None => transitions,
	}
}

async fn export_profiles<C: Controller + ?Sized>(ctl: &C) -> (Vec<Profile>, Option<String>) {
	let list = match ctl.profiles().await {
		Ok(list) => list,
		Err(e) => {
			warn!(target = "stagectl.sync", error = %e, "profile list unavailable");
			return (Vec::new(), None);
		}
	};

	let mut profiles = Vec::with_capacity(list.profiles.len());
	let mut failure = None;
	for name in &list.profiles {
		let read = async {
			ctl.set_current_profile(name).await?;
			let video = ctl.video_settings().await?;
			let audio = ctl.audio_settings().await?;
			Ok::<_, stagectl_runtime::Error>((video, audio))
		};
		match read.await {
			Ok((video, audio)) => profiles.push(Profile {
				name: name.clone(),
				video,
				audio,
			}),
			Err(e) => {
				failure = Some(e);
				break;
			}
		}
	}

	if let Err(e) = ctl.set_current_profile(&list.current).await {
		warn!(target = "stagectl.sync", profile = %list.current, error = %e, "failed to restore current profile");
	}

	let current = Some(list.current).filter(|c| !c.is_empty());
	match failure {
		Some(e) => {
			warn!(target = "stagectl.sync", error = %e, "profile settings unavailable");
			(Vec::new(), current)
		}
		None => (profiles, current),
	}
}
