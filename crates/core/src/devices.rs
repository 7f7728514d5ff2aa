//! Capture-device enumeration through the controller.
//!
//! The controller only lists capture devices as property values of an
//! input, so enumeration creates throwaway capture inputs in a scratch
//! scene, reads their device lists, and tears the scaffolding down again.

use std::collections::HashSet;

use serde::Serialize;
use stagectl_protocol::Settings;
use tracing::{debug, warn};

use crate::classify::{
	Category, ClassifiedDevice, Platform, RawCaptureInput, UNKNOWN_DEVICE_ID, classify, default_input_kind, describe_device,
};
use crate::controller::{Controller, InputInfo, PropertyItem};
use crate::error::{ReconcileExt, Result};
use crate::hints::HintTable;
use crate::names::ensure_unique;
use crate::reserved::{DEVICE_SCENE, TEMP_AUDIO_CAPTURE, TEMP_VIDEO_CAPTURE, is_temp_input};
use crate::sync::capture_named_inputs;

/// Properties that may carry a microphone's device list, in lookup order.
const MIC_PROPERTIES: [&str; 3] = ["device_id", "device", "audio_device_id"];

/// Name of the list property holding the device of a camera input kind.
pub fn camera_property(kind: &str) -> &'static str {
	if kind.contains("v4l2") {
		"device_id"
	} else if kind.contains("av_capture") {
		"device"
	} else {
		"video_device_id"
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInventory {
	pub cameras: Vec<ClassifiedDevice>,
	pub microphones: Vec<ClassifiedDevice>,
}

impl DeviceInventory {
	fn push(&mut self, device: ClassifiedDevice) {
		let list = match device.category {
			Category::Camera => &mut self.cameras,
			Category::Microphone => &mut self.microphones,
		};
		list.push(device);
	}

	pub fn is_empty(&self) -> bool {
		self.cameras.is_empty() && self.microphones.is_empty()
	}
}

/// Lists capture devices the controller can see, plus existing inputs
/// that classify as devices.
///
/// The scratch scene is removed and the previous program scene restored
/// even when enumeration fails part-way.
pub async fn enumerate<C: Controller + ?Sized>(
	ctl: &C,
	hints: &HintTable,
	platform: Platform,
) -> Result<DeviceInventory> {
	let scenes = ctl.scene_list().await.step(|| "list scenes".into())?;
	let scratch = ensure_unique(DEVICE_SCENE, scenes.scenes.iter().map(String::as_str));
	ctl.create_scene(&scratch)
		.await
		.step(|| format!("create scene {scratch}"))?;

	let result = match ctl
		.set_current_scene(&scratch)
		.await
		.step(|| format!("switch to scene {scratch}"))
	{
		Ok(()) => scan(ctl, &scratch, hints, platform).await,
		Err(e) => Err(e),
	};

	if !scenes.current.is_empty() {
		if let Err(e) = ctl.set_current_scene(&scenes.current).await {
			warn!(target = "stagectl.devices", scene = %scenes.current, error = %e, "failed to restore program scene");
		}
	}
	if let Err(e) = ctl.remove_scene(&scratch).await {
		warn!(target = "stagectl.devices", scene = %scratch, error = %e, "scratch scene left in place");
	}

	result
}

async fn scan<C: Controller + ?Sized>(
	ctl: &C,
	scratch: &str,
	hints: &HintTable,
	platform: Platform,
) -> Result<DeviceInventory> {
	let existing = ctl.inputs().await.step(|| "list inputs".into())?;
	let names: Vec<&str> = existing.iter().map(|i| i.name.as_str()).collect();
	let mut inventory = DeviceInventory::default();

	let camera_kind = default_input_kind(Category::Camera, platform);
	let camera = ensure_unique(TEMP_VIDEO_CAPTURE, names.iter().copied());
	if create_probe(ctl, scratch, &camera, camera_kind).await {
		let property = camera_property(camera_kind);
		match ctl.property_items(&camera, property).await {
			Ok(items) => describe_items(&mut inventory, Category::Camera, camera_kind, &items, hints),
			Err(e) => warn!(target = "stagectl.devices", input = %camera, property, error = %e, "camera list unavailable"),
		}
	}

	let mic_kind = default_input_kind(Category::Microphone, platform);
	let mic = ensure_unique(TEMP_AUDIO_CAPTURE, names.iter().copied());
	if create_probe(ctl, scratch, &mic, mic_kind).await {
		match microphone_items(ctl, &mic).await {
			Some(items) => describe_items(&mut inventory, Category::Microphone, mic_kind, &items, hints),
			None => warn!(target = "stagectl.devices", input = %mic, "microphone list unavailable"),
		}
	}

	for input in &existing {
		if is_temp_input(&input.name) {
			continue;
		}
		if let Some(device) = classify_existing(ctl, input, hints).await {
			let duplicate = device.device_id != UNKNOWN_DEVICE_ID
				&& inventory_ids(&inventory, device.category).contains(device.device_id.as_str());
			if !duplicate {
				inventory.push(device);
			}
		}
	}

	debug!(
		target = "stagectl.devices",
		cameras = inventory.cameras.len(),
		microphones = inventory.microphones.len(),
		"enumerated devices"
	);
	Ok(inventory)
}

async fn create_probe<C: Controller + ?Sized>(ctl: &C, scene: &str, name: &str, kind: &str) -> bool {
	match ctl.create_input(scene, name, kind, &Settings::new()).await {
		Ok(_) => true,
		Err(e) => {
			warn!(target = "stagectl.devices", input = name, kind, error = %e, "failed to create probe input");
			false
		}
	}
}

async fn microphone_items<C: Controller + ?Sized>(ctl: &C, input: &str) -> Option<Vec<PropertyItem>> {
	for property in MIC_PROPERTIES {
		match ctl.property_items(input, property).await {
			Ok(items) => return Some(items),
			Err(e) => debug!(target = "stagectl.devices", input, property, error = %e, "no device list"),
		}
	}
	None
}

fn describe_items(
	inventory: &mut DeviceInventory,
	category: Category,
	kind: &str,
	items: &[PropertyItem],
	hints: &HintTable,
) {
	for item in items.iter().filter(|i| !i.value.is_empty()) {
		inventory.push(describe_device(category, &item.name, &item.value, Some(kind), hints));
	}
}

fn inventory_ids(inventory: &DeviceInventory, category: Category) -> HashSet<&str> {
	let list = match category {
		Category::Camera => &inventory.cameras,
		Category::Microphone => &inventory.microphones,
	};
	list.iter().map(|d| d.device_id.as_str()).collect()
}

async fn classify_existing<C: Controller + ?Sized>(
	ctl: &C,
	input: &InputInfo,
	hints: &HintTable,
) -> Option<ClassifiedDevice> {
	let settings = match ctl.input_settings(&input.name).await {
		Ok(settings) => settings,
		Err(e) => {
			debug!(target = "stagectl.devices", input = %input.name, error = %e, "settings unavailable");
			Settings::new()
		}
	};
	let raw = RawCaptureInput::new(input.kind.clone(), input.name.clone(), settings);
	classify(&raw, hints).map(|c| c.describe(hints))
}

/// Resolves the devices selected by the reserved named inputs.
///
/// Each named input's selected device id is looked up in its own device
/// list; inputs whose list cannot be read or whose selection is not
/// listed are skipped.
pub async fn named_devices<C: Controller + ?Sized>(ctl: &C, hints: &HintTable) -> DeviceInventory {
	let mut inventory = DeviceInventory::default();

	for named in capture_named_inputs(ctl).await {
		let category = if named.input_name.starts_with("DefaultCamera") {
			Category::Camera
		} else {
			Category::Microphone
		};
		let property = match category {
			Category::Camera => Some(camera_property(&named.input_kind)),
			Category::Microphone => MIC_PROPERTIES
				.into_iter()
				.find(|p| named.input_settings.contains_key(*p)),
		};
		let Some(property) = property else {
			debug!(target = "stagectl.devices", input = %named.input_name, "no device selected");
			continue;
		};
		let Some(selected) = named.input_settings.get(property).and_then(|v| v.as_str()) else {
			continue;
		};

		let items = match ctl.property_items(&named.input_name, property).await {
			Ok(items) => items,
			Err(e) => {
				warn!(target = "stagectl.devices", input = %named.input_name, error = %e, "device list unavailable");
				continue;
			}
		};
		match items.iter().find(|i| i.value == selected) {
			Some(item) => inventory.push(describe_device(
				category,
				&item.name,
				&item.value,
				Some(&named.input_kind),
				hints,
			)),
			None => debug!(target = "stagectl.devices", input = %named.input_name, selected, "selected device not listed"),
		}
	}

	inventory
}
