//! Device classifier.
//!
//! Turns raw capture-input records (kind, name, settings) into typed
//! devices. Everything here is a pure function of its inputs and a
//! [`HintTable`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stagectl_protocol::Settings;

use crate::hints::{HintTable, contains_any};
use crate::reserved::is_named_input;

/// Device id used when a record carries none.
pub const UNKNOWN_DEVICE_ID: &str = "unknown";

const CAMERA_KIND_MARKERS: [&str; 3] = ["dshow", "v4l2", "av_capture"];
const AUDIO_KIND_MARKERS: [&str; 3] = ["wasapi", "pulse", "coreaudio"];

const NETWORK_SCHEMES: [&str; 4] = ["rtsp://", "rtmp://", "http://", "https://"];
const NETWORK_PROTOCOLS: [&str; 4] = ["rtsp", "rtmp", "ipcam", "ip webcam"];
const USB_TOKENS: [&str; 5] = ["usb", "vid_", "pid_", "vendor", "product"];
const APPLE_MARKERS: [&str; 3] = ["iphone", "ipad", "facetime"];
const MOBILE_NETWORK_TOKENS: [&str; 3] = ["rtsp", "http", "ipcam"];
const INTEGRATED_MARKERS: [&str; 3] = ["integrated", "built-in", "facetime hd camera"];

static USB_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(vid|pid|usb)").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
	Camera,
	Microphone,
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Category::Camera => "camera",
			Category::Microphone => "microphone",
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
	Windows,
	Linux,
	Apple,
	Unknown,
}

impl Platform {
	/// Platform this binary was built for.
	pub fn host() -> Self {
		if cfg!(windows) {
			Platform::Windows
		} else if cfg!(target_os = "macos") {
			Platform::Apple
		} else if cfg!(target_os = "linux") {
			Platform::Linux
		} else {
			Platform::Unknown
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
	Network,
	VirtualDriver,
	Usb,
	Unknown,
}

/// A capture input as reported by enumeration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCaptureInput {
	pub kind: String,
	pub name: String,
	#[serde(default)]
	pub settings: Settings,
}

impl RawCaptureInput {
	pub fn new(kind: impl Into<String>, name: impl Into<String>, settings: Settings) -> Self {
		Self {
			kind: kind.into(),
			name: name.into(),
			settings,
		}
	}

	/// First non-empty string under `device_id` or `device`.
	pub fn device_id(&self) -> Option<&str> {
		["device_id", "device"]
			.iter()
			.filter_map(|key| self.settings.get(*key).and_then(Value::as_str))
			.find(|id| !id.is_empty())
	}
}

/// Outcome of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
	pub category: Category,
	pub name: String,
	pub device_id: String,
	pub input_kind: String,
}

/// Fully described device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedDevice {
	pub category: Category,
	pub name: String,
	pub device_id: String,
	pub input_kind: String,
	pub platform: Platform,
	pub source: SourceKind,
	pub manufacturer: Option<String>,
	/// Only set for cameras.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub is_mobile: Option<bool>,
	/// Heuristics that fired, in evaluation order. Empty for microphones.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub matched_hints: Vec<String>,
}

fn normalize(s: &str) -> String {
	s.trim().to_lowercase()
}

/// Capture kind the controller uses for `category` on `platform`.
pub fn default_input_kind(category: Category, platform: Platform) -> &'static str {
	match (category, platform) {
		(Category::Camera, Platform::Linux) => "v4l2_input",
		(Category::Camera, Platform::Apple) => "av_capture_input",
		(Category::Camera, _) => "dshow_input",
		(Category::Microphone, Platform::Linux) => "pulse_input_capture",
		(Category::Microphone, Platform::Apple) => "coreaudio_input_capture",
		(Category::Microphone, _) => "wasapi_input_capture",
	}
}

/// Decides whether a raw record is a camera, a microphone, or neither.
///
/// Rules, first match wins:
/// 1. reserved bookkeeping names are never devices
/// 2. a camera capture kind means camera
/// 3. an audio capture kind means microphone
/// 4. with a known device id: name hints, then microphone hints, then id hints
pub fn classify(raw: &RawCaptureInput, hints: &HintTable) -> Option<Classification> {
	if is_named_input(&raw.name) {
		return None;
	}

	let device_id = raw.device_id().unwrap_or(UNKNOWN_DEVICE_ID).to_string();
	let kind = raw.kind.as_str();
	let found = |category: Category| {
		let input_kind = if kind.is_empty() {
			default_input_kind(category, Platform::Unknown).to_string()
		} else {
			kind.to_string()
		};
		Some(Classification {
			category,
			name: raw.name.clone(),
			device_id: device_id.clone(),
			input_kind,
		})
	};

	if contains_any(kind, &CAMERA_KIND_MARKERS) {
		return found(Category::Camera);
	}
	if contains_any(kind, &AUDIO_KIND_MARKERS) {
		return found(Category::Microphone);
	}

	if device_id != UNKNOWN_DEVICE_ID {
		let name = raw.name.to_lowercase();
		if contains_any(&name, &hints.name_hints) {
			return found(Category::Camera);
		}
		if contains_any(&name, &hints.microphone_hints) {
			return found(Category::Microphone);
		}
		if contains_any(&device_id.to_lowercase(), &hints.id_hints) {
			return found(Category::Camera);
		}
	}

	None
}

pub fn guess_platform(kind: &str) -> Platform {
	let k = normalize(kind);
	if k.contains("dshow") {
		Platform::Windows
	} else if k.contains("v4l2") {
		Platform::Linux
	} else if k.contains("av_capture") || k.contains("coreaudio") {
		Platform::Apple
	} else if k.contains("wasapi") {
		Platform::Windows
	} else if k.contains("pulse") {
		Platform::Linux
	} else {
		Platform::Unknown
	}
}

/// Network beats virtual driver beats USB.
pub fn guess_source(name: &str, device_id: &str, hints: &HintTable) -> SourceKind {
	let n = normalize(name);
	let d = normalize(device_id);

	if contains_any(&d, &NETWORK_SCHEMES) || contains_any(&d, &NETWORK_PROTOCOLS) {
		return SourceKind::Network;
	}
	if contains_any(&n, &hints.mobile_apps) || contains_any(&d, &hints.mobile_apps) {
		return SourceKind::VirtualDriver;
	}
	let usb_pattern = USB_PATTERN.as_ref().is_some_and(|re| re.is_match(&d));
	if contains_any(&d, &USB_TOKENS) || usb_pattern {
		return SourceKind::Usb;
	}
	SourceKind::Unknown
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(token: &str) -> String {
	let mut chars = token.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
		None => String::new(),
	}
}

pub fn guess_manufacturer(name: &str, device_id: &str, hints: &HintTable) -> Option<String> {
	let n = normalize(name);
	let d = normalize(device_id);

	if let Some(m) = hints
		.manufacturers
		.iter()
		.find(|m| n.contains(m.as_str()) || d.contains(m.as_str()))
	{
		return Some(capitalize(m));
	}

	if let Some((_, brand)) = hints
		.aliases
		.iter()
		.find(|(alias, _)| n.contains(alias.as_str()) || d.contains(alias.as_str()))
	{
		return Some(brand.clone());
	}

	let combined = format!("{n} {d}");
	if contains_any(&combined, &APPLE_MARKERS) {
		return Some("Apple".to_string());
	}

	None
}

/// Is this camera really a phone?
///
/// Returns the verdict plus every tag that fired, in evaluation order.
/// Positive tags: `name_hint`, `id_hint`, `mobile_app`, `network`,
/// `manufacturer:Apple`. Negative tags (`pc_webcam_brand`,
/// `integrated_laptop`) override any number of positive ones.
pub fn is_mobile_camera(name: &str, device_id: &str, hints: &HintTable) -> (bool, Vec<String>) {
	let n = normalize(name);
	let d = normalize(device_id);
	let mut tags = Vec::new();

	if contains_any(&n, &hints.name_hints) {
		tags.push("name_hint".to_string());
	}
	if contains_any(&d, &hints.id_hints) {
		tags.push("id_hint".to_string());
	}
	if contains_any(&n, &hints.mobile_apps) {
		tags.push("mobile_app".to_string());
	}
	if contains_any(&d, &MOBILE_NETWORK_TOKENS) {
		tags.push("network".to_string());
	}
	if let Some(manufacturer) = guess_manufacturer(name, device_id, hints) {
		tags.push(format!("manufacturer:{manufacturer}"));
	}
	if contains_any(&n, &hints.pc_webcams) {
		tags.push("pc_webcam_brand".to_string());
	}
	if contains_any(&n, &INTEGRATED_MARKERS) {
		tags.push("integrated_laptop".to_string());
	}

	let positive = tags.iter().any(|t| {
		matches!(
			t.as_str(),
			"name_hint" | "id_hint" | "mobile_app" | "network" | "manufacturer:Apple"
		)
	});
	let negative = tags
		.iter()
		.any(|t| t == "pc_webcam_brand" || t == "integrated_laptop");

	(positive && !negative, tags)
}

/// Builds the full description of a device.
///
/// Without an explicit `input_kind` the platform is guessed from the
/// category's fallback kind and the kind is then taken from the platform.
pub fn describe_device(
	category: Category,
	name: &str,
	device_id: &str,
	input_kind: Option<&str>,
	hints: &HintTable,
) -> ClassifiedDevice {
	let input_kind = input_kind.filter(|k| !k.is_empty());
	let platform = guess_platform(input_kind.unwrap_or(default_input_kind(category, Platform::Unknown)));
	let input_kind = input_kind
		.map(str::to_string)
		.unwrap_or_else(|| default_input_kind(category, platform).to_string());

	let (is_mobile, matched_hints) = match category {
		Category::Camera => {
			let (mobile, tags) = is_mobile_camera(name, device_id, hints);
			(Some(mobile), tags)
		}
		Category::Microphone => (None, Vec::new()),
	};

	ClassifiedDevice {
		category,
		name: name.to_string(),
		device_id: device_id.to_string(),
		input_kind,
		platform,
		source: guess_source(name, device_id, hints),
		manufacturer: guess_manufacturer(name, device_id, hints),
		is_mobile,
		matched_hints,
	}
}

impl Classification {
	pub fn describe(&self, hints: &HintTable) -> ClassifiedDevice {
		describe_device(
			self.category,
			&self.name,
			&self.device_id,
			Some(&self.input_kind),
			hints,
		)
	}
}
