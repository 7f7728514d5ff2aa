use serde::Serialize;
use serde_json::{Map, Value};
use stagectl::{ClassifiedDevice, HintTable, RawCaptureInput, classify};

use crate::cli::ClassifyArgs;

/// `device` is null when the record is not a capture device.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyData {
	pub device: Option<ClassifiedDevice>,
}

/// Classifies and describes one record without contacting the controller.
pub fn classify_record(args: &ClassifyArgs, hints: &HintTable) -> ClassifyData {
	let mut settings = Map::new();
	if let Some(id) = &args.device_id {
		settings.insert("device_id".into(), Value::String(id.clone()));
	}
	let raw = RawCaptureInput::new(args.kind.as_str(), args.name.as_str(), settings);

	ClassifyData {
		device: classify(&raw, hints).map(|c| c.describe(hints)),
	}
}
