//! Reserved scene and input names.
//!
//! The classifier skips these and the synchronizer recognizes them, so both
//! read the same constants.

/// Cross-scene inputs that a snapshot carries in `namedInputs`.
pub const NAMED_INPUTS: [&str; 4] = [
	"DefaultCamera",
	"DefaultCamera1",
	"DefaultCamera2",
	"DefaultMicrophone",
];

/// Base name of the scratch scene that anchors an import.
pub const STAGING_SCENE: &str = "TempImportScene";

/// Base name of the scratch scene used while enumerating devices.
pub const DEVICE_SCENE: &str = "TempSceneForDevices";

/// Base names of the scratch inputs used while enumerating devices.
pub const TEMP_VIDEO_CAPTURE: &str = "TempVideoCapture";
pub const TEMP_AUDIO_CAPTURE: &str = "TempAudioCapture";

pub fn is_named_input(name: &str) -> bool {
	NAMED_INPUTS.contains(&name)
}

/// True for `base`, `base2`, `base3`, ...
fn is_suffixed(name: &str, base: &str) -> bool {
	match name.strip_prefix(base) {
		Some("") => true,
		Some(rest) => rest.bytes().all(|b| b.is_ascii_digit()),
		None => false,
	}
}

pub fn is_staging_scene(name: &str) -> bool {
	is_suffixed(name, STAGING_SCENE)
}

pub fn is_device_scene(name: &str) -> bool {
	is_suffixed(name, DEVICE_SCENE)
}

pub fn is_temp_input(name: &str) -> bool {
	is_suffixed(name, TEMP_VIDEO_CAPTURE) || is_suffixed(name, TEMP_AUDIO_CAPTURE)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn suffixed_names_are_recognized() {
		assert!(is_staging_scene("TempImportScene"));
		assert!(is_staging_scene("TempImportScene3"));
		assert!(!is_staging_scene("TempImportSceneOld"));
		assert!(!is_staging_scene("Main"));

		assert!(is_temp_input("TempAudioCapture2"));
		assert!(!is_temp_input("DefaultMicrophone"));
		assert!(is_named_input("DefaultCamera2"));
		assert!(!is_named_input("DefaultCamera3"));
	}
}
