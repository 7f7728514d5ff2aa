use stagectl::{DeviceInventory, LocalStudio};
use tracing::info;

use crate::error::Result;

pub async fn execute(studio: &LocalStudio) -> Result<DeviceInventory> {
	let inventory = studio.devices().await?;
	info!(
		target = "stagectl.cli",
		cameras = inventory.cameras.len(),
		microphones = inventory.microphones.len(),
		"enumerated devices"
	);
	Ok(inventory)
}

/// Devices currently selected by the named inputs.
pub async fn execute_named(studio: &LocalStudio) -> Result<DeviceInventory> {
	Ok(studio.named_devices().await?)
}
