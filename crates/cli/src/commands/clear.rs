use serde::Serialize;
use stagectl::LocalStudio;

use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearData {
	pub removed_scenes: usize,
}

pub async fn execute(studio: &LocalStudio) -> Result<ClearData> {
	let removed_scenes = studio.clear_scenes().await?;
	Ok(ClearData { removed_scenes })
}
