use serde::Serialize;
use stagectl::LocalStudio;
use stagectl::runtime::ControllerVersion;
use tracing::info;

use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
	pub controller_version: String,
	pub websocket_version: String,
	pub rpc_version: u32,
	pub platform: String,
}

impl From<ControllerVersion> for StatusData {
	fn from(v: ControllerVersion) -> Self {
		Self {
			controller_version: v.obs_version,
			websocket_version: v.obs_web_socket_version,
			rpc_version: v.rpc_version,
			platform: v.platform_description,
		}
	}
}

pub async fn execute(studio: &LocalStudio) -> Result<StatusData> {
	let session = studio.session().await?;
	let version = session.version().await?;
	info!(target = "stagectl.cli", version = %version.obs_version, "controller ready");
	Ok(version.into())
}
