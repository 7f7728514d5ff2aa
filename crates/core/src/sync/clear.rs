use tracing::{debug, info};

use crate::controller::Controller;
use crate::error::{ReconcileExt, Result};
use crate::names::ensure_unique;
use crate::reserved::{STAGING_SCENE, is_staging_scene};

/// Removes every scene except a staging anchor, which is left current.
///
/// The controller refuses to remove its program scene, so the anchor is
/// created and switched to first. A later import adopts it. Returns the
/// number of scenes removed.
pub async fn clear_scenes<C: Controller + ?Sized>(ctl: &C) -> Result<usize> {
	let list = ctl.scene_list().await.step(|| "list scenes".into())?;

	let anchor = if is_staging_scene(&list.current) {
		list.current.clone()
	} else {
		let name = ensure_unique(STAGING_SCENE, list.scenes.iter().map(String::as_str));
		ctl.create_scene(&name)
			.await
			.step(|| format!("create staging scene {name}"))?;
		ctl.set_current_scene(&name)
			.await
			.step(|| format!("switch to scene {name}"))?;
		name
	};

	let mut removed = 0;
	for scene in list.scenes.iter().filter(|s| **s != anchor) {
		ctl.remove_scene(scene)
			.await
			.step(|| format!("remove scene {scene}"))?;
		debug!(target = "stagectl.sync", scene = %scene, "removed scene");
		removed += 1;
	}

	info!(target = "stagectl.sync", removed, anchor = %anchor, "cleared scenes");
	Ok(removed)
}
