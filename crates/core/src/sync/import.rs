//! Snapshot import: additive reconciliation onto a live controller.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use stagectl_protocol::{Filter, NamedInput, Profile, Scene, SnapshotDocument, Transition};
use tracing::{debug, info, warn};

use crate::controller::Controller;
use crate::error::{Error, ReconcileExt, Result};
use crate::names::ensure_unique;
use crate::reserved::{STAGING_SCENE, is_staging_scene};

/// Counts of what an import created or updated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
	pub named_inputs_updated: usize,
	pub named_inputs_created: usize,
	pub scenes_created: usize,
	pub items_placed: usize,
	pub filters_created: usize,
	pub transitions_applied: usize,
	pub profiles_applied: usize,
}

/// Filter names known per source, so a filter is created at most once.
#[derive(Default)]
struct FilterLedger {
	by_source: HashMap<String, HashSet<String>>,
}

impl FilterLedger {
	/// Creates `filter` on `source` unless a filter of that name is already there.
	async fn ensure<C: Controller + ?Sized>(&mut self, ctl: &C, source: &str, filter: &Filter) -> Result<bool> {
		if !self.by_source.contains_key(source) {
			let existing = match ctl.source_filters(source).await {
				Ok(filters) => filters.into_iter().map(|f| f.name).collect(),
				Err(e) => {
					debug!(target = "stagectl.sync", source, error = %e, "existing filters unknown");
					HashSet::new()
				}
			};
			self.by_source.insert(source.to_string(), existing);
		}
		let known = self.by_source.entry(source.to_string()).or_default();
		if known.contains(&filter.name) {
			return Ok(false);
		}

		ctl.create_source_filter(source, filter)
			.await
			.step(|| format!("create filter {} on {source}", filter.name))?;
		known.insert(filter.name.clone());
		Ok(true)
	}
}

struct Importer<'a, C: Controller + ?Sized> {
	ctl: &'a C,
	staging: String,
	scenes: HashSet<String>,
	inputs: HashSet<String>,
	filters: FilterLedger,
	summary: ImportSummary,
}

/// Materializes `doc` onto the controller.
///
/// Existing scenes are kept and never overwritten; listed scenes that are
/// missing are created. Every item in the document gets a new placement,
/// so importing onto a target that already holds the same items yields
/// duplicates. Callers wanting a clean result clear the scenes first.
///
/// Named-input setting updates and staging cleanup are best-effort. Any
/// other failed step aborts the import with [`Error::Reconcile`].
pub async fn import<C: Controller + ?Sized>(ctl: &C, doc: &SnapshotDocument) -> Result<ImportSummary> {
	let scene_list = ctl.scene_list().await.step(|| "list scenes".into())?;
	let staging = if is_staging_scene(&scene_list.current) {
		debug!(target = "stagectl.sync", scene = %scene_list.current, "adopting staging scene");
		scene_list.current.clone()
	} else {
		let name = ensure_unique(STAGING_SCENE, scene_list.scenes.iter().map(String::as_str));
		ctl.create_scene(&name)
			.await
			.step(|| format!("create staging scene {name}"))?;
		name
	};

	let inputs = ctl.inputs().await.step(|| "list inputs".into())?;
	let mut importer = Importer {
		ctl,
		scenes: scene_list.scenes.into_iter().chain([staging.clone()]).collect(),
		staging,
		inputs: inputs.into_iter().map(|i| i.name).collect(),
		filters: FilterLedger::default(),
		summary: ImportSummary::default(),
	};

	importer.run(doc).await?;
	importer.remove_staging().await;

	info!(target = "stagectl.sync", summary = ?importer.summary, "imported snapshot");
	Ok(importer.summary)
}

impl<C: Controller + ?Sized> Importer<'_, C> {
	async fn run(&mut self, doc: &SnapshotDocument) -> Result<()> {
		for named in &doc.named_inputs {
			self.named_input(named).await?;
		}

		for scene in &doc.scenes {
			if self.scenes.contains(&scene.name) {
				continue;
			}
			self.ctl
				.create_scene(&scene.name)
				.await
				.step(|| format!("create scene {}", scene.name))?;
			self.scenes.insert(scene.name.clone());
			self.summary.scenes_created += 1;
		}

		for scene in &doc.scenes {
			self.populate(scene).await?;
		}

		self.transitions(&doc.transitions).await?;

		for profile in &doc.profiles {
			self.profile(profile).await?;
		}

		if !doc.current_scene.is_empty() {
			self.ctl
				.set_current_scene(&doc.current_scene)
				.await
				.step(|| format!("set current scene {}", doc.current_scene))?;
		}
		if let Some(profile) = &doc.current_profile {
			self.ctl
				.set_current_profile(profile)
				.await
				.step(|| format!("set current profile {profile}"))?;
		}
		Ok(())
	}

	async fn named_input(&mut self, named: &NamedInput) -> Result<()> {
		if self.inputs.contains(&named.input_name) {
			match self
				.ctl
				.set_input_settings(&named.input_name, &named.input_settings)
				.await
			{
				Ok(()) => self.summary.named_inputs_updated += 1,
				Err(e) => {
					warn!(target = "stagectl.sync", input = %named.input_name, error = %e, "named input update failed");
				}
			}
			return Ok(());
		}

		self.ctl
			.create_input(
				&self.staging,
				&named.input_name,
				&named.input_kind,
				&named.input_settings,
			)
			.await
			.step(|| format!("create named input {}", named.input_name))?;
		self.inputs.insert(named.input_name.clone());
		self.summary.named_inputs_created += 1;
		Ok(())
	}

	async fn populate(&mut self, scene: &Scene) -> Result<()> {
		for filter in &scene.filters {
			if self.filters.ensure(self.ctl, &scene.name, filter).await? {
				self.summary.filters_created += 1;
			}
		}

		for item in &scene.items {
			let source = &item.source_name;
			let id = if self.inputs.contains(source) || self.scenes.contains(source) {
				self.ctl
					.create_scene_item(&scene.name, source)
					.await
					.step(|| format!("place {source} in {}", scene.name))?
			} else {
				let kind = item.input_kind.as_deref().ok_or_else(|| Error::Reconcile {
					step: format!("place {source} in {}", scene.name),
					source: stagectl_runtime::Error::Protocol(format!(
						"source {source} does not exist and has no input kind"
					)),
				})?;
				let id = self
					.ctl
					.create_input(&scene.name, source, kind, &item.input_settings)
					.await
					.step(|| format!("create input {source} in {}", scene.name))?;
				self.inputs.insert(source.clone());
				id
			};
			self.summary.items_placed += 1;

			self.ctl
				.set_scene_item_transform(&scene.name, id, &item.transform.writable())
				.await
				.step(|| format!("set transform of {source} in {}", scene.name))?;

			for filter in &item.filters {
				if self.filters.ensure(self.ctl, source, filter).await? {
					self.summary.filters_created += 1;
				}
			}
		}

		debug!(target = "stagectl.sync", scene = %scene.name, items = scene.items.len(), "populated scene");
		Ok(())
	}

	/// Applies transition settings, then reselects the transition that was current.
	async fn transitions(&mut self, transitions: &[Transition]) -> Result<()> {
		if transitions.is_empty() {
			return Ok(());
		}
		let previous = match self.ctl.current_transition().await {
			Ok((name, _)) => Some(name),
			Err(e) => {
				debug!(target = "stagectl.sync", error = %e, "current transition unknown");
				None
			}
		};

		for transition in transitions {
			self.ctl
				.set_current_transition(&transition.name)
				.await
				.step(|| format!("select transition {}", transition.name))?;
			self.ctl
				.set_current_transition_settings(&transition.settings)
				.await
				.step(|| format!("apply settings of transition {}", transition.name))?;
			self.summary.transitions_applied += 1;
		}

		if let Some(previous) = previous {
			if let Err(e) = self.ctl.set_current_transition(&previous).await {
				warn!(target = "stagectl.sync", transition = %previous, error = %e, "failed to reselect transition");
			}
		}
		Ok(())
	}

	async fn profile(&mut self, profile: &Profile) -> Result<()> {
		let existing = self
			.ctl
			.profiles()
			.await
			.step(|| "list profiles".into())?;
		if !existing.profiles.contains(&profile.name) {
			self.ctl
				.create_profile(&profile.name)
				.await
				.step(|| format!("create profile {}", profile.name))?;
		}
		self.ctl
			.set_current_profile(&profile.name)
			.await
			.step(|| format!("select profile {}", profile.name))?;

		self.ctl
			.set_video_settings(&profile.video)
			.await
			.step(|| format!("apply video settings of profile {}", profile.name))?;
		self.ctl
			.set_audio_settings(&profile.audio)
			.await
			.step(|| format!("apply audio settings of profile {}", profile.name))?;
		self.summary.profiles_applied += 1;
		Ok(())
	}

	async fn remove_staging(&self) {
		match self.ctl.remove_scene(&self.staging).await {
			Ok(()) => debug!(target = "stagectl.sync", scene = %self.staging, "removed staging scene"),
			Err(e) => {
				warn!(target = "stagectl.sync", scene = %self.staging, error = %e, "staging scene left in place");
			}
		}
	}
}
