use std::path::PathBuf;

use serde::Serialize;
use stagectl::protocol::SnapshotDocument;
use stagectl::{ImportSummary, LocalStudio};
use tracing::info;

use crate::cli::{ExportArgs, ImportArgs};
use crate::error::Result;

/// Either the written file or the document itself.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ExportData {
	Written(ExportSummary),
	Document(Box<SnapshotDocument>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
	pub path: PathBuf,
	pub scenes: usize,
	pub named_inputs: usize,
	pub transitions: usize,
	pub profiles: usize,
}

impl ExportSummary {
	fn new(path: PathBuf, doc: &SnapshotDocument) -> Self {
		Self {
			path,
			scenes: doc.scenes.len(),
			named_inputs: doc.named_inputs.len(),
			transitions: doc.transitions.len(),
			profiles: doc.profiles.len(),
		}
	}
}

pub async fn export(studio: &LocalStudio, args: &ExportArgs) -> Result<ExportData> {
	match &args.output {
		Some(path) => {
			let doc = studio.save_snapshot(path).await?;
			info!(target = "stagectl.cli", path = %path.display(), "wrote snapshot");
			Ok(ExportData::Written(ExportSummary::new(path.clone(), &doc)))
		}
		None => Ok(ExportData::Document(Box::new(studio.export().await?))),
	}
}

pub async fn import(studio: &LocalStudio, args: &ImportArgs) -> Result<ImportSummary> {
	Ok(studio.load_snapshot(&args.input, args.clear).await?)
}
