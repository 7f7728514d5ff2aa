//! Heuristic token tables used by the device classifier.
//!
//! The hint file is JSON:
//!
//! ```json
//! {
//!   "manufacturers": ["samsung", "xiaomi"],
//!   "aliases": { "redmi": "Xiaomi" },
//!   "name_hints": ["phone", "android"],
//!   "microphone_hints": ["mic", "headset"],
//!   "id_hints": ["droidcam"],
//!   "mobile_apps": ["droidcam", "iriun", "epoccam"],
//!   "pc_webcams": ["logitech", "razer"]
//! }
//! ```
//!
//! All tokens are lowercased at load so matching is case-insensitive.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, warn};

/// On-disk shape; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HintFile {
	manufacturers: Vec<String>,
	/// Kept in file order; the first matching alias wins.
	aliases: IndexMap<String, String>,
	#[serde(alias = "camera_hints")]
	name_hints: Vec<String>,
	microphone_hints: Vec<String>,
	id_hints: Vec<String>,
	mobile_apps: Vec<String>,
	pc_webcams: Vec<String>,
}

/// Lowercased lookup tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HintTable {
	pub manufacturers: Vec<String>,
	/// Lowercased alias to canonical brand, in alias order.
	pub aliases: Vec<(String, String)>,
	pub name_hints: Vec<String>,
	pub microphone_hints: Vec<String>,
	pub id_hints: Vec<String>,
	pub mobile_apps: Vec<String>,
	pub pc_webcams: Vec<String>,
}

fn lowercase_all(tokens: Vec<String>) -> Vec<String> {
	tokens
		.into_iter()
		.map(|t| t.trim().to_lowercase())
		.filter(|t| !t.is_empty())
		.collect()
}

impl From<HintFile> for HintTable {
	fn from(file: HintFile) -> Self {
		Self {
			manufacturers: lowercase_all(file.manufacturers),
			aliases: file
				.aliases
				.into_iter()
				.map(|(alias, brand)| (alias.trim().to_lowercase(), brand))
				.filter(|(alias, _)| !alias.is_empty())
				.collect(),
			name_hints: lowercase_all(file.name_hints),
			microphone_hints: lowercase_all(file.microphone_hints),
			id_hints: lowercase_all(file.id_hints),
			mobile_apps: lowercase_all(file.mobile_apps),
			pc_webcams: lowercase_all(file.pc_webcams),
		}
	}
}

impl HintTable {
	/// Parses a hint document.
	pub fn from_json(text: &str) -> serde_json::Result<Self> {
		let file: HintFile = serde_json::from_str(text)?;
		Ok(file.into())
	}

	/// Loads the hint file at `path`.
	///
	/// A missing or malformed file yields an empty table; the cause is logged.
	pub fn load(path: &Path) -> Self {
		let text = match std::fs::read_to_string(path) {
			Ok(text) => text,
			Err(e) => {
				warn!(target = "stagectl.hints", path = %path.display(), error = %e, "hint file unreadable; using empty hints");
				return Self::default();
			}
		};

		match Self::from_json(&text) {
			Ok(table) => {
				debug!(
					target = "stagectl.hints",
					path = %path.display(),
					manufacturers = table.manufacturers.len(),
					aliases = table.aliases.len(),
					"loaded hints"
				);
				table
			}
			Err(e) => {
				warn!(target = "stagectl.hints", path = %path.display(), error = %e, "hint file malformed; using empty hints");
				Self::default()
			}
		}
	}

	pub fn is_empty(&self) -> bool {
		self.manufacturers.is_empty()
			&& self.aliases.is_empty()
			&& self.name_hints.is_empty()
			&& self.microphone_hints.is_empty()
			&& self.id_hints.is_empty()
			&& self.mobile_apps.is_empty()
			&& self.pc_webcams.is_empty()
	}
}

/// True if any token occurs in `haystack`.
pub(crate) fn contains_any<S: AsRef<str>>(haystack: &str, tokens: &[S]) -> bool {
	tokens.iter().any(|t| haystack.contains(t.as_ref()))
}

/// Process-wide hint table that can be swapped without blocking readers.
#[derive(Debug, Clone, Default)]
pub struct SharedHints {
	inner: Arc<RwLock<Arc<HintTable>>>,
}

impl SharedHints {
	pub fn new(table: HintTable) -> Self {
		Self {
			inner: Arc::new(RwLock::new(Arc::new(table))),
		}
	}

	pub fn load(path: &Path) -> Self {
		Self::new(HintTable::load(path))
	}

	/// The table in effect right now. Later reloads do not affect it.
	pub fn current(&self) -> Arc<HintTable> {
		Arc::clone(&self.inner.read())
	}

	/// Rebuilds the table from `path` and swaps it in.
	pub fn reload(&self, path: &Path) -> Arc<HintTable> {
		let table = Arc::new(HintTable::load(path));
		*self.inner.write() = Arc::clone(&table);
		table
	}

	pub fn replace(&self, table: HintTable) {
		*self.inner.write() = Arc::new(table);
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use tempfile::TempDir;

	use super::*;

	#[test]
	fn tokens_are_lowercased() {
		let table = HintTable::from_json(
			r#"{"manufacturers": ["Samsung"], "aliases": {"Redmi": "Xiaomi"}, "name_hints": [" Phone "]}"#,
		)
		.unwrap();
		assert_eq!(table.manufacturers, vec!["samsung"]);
		assert_eq!(table.aliases, vec![("redmi".to_string(), "Xiaomi".to_string())]);
		assert_eq!(table.name_hints, vec!["phone"]);
		assert!(table.pc_webcams.is_empty());
	}

	#[test]
	fn aliases_keep_file_order() {
		let table = HintTable::from_json(r#"{"aliases": {"zte": "ZTE", "mi": "Xiaomi", "a": "Acme"}}"#).unwrap();
		let order: Vec<&str> = table.aliases.iter().map(|(alias, _)| alias.as_str()).collect();
		assert_eq!(order, ["zte", "mi", "a"]);
	}

	#[test]
	fn camera_hints_key_is_accepted() {
		let table = HintTable::from_json(r#"{"camera_hints": ["Webcam"]}"#).unwrap();
		assert_eq!(table.name_hints, vec!["webcam"]);
	}

	#[test]
	fn missing_or_malformed_file_gives_empty_table() {
		let temp = TempDir::new().unwrap();
		assert!(HintTable::load(&temp.path().join("absent.json")).is_empty());

		let bad = temp.path().join("hints.json");
		fs::write(&bad, "{ not json").unwrap();
		assert!(HintTable::load(&bad).is_empty());
	}

	#[test]
	fn reload_swaps_without_touching_held_tables() {
		let temp = TempDir::new().unwrap();
		let path = temp.path().join("hints.json");
		fs::write(&path, r#"{"mobile_apps": ["DroidCam"]}"#).unwrap();

		let shared = SharedHints::load(&path);
		let before = shared.current();
		assert_eq!(before.mobile_apps, vec!["droidcam"]);

		fs::write(&path, r#"{"mobile_apps": ["Iriun"]}"#).unwrap();
		shared.reload(&path);

		assert_eq!(before.mobile_apps, vec!["droidcam"]);
		assert_eq!(shared.current().mobile_apps, vec!["iriun"]);
	}
}
