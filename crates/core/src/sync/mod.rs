//! Scene-graph synchronizer: export a live controller into a
//! [`SnapshotDocument`](stagectl_protocol::SnapshotDocument) and reconcile a
//! document back onto a controller.

mod clear;
mod export;
mod import;

pub use clear::clear_scenes;
pub use export::export;
pub(crate) use export::capture_named_inputs;
pub use import::{ImportSummary, import};
