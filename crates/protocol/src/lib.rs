//! Wire types shared by the stagectl runtime and core crates.
//!
//! - [`message`]: controller WebSocket envelopes (`{ "op": u8, "d": {...} }`)
//! - [`auth`]: the challenge/salt authentication digest
//! - [`snapshot`]: the declarative scene-graph document written to and read from disk
//!
//! This crate performs no I/O.

pub mod auth;
pub mod message;
pub mod snapshot;

pub use auth::authentication_string;
pub use message::{
	Envelope, Hello, HelloAuthentication, Identified, Identify, OpCode, RequestPayload,
	RequestResponsePayload, RequestStatus, RPC_VERSION,
};
pub use snapshot::{
	AudioSettings, Filter, NamedInput, Profile, Scene, SceneItem, Settings, SnapshotDocument,
	Transform, Transition, VideoSettings,
};
