//! Runtime for talking to a live production controller.
//!
//! Layers, bottom up:
//!
//! - [`transport`]: WebSocket frames in, JSON values out
//! - [`connection`]: handshake and `requestId` correlation
//! - [`session`]: an identified connection with typed helpers
//! - [`process`]: finding, launching and stopping the local controller
//! - [`supervisor`]: the retrying, serialized "get ready session" gate

pub mod connection;
pub mod error;
pub mod process;
pub mod session;
pub mod supervisor;
pub mod transport;

pub use connection::Connection;
pub use error::{Error, Result};
pub use process::{LaunchConfig, LocalController};
pub use session::{ControllerConfig, ControllerVersion, EXIT_REQUEST, Session};
pub use supervisor::{
	ControllerHost, LocalSupervisor, RetryPolicy, SessionConnector, Supervisor, WebSocketConnector,
};
pub use transport::{Transport, TransportParts, TransportReceiver, WebSocketTransport};
