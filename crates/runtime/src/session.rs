//! An identified controller session.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::connection::Connection;
use crate::error::Result;
use crate::transport::{TransportParts, WebSocketTransport};

/// Request that asks the controller application to quit.
///
/// Not every controller build accepts it; callers fall back to terminating
/// the process when it fails.
pub const EXIT_REQUEST: &str = "Exit";

fn default_host() -> String {
	"127.0.0.1".to_string()
}

fn default_port() -> u16 {
	4455
}

fn default_request_timeout_ms() -> u64 {
	10_000
}

/// Where and how to reach the controller's WebSocket endpoint.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfig {
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub password: Option<String>,
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,
}

impl Default for ControllerConfig {
	fn default() -> Self {
		Self {
			host: default_host(),
			port: default_port(),
			password: None,
			request_timeout_ms: default_request_timeout_ms(),
		}
	}
}

impl fmt::Debug for ControllerConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ControllerConfig")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("password", &self.password.as_ref().map(|_| "<redacted>"))
			.field("request_timeout_ms", &self.request_timeout_ms)
			.finish()
	}
}

impl ControllerConfig {
	pub fn url(&self) -> String {
		format!("ws://{}:{}", self.host, self.port)
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}
}

/// Version information reported by `GetVersion`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerVersion {
	#[serde(default)]
	pub obs_version: String,
	#[serde(default)]
	pub obs_web_socket_version: String,
	#[serde(default)]
	pub rpc_version: u32,
	#[serde(default)]
	pub platform: String,
	#[serde(default)]
	pub platform_description: String,
	#[serde(default)]
	pub available_requests: Vec<String>,
}

/// An identified connection ready for requests.
///
/// Dropping the session closes the socket.
pub struct Session {
	connection: Arc<Connection>,
	dispatch: JoinHandle<()>,
	request_timeout: Duration,
	rpc_version: u32,
}

impl Session {
	/// Opens a WebSocket to the configured endpoint and identifies.
	pub async fn connect(config: &ControllerConfig) -> Result<Self> {
		let parts = WebSocketTransport::connect(&config.url()).await?;
		let session = Self::from_parts(parts, config).await?;
		info!(
			target = "stagectl.session",
			url = %config.url(),
			rpc_version = session.rpc_version,
			"identified with controller"
		);
		Ok(session)
	}

	/// Identifies over already-open transport halves.
	pub async fn from_parts(parts: TransportParts, config: &ControllerConfig) -> Result<Self> {
		let connection = Arc::new(Connection::new(parts));
		let runner = Arc::clone(&connection);
		let dispatch = tokio::spawn(async move { runner.run().await });

		let timeout = config.request_timeout();
		match connection.identify(config.password.as_deref(), timeout).await {
			Ok(rpc_version) => Ok(Self {
				connection,
				dispatch,
				request_timeout: timeout,
				rpc_version,
			}),
			Err(e) => {
				connection.close();
				dispatch.abort();
				Err(e)
			}
		}
	}

	pub fn rpc_version(&self) -> u32 {
		self.rpc_version
	}

	/// Issues one request. `Value::Null` data sends no `requestData`.
	pub async fn call(&self, request_type: &str, data: Value) -> Result<Value> {
		self.connection
			.request(request_type, data, self.request_timeout)
			.await
	}

	/// Issues one request and decodes the response data.
	pub async fn call_as<T: DeserializeOwned>(&self, request_type: &str, data: Value) -> Result<T> {
		let value = self.call(request_type, data).await?;
		Ok(serde_json::from_value(value)?)
	}

	pub async fn version(&self) -> Result<ControllerVersion> {
		self.call_as("GetVersion", Value::Null).await
	}

	/// Cheap liveness probe: the socket is open and `GetVersion` answers.
	pub async fn is_alive(&self) -> bool {
		if self.connection.is_closed() {
			return false;
		}
		match self.version().await {
			Ok(_) => true,
			Err(e) => {
				debug!(target = "stagectl.session", error = %e, "liveness probe failed");
				false
			}
		}
	}

	/// Asks the controller to quit.
	pub async fn request_exit(&self) -> Result<()> {
		self.call(EXIT_REQUEST, Value::Null).await.map(|_| ())
	}

	pub fn close(&self) {
		self.connection.close();
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		self.connection.close();
		self.dispatch.abort();
	}
}
