//! Connection Supervisor: the only owner of the controller process and of
//! the shared session.
//!
//! Each [`Supervisor::get_ready_session`] call holds one mutex for its whole
//! duration, so concurrent callers never race to spawn a second controller
//! or probe the port at the same time. Per attempt:
//!
//! 1. Probe: process present? port open?
//! 2. Hung process (present, port closed): ask it to exit over the stale
//!    session if there is one, terminate it, launch fresh
//! 3. Absent process: launch fresh
//! 4. Wait `base_delay * 2^(attempt - 1)`
//! 5. Open a session and check it answers a trivial request
//!
//! A launch failure is returned immediately. Everything else is recorded
//! and retried until the attempts run out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as TokioMutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::process::LocalController;
use crate::session::{ControllerConfig, Session};

/// Probing and lifecycle control of the controller process.
#[async_trait]
pub trait ControllerHost: Send + Sync {
	async fn is_running(&self) -> bool;
	async fn is_port_open(&self) -> bool;
	async fn launch(&self) -> Result<()>;
	/// Stops the process, escalating to a forced kill after the grace period.
	async fn terminate(&self) -> Result<()>;
}

#[async_trait]
impl ControllerHost for LocalController {
	async fn is_running(&self) -> bool {
		LocalController::is_running(self).await
	}

	async fn is_port_open(&self) -> bool {
		LocalController::is_port_open(self).await
	}

	async fn launch(&self) -> Result<()> {
		LocalController::launch(self).await
	}

	async fn terminate(&self) -> Result<()> {
		LocalController::terminate(self, self.config().grace()).await
	}
}

/// Opens and checks sessions.
#[async_trait]
pub trait SessionConnector: Send + Sync {
	type Session: Send + Sync + 'static;

	async fn open(&self) -> Result<Self::Session>;

	/// True if the session still answers requests.
	async fn verify(&self, session: &Self::Session) -> bool;

	/// Asks the controller to quit over an existing session.
	async fn request_exit(&self, session: &Self::Session) -> Result<()>;
}

/// Connects real [`Session`]s over WebSocket.
pub struct WebSocketConnector {
	config: ControllerConfig,
}

impl WebSocketConnector {
	pub fn new(config: ControllerConfig) -> Self {
		Self { config }
	}
}

#[async_trait]
impl SessionConnector for WebSocketConnector {
	type Session = Session;

	async fn open(&self) -> Result<Session> {
		Session::connect(&self.config).await
	}

	async fn verify(&self, session: &Session) -> bool {
		session.is_alive().await
	}

	async fn request_exit(&self, session: &Session) -> Result<()> {
		session.request_exit().await
	}
}

fn default_retries() -> u32 {
	5
}

fn default_base_delay_ms() -> u64 {
	2_000
}

/// Attempt count and exponential backoff base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
	#[serde(default = "default_retries")]
	pub retries: u32,
	#[serde(default = "default_base_delay_ms")]
	pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			retries: default_retries(),
			base_delay_ms: default_base_delay_ms(),
		}
	}
}

impl RetryPolicy {
	/// Wait before attempt `attempt` (1-based).
	pub fn backoff(&self, attempt: u32) -> Duration {
		let factor = 1u64 << attempt.saturating_sub(1).min(20);
		Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
	}
}

/// Serialized gatekeeper for the controller session.
pub struct Supervisor<H, C: SessionConnector> {
	host: H,
	connector: C,
	policy: RetryPolicy,
	current: TokioMutex<Option<Arc<C::Session>>>,
}

/// Supervisor over a local controller process and WebSocket sessions.
pub type LocalSupervisor = Supervisor<LocalController, WebSocketConnector>;

impl LocalSupervisor {
	pub fn local(
		controller: ControllerConfig,
		launch: crate::process::LaunchConfig,
		policy: RetryPolicy,
	) -> Self {
		let host = LocalController::new(launch, controller.host.clone(), controller.port);
		Supervisor::new(host, WebSocketConnector::new(controller), policy)
	}
}

impl<H: ControllerHost, C: SessionConnector> Supervisor<H, C> {
	pub fn new(host: H, connector: C, policy: RetryPolicy) -> Self {
		Self {
			host,
			connector,
			policy,
			current: TokioMutex::new(None),
		}
	}

	pub fn policy(&self) -> RetryPolicy {
		self.policy
	}

	/// Returns the cached session if it still answers, otherwise brings the
	/// controller up and connects.
	///
	/// # Errors
	///
	/// - [`Error::Launch`] if the controller could not be started
	/// - [`Error::Connection`] wrapping the last failure once every attempt
	///   has been used
	pub async fn get_ready_session(&self) -> Result<Arc<C::Session>> {
		let mut slot = self.current.lock().await;

		let mut stale = match slot.take() {
			Some(session) if self.connector.verify(&session).await => {
				*slot = Some(Arc::clone(&session));
				return Ok(session);
			}
			Some(session) => {
				info!(target = "stagectl.supervisor", "cached session failed liveness check");
				Some(session)
			}
			None => None,
		};

		let mut last_error = None;
		for attempt in 1..=self.policy.retries {
			let delay = self.policy.backoff(attempt);

			if let Err(e) = self.prepare(&mut stale).await {
				if e.is_launch() {
					return Err(e);
				}
				warn!(target = "stagectl.supervisor", attempt, error = %e, "failed to prepare controller");
				last_error = Some(e);
				tokio::time::sleep(delay).await;
				continue;
			}

			debug!(
				target = "stagectl.supervisor",
				attempt,
				delay_ms = delay.as_millis() as u64,
				"waiting before connect"
			);
			tokio::time::sleep(delay).await;

			match self.open_verified().await {
				Ok(session) => {
					info!(target = "stagectl.supervisor", attempt, "controller session ready");
					let session = Arc::new(session);
					*slot = Some(Arc::clone(&session));
					return Ok(session);
				}
				Err(e) => {
					warn!(target = "stagectl.supervisor", attempt, error = %e, "connect attempt failed");
					last_error = Some(e);
				}
			}
		}

		Err(Error::Connection {
			attempts: self.policy.retries,
			source: Box::new(
				last_error.unwrap_or_else(|| Error::ConnectionFailed("no attempts were made".into())),
			),
		})
	}

	/// Drops the cached session without touching the controller.
	pub async fn reset(&self) {
		self.current.lock().await.take();
	}

	async fn prepare(&self, stale: &mut Option<Arc<C::Session>>) -> Result<()> {
		let running = self.host.is_running().await;
		if running && self.host.is_port_open().await {
			return Ok(());
		}

		if running {
			warn!(target = "stagectl.supervisor", "controller is running but its port is closed; restarting");
			if let Some(session) = stale.take() {
				if let Err(e) = self.connector.request_exit(&session).await {
					debug!(target = "stagectl.supervisor", error = %e, "exit request failed");
				}
			}
			self.host.terminate().await?;
		} else {
			info!(target = "stagectl.supervisor", "controller is not running; launching");
		}

		self.host.launch().await
	}

	async fn open_verified(&self) -> Result<C::Session> {
		let session = self.connector.open().await?;
		if self.connector.verify(&session).await {
			Ok(session)
		} else {
			Err(Error::ConnectionFailed(
				"controller did not answer the liveness probe".into(),
			))
		}
	}
}
