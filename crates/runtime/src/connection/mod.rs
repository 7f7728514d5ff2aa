//! Request/response layer on top of the WebSocket transport.
//!
//! The connection owns the handshake with the controller and correlates every
//! outgoing request with its response through the `requestId` field:
//!
//! 1. [`Connection::request`] allocates an id and parks a oneshot sender
//! 2. The frame is queued for the writer task
//! 3. The dispatch loop in [`Connection::run`] matches the response by id
//! 4. The caller's [`ResponseFuture`] resolves with the response data
//!
//! A dropped or timed-out request removes its own callback through
//! [`CancelGuard`], so late responses are logged and discarded.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::Mutex as ParkingLotMutex;
use serde_json::Value;
use stagectl_protocol::{
	Envelope, Hello, Identified, Identify, OpCode, RPC_VERSION, RequestPayload,
	RequestResponsePayload, authentication_string,
};
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// Pending request callbacks keyed by request id.
type CallbackMap = Arc<TokioMutex<HashMap<String, oneshot::Sender<Result<Value>>>>>;

/// Work item for the writer task.
enum Outbound {
	Frame(Value),
	Close,
}

/// RAII guard ensuring callback cleanup when a request future is dropped.
struct CancelGuard {
	id: String,
	callbacks: CallbackMap,
	completed: bool,
}

impl CancelGuard {
	fn new(id: String, callbacks: CallbackMap) -> Self {
		Self {
			id,
			callbacks,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}

		let id = std::mem::take(&mut self.id);
		let callbacks = Arc::clone(&self.callbacks);

		if let Ok(handle) = tokio::runtime::Handle::try_current() {
			handle.spawn(async move {
				if callbacks.lock().await.remove(&id).is_some() {
					debug!(target = "stagectl.connection", %id, "removed orphaned callback");
				}
			});
		}
	}
}

/// Future returned by [`Connection::request`] with automatic cancellation cleanup.
struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.complete();
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// One-shot delivery slot for a handshake message.
struct Slot<T> {
	tx: ParkingLotMutex<Option<oneshot::Sender<T>>>,
	rx: ParkingLotMutex<Option<oneshot::Receiver<T>>>,
}

impl<T> Slot<T> {
	fn new() -> Self {
		let (tx, rx) = oneshot::channel();
		Self {
			tx: ParkingLotMutex::new(Some(tx)),
			rx: ParkingLotMutex::new(Some(rx)),
		}
	}

	fn fill(&self, value: T) -> bool {
		match self.tx.lock().take() {
			Some(tx) => tx.send(value).is_ok(),
			None => false,
		}
	}

	fn take_receiver(&self) -> Option<oneshot::Receiver<T>> {
		self.rx.lock().take()
	}

	fn abandon(&self) {
		self.tx.lock().take();
	}
}

/// Connection to a controller's WebSocket endpoint.
pub struct Connection {
	last_id: AtomicU64,
	callbacks: CallbackMap,
	outbound_tx: mpsc::UnboundedSender<Outbound>,
	outbound_rx: TokioMutex<Option<mpsc::UnboundedReceiver<Outbound>>>,
	transport_sender: TokioMutex<Option<Box<dyn Transport>>>,
	transport_receiver: TokioMutex<Option<Box<dyn TransportReceiver>>>,
	message_rx: TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>,
	hello: Slot<Hello>,
	identified: Slot<Identified>,
	closed: AtomicBool,
}

impl Connection {
	/// Creates a connection over the given transport halves.
	///
	/// Nothing is read or written until [`run`](Self::run) is spawned.
	pub fn new(parts: TransportParts) -> Self {
		let TransportParts {
			sender,
			receiver,
			message_rx,
		} = parts;

		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

		Self {
			last_id: AtomicU64::new(0),
			callbacks: Arc::new(TokioMutex::new(HashMap::new())),
			outbound_tx,
			outbound_rx: TokioMutex::new(Some(outbound_rx)),
			transport_sender: TokioMutex::new(Some(sender)),
			transport_receiver: TokioMutex::new(Some(receiver)),
			message_rx: TokioMutex::new(Some(message_rx)),
			hello: Slot::new(),
			identified: Slot::new(),
			closed: AtomicBool::new(false),
		}
	}

	/// True once the dispatch loop has ended or [`close`](Self::close) was called.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst) || self.outbound_tx.is_closed()
	}

	/// Performs the Hello / Identify / Identified exchange.
	///
	/// Returns the negotiated RPC version.
	///
	/// # Errors
	///
	/// - [`Error::AuthenticationFailed`] if the controller wants a password and
	///   none is configured, or it drops the socket after our digest was sent
	/// - [`Error::Timeout`] if either handshake message does not arrive in time
	pub async fn identify(&self, password: Option<&str>, timeout: Duration) -> Result<u32> {
		let hello_rx = self
			.hello
			.take_receiver()
			.ok_or_else(|| Error::Protocol("identify called more than once".into()))?;
		let hello = tokio::time::timeout(timeout, hello_rx)
			.await
			.map_err(|_| Error::Timeout("waiting for Hello".into()))?
			.map_err(|_| Error::ChannelClosed)?;

		debug!(
			target = "stagectl.connection",
			version = hello.obs_web_socket_version.as_deref().unwrap_or("unknown"),
			rpc_version = hello.rpc_version,
			auth_required = hello.authentication.is_some(),
			"received Hello"
		);

		let authentication = match (&hello.authentication, password) {
			(Some(auth), Some(password)) => {
				Some(authentication_string(password, &auth.salt, &auth.challenge))
			}
			(Some(_), None) => {
				return Err(Error::AuthenticationFailed(
					"controller requires a password but none is configured".into(),
				));
			}
			(None, _) => None,
		};
		let auth_sent = authentication.is_some();

		let identify = Identify {
			rpc_version: RPC_VERSION.min(hello.rpc_version),
			authentication,
			event_subscriptions: 0,
		};
		self.send_frame(Envelope::new(OpCode::Identify, &identify)?)?;

		let identified_rx = self
			.identified
			.take_receiver()
			.ok_or_else(|| Error::Protocol("identify called more than once".into()))?;
		match tokio::time::timeout(timeout, identified_rx).await {
			Err(_) => Err(Error::Timeout("waiting for Identified".into())),
			Ok(Err(_)) if auth_sent => Err(Error::AuthenticationFailed(
				"controller closed the connection after authentication".into(),
			)),
			Ok(Err(_)) => Err(Error::ChannelClosed),
			Ok(Ok(identified)) => Ok(identified.negotiated_rpc_version),
		}
	}

	/// Sends a request and waits up to `timeout` for its response data.
	///
	/// `Value::Null` data omits `requestData` from the frame. A response with
	/// no `responseData` resolves to `Value::Null`.
	pub async fn request(
		&self,
		request_type: &str,
		data: Value,
		timeout: Duration,
	) -> Result<Value> {
		let id = self.last_id.fetch_add(1, Ordering::SeqCst).to_string();

		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().await.insert(id.clone(), tx);
		let guard = CancelGuard::new(id.clone(), Arc::clone(&self.callbacks));

		let payload = RequestPayload {
			request_type: request_type.to_string(),
			request_id: id.clone(),
			request_data: (!data.is_null()).then_some(data),
		};
		debug!(target = "stagectl.connection", %id, request_type, "sending request");
		self.send_frame(Envelope::new(OpCode::Request, &payload)?)?;

		tokio::time::timeout(timeout, ResponseFuture { rx, guard })
			.await
			.map_err(|_| Error::Timeout(format!("{request_type} after {}ms", timeout.as_millis())))?
	}

	/// Asks the writer task to close the socket.
	pub fn close(&self) {
		self.closed.store(true, Ordering::SeqCst);
		let _ = self.outbound_tx.send(Outbound::Close);
	}

	fn send_frame(&self, envelope: Envelope) -> Result<()> {
		let value = serde_json::to_value(&envelope)?;
		self.outbound_tx
			.send(Outbound::Frame(value))
			.map_err(|_| Error::ChannelClosed)
	}

	/// Runs the reader, writer and dispatch loop until the socket closes.
	///
	/// Every request still pending when the loop ends fails with
	/// [`Error::ChannelClosed`].
	pub async fn run(self: &Arc<Self>) {
		let (Some(transport_receiver), Some(mut transport_sender), Some(mut outbound_rx), Some(mut message_rx)) = (
			self.transport_receiver.lock().await.take(),
			self.transport_sender.lock().await.take(),
			self.outbound_rx.lock().await.take(),
			self.message_rx.lock().await.take(),
		) else {
			warn!(target = "stagectl.connection", "run() called more than once");
			return;
		};

		let reader_handle = tokio::spawn(async move {
			if let Err(e) = transport_receiver.run().await {
				debug!(target = "stagectl.connection", error = %e, "transport read ended");
			}
		});

		let writer_handle = tokio::spawn(async move {
			while let Some(item) = outbound_rx.recv().await {
				match item {
					Outbound::Frame(message) => {
						if let Err(e) = transport_sender.send(message).await {
							error!(target = "stagectl.connection", error = %e, "transport write failed");
							break;
						}
					}
					Outbound::Close => {
						if let Err(e) = transport_sender.close().await {
							debug!(target = "stagectl.connection", error = %e, "close failed");
						}
						break;
					}
				}
			}
		});

		while let Some(message) = message_rx.recv().await {
			if let Err(e) = self.dispatch_internal(message).await {
				warn!(target = "stagectl.connection", error = %e, "failed to dispatch frame");
			}
		}

		debug!(target = "stagectl.connection", "dispatch loop ended");
		self.closed.store(true, Ordering::SeqCst);
		writer_handle.abort();
		reader_handle.abort();
		self.hello.abandon();
		self.identified.abandon();
		// Dropping the senders resolves every pending future with ChannelClosed.
		self.callbacks.lock().await.clear();
	}

	/// Dispatch an incoming frame (test-only public version)
	#[cfg(test)]
	pub(crate) async fn dispatch(self: &Arc<Self>, message: Value) -> Result<()> {
		self.dispatch_internal(message).await
	}

	async fn dispatch_internal(&self, message: Value) -> Result<()> {
		let envelope: Envelope = serde_json::from_value(message)
			.map_err(|e| Error::Protocol(format!("malformed envelope: {e}")))?;

		match envelope.op {
			OpCode::Hello => {
				let hello: Hello = envelope.payload()?;
				if !self.hello.fill(hello) {
					debug!(target = "stagectl.connection", "ignoring repeated Hello");
				}
				Ok(())
			}
			OpCode::Identified => {
				let identified: Identified = envelope.payload()?;
				if !self.identified.fill(identified) {
					debug!(target = "stagectl.connection", "ignoring repeated Identified");
				}
				Ok(())
			}
			OpCode::RequestResponse => {
				let response: RequestResponsePayload = envelope.payload()?;
				let Some(callback) = self.callbacks.lock().await.remove(&response.request_id) else {
					debug!(
						target = "stagectl.connection",
						id = %response.request_id,
						request_type = %response.request_type,
						"response for unknown or abandoned request"
					);
					return Ok(());
				};

				let status = response.request_status;
				let result = if status.result {
					Ok(response.response_data.unwrap_or(Value::Null))
				} else {
					Err(Error::Remote {
						request_type: response.request_type,
						code: status.code,
						comment: status.comment,
					})
				};

				let _ = callback.send(result);
				Ok(())
			}
			OpCode::Event => {
				debug!(
					target = "stagectl.connection",
					event = envelope.d.get("eventType").and_then(serde_json::Value::as_str).unwrap_or("?"),
					"ignoring event"
				);
				Ok(())
			}
			other => {
				debug!(target = "stagectl.connection", op = ?other, "ignoring frame");
				Ok(())
			}
		}
	}
}
