//! WebSocket transport.
//!
//! The transport moves raw JSON frames; it knows nothing about op codes or
//! request correlation. It is split into a sending half ([`Transport`]) and a
//! receiving half ([`TransportReceiver`]) that forwards every decoded frame
//! into an unbounded channel consumed by the [`Connection`](crate::Connection).


use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Sending half of a transport.
#[async_trait]
pub trait Transport: Send {
	/// Sends one JSON frame.
	async fn send(&mut self, message: Value) -> Result<()>;

	/// Initiates a clean close of the underlying channel.
	async fn close(&mut self) -> Result<()>;
}

/// Receiving half of a transport.
#[async_trait]
pub trait TransportReceiver: Send {
	/// Reads frames until the peer closes or the consumer goes away.
	async fn run(self: Box<Self>) -> Result<()>;
}

/// Both halves plus the channel the receiver feeds.
pub struct TransportParts {
	pub sender: Box<dyn Transport>,
	pub receiver: Box<dyn TransportReceiver>,
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// WebSocket transport to the controller.
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Opens a WebSocket to `url` and splits it into transport halves.
	///
	/// # Errors
	///
	/// Returns [`Error::ConnectionFailed`] if the socket cannot be opened.
	pub async fn connect(url: &str) -> Result<TransportParts> {
		debug!(target = "stagectl.transport", %url, "opening websocket");
		let (stream, _response) = tokio_tungstenite::connect_async(url)
			.await
			.map_err(|e| Error::ConnectionFailed(format!("{url}: {e}")))?;
		Ok(Self::from_stream(stream))
	}

	/// Splits an already-open WebSocket stream into transport halves.
	pub fn from_stream<S>(stream: WebSocketStream<S>) -> TransportParts
	where
		S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
	{
		let (sink, stream) = stream.split();
		let (tx, message_rx) = mpsc::unbounded_channel();

		TransportParts {
			sender: Box::new(WebSocketTransportSender { sink }),
			receiver: Box::new(WebSocketTransportReceiver { stream, tx }),
			message_rx,
		}
	}
}

/// Sending half of [`WebSocketTransport`].
pub struct WebSocketTransportSender<S = MaybeTlsStream<TcpStream>> {
	sink: SplitSink<WebSocketStream<S>, WsMessage>,
}

/// Receiving half of [`WebSocketTransport`].
pub struct WebSocketTransportReceiver<S = MaybeTlsStream<TcpStream>> {
	stream: SplitStream<WebSocketStream<S>>,
	tx: mpsc::UnboundedSender<Value>,
}

#[async_trait]
impl<S> Transport for WebSocketTransportSender<S>
where
	S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send,
{
	async fn send(&mut self, message: Value) -> Result<()> {
		let text = serde_json::to_string(&message)?;
		self.sink
			.send(WsMessage::Text(text))
			.await
			.map_err(|e| Error::Transport(format!("Failed to send frame: {e}")))
	}

	async fn close(&mut self) -> Result<()> {
		self.sink
			.close()
			.await
			.map_err(|e| Error::Transport(format!("Failed to close websocket: {e}")))
	}
}

#[async_trait]
impl<S> TransportReceiver for WebSocketTransportReceiver<S>
where
	S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send,
{
	async fn run(mut self: Box<Self>) -> Result<()> {
		while let Some(frame) = self.stream.next().await {
			let frame = frame.map_err(|e| Error::Transport(format!("Failed to read frame: {e}")))?;
			let parsed = match frame {
				WsMessage::Text(text) => serde_json::from_str::<Value>(&text),
				WsMessage::Binary(bytes) => serde_json::from_slice::<Value>(&bytes),
				WsMessage::Close(reason) => {
					debug!(target = "stagectl.transport", ?reason, "peer closed websocket");
					return Ok(());
				}
				_ => continue,
			};

			match parsed {
				Ok(value) => {
					if self.tx.send(value).is_err() {
						// Consumer dropped; nothing left to deliver to.
						return Ok(());
					}
				}
				Err(e) => warn!(target = "stagectl.transport", error = %e, "dropping malformed frame"),
			}
		}

		Ok(())
	}
}
