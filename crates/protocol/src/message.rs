//! Controller WebSocket envelopes.
//!
//! Every frame exchanged with the controller is a JSON object of the form
//! `{ "op": <u8>, "d": { ... } }`. The connection handshake is:
//!
//! 1. Server sends [`Hello`] (optionally carrying an authentication challenge)
//! 2. Client replies with [`Identify`]
//! 3. Server confirms with [`Identified`]
//!
//! After that the client issues [`RequestPayload`]s and receives
//! [`RequestResponsePayload`]s correlated by `requestId`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// RPC version negotiated during [`Identify`].
pub const RPC_VERSION: u32 = 1;

/// Envelope discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OpCode {
	Hello,
	Identify,
	Identified,
	Reidentify,
	Event,
	Request,
	RequestResponse,
	RequestBatch,
	RequestBatchResponse,
}

impl From<OpCode> for u8 {
	fn from(op: OpCode) -> Self {
		match op {
			OpCode::Hello => 0,
			OpCode::Identify => 1,
			OpCode::Identified => 2,
			OpCode::Reidentify => 3,
			OpCode::Event => 5,
			OpCode::Request => 6,
			OpCode::RequestResponse => 7,
			OpCode::RequestBatch => 8,
			OpCode::RequestBatchResponse => 9,
		}
	}
}

impl TryFrom<u8> for OpCode {
	type Error = String;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		Ok(match value {
			0 => OpCode::Hello,
			1 => OpCode::Identify,
			2 => OpCode::Identified,
			3 => OpCode::Reidentify,
			5 => OpCode::Event,
			6 => OpCode::Request,
			7 => OpCode::RequestResponse,
			8 => OpCode::RequestBatch,
			9 => OpCode::RequestBatchResponse,
			other => return Err(format!("unknown op code {other}")),
		})
	}
}

/// Raw frame: an op code plus its untyped payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
	pub op: OpCode,
	#[serde(default)]
	pub d: Value,
}

impl Envelope {
	/// Wraps a typed payload.
	pub fn new<T: Serialize>(op: OpCode, payload: &T) -> serde_json::Result<Self> {
		Ok(Self {
			op,
			d: serde_json::to_value(payload)?,
		})
	}

	/// Decodes the payload as `T`.
	pub fn payload<T: for<'de> Deserialize<'de>>(&self) -> serde_json::Result<T> {
		T::deserialize(&self.d)
	}
}

/// First message sent by the server after the socket opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
	#[serde(default)]
	pub obs_web_socket_version: Option<String>,
	pub rpc_version: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authentication: Option<HelloAuthentication>,
}

/// Challenge/salt pair; present only when the server requires a password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloAuthentication {
	pub challenge: String,
	pub salt: String,
}

/// Client reply to [`Hello`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
	pub rpc_version: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub authentication: Option<String>,
	/// Bitmask of event categories; zero disables events entirely.
	pub event_subscriptions: u32,
}

/// Handshake confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identified {
	pub negotiated_rpc_version: u32,
}

/// A single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
	pub request_type: String,
	pub request_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub request_data: Option<Value>,
}

/// Outcome of a request as reported by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestStatus {
	pub result: bool,
	pub code: u16,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub comment: Option<String>,
}

/// Response correlated with a [`RequestPayload`] by `request_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponsePayload {
	pub request_type: String,
	pub request_id: String,
	pub request_status: RequestStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub response_data: Option<Value>,
}
