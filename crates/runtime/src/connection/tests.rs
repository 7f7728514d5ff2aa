use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use stagectl_protocol::authentication_string;
use tokio::sync::mpsc;

use super::*;
use crate::transport::{Transport, TransportParts, TransportReceiver};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Transport that hands every outgoing frame to the test.
struct ChannelTransport {
	sent: mpsc::UnboundedSender<Value>,
	closed: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for ChannelTransport {
	async fn send(&mut self, message: Value) -> Result<()> {
		self.sent.send(message).map_err(|_| Error::ChannelClosed)
	}

	async fn close(&mut self) -> Result<()> {
		self.closed.store(true, Ordering::SeqCst);
		Ok(())
	}
}

/// Incoming frames are pushed straight into `message_rx` by the test.
struct IdleReceiver;

#[async_trait]
impl TransportReceiver for IdleReceiver {
	async fn run(self: Box<Self>) -> Result<()> {
		Ok(())
	}
}

struct Harness {
	connection: Arc<Connection>,
	to_client: mpsc::UnboundedSender<Value>,
	from_client: mpsc::UnboundedReceiver<Value>,
	transport_closed: Arc<AtomicBool>,
}

fn harness() -> Harness {
	let (sent_tx, from_client) = mpsc::unbounded_channel();
	let (to_client, message_rx) = mpsc::unbounded_channel();
	let transport_closed = Arc::new(AtomicBool::new(false));

	let parts = TransportParts {
		sender: Box::new(ChannelTransport {
			sent: sent_tx,
			closed: Arc::clone(&transport_closed),
		}),
		receiver: Box::new(IdleReceiver),
		message_rx,
	};
	let connection = Arc::new(Connection::new(parts));
	let runner = Arc::clone(&connection);
	tokio::spawn(async move { runner.run().await });

	Harness {
		connection,
		to_client,
		from_client,
		transport_closed,
	}
}

fn response(request: &Value, ok: bool, data: Value) -> Value {
	let code = if ok { 100 } else { 600 };
	let mut d = json!({
		"requestType": request["d"]["requestType"],
		"requestId": request["d"]["requestId"],
		"requestStatus": { "result": ok, "code": code },
	});
	if ok {
		d["responseData"] = data;
	} else {
		d["requestStatus"]["comment"] = data;
	}
	json!({ "op": 7, "d": d })
}

#[tokio::test]
async fn test_identify_without_authentication() {
	let mut h = harness();
	h.to_client
		.send(json!({"op": 0, "d": {"obsWebSocketVersion": "5.4.2", "rpcVersion": 1}}))
		.unwrap();

	let conn = Arc::clone(&h.connection);
	let identify = tokio::spawn(async move { conn.identify(None, TIMEOUT).await });

	let frame = h.from_client.recv().await.unwrap();
	assert_eq!(frame["op"], 1);
	assert_eq!(frame["d"]["rpcVersion"], 1);
	assert_eq!(frame["d"]["eventSubscriptions"], 0);
	assert!(frame["d"].get("authentication").is_none());

	h.to_client
		.send(json!({"op": 2, "d": {"negotiatedRpcVersion": 1}}))
		.unwrap();
	assert_eq!(identify.await.unwrap().unwrap(), 1);
}

#[tokio::test]
async fn test_identify_sends_digest_when_challenged() {
	let mut h = harness();
	h.to_client
		.send(json!({
			"op": 0,
			"d": {
				"rpcVersion": 1,
				"authentication": {"challenge": "+IxH4CnCiqpX1rM9scsNynZzbOe4KhDeYcTNS3PDaeY=", "salt": "lM1GncleQOaCu9lT1yeUZhFYnqhsLLP1G5lAGo3ixaI="}
			}
		}))
		.unwrap();

	let conn = Arc::clone(&h.connection);
	let identify = tokio::spawn(async move { conn.identify(Some("supersecretpassword"), TIMEOUT).await });

	let frame = h.from_client.recv().await.unwrap();
	assert_eq!(
		frame["d"]["authentication"],
		authentication_string(
			"supersecretpassword",
			"lM1GncleQOaCu9lT1yeUZhFYnqhsLLP1G5lAGo3ixaI=",
			"+IxH4CnCiqpX1rM9scsNynZzbOe4KhDeYcTNS3PDaeY="
		)
	);

	h.to_client
		.send(json!({"op": 2, "d": {"negotiatedRpcVersion": 1}}))
		.unwrap();
	assert!(identify.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_identify_requires_password_when_challenged() {
	let mut h = harness();
	h.to_client
		.send(json!({"op": 0, "d": {"rpcVersion": 1, "authentication": {"challenge": "c", "salt": "s"}}}))
		.unwrap();

	let result = h.connection.identify(None, TIMEOUT).await;
	assert!(matches!(result, Err(Error::AuthenticationFailed(_))));
	assert!(h.from_client.try_recv().is_err(), "nothing should be sent");
}

#[tokio::test]
async fn test_socket_closed_after_digest_is_authentication_failure() {
	let mut h = harness();
	h.to_client
		.send(json!({"op": 0, "d": {"rpcVersion": 1, "authentication": {"challenge": "c", "salt": "s"}}}))
		.unwrap();

	let conn = Arc::clone(&h.connection);
	let identify = tokio::spawn(async move { conn.identify(Some("wrong"), TIMEOUT).await });

	h.from_client.recv().await.unwrap();
	drop(h.to_client);

	let result = identify.await.unwrap();
	assert!(matches!(result, Err(Error::AuthenticationFailed(_))));
}

#[tokio::test(start_paused = true)]
async fn test_identify_times_out_without_hello() {
	let h = harness();
	let result = h.connection.identify(None, Duration::from_secs(2)).await;
	assert!(matches!(result, Err(Error::Timeout(_))));
}

#[tokio::test]
async fn test_responses_are_correlated_by_request_id() {
	let mut h = harness();

	let conn = Arc::clone(&h.connection);
	let first = tokio::spawn(async move { conn.request("GetSceneList", Value::Null, TIMEOUT).await });
	let req_a = h.from_client.recv().await.unwrap();

	let conn = Arc::clone(&h.connection);
	let second = tokio::spawn(async move { conn.request("GetInputList", json!({}), TIMEOUT).await });
	let req_b = h.from_client.recv().await.unwrap();

	assert_ne!(req_a["d"]["requestId"], req_b["d"]["requestId"]);
	assert!(req_a["d"].get("requestData").is_none());
	assert_eq!(req_b["d"]["requestData"], json!({}));

	// Answer out of order.
	h.to_client
		.send(response(&req_b, true, json!({"inputs": []})))
		.unwrap();
	h.to_client
		.send(response(&req_a, true, json!({"scenes": [{"sceneName": "Main"}]})))
		.unwrap();

	let a = first.await.unwrap().unwrap();
	let b = second.await.unwrap().unwrap();
	assert_eq!(a["scenes"][0]["sceneName"], "Main");
	assert_eq!(b["inputs"], json!([]));
}

#[tokio::test]
async fn test_failed_status_becomes_remote_error() {
	let mut h = harness();

	let conn = Arc::clone(&h.connection);
	let call = tokio::spawn(async move {
		conn.request("RemoveScene", json!({"sceneName": "Gone"}), TIMEOUT)
			.await
	});
	let req = h.from_client.recv().await.unwrap();
	h.to_client
		.send(response(&req, false, json!("No source was found")))
		.unwrap();

	match call.await.unwrap() {
		Err(Error::Remote {
			request_type,
			code,
			comment,
		}) => {
			assert_eq!(request_type, "RemoveScene");
			assert_eq!(code, 600);
			assert_eq!(comment.as_deref(), Some("No source was found"));
		}
		other => panic!("expected remote error, got {other:?}"),
	}
}

#[tokio::test]
async fn test_response_without_data_is_null() {
	let mut h = harness();

	let conn = Arc::clone(&h.connection);
	let call = tokio::spawn(async move {
		conn.request("SetCurrentProgramScene", json!({"sceneName": "Main"}), TIMEOUT)
			.await
	});
	let req = h.from_client.recv().await.unwrap();
	let mut reply = response(&req, true, Value::Null);
	reply["d"].as_object_mut().unwrap().remove("responseData");
	h.to_client.send(reply).unwrap();

	assert_eq!(call.await.unwrap().unwrap(), Value::Null);
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_request_releases_its_callback() {
	let h = harness();

	let result = h
		.connection
		.request("GetVersion", Value::Null, Duration::from_millis(500))
		.await;
	assert!(matches!(result, Err(Error::Timeout(_))));

	for _ in 0..5 {
		tokio::task::yield_now().await;
	}
	assert!(h.connection.callbacks.lock().await.is_empty());
}

#[tokio::test]
async fn test_pending_request_fails_when_socket_closes() {
	let mut h = harness();

	let conn = Arc::clone(&h.connection);
	let call = tokio::spawn(async move { conn.request("GetVersion", Value::Null, TIMEOUT).await });
	h.from_client.recv().await.unwrap();
	drop(h.to_client);

	assert!(matches!(call.await.unwrap(), Err(Error::ChannelClosed)));
	assert!(h.connection.is_closed());
}

#[tokio::test]
async fn test_close_closes_transport() {
	let h = harness();
	h.connection.close();
	assert!(h.connection.is_closed());

	for _ in 0..5 {
		tokio::task::yield_now().await;
	}
	assert!(h.transport_closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_events_and_unknown_responses_are_ignored() {
	let h = harness();
	let conn = Arc::clone(&h.connection);

	conn.dispatch(json!({"op": 5, "d": {"eventType": "SceneCreated", "eventIntent": 4}}))
		.await
		.unwrap();
	conn.dispatch(json!({
		"op": 7,
		"d": {"requestType": "GetVersion", "requestId": "999", "requestStatus": {"result": true, "code": 100}}
	}))
	.await
	.unwrap();
	assert!(conn.dispatch(json!({"op": 4, "d": {}})).await.is_err());
}
