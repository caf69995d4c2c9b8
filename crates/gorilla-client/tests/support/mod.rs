//! Scripted in-memory service for driving the client over the real wire
//! protocol.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use gorilla_client::{ClientOptions, Connector, PipeServiceClient};
use gorilla_proto::timestamp;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};

/// What the service sends back for one request.
pub struct Reply {
    pub lines: Vec<String>,
    /// Keep the connection open after the last line until the client hangs up.
    pub hold_open: bool,
}

impl Reply {
    pub fn lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            hold_open: false,
        }
    }

    pub fn held(lines: Vec<String>) -> Self {
        Self {
            lines,
            hold_open: true,
        }
    }
}

type Handler = dyn Fn(&Value) -> Reply + Send + Sync;

/// A connector whose peer answers each connection with a scripted reply.
#[derive(Clone)]
pub struct ScriptedService {
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl ScriptedService {
    pub fn new(handler: impl Fn(&Value) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every request line received so far, in order.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn client(&self) -> PipeServiceClient<Self> {
        PipeServiceClient::with_connector(options(), self.clone())
    }
}

impl Connector for ScriptedService {
    type Stream = DuplexStream;

    async fn connect(&self, _timeout: Duration) -> io::Result<DuplexStream> {
        let (client, server) = tokio::io::duplex(64 * 1024);
        tokio::spawn(serve(server, self.handler.clone(), self.requests.clone()));
        Ok(client)
    }

    fn endpoint(&self) -> &str {
        "scripted"
    }
}

async fn serve(stream: DuplexStream, handler: Arc<Handler>, requests: Arc<Mutex<Vec<Value>>>) {
    let (read_half, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    match reader.read_line(&mut line).await {
        Ok(n) if n > 0 => {}
        _ => return,
    }
    let request: Value = serde_json::from_str(&line).expect("client sent invalid JSON");
    requests.lock().unwrap().push(request.clone());

    let reply = (*handler)(&request);
    for out in reply.lines {
        let framed = format!("{out}\n");
        if writer.write_all(framed.as_bytes()).await.is_err() {
            return;
        }
    }
    let _ = writer.flush().await;

    if reply.hold_open {
        let mut rest = Vec::new();
        let _ = reader.read_to_end(&mut rest).await;
    }
}

/// A connector that always refuses.
#[derive(Clone)]
pub struct Refusing;

impl Connector for Refusing {
    type Stream = DuplexStream;

    async fn connect(&self, _timeout: Duration) -> io::Result<DuplexStream> {
        Err(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        ))
    }

    fn endpoint(&self) -> &str {
        "refusing"
    }
}

pub fn options() -> ClientOptions {
    ClientOptions::default()
        .with_connect_timeout(Duration::from_secs(2))
        .with_request_timeout(Duration::from_secs(5))
}

fn now() -> String {
    timestamp::format(&Utc::now())
}

/// A Response correlated with `request`.
pub fn response(request: &Value, operation_id: &str, payload: Value) -> String {
    json!({
        "version": "v1",
        "messageType": "Response",
        "operation": request["operation"],
        "requestId": request["requestId"],
        "operationId": operation_id,
        "timestampUtc": now(),
        "payload": payload,
    })
    .to_string()
}

/// A `ListOptionalInstalls` response carrying `items`.
pub fn list_response(request: &Value, items: Value) -> String {
    response(request, "", json!({ "items": items }))
}

/// A Response that echoes everything except the operation.
pub fn response_with_operation(request: &Value, operation: &str, payload: Value) -> String {
    json!({
        "version": "v1",
        "messageType": "Response",
        "operation": operation,
        "requestId": request["requestId"],
        "operationId": "",
        "timestampUtc": now(),
        "payload": payload,
    })
    .to_string()
}

/// The stream acknowledgement for a `StreamOperationStatus` request.
pub fn ack(request: &Value, accepted: bool) -> String {
    let operation_id = request["operationId"].as_str().unwrap_or_default();
    response(request, operation_id, json!({ "streamAccepted": accepted }))
}

pub fn event(operation_id: &str, state: &str, progress: i32, message: &str) -> String {
    let payload = json!({
        "state": state,
        "progressPercent": progress,
        "message": message,
    });
    event_with(operation_id, payload)
}

pub fn event_with(operation_id: &str, payload: Value) -> String {
    json!({
        "version": "v1",
        "messageType": "Event",
        "operation": "StreamOperationStatus",
        "requestId": "",
        "operationId": operation_id,
        "timestampUtc": now(),
        "payload": payload,
    })
    .to_string()
}

pub fn error(request: &Value, code: &str, message: &str) -> String {
    json!({
        "version": "v1",
        "messageType": "Error",
        "operation": request["operation"],
        "requestId": request["requestId"],
        "operationId": request["operationId"],
        "timestampUtc": now(),
        "payload": { "errorCode": code, "errorMessage": message },
    })
    .to_string()
}

pub fn item(name: &str, status: &str) -> Value {
    json!({
        "itemName": name,
        "displayName": name,
        "version": "3.0.20",
        "catalog": "production",
        "installerType": "msi",
        "installerPackageId": name,
        "installerLocation": format!("packages/{name}.msi"),
        "isManaged": true,
        "isInstalled": status == "Installed",
        "status": status,
        "statusUpdatedAtUtc": "2026-02-14T18:10:00Z",
    })
}
