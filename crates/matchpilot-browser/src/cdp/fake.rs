//! In-process stand-in for Chrome's DevTools endpoint, for tests.
//!
//! Serves `/json/version` and `/json/new` over plain HTTP and accepts the
//! browser WebSocket on the same port. Every command received is recorded and
//! answered by a responder closure, which may also push events.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

type Responder = Arc<dyn Fn(&Value) -> Vec<Value> + Send + Sync>;

pub(crate) struct FakeBrowser {
    port: u16,
    commands: Arc<Mutex<Vec<Value>>>,
    task: JoinHandle<()>,
}

impl FakeBrowser {
    /// Start a fake browser answering every command with [`default_reply`].
    pub(crate) async fn start() -> Self {
        Self::with_responder(default_reply).await
    }

    pub(crate) async fn with_responder(
        responder: impl Fn(&Value) -> Vec<Value> + Send + Sync + 'static,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let responder: Responder = Arc::new(responder);
        let created = Arc::new(AtomicU64::new(0));

        let task = {
            let commands = commands.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let mut head = [0u8; 4096];
                    let n = stream.peek(&mut head).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&head[..n]).to_lowercase();
                    if request.contains("upgrade: websocket") {
                        tokio::spawn(serve_socket(stream, commands.clone(), responder.clone()));
                    } else {
                        tokio::spawn(serve_http(stream, port, created.clone()));
                    }
                }
            })
        };

        Self {
            port,
            commands,
            task,
        }
    }

    pub(crate) fn endpoint(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    /// Methods of every command received so far, in order.
    pub(crate) fn methods(&self) -> Vec<String> {
        self.commands
            .lock()
            .iter()
            .filter_map(|c| c["method"].as_str().map(str::to_string))
            .collect()
    }

    /// Every received command with the given method.
    pub(crate) fn commands(&self, method: &str) -> Vec<Value> {
        self.commands
            .lock()
            .iter()
            .filter(|c| c["method"] == method)
            .cloned()
            .collect()
    }
}

impl Drop for FakeBrowser {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Successful response to `request`.
pub(crate) fn reply(request: &Value, result: Value) -> Value {
    json!({"id": request["id"], "result": result})
}

/// Protocol error response to `request`.
pub(crate) fn reply_error(request: &Value, code: i64, message: &str) -> Value {
    json!({"id": request["id"], "error": {"code": code, "message": message}})
}

/// Event on the session `request` was sent on.
pub(crate) fn event(request: &Value, method: &str, params: Value) -> Value {
    json!({"method": method, "params": params, "sessionId": request["sessionId"]})
}

/// A Chrome with one blank tab (`T1`) whose commands all succeed.
///
/// Navigations report a loader and immediately fire its `load` and
/// `networkIdle` lifecycle events.
pub(crate) fn default_reply(request: &Value) -> Vec<Value> {
    let params = &request["params"];
    match request["method"].as_str().unwrap_or("") {
        "Target.getTargets" => vec![reply(
            request,
            json!({"targetInfos": [
                {"targetId": "T1", "type": "page", "title": "", "url": "about:blank", "attached": false},
                {"targetId": "W1", "type": "service_worker", "title": "", "url": "http://x/sw.js"},
            ]}),
        )],
        "Target.attachToTarget" => vec![reply(
            request,
            json!({"sessionId": format!("S-{}", params["targetId"].as_str().unwrap_or(""))}),
        )],
        "Page.navigate" => {
            let loader = "L1";
            let mut out = vec![reply(request, json!({"frameId": "F1", "loaderId": loader}))];
            for name in ["init", "DOMContentLoaded", "load", "networkIdle"] {
                out.push(event(
                    request,
                    "Page.lifecycleEvent",
                    json!({"frameId": "F1", "loaderId": loader, "name": name, "timestamp": 1.0}),
                ));
            }
            out
        }
        "Runtime.evaluate" => vec![reply(
            request,
            json!({"result": {"type": "string", "value": "http://x/home"}}),
        )],
        "DOM.getDocument" => vec![reply(request, json!({"root": {"nodeId": 1}}))],
        _ => vec![reply(request, json!({}))],
    }
}

async fn serve_http(mut stream: TcpStream, port: u16, created: Arc<AtomicU64>) {
    let mut buf = vec![0u8; 4096];
    let n = stream.read(&mut buf).await.unwrap_or(0);
    let request = String::from_utf8_lossy(&buf[..n]).to_string();
    let target = request.split_whitespace().nth(1).unwrap_or("/").to_string();

    let (status, body) = if target == "/json/version" {
        (
            "200 OK",
            json!({
                "Browser": "FakeChrome/1.0",
                "Protocol-Version": "1.3",
                "User-Agent": "fake",
                "webSocketDebuggerUrl": format!("ws://127.0.0.1:{}/devtools/browser/fake", port),
            }),
        )
    } else if let Some(rest) = target.strip_prefix("/json/new") {
        let id = created.fetch_add(1, Ordering::SeqCst) + 1;
        let url = rest.strip_prefix('?').unwrap_or("about:blank");
        (
            "200 OK",
            json!({"id": format!("N{}", id), "type": "page", "title": "", "url": url}),
        )
    } else {
        ("404 Not Found", json!({}))
    };

    let body = body.to_string();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn serve_socket(stream: TcpStream, commands: Arc<Mutex<Vec<Value>>>, responder: Responder) {
    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    let (mut sink, mut source) = ws.split();
    while let Some(Ok(msg)) = source.next().await {
        let Message::Text(text) = msg else {
            continue;
        };
        let Ok(command) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        commands.lock().push(command.clone());
        for out in responder(&command) {
            if sink.send(Message::Text(out.to_string().into())).await.is_err() {
                return;
            }
        }
    }
}
