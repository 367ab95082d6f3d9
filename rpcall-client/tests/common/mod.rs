//! Common test utilities for rpcall-client integration tests
//!
//! A mock JSON-RPC WebSocket server that handles every inbound request on its
//! own task, so slow calls answer after fast ones, the way a real server
//! multiplexing a connection would.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

/// What the server does with one inbound message
pub enum Reply {
    Text(String),
    Binary(Vec<u8>),
    Close,
}

/// Mock WebSocket server for client testing
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    message_rx: mpsc::Receiver<String>,
    handshake_headers: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockWsServer {
    /// Start a server answering with [`standard_replies`]
    pub async fn start() -> Self {
        Self::with_handler(standard_replies).await
    }

    /// Start a server with a custom handler
    ///
    /// The handler runs on its own task per inbound text message; its
    /// replies are written in the order it returns them.
    pub async fn with_handler<F, Fut>(handler: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<Reply>> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (msg_tx, message_rx) = mpsc::channel::<String>(100);
        let handshake_headers = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);
        let headers = Arc::clone(&handshake_headers);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        let msg_tx = msg_tx.clone();
                        let handler = Arc::clone(&handler);
                        let headers = Arc::clone(&headers);

                        tokio::spawn(async move {
                            let capture = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                                let mut seen = headers.lock().unwrap();
                                seen.clear();
                                for (name, value) in request.headers() {
                                    seen.push((
                                        name.as_str().to_string(),
                                        value.to_str().unwrap_or_default().to_string(),
                                    ));
                                }
                                Ok(response)
                            };
                            let Ok(ws_stream) = accept_hdr_async(stream, capture).await else {
                                return;
                            };
                            let (mut write, mut read) = ws_stream.split();

                            // Single writer; handler tasks queue replies here
                            let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<Reply>();
                            let writer = tokio::spawn(async move {
                                while let Some(reply) = reply_rx.recv().await {
                                    match reply {
                                        Reply::Text(text) => {
                                            if write.send(Message::Text(text)).await.is_err() {
                                                break;
                                            }
                                        }
                                        Reply::Binary(bytes) => {
                                            if write.send(Message::Binary(bytes)).await.is_err() {
                                                break;
                                            }
                                        }
                                        Reply::Close => {
                                            let _ = write.send(Message::Close(None)).await;
                                            break;
                                        }
                                    }
                                }
                            });

                            while let Some(Ok(message)) = read.next().await {
                                let Message::Text(text) = message else { continue };
                                let _ = msg_tx.send(text.clone()).await;

                                let handler = Arc::clone(&handler);
                                let reply_tx = reply_tx.clone();
                                tokio::spawn(async move {
                                    for reply in handler(text).await {
                                        let _ = reply_tx.send(reply);
                                    }
                                });
                            }

                            drop(reply_tx);
                            let _ = writer.await;
                        });
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            message_rx,
            handshake_headers,
        }
    }

    /// WebSocket URL for connecting to this server
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Wait (up to 5 seconds) for the next message the server received
    pub async fn wait_for_message(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(5), self.message_rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Value of a header from the most recent handshake
    pub fn handshake_header(&self, name: &str) -> Option<String> {
        self.handshake_headers
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    /// Stop accepting connections
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Server that completes the handshake and then never reads
///
/// Once the socket buffers fill, every client write stalls.
pub struct StalledWsServer {
    addr: SocketAddr,
    task: tokio::task::JoinHandle<()>,
}

impl StalledWsServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                if let Ok(ws_stream) = tokio_tungstenite::accept_async(stream).await {
                    held.push(ws_stream);
                }
            }
        });

        Self { addr, task }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn shutdown(self) {
        self.task.abort();
    }
}

/// Default behaviour, keyed on the method name:
///
/// - `wait [seconds]`: sleep, then answer with `seconds`
/// - `echo`: answer with the params
/// - `fail [code, message]`: answer with that error
/// - `silent`: never answer
/// - `close`: send a close frame
/// - `noise`: send a non-JSON message and an unmatched response, then echo
pub async fn standard_replies(text: String) -> Vec<Reply> {
    let request: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => return Vec::new(),
    };
    let id = request["id"].as_i64().unwrap_or_default();
    let params = request["params"].clone();

    match request["method"].as_str().unwrap_or_default() {
        "wait" => {
            let seconds = params[0].as_f64().unwrap_or(0.0);
            tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
            vec![Reply::Text(mock_response(id, json!(seconds)))]
        }
        "echo" => vec![Reply::Text(mock_response(id, params))],
        "fail" => {
            let code = params[0].as_i64().unwrap_or(-32603);
            let message = params[1].as_str().unwrap_or("failed");
            vec![Reply::Text(mock_error_response(id, code, message))]
        }
        "silent" => Vec::new(),
        "close" => vec![Reply::Close],
        "noise" => vec![
            Reply::Text("this is not json".to_string()),
            Reply::Text(mock_response(id + 1000, json!("stray"))),
            Reply::Text(json!({"jsonrpc": "2.0", "result": "no id"}).to_string()),
            Reply::Text(mock_response(id, params)),
        ],
        _ => vec![Reply::Text(mock_error_response(id, -32601, "Method not found"))],
    }
}

/// Helper to create a mock JSON-RPC response
pub fn mock_response(id: i64, result: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": id
    })
    .to_string()
}

/// Helper to create a mock JSON-RPC error response
pub fn mock_error_response(id: i64, code: i64, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "error": {
            "code": code,
            "message": message
        },
        "id": id
    })
    .to_string()
}
