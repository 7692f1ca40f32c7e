//! Low-level Chrome DevTools Protocol (CDP) client over WebSocket.
//!
//! Talks to one page target of a Chrome/Chromium instance. Only the handful of
//! commands the portal session needs are wrapped; everything else goes through
//! [`CdpClient::send_command`].

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, warn};

#[derive(Error, Debug)]
pub enum CdpError {
    /// WebSocket gone, writer closed or the response channel dropped.
    #[error("transport: {0}")]
    Transport(String),

    /// The browser answered with an `error` object.
    #[error("protocol error in {method}: {detail}")]
    Protocol { method: String, detail: Value },

    /// A script raised inside the page.
    #[error("script exception: {0}")]
    Script(String),

    #[error("command '{0}' timed out")]
    Timeout(String),
}

/// A CDP WebSocket client that sends commands and matches responses by id.
pub struct CdpClient {
    ws_tx: mpsc::Sender<String>,
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>,
    next_id: AtomicU64,
    command_timeout: Duration,
    reader_handle: tokio::task::JoinHandle<()>,
    writer_handle: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to a Chrome CDP WebSocket endpoint.
    pub async fn connect(ws_url: &str, command_timeout: Duration) -> Result<Self, CdpError> {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::connect_async;
        use tokio_tungstenite::tungstenite::Message;

        let (ws_stream, _) = connect_async(ws_url).await.map_err(|e| {
            CdpError::Transport(format!("failed to connect to {}: {}", ws_url, e))
        })?;

        let (mut ws_sink, mut ws_stream_read) = ws_stream.split();

        let (ws_tx, mut ws_rx) = mpsc::channel::<String>(256);

        let pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let pending_clone = pending.clone();

        let writer_handle = tokio::spawn(async move {
            while let Some(msg) = ws_rx.recv().await {
                if let Err(e) = ws_sink.send(Message::Text(msg)).await {
                    error!("CDP WebSocket write error: {}", e);
                    break;
                }
            }
        });

        // Events are not consumed; only id-bearing responses are dispatched.
        let reader_handle = tokio::spawn(async move {
            while let Some(msg_result) = ws_stream_read.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        let Ok(val) = serde_json::from_str::<Value>(&text) else {
                            continue;
                        };
                        if let Some(id) = val.get("id").and_then(|v| v.as_u64()) {
                            let mut pending = pending_clone.lock().await;
                            if let Some(tx) = pending.remove(&id) {
                                let _ = tx.send(val);
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("CDP WebSocket closed by browser");
                        break;
                    }
                    Err(e) => {
                        warn!("CDP WebSocket read error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
            // Wake every waiter so callers see a transport failure instead of a timeout.
            pending_clone.lock().await.clear();
        });

        Ok(Self {
            ws_tx,
            pending,
            next_id: AtomicU64::new(1),
            command_timeout,
            reader_handle,
            writer_handle,
        })
    }

    /// Send a CDP command and wait for its result.
    pub async fn send_command(&self, method: &str, params: Value) -> Result<Value, CdpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let msg = json!({
            "id": id,
            "method": method,
            "params": params,
        });

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        if self.ws_tx.send(msg.to_string()).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(CdpError::Transport("WebSocket writer closed".to_string()));
        }

        match tokio::time::timeout(self.command_timeout, rx).await {
            Ok(Ok(response)) => match response.get("error") {
                Some(detail) => Err(CdpError::Protocol {
                    method: method.to_string(),
                    detail: detail.clone(),
                }),
                None => Ok(response.get("result").cloned().unwrap_or(Value::Null)),
            },
            Ok(Err(_)) => Err(CdpError::Transport("response channel closed".to_string())),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(CdpError::Timeout(method.to_string()))
            }
        }
    }

    /// Enable a CDP domain (e.g., "Page", "Runtime", "DOM").
    pub async fn enable_domain(&self, domain: &str) -> Result<(), CdpError> {
        self.send_command(&format!("{}.enable", domain), json!({}))
            .await?;
        Ok(())
    }

    pub async fn navigate(&self, url: &str) -> Result<(), CdpError> {
        let result = self
            .send_command("Page.navigate", json!({"url": url}))
            .await?;
        if let Some(text) = result.get("errorText").and_then(|v| v.as_str()) {
            return Err(CdpError::Transport(format!("navigation to {} failed: {}", url, text)));
        }
        Ok(())
    }

    /// Evaluate an expression in the page and return its JSON value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .send_command(
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;
        remote_value(result)
    }

    /// Evaluate an expression and keep the result as a remote object.
    /// Returns `None` when the expression yields `null`/`undefined`.
    pub async fn evaluate_handle(&self, expression: &str) -> Result<Option<String>, CdpError> {
        let result = self
            .send_command(
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "returnByValue": false,
                }),
            )
            .await?;
        check_exception(&result)?;
        Ok(result
            .get("result")
            .and_then(|r| r.get("objectId"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()))
    }

    /// Call a function with `this` bound to a remote object.
    pub async fn call_function_on(
        &self,
        object_id: &str,
        function_declaration: &str,
    ) -> Result<Value, CdpError> {
        let result = self
            .send_command(
                "Runtime.callFunctionOn",
                json!({
                    "objectId": object_id,
                    "functionDeclaration": function_declaration,
                    "returnByValue": true,
                }),
            )
            .await?;
        remote_value(result)
    }

    /// Insert text into the focused element (bypasses key events).
    pub async fn insert_text(&self, text: &str) -> Result<(), CdpError> {
        self.send_command("Input.insertText", json!({"text": text}))
            .await?;
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.reader_handle.abort();
        self.writer_handle.abort();
    }
}

fn check_exception(result: &Value) -> Result<(), CdpError> {
    if let Some(details) = result.get("exceptionDetails") {
        let text = details
            .get("exception")
            .and_then(|e| e.get("description"))
            .or_else(|| details.get("text"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown exception");
        return Err(CdpError::Script(text.to_string()));
    }
    Ok(())
}

fn remote_value(result: Value) -> Result<Value, CdpError> {
    check_exception(&result)?;
    Ok(result
        .get("result")
        .and_then(|r| r.get("value"))
        .cloned()
        .unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_value_extracts_value() {
        let result = json!({"result": {"type": "boolean", "value": true}});
        assert_eq!(remote_value(result).unwrap(), json!(true));
    }

    #[test]
    fn test_remote_value_undefined_is_null() {
        let result = json!({"result": {"type": "undefined"}});
        assert_eq!(remote_value(result).unwrap(), Value::Null);
    }

    #[test]
    fn test_exception_details_become_script_error() {
        let result = json!({
            "result": {"type": "object", "subtype": "error"},
            "exceptionDetails": {
                "text": "Uncaught",
                "exception": {"description": "TypeError: x is null"}
            }
        });
        match remote_value(result) {
            Err(CdpError::Script(msg)) => assert_eq!(msg, "TypeError: x is null"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
