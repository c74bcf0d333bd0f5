use crate::error::{Result, WebcamError};
use crate::events::DeviceEvent;
use crate::protocol::{Incoming, Request};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// WebSocket connection state
struct ConnectionState {
    /// Pending requests waiting for responses
    pending_requests: HashMap<Uuid, oneshot::Sender<Incoming>>,
    /// Channel for sending outgoing messages
    ws_tx: mpsc::UnboundedSender<Message>,
}

/// Low-level JSON-RPC connection to the device's WebSocket API
pub struct Connection {
    state: Arc<Mutex<ConnectionState>>,
    /// Broadcast channel for feedback events (outside mutex to allow non-blocking subscribe)
    feedback_tx: broadcast::Sender<DeviceEvent>,
}

impl Connection {
    /// Connect to a WebSocket URL
    pub async fn connect(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        tracing::info!("Connecting to {}", url);

        let (ws_stream, _) = connect_async(&url).await?;
        let (mut write, mut read) = ws_stream.split();

        let (ws_tx, mut ws_rx) = mpsc::unbounded_channel::<Message>();
        let (feedback_tx, _) = broadcast::channel(100);

        let state = Arc::new(Mutex::new(ConnectionState {
            pending_requests: HashMap::new(),
            ws_tx,
        }));

        // Forward outgoing messages to the WebSocket
        let write_handle = tokio::spawn(async move {
            while let Some(msg) = ws_rx.recv().await {
                if let Err(e) = write.send(msg).await {
                    tracing::error!("Failed to send message: {}", e);
                    break;
                }
            }
        });

        // Receive and route incoming messages
        let state_clone = state.clone();
        let feedback_tx_clone = feedback_tx.clone();
        tokio::spawn(async move {
            while let Some(msg_result) = read.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        if let Err(e) =
                            Self::handle_message(&state_clone, &feedback_tx_clone, text).await
                        {
                            tracing::error!("Error handling message: {}", e);
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("WebSocket connection closed");
                        break;
                    }
                    Err(e) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }

            // Connection closed, cancel all pending requests
            let mut state = state_clone.lock().await;
            state.pending_requests.clear();
            drop(write_handle);
        });

        Ok(Self { state, feedback_tx })
    }

    /// Route an incoming message to a pending request or the feedback channel
    async fn handle_message(
        state: &Arc<Mutex<ConnectionState>>,
        feedback_tx: &broadcast::Sender<DeviceEvent>,
        text: String,
    ) -> Result<()> {
        tracing::debug!("Received: {}", text);

        let incoming: Incoming = serde_json::from_str(&text)?;

        if let Some(id) = incoming.id {
            let mut state = state.lock().await;
            if let Some(tx) = state.pending_requests.remove(&id) {
                let _ = tx.send(incoming);
            } else {
                tracing::debug!("Response for unknown request {}", id);
            }
            return Ok(());
        }

        if incoming.is_feedback() {
            if let Some(params) = &incoming.params {
                match DeviceEvent::from_feedback(params) {
                    // No receivers is fine; events are simply dropped
                    Some(event) => {
                        let _ = feedback_tx.send(event);
                    }
                    None => tracing::debug!("Ignoring unrecognized feedback payload"),
                }
            }
        } else {
            tracing::debug!("Ignoring message with no id: {:?}", incoming.method);
        }

        Ok(())
    }

    /// Send a request and wait for its response payload
    pub async fn send_request(&self, request: Request) -> Result<serde_json::Value> {
        let request_id = request.id;
        let (tx, rx) = oneshot::channel();

        // Register the pending request
        {
            let mut state = self.state.lock().await;
            state.pending_requests.insert(request_id, tx);

            let json = serde_json::to_string(&request)?;
            tracing::debug!("Sending: {}", json);

            state
                .ws_tx
                .send(Message::Text(json))
                .map_err(|_| WebcamError::ConnectionClosed)?;
        }

        // Wait for response with timeout
        let response = match timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(WebcamError::ConnectionClosed),
            Err(_) => {
                // Timeout - remove from pending requests
                let mut state = self.state.lock().await;
                state.pending_requests.remove(&request_id);
                return Err(WebcamError::Timeout);
            }
        };

        if let Some(error) = response.error {
            return Err(WebcamError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result.unwrap_or(serde_json::Value::Null))
    }

    /// Send a request without waiting for a response (fire and forget)
    pub async fn send_only(&self, request: Request) -> Result<()> {
        let state = self.state.lock().await;
        let json = serde_json::to_string(&request)?;
        tracing::debug!("Sending (no response): {}", json);

        state
            .ws_tx
            .send(Message::Text(json))
            .map_err(|_| WebcamError::ConnectionClosed)?;

        Ok(())
    }

    /// Subscribe to feedback events
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.feedback_tx.subscribe()
    }
}
