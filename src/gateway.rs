use crate::connection::Connection;
use crate::error::{Result, WebcamError};
use crate::events::EventReceiver;
use crate::protocol::Request;
use crate::types::{as_u32, CallInfo, ConnectorInfo};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Text-input dialogs stay on screen this long before the device dismisses them.
const TEXT_INPUT_TIMEOUT_SECS: u32 = 45;

/// Status paths the controller reacts to
const STATUS_PATHS: &[&str] = &[
    "Video Selfview OnMonitorRole",
    "Video Selfview FullscreenMode",
    "Video Selfview Mode",
    "Video Input Connector",
    "SystemUnit State NumberOfActiveCalls",
];

/// UI event paths the controller reacts to
const EVENT_PATHS: &[&str] = &[
    "UserInterface Extensions Widget Action",
    "UserInterface Message TextInput Response",
];

/// Operations the reactive core invokes on the device
///
/// The controller is generic over this trait so tests can substitute a
/// recording fake for the WebSocket transport. Commands are fire-and-forget
/// on the device side; the `Result` only reflects transport failures.
#[async_trait]
pub trait DeviceGateway: Send + Sync {
    /// Issue a command by its space-separated name, e.g. `"Presentation Stop"`
    async fn issue_command(&self, name: &str, params: Value) -> Result<()>;

    /// Read a configuration list of connector descriptors,
    /// e.g. `"Video Input Connector"`
    async fn read_config(&self, path: &str) -> Result<Vec<ConnectorInfo>>;

    /// Fetch the current call list
    async fn call_list(&self) -> Result<Vec<CallInfo>>;

    /// Read the number of active calls
    async fn active_call_count(&self) -> Result<u32>;

    /// Show a modal numeric text-input dialog; the response arrives as a
    /// `TextInputResponse` event carrying the same feedback id
    async fn prompt_text_input(&self, feedback_id: &str, title: &str) -> Result<()>;

    /// Write a UI extension widget's value
    async fn set_widget_value(&self, widget_id: &str, value: &str) -> Result<()>;
}

/// Gateway to a device's JSON-RPC WebSocket API
pub struct XapiGateway {
    connection: Arc<Connection>,
}

impl XapiGateway {
    /// Connect to the device's WebSocket API at `ws://{host}:{port}/ws`
    pub async fn connect(host: impl Into<String>, port: u16) -> Result<Self> {
        let url = format!("ws://{}:{}/ws", host.into(), port);
        let connection = Connection::connect(url).await?;

        Ok(Self {
            connection: Arc::new(connection),
        })
    }

    /// Get a receiver for typed device events
    pub fn events(&self) -> EventReceiver {
        EventReceiver::new(self.connection.subscribe())
    }

    /// Register a feedback subscription for a status path
    pub async fn subscribe_status(&self, path: &str) -> Result<()> {
        let query = format!("Status {}", path);
        self.connection
            .send_request(Request::feedback_subscribe(&query))
            .await?;
        Ok(())
    }

    /// Register a feedback subscription for a UI event path
    pub async fn subscribe_event(&self, path: &str) -> Result<()> {
        let query = format!("Event {}", path);
        self.connection
            .send_request(Request::feedback_subscribe(&query))
            .await?;
        Ok(())
    }

    /// Register every subscription the webcam controller depends on
    pub async fn subscribe_webcam_feedback(&self) -> Result<()> {
        for path in STATUS_PATHS {
            self.subscribe_status(path).await?;
        }
        for path in EVENT_PATHS {
            self.subscribe_event(path).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceGateway for XapiGateway {
    async fn issue_command(&self, name: &str, params: Value) -> Result<()> {
        self.connection.send_only(Request::command(name, params)).await
    }

    async fn read_config(&self, path: &str) -> Result<Vec<ConnectorInfo>> {
        let result = self
            .connection
            .send_request(Request::get(&format!("Configuration {}", path)))
            .await?;

        let entries = result
            .as_array()
            .ok_or_else(|| WebcamError::InvalidResponse(format!("{} is not a list", path)))?;

        Ok(entries.iter().filter_map(ConnectorInfo::from_value).collect())
    }

    async fn call_list(&self) -> Result<Vec<CallInfo>> {
        let result = self.connection.send_request(Request::get("Status Call")).await?;

        // No calls yields an empty or missing list
        let entries = match result.as_array() {
            Some(entries) => entries,
            None => return Ok(Vec::new()),
        };

        Ok(entries.iter().filter_map(CallInfo::from_value).collect())
    }

    async fn active_call_count(&self) -> Result<u32> {
        let result = self
            .connection
            .send_request(Request::get("Status SystemUnit State NumberOfActiveCalls"))
            .await?;

        as_u32(&result).ok_or_else(|| {
            WebcamError::InvalidResponse(format!("Unexpected call count payload: {}", result))
        })
    }

    async fn prompt_text_input(&self, feedback_id: &str, title: &str) -> Result<()> {
        self.issue_command(
            "UserInterface Message TextInput Display",
            json!({
                "Duration": TEXT_INPUT_TIMEOUT_SECS,
                "FeedbackId": feedback_id,
                "InputType": "Numeric",
                "KeyboardState": "Open",
                "Placeholder": title,
                "SubmitText": "Submit",
                "Title": title,
                "Text": title,
            }),
        )
        .await
    }

    async fn set_widget_value(&self, widget_id: &str, value: &str) -> Result<()> {
        self.issue_command(
            "UserInterface Extensions Widget SetValue",
            json!({ "WidgetId": widget_id, "Value": value }),
        )
        .await
    }
}
