use crate::error::{Result, WebcamError};
use crate::types::{as_u32, SignalState};
use serde_json::Value;
use tokio::sync::broadcast;

/// A typed device notification
///
/// Feedback from the device arrives on independent subscription paths with no
/// ordering guarantee between them; each variant corresponds to one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Self-view moved to a different monitor role
    SelfviewMonitorRole(String),
    /// Self-view fullscreen mode changed (true = fullscreen)
    SelfviewFullscreen(bool),
    /// Self-view was turned on or off
    SelfviewMode(bool),
    /// Signal state changed on a video input connector
    InputSignal {
        connector_id: u32,
        state: SignalState,
    },
    /// Number of active calls changed
    ActiveCalls(u32),
    /// An operator pressed or changed a UI widget
    WidgetAction {
        widget_id: String,
        action: String,
        value: String,
    },
    /// An operator submitted a text-input dialog
    TextInputResponse { feedback_id: String, text: String },
}

impl DeviceEvent {
    /// Parse a feedback payload into a typed event.
    ///
    /// Returns `None` for payloads that are malformed or belong to paths this
    /// library does not subscribe to; such notifications are ignored.
    pub fn from_feedback(payload: &Value) -> Option<DeviceEvent> {
        if let Some(status) = payload.get("Status") {
            return Self::from_status(status);
        }
        if let Some(event) = payload.get("Event") {
            return Self::from_ui_event(event);
        }
        None
    }

    fn from_status(status: &Value) -> Option<DeviceEvent> {
        if let Some(selfview) = status.pointer("/Video/Selfview") {
            if let Some(role) = selfview.get("OnMonitorRole").and_then(Value::as_str) {
                return Some(DeviceEvent::SelfviewMonitorRole(role.to_string()));
            }
            if let Some(fullscreen) = selfview.get("FullscreenMode").and_then(Value::as_str) {
                return Some(DeviceEvent::SelfviewFullscreen(fullscreen == "On"));
            }
            if let Some(mode) = selfview.get("Mode").and_then(Value::as_str) {
                return Some(DeviceEvent::SelfviewMode(mode == "On"));
            }
        }

        if let Some(connectors) = status.pointer("/Video/Input/Connector") {
            for connector in as_slice(connectors) {
                let id = connector.get("id").and_then(as_u32);
                let state = connector.get("SignalState").and_then(Value::as_str);
                if let (Some(connector_id), Some(state)) = (id, state) {
                    return Some(DeviceEvent::InputSignal {
                        connector_id,
                        state: SignalState::from_device(state),
                    });
                }
            }
        }

        if let Some(count) = status.pointer("/SystemUnit/State/NumberOfActiveCalls") {
            return as_u32(count).map(DeviceEvent::ActiveCalls);
        }

        None
    }

    fn from_ui_event(event: &Value) -> Option<DeviceEvent> {
        if let Some(action) = event.pointer("/UserInterface/Extensions/Widget/Action") {
            let action = first_entry(action)?;
            let widget_id = action.get("WidgetId").and_then(Value::as_str)?;
            return Some(DeviceEvent::WidgetAction {
                widget_id: widget_id.to_string(),
                action: action
                    .get("Type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                value: action
                    .get("Value")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }

        if let Some(response) = event.pointer("/UserInterface/Message/TextInput/Response") {
            let response = first_entry(response)?;
            let feedback_id = response.get("FeedbackId").and_then(Value::as_str)?;
            let text = response.get("Text").and_then(Value::as_str)?;
            return Some(DeviceEvent::TextInputResponse {
                feedback_id: feedback_id.to_string(),
                text: text.to_string(),
            });
        }

        None
    }
}

/// Some firmware versions wrap single entries in a one-element array.
fn first_entry(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

fn as_slice(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items.as_slice(),
        other => std::slice::from_ref(other),
    }
}

/// Receiver for typed device events
pub struct EventReceiver {
    rx: broadcast::Receiver<DeviceEvent>,
}

impl EventReceiver {
    pub(crate) fn new(rx: broadcast::Receiver<DeviceEvent>) -> Self {
        Self { rx }
    }

    /// Receive the next device event
    ///
    /// Returns `ConnectionClosed` once the connection is gone, or
    /// `ChannelError` when this receiver lagged behind and dropped events.
    pub async fn recv(&mut self) -> Result<DeviceEvent> {
        self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => WebcamError::ConnectionClosed,
            broadcast::error::RecvError::Lagged(n) => {
                WebcamError::ChannelError(format!("Lagged by {} events", n))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_selfview_notifications() {
        let role = json!({ "Status": { "Video": { "Selfview": { "OnMonitorRole": "First" } } } });
        assert_eq!(
            DeviceEvent::from_feedback(&role),
            Some(DeviceEvent::SelfviewMonitorRole("First".to_string()))
        );

        let fullscreen = json!({ "Status": { "Video": { "Selfview": { "FullscreenMode": "Off" } } } });
        assert_eq!(
            DeviceEvent::from_feedback(&fullscreen),
            Some(DeviceEvent::SelfviewFullscreen(false))
        );

        let mode = json!({ "Status": { "Video": { "Selfview": { "Mode": "On" } } } });
        assert_eq!(
            DeviceEvent::from_feedback(&mode),
            Some(DeviceEvent::SelfviewMode(true))
        );
    }

    #[test]
    fn parses_input_connector_signal() {
        let payload = json!({
            "Status": { "Video": { "Input": { "Connector": [
                { "id": 2, "SignalState": "OK" }
            ] } } }
        });
        assert_eq!(
            DeviceEvent::from_feedback(&payload),
            Some(DeviceEvent::InputSignal {
                connector_id: 2,
                state: SignalState::Ok
            })
        );

        // single entry without the array wrapper
        let bare = json!({
            "Status": { "Video": { "Input": { "Connector":
                { "id": "3", "SignalState": "Unstable" }
            } } }
        });
        assert_eq!(
            DeviceEvent::from_feedback(&bare),
            Some(DeviceEvent::InputSignal {
                connector_id: 3,
                state: SignalState::Unstable
            })
        );
    }

    #[test]
    fn parses_active_call_count_as_string_or_number() {
        let stringy = json!({ "Status": { "SystemUnit": { "State": { "NumberOfActiveCalls": "1" } } } });
        assert_eq!(
            DeviceEvent::from_feedback(&stringy),
            Some(DeviceEvent::ActiveCalls(1))
        );

        let numeric = json!({ "Status": { "SystemUnit": { "State": { "NumberOfActiveCalls": 0 } } } });
        assert_eq!(
            DeviceEvent::from_feedback(&numeric),
            Some(DeviceEvent::ActiveCalls(0))
        );
    }

    #[test]
    fn parses_ui_events() {
        let widget = json!({
            "Event": { "UserInterface": { "Extensions": { "Widget": { "Action": {
                "WidgetId": "toggle_UJ", "Type": "changed", "Value": "on"
            } } } } }
        });
        assert_eq!(
            DeviceEvent::from_feedback(&widget),
            Some(DeviceEvent::WidgetAction {
                widget_id: "toggle_UJ".to_string(),
                action: "changed".to_string(),
                value: "on".to_string(),
            })
        );

        let text = json!({
            "Event": { "UserInterface": { "Message": { "TextInput": { "Response": {
                "FeedbackId": "dialOutNum", "Text": "2345"
            } } } } }
        });
        assert_eq!(
            DeviceEvent::from_feedback(&text),
            Some(DeviceEvent::TextInputResponse {
                feedback_id: "dialOutNum".to_string(),
                text: "2345".to_string(),
            })
        );
    }

    #[test]
    fn malformed_payloads_are_ignored() {
        assert_eq!(DeviceEvent::from_feedback(&json!({})), None);
        assert_eq!(DeviceEvent::from_feedback(&json!({ "Status": {} })), None);
        // connector entry missing SignalState
        let partial = json!({
            "Status": { "Video": { "Input": { "Connector": [{ "id": 2 }] } } }
        });
        assert_eq!(DeviceEvent::from_feedback(&partial), None);
        // text input missing FeedbackId
        let no_id = json!({
            "Event": { "UserInterface": { "Message": { "TextInput": { "Response": {
                "Text": "2345"
            } } } } }
        });
        assert_eq!(DeviceEvent::from_feedback(&no_id), None);
    }
}
