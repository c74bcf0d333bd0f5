use crate::error::{Result, WebcamError};
use crate::events::{DeviceEvent, EventReceiver};
use crate::gateway::DeviceGateway;
use crate::keepalive::KeepAlive;
use crate::topology;
use crate::types::{SignalState, Topology};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const TOGGLE_WIDGET_ID: &str = "toggle_UJ";
const ENTER_PHONE_WIDGET_ID: &str = "enterPhone";
const DIAL_WIDGET_ID: &str = "dial";
const DIAL_DISPLAY_WIDGET_ID: &str = "dialin_txt";

const DIAL_FEEDBACK_ID: &str = "dialOutNum";
const CONFERENCE_FEEDBACK_ID: &str = "confId";
const DIAL_PROMPT: &str = "Enter number to dial";
const CONFERENCE_PROMPT: &str = "Enter your ConferenceID / Meeting Number";

const BANNER_TEXT: &str = "Webcam Mode";
const DTMF_TERMINATOR: char = '#';

const DIAL_ATTEMPTS: u32 = 3;
const DIAL_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Reactive controller that keeps the endpoint configured as a webcam source
///
/// Owns all mutable state of the mode: the Universal Join flag, the resolved
/// connector topology, the operator's dial string and the keep-alive handle.
/// Every reaction runs sequentially on the task driving [`run`](Self::run),
/// so the fields need no locking.
pub struct WebcamController<G> {
    gateway: Arc<G>,
    mode_enabled: bool,
    topology: Option<Topology>,
    dial_string: Option<String>,
    keepalive: Option<KeepAlive>,
}

impl<G: DeviceGateway + 'static> WebcamController<G> {
    /// Create a controller over the given gateway
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            mode_enabled: false,
            topology: None,
            dial_string: None,
            keepalive: None,
        }
    }

    /// Whether Universal Join mode is currently enabled
    pub fn mode_enabled(&self) -> bool {
        self.mode_enabled
    }

    /// The resolved connector topology, once resolution has completed
    pub fn topology(&self) -> Option<Topology> {
        self.topology
    }

    /// Drive the controller until the event stream closes.
    ///
    /// Resets the UI widgets, then resolves the connector topology while
    /// already dispatching events; reactions that need the topology no-op
    /// until it is available instead of acting on a default.
    pub async fn run(&mut self, mut events: EventReceiver) -> Result<()> {
        self.init_ui().await;

        let resolve = topology::resolve(Arc::clone(&self.gateway));
        tokio::pin!(resolve);
        let mut resolving = true;

        loop {
            tokio::select! {
                resolved = &mut resolve, if resolving => {
                    resolving = false;
                    match resolved {
                        Ok(topology) => self.topology = Some(topology),
                        // Topology stays unresolved; dependent reactions keep no-oping
                        Err(e) => tracing::warn!("Topology resolution failed: {}", e),
                    }
                }
                event = events.recv() => match event {
                    Ok(event) => self.handle_event(event).await,
                    Err(WebcamError::ChannelError(msg)) => {
                        tracing::warn!("Event stream lagged: {}", msg);
                    }
                    Err(e) => return Err(e),
                },
            }
        }
    }

    /// Dispatch a single device event
    pub async fn handle_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::SelfviewMonitorRole(role) => self.on_selfview_role(&role).await,
            DeviceEvent::SelfviewFullscreen(fullscreen) => {
                if !fullscreen {
                    self.on_selfview_drift("fullscreen off").await;
                }
            }
            DeviceEvent::SelfviewMode(on) => {
                if !on {
                    self.on_selfview_drift("self-view off").await;
                }
            }
            DeviceEvent::InputSignal {
                connector_id,
                state,
            } => self.on_input_signal(connector_id, state).await,
            DeviceEvent::ActiveCalls(count) => self.on_active_calls(count).await,
            DeviceEvent::WidgetAction {
                widget_id,
                action,
                value,
            } => self.on_widget_action(&widget_id, &action, &value).await,
            DeviceEvent::TextInputResponse { feedback_id, text } => {
                self.on_text_input(&feedback_id, text).await
            }
        }
    }

    /// Enable or disable Universal Join mode.
    ///
    /// The self-view command is issued with the requested value even when
    /// disabling, restoring the normal self-view state. Enabling shows a
    /// transient banner and (re)starts the keep-alive timer; disabling stops
    /// it. At most one keep-alive task is alive at any time.
    pub async fn set_mode(&mut self, enable: bool) {
        self.mode_enabled = enable;
        self.set_selfview(enable).await;

        if let Some(keepalive) = self.keepalive.take() {
            keepalive.stop();
        }

        if enable {
            self.advise(
                "UserInterface Message TextLine Display",
                json!({
                    "Text": BANNER_TEXT,
                    "Duration": "30",
                    "X": "100",
                    "Y": "100",
                }),
            )
            .await;
            self.keepalive = Some(KeepAlive::start(Arc::clone(&self.gateway)));
            tracing::info!("Universal Join enabled");
        } else {
            tracing::info!("Universal Join disabled");
        }
    }

    /// Issue the full-screen self-view command on the resolved output.
    ///
    /// Idempotent by design of the device command, so the watchdog can call
    /// it for every deviation notification. Skipped while the topology is
    /// unresolved.
    async fn set_selfview(&self, on: bool) {
        let Some(topology) = &self.topology else {
            tracing::debug!("Self-view command skipped, topology unresolved");
            return;
        };
        let value = if on { "On" } else { "Off" };
        self.advise(
            "Video Selfview Set",
            json!({
                "Mode": value,
                "FullscreenMode": value,
                "OnMonitorRole": topology.output_role.as_str(),
            }),
        )
        .await;
    }

    async fn on_selfview_role(&self, role: &str) {
        if !self.mode_enabled {
            return;
        }
        let Some(topology) = &self.topology else {
            return;
        };
        if role != topology.output_role.as_str() {
            tracing::debug!("Self-view drifted to monitor role {}", role);
            self.set_selfview(true).await;
        }
    }

    async fn on_selfview_drift(&self, what: &str) {
        if !self.mode_enabled {
            return;
        }
        tracing::debug!("Self-view drifted: {}", what);
        self.set_selfview(true).await;
    }

    async fn on_input_signal(&self, connector_id: u32, state: SignalState) {
        if !self.mode_enabled {
            return;
        }
        let Some(topology) = &self.topology else {
            return;
        };
        if topology.presentation_input != Some(connector_id) {
            tracing::debug!("Ignoring signal change on connector {}", connector_id);
            return;
        }

        match state {
            SignalState::Ok => self.start_presentation().await,
            _ => self.advise("Presentation Stop", Value::Null).await,
        }
    }

    /// React to the active-call count rising above zero.
    ///
    /// With a stored dial string, the call list is fetched to check whether
    /// the first call's remote number contains the dialed number; a match
    /// means the operator's outbound call connected, so the conference-id
    /// prompt is shown and presentation starts. Without a dial string,
    /// presentation starts immediately. Nothing happens when the count
    /// returns to zero.
    async fn on_active_calls(&mut self, count: u32) {
        if !self.mode_enabled || count == 0 {
            return;
        }

        if self.dial_string.is_none() {
            self.start_presentation().await;
            return;
        }

        let calls = match self.gateway.call_list().await {
            Ok(calls) => calls,
            Err(e) => {
                tracing::warn!("Call list fetch failed: {}", e);
                return;
            }
        };

        // Other handlers may have run while the fetch was in flight
        if !self.mode_enabled {
            return;
        }
        let Some(dial_string) = &self.dial_string else {
            self.start_presentation().await;
            return;
        };

        let matched = calls
            .first()
            .is_some_and(|call| call.remote_number.contains(dial_string.as_str()));
        if matched {
            if let Err(e) = self
                .gateway
                .prompt_text_input(CONFERENCE_FEEDBACK_ID, CONFERENCE_PROMPT)
                .await
            {
                tracing::warn!("Conference-id prompt failed: {}", e);
            }
            self.start_presentation().await;
        }
    }

    async fn on_widget_action(&mut self, widget_id: &str, action: &str, value: &str) {
        match widget_id {
            TOGGLE_WIDGET_ID => self.set_mode(value == "on").await,
            ENTER_PHONE_WIDGET_ID if action == "clicked" => {
                if let Err(e) = self
                    .gateway
                    .prompt_text_input(DIAL_FEEDBACK_ID, DIAL_PROMPT)
                    .await
                {
                    tracing::warn!("Dial prompt failed: {}", e);
                }
            }
            DIAL_WIDGET_ID if action == "clicked" && self.dial_string.is_some() => {
                self.place_call().await;
            }
            _ => {}
        }
    }

    async fn on_text_input(&mut self, feedback_id: &str, text: String) {
        match feedback_id {
            DIAL_FEEDBACK_ID => {
                let label = format!("Current Dial-In Number: {}", text);
                self.dial_string = Some(text);
                if let Err(e) = self
                    .gateway
                    .set_widget_value(DIAL_DISPLAY_WIDGET_ID, &label)
                    .await
                {
                    tracing::warn!("Dial-in display update failed: {}", e);
                }
            }
            CONFERENCE_FEEDBACK_ID => {
                self.advise("Call DTMFSend", json!({ "DTMFString": text })).await;
                // operators need not type the terminator themselves
                if !text.ends_with(DTMF_TERMINATOR) {
                    self.advise(
                        "Call DTMFSend",
                        json!({ "DTMFString": DTMF_TERMINATOR.to_string() }),
                    )
                    .await;
                }
            }
            other => tracing::debug!("Ignoring text input for feedback id {}", other),
        }
    }

    /// Place an audio call to the stored dial string, unless a call is
    /// already in progress. Call placement is the one command whose silent
    /// loss matters, so it retries with backoff.
    async fn place_call(&self) {
        let Some(number) = self.dial_string.clone() else {
            return;
        };

        let count = match self.gateway.active_call_count().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Active-call count read failed: {}", e);
                return;
            }
        };
        if count != 0 {
            tracing::debug!("Dial skipped, {} call(s) already in progress", count);
            return;
        }

        for attempt in 1..=DIAL_ATTEMPTS {
            match self
                .gateway
                .issue_command("Dial", json!({ "Number": number, "CallType": "Audio" }))
                .await
            {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!("Dial attempt {} failed: {}", attempt, e);
                    if attempt < DIAL_ATTEMPTS {
                        tokio::time::sleep(DIAL_RETRY_DELAY * attempt).await;
                    }
                }
            }
        }
    }

    async fn start_presentation(&self) {
        self.advise("Presentation Start", json!({ "SendingMode": "LocalOnly" }))
            .await;
    }

    /// Reset the UI widgets to their initial state
    async fn init_ui(&self) {
        if let Err(e) = self.gateway.set_widget_value(TOGGLE_WIDGET_ID, "Off").await {
            tracing::warn!("Toggle reset failed: {}", e);
        }
        if let Err(e) = self
            .gateway
            .set_widget_value(DIAL_DISPLAY_WIDGET_ID, "Current Dial-in Number: NONE")
            .await
        {
            tracing::warn!("Dial-in display reset failed: {}", e);
        }
    }

    /// Advisory command: log and continue on failure
    async fn advise(&self, name: &str, params: Value) {
        if let Err(e) = self.gateway.issue_command(name, params).await {
            tracing::warn!("Command {} failed: {}", name, e);
        }
    }
}
