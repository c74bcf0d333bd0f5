use crate::gateway::DeviceGateway;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Shorter than the device's standby-timeout reset window, with margin.
const REFRESH_PERIOD: Duration = Duration::from_secs(29);

/// Recurring task that resets the device's standby timer while Universal
/// Join mode is enabled, so the unit never sleeps during webcam use.
///
/// At most one handle is alive at a time; the mode controller stops any
/// previous one before starting a new one.
pub(crate) struct KeepAlive {
    handle: JoinHandle<()>,
}

impl KeepAlive {
    /// Spawn the keep-alive task. The first reset fires one full period in.
    pub(crate) fn start<G: DeviceGateway + 'static>(gateway: Arc<G>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticks = interval(REFRESH_PERIOD);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // consume the immediate first tick
            ticks.tick().await;
            loop {
                ticks.tick().await;
                if let Err(e) = gateway
                    .issue_command("Standby ResetTimer", json!({ "Delay": 1 }))
                    .await
                {
                    tracing::warn!("Standby reset failed: {}", e);
                }
            }
        });

        Self { handle }
    }

    /// Stop the task; no further resets are issued once this returns.
    pub(crate) fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
