use crate::error::Result;
use crate::gateway::DeviceGateway;
use crate::types::{OutputRole, Topology};
use std::sync::Arc;

/// Resolve the connector topology from the device's configuration.
///
/// Runs once at startup: the presentation input is the first connector whose
/// source type is `PC`, and the capture output is assumed to be the
/// highest-numbered video output. The result is immutable; until it is
/// available, reactions that depend on it must no-op.
pub async fn resolve<G: DeviceGateway>(gateway: Arc<G>) -> Result<Topology> {
    let inputs = gateway.read_config("Video Input Connector").await?;
    let presentation_input = inputs
        .iter()
        .find(|c| c.source_type.as_deref() == Some("PC"))
        .map(|c| c.id);
    if presentation_input.is_none() {
        tracing::warn!("No PC input connector found; presentation will not auto-start");
    }

    let outputs = gateway.read_config("Video Output Connector").await?;
    let output_role = OutputRole::for_output_count(outputs.len());

    tracing::info!(
        presentation_input = ?presentation_input,
        output_role = output_role.as_str(),
        "Resolved connector topology"
    );

    Ok(Topology {
        presentation_input,
        output_role,
    })
}
