use serde_json::Value;

/// Monitor role of a video output connector.
///
/// The device labels outputs by ordinal role rather than connector number.
/// The highest-numbered output is assumed to carry the USB capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputRole {
    Second,
    Third,
    Fourth,
}

impl OutputRole {
    /// Map a physical output count to the role of the highest-numbered output.
    ///
    /// Systems with fewer than three outputs (and anything unrecognized)
    /// fall back to `Second`.
    pub fn for_output_count(count: usize) -> Self {
        match count {
            3 => OutputRole::Third,
            4 => OutputRole::Fourth,
            _ => OutputRole::Second,
        }
    }

    /// The label used on the wire for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputRole::Second => "Second",
            OutputRole::Third => "Third",
            OutputRole::Fourth => "Fourth",
        }
    }
}

/// Signal state reported for a video input connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    /// A stable signal is present; the only state that starts presentation.
    Ok,
    Unknown,
    Unstable,
    Unsupported,
    NotFound,
    /// Any state string this library does not know about.
    Other,
}

impl SignalState {
    /// Parse the device's signal-state string.
    pub fn from_device(state: &str) -> Self {
        match state {
            "OK" => SignalState::Ok,
            "Unknown" => SignalState::Unknown,
            "Unstable" => SignalState::Unstable,
            "Unsupported" => SignalState::Unsupported,
            "NotFound" => SignalState::NotFound,
            _ => SignalState::Other,
        }
    }
}

/// Connector descriptor from a configuration read.
#[derive(Debug, Clone)]
pub struct ConnectorInfo {
    /// Connector identifier (1-based)
    pub id: u32,
    /// Input source type (e.g. "PC", "camera"); absent for outputs
    pub source_type: Option<String>,
}

impl ConnectorInfo {
    /// Parse a connector entry from a configuration list.
    ///
    /// Returns `None` when the entry has no usable identifier.
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        let id = value.get("id").and_then(as_u32)?;
        let source_type = value
            .get("InputSourceType")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self { id, source_type })
    }
}

/// A call entry from the device's call list.
#[derive(Debug, Clone)]
pub struct CallInfo {
    /// Remote party's number or URI
    pub remote_number: String,
    /// Call status (e.g. "Connected", "Dialling")
    pub status: Option<String>,
}

impl CallInfo {
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        let remote_number = value
            .get("RemoteNumber")
            .and_then(Value::as_str)?
            .to_string();
        let status = value
            .get("Status")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self {
            remote_number,
            status,
        })
    }
}

/// Connector topology resolved once at startup and immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    /// Input connector carrying the presentation (PC) source, if any
    pub presentation_input: Option<u32>,
    /// Role of the highest-numbered video output
    pub output_role: OutputRole,
}

/// The device is inconsistent about numbers: some paths report them as JSON
/// numbers, others as strings.
pub(crate) fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn output_role_follows_output_count() {
        assert_eq!(OutputRole::for_output_count(2), OutputRole::Second);
        assert_eq!(OutputRole::for_output_count(3), OutputRole::Third);
        assert_eq!(OutputRole::for_output_count(4), OutputRole::Fourth);
        // anything else falls back to Second
        assert_eq!(OutputRole::for_output_count(0), OutputRole::Second);
        assert_eq!(OutputRole::for_output_count(7), OutputRole::Second);
    }

    #[test]
    fn signal_state_parses_device_strings() {
        assert_eq!(SignalState::from_device("OK"), SignalState::Ok);
        assert_eq!(SignalState::from_device("Unstable"), SignalState::Unstable);
        assert_eq!(SignalState::from_device("Mystery"), SignalState::Other);
    }

    #[test]
    fn connector_info_accepts_numeric_and_string_ids() {
        let numeric = json!({ "id": 2, "InputSourceType": "PC" });
        let parsed = ConnectorInfo::from_value(&numeric).unwrap();
        assert_eq!(parsed.id, 2);
        assert_eq!(parsed.source_type.as_deref(), Some("PC"));

        let stringy = json!({ "id": "3" });
        let parsed = ConnectorInfo::from_value(&stringy).unwrap();
        assert_eq!(parsed.id, 3);
        assert!(parsed.source_type.is_none());

        assert!(ConnectorInfo::from_value(&json!({ "InputSourceType": "PC" })).is_none());
    }

    #[test]
    fn call_info_requires_remote_number() {
        let call = json!({ "RemoteNumber": "+12345", "Status": "Connected" });
        let parsed = CallInfo::from_value(&call).unwrap();
        assert_eq!(parsed.remote_number, "+12345");
        assert_eq!(parsed.status.as_deref(), Some("Connected"));

        assert!(CallInfo::from_value(&json!({ "Status": "Connected" })).is_none());
    }
}
