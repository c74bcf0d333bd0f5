use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// JSON-RPC request sent to the device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub id: Uuid,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Any message arriving from the device: a response to a pending request
/// (carries `id`) or a feedback notification (carries `method`).
#[derive(Debug, Clone, Deserialize)]
pub struct Incoming {
    pub id: Option<Uuid>,
    pub method: Option<String>,
    pub params: Option<Value>,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

const FEEDBACK_METHOD: &str = "xFeedback/Event";

impl Request {
    fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Uuid::new_v4(),
            method: method.into(),
            params,
        }
    }

    /// Build an `xCommand` request from a space-separated command name,
    /// e.g. `"Video Selfview Set"` becomes `xCommand/Video/Selfview/Set`.
    pub fn command(name: &str, params: Value) -> Self {
        let method = format!("xCommand/{}", name.split_whitespace().collect::<Vec<_>>().join("/"));
        let params = match params {
            Value::Null => None,
            other => Some(other),
        };
        Self::new(method, params)
    }

    /// Build an `xGet` request for a space-separated document path,
    /// e.g. `"Configuration Video Input Connector"`.
    pub fn get(path: &str) -> Self {
        let segments: Vec<Value> = path.split_whitespace().map(|s| json!(s)).collect();
        Self::new("xGet", Some(json!({ "Path": segments })))
    }

    /// Build an `xFeedback/Subscribe` request for a space-separated query
    /// path, e.g. `"Status Video Selfview Mode"`.
    pub fn feedback_subscribe(query: &str) -> Self {
        let segments: Vec<Value> = query.split_whitespace().map(|s| json!(s)).collect();
        Self::new("xFeedback/Subscribe", Some(json!({ "Query": segments })))
    }
}

impl Incoming {
    /// Whether this message is a feedback notification rather than a response
    pub fn is_feedback(&self) -> bool {
        self.id.is_none() && self.method.as_deref() == Some(FEEDBACK_METHOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_request_shapes_method_and_params() {
        let request = Request::command("Video Selfview Set", json!({ "Mode": "On" }));
        assert_eq!(request.jsonrpc, "2.0");
        assert_eq!(request.method, "xCommand/Video/Selfview/Set");
        assert_eq!(request.params, Some(json!({ "Mode": "On" })));

        let serialized = serde_json::to_value(&request).unwrap();
        assert!(serialized.get("id").unwrap().is_string());
    }

    #[test]
    fn command_with_null_params_omits_params() {
        let request = Request::command("Presentation Stop", Value::Null);
        assert_eq!(request.method, "xCommand/Presentation/Stop");
        assert!(request.params.is_none());

        let serialized = serde_json::to_string(&request).unwrap();
        assert!(!serialized.contains("params"));
    }

    #[test]
    fn get_request_splits_path() {
        let request = Request::get("Status SystemUnit State NumberOfActiveCalls");
        assert_eq!(request.method, "xGet");
        assert_eq!(
            request.params,
            Some(json!({ "Path": ["Status", "SystemUnit", "State", "NumberOfActiveCalls"] }))
        );
    }

    #[test]
    fn feedback_detection() {
        let notification: Incoming = serde_json::from_str(
            r#"{"jsonrpc":"2.0","method":"xFeedback/Event","params":{"Status":{}}}"#,
        )
        .unwrap();
        assert!(notification.is_feedback());

        let response: Incoming = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":"7f2c1a80-df2d-4dcb-8cdd-4133ec51e3b5","result":true}"#,
        )
        .unwrap();
        assert!(!response.is_feedback());
    }
}
