use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON envelope every engine admin endpoint answers with.
///
/// `data`, `exc` and `exc_trace` are frequently absent on the wire
/// (non-engine action results carry only `result` and `message`), so they
/// default to null when missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineApiResult {
    pub result: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub exc: Option<String>,
    #[serde(default)]
    pub exc_trace: Option<String>,
}

impl EngineApiResult {
    pub fn is_ok(&self) -> bool {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_envelope() {
        let raw = r#"{
            "result": true,
            "message": "",
            "data": {"state": "SUSPENDED"},
            "exc": null,
            "exc_trace": null
        }"#;
        let envelope: EngineApiResult = serde_json::from_str(raw).unwrap();
        assert!(envelope.is_ok());
        assert_eq!(envelope.data["state"], "SUSPENDED");
    }

    #[test]
    fn decodes_envelope_without_optional_fields() {
        let raw = r#"{"result": false, "message": "no permission"}"#;
        let envelope: EngineApiResult = serde_json::from_str(raw).unwrap();
        assert!(!envelope.is_ok());
        assert_eq!(envelope.message, "no permission");
        assert!(envelope.data.is_null());
        assert!(envelope.exc.is_none());
    }
}
