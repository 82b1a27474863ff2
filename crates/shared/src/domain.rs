use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{UnknownEngineType, UnsupportedMethod};

/// Engine implementations the admin API can target. The URL `version`
/// segment is drawn from this closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineType {
    BambooEngine,
    PipelineEngine,
}

impl EngineType {
    pub fn as_segment(&self) -> &'static str {
        match self {
            EngineType::BambooEngine => "bamboo_engine",
            EngineType::PipelineEngine => "pipeline_engine",
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_segment())
    }
}

impl FromStr for EngineType {
    type Err = UnknownEngineType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bamboo_engine" => Ok(EngineType::BambooEngine),
            "pipeline_engine" => Ok(EngineType::PipelineEngine),
            other => Err(UnknownEngineType(other.to_string())),
        }
    }
}

/// HTTP verbs the dispatch client supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl ActionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionMethod::Get => "get",
            ActionMethod::Post => "post",
            ActionMethod::Put => "put",
            ActionMethod::Delete => "delete",
            ActionMethod::Patch => "patch",
        }
    }

    /// Verbs that carry the payload as a JSON body; the rest send it as
    /// the query string.
    pub fn sends_body(&self) -> bool {
        matches!(
            self,
            ActionMethod::Post | ActionMethod::Put | ActionMethod::Patch
        )
    }
}

impl fmt::Display for ActionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(ActionMethod::Get),
            "post" => Ok(ActionMethod::Post),
            "put" => Ok(ActionMethod::Put),
            "delete" => Ok(ActionMethod::Delete),
            "patch" => Ok(ActionMethod::Patch),
            other => Err(UnsupportedMethod(other.to_string())),
        }
    }
}

/// Administration actions exposed by the engine admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    TaskPause,
    TaskResume,
    TaskRevoke,
    NodeRetry,
    NodeSkip,
    NodeCallback,
    NodeSkipExg,
    NodeSkipCpg,
    NodeForcedFail,
}

impl ActionKind {
    pub fn as_segment(&self) -> &'static str {
        match self {
            ActionKind::TaskPause => "task_pause",
            ActionKind::TaskResume => "task_resume",
            ActionKind::TaskRevoke => "task_revoke",
            ActionKind::NodeRetry => "node_retry",
            ActionKind::NodeSkip => "node_skip",
            ActionKind::NodeCallback => "node_callback",
            ActionKind::NodeSkipExg => "node_skip_exg",
            ActionKind::NodeSkipCpg => "node_skip_cpg",
            ActionKind::NodeForcedFail => "node_forced_fail",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_segment())
    }
}

/// One dispatchable request against the admin API. Lives only for the
/// duration of a single call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub version: String,
    pub action_name: String,
    pub method: ActionMethod,
    pub path_id: String,
    #[serde(default)]
    pub query: Map<String, Value>,
}

impl ActionRequest {
    pub fn new(
        version: impl Into<String>,
        action_name: impl Into<String>,
        method: ActionMethod,
        path_id: impl Into<String>,
        query: Map<String, Value>,
    ) -> Self {
        Self {
            version: version.into(),
            action_name: action_name.into(),
            method,
            path_id: path_id.into(),
            query,
        }
    }

    /// Path relative to the base URL, always with the trailing slash the
    /// admin API routes require.
    pub fn relative_path(&self) -> String {
        format!(
            "api/v1/{}/{}/{}/",
            self.version, self.action_name, self.path_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_matches_admin_route_shape() {
        let request = ActionRequest::new(
            "bamboo_engine",
            "task_pause",
            ActionMethod::Post,
            "abc123",
            Map::new(),
        );
        assert_eq!(request.relative_path(), "api/v1/bamboo_engine/task_pause/abc123/");
    }

    #[test]
    fn engine_type_round_trips_through_segment() {
        for engine in [EngineType::BambooEngine, EngineType::PipelineEngine] {
            assert_eq!(engine.as_segment().parse::<EngineType>().unwrap(), engine);
        }
    }

    #[test]
    fn unknown_engine_type_is_rejected() {
        let err = "celery_engine".parse::<EngineType>().unwrap_err();
        assert!(err.to_string().contains("celery_engine"));
    }

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!("POST".parse::<ActionMethod>().unwrap(), ActionMethod::Post);
        assert_eq!("get".parse::<ActionMethod>().unwrap(), ActionMethod::Get);
    }

    #[test]
    fn unsupported_method_is_rejected() {
        assert!("brew".parse::<ActionMethod>().is_err());
    }

    #[test]
    fn only_body_verbs_send_a_body() {
        assert!(ActionMethod::Post.sends_body());
        assert!(ActionMethod::Put.sends_body());
        assert!(ActionMethod::Patch.sends_body());
        assert!(!ActionMethod::Get.sends_body());
        assert!(!ActionMethod::Delete.sends_body());
    }
}
