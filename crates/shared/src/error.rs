use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnsupportedMethod(pub String);

#[derive(Debug, Clone, Error)]
#[error("unknown engine type: {0} (expected bamboo_engine or pipeline_engine)")]
pub struct UnknownEngineType(pub String);
