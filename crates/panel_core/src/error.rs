use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    /// Transport-level failure (connect, DNS, aborted request), forwarded
    /// unchanged from the HTTP stack.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    /// The server answered, but with a status the panel contract does not
    /// deliver to callers. Statuses inside [200, 505] never take this path.
    #[error("http status {0} outside accepted range [200, 505]")]
    StatusOutsideAcceptedRange(StatusCode),
    #[error("failed to decode engine api response: {0}")]
    Decode(#[from] serde_json::Error),
}
