use std::{ops::RangeInclusive, sync::Arc};

use reqwest::{
    cookie::{CookieStore, Jar},
    header::{HeaderMap, HeaderValue},
    Client, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shared::{
    domain::{ActionKind, ActionMethod, ActionRequest, EngineType},
    protocol::EngineApiResult,
};
use tracing::{debug, info, warn};
use url::Url;

pub mod config;
pub mod error;

pub use config::{load_settings, Settings};
pub use error::DispatchError;

/// Cookie the panel server issues its CSRF token under.
pub const CSRF_COOKIE_NAME: &str = "bk_sops_csrftoken";
/// Header the token is mirrored into on every request.
pub const CSRF_HEADER_NAME: &str = "X-CSRFToken";
/// Statuses delivered to the caller as a normal result. Non-2xx codes in
/// this range are not transport errors; interpreting them is the caller's
/// job.
pub const ACCEPTED_STATUS: RangeInclusive<u16> = 200..=505;

/// Seam for status-specific response handling. Called with every accepted
/// response before it is returned; transport errors never reach the hook.
pub trait ResponseHook: Send + Sync {
    fn on_response(&self, response: &ActionResponse);
}

/// Default hook: passes every response through unchanged. Unauthorized
/// responses only leave a trace line; session handling hangs off the
/// caller.
pub struct PassthroughHook;

impl ResponseHook for PassthroughHook {
    fn on_response(&self, response: &ActionResponse) {
        if response.status == StatusCode::UNAUTHORIZED {
            debug!("unauthorized response passed through to caller");
        }
    }
}

/// Raw result of one dispatched action: the HTTP status and the untouched
/// body bytes.
#[derive(Debug, Clone)]
pub struct ActionResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ActionResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DispatchError> {
        serde_json::from_slice(&self.body).map_err(DispatchError::Decode)
    }

    /// Decodes the engine admin envelope out of the body.
    pub fn api_result(&self) -> Result<EngineApiResult, DispatchError> {
        self.json()
    }
}

/// HTTP client for the engine admin API.
///
/// Explicitly constructed and injected; read-only after construction, so a
/// single instance serves arbitrarily many concurrent callers. Every call
/// is a fresh request: no retries, no caching, no timeout beyond the
/// transport defaults.
pub struct PanelClient {
    http: Client,
    base_url: Url,
    cookies: Arc<Jar>,
    hook: Arc<dyn ResponseHook>,
}

impl PanelClient {
    pub fn new(settings: &Settings) -> Result<Self, DispatchError> {
        Self::with_hook(settings, Arc::new(PassthroughHook))
    }

    pub fn with_hook(
        settings: &Settings,
        hook: Arc<dyn ResponseHook>,
    ) -> Result<Self, DispatchError> {
        let base_url = Url::parse(&config::normalize_base_url(&settings.base_url))?;

        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        let cookies = Arc::new(Jar::default());
        if let Some(token) = &settings.csrf_token {
            cookies.add_cookie_str(&format!("{CSRF_COOKIE_NAME}={token}"), &base_url);
        }

        let http = Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::clone(&cookies))
            .build()?;

        Ok(Self {
            http,
            base_url,
            cookies,
            hook,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Current CSRF token, read back from the jar so a token the server set
    /// via Set-Cookie wins over the seeded one.
    fn csrf_token(&self) -> Option<String> {
        let header = self.cookies.cookies(&self.base_url)?;
        let raw = header.to_str().ok()?;
        raw.split("; ").find_map(|pair| {
            pair.strip_prefix(CSRF_COOKIE_NAME)?
                .strip_prefix('=')
                .map(str::to_string)
        })
    }

    /// Issues one action request against
    /// `{base}api/v1/{version}/{action_name}/{path_id}/`.
    ///
    /// Resolves for every status in [`ACCEPTED_STATUS`], carrying that
    /// status and the raw body; fails only on transport errors or a status
    /// outside the accepted range.
    pub async fn dispatch(&self, request: &ActionRequest) -> Result<ActionResponse, DispatchError> {
        let url = self.base_url.join(&request.relative_path())?;
        info!(method = request.method.as_str(), url = %url, "dispatching engine admin action");

        let mut builder = match request.method {
            ActionMethod::Get => self
                .http
                .get(url.clone())
                .query(&query_pairs(&request.query)),
            ActionMethod::Delete => self
                .http
                .delete(url.clone())
                .query(&query_pairs(&request.query)),
            ActionMethod::Post => self.http.post(url.clone()).json(&request.query),
            ActionMethod::Put => self.http.put(url.clone()).json(&request.query),
            ActionMethod::Patch => self.http.patch(url.clone()).json(&request.query),
        };

        if let Some(token) = self.csrf_token() {
            builder = builder.header(CSRF_HEADER_NAME, token);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !ACCEPTED_STATUS.contains(&status.as_u16()) {
            warn!(%status, %url, "status outside accepted range");
            return Err(DispatchError::StatusOutsideAcceptedRange(status));
        }

        let body = response.bytes().await?.to_vec();
        let response = ActionResponse { status, body };
        self.hook.on_response(&response);
        Ok(response)
    }

    pub async fn task_pause(
        &self,
        engine: EngineType,
        instance_id: &str,
    ) -> Result<EngineApiResult, DispatchError> {
        self.run_action(engine, ActionKind::TaskPause, instance_id, Map::new())
            .await
    }

    pub async fn task_resume(
        &self,
        engine: EngineType,
        instance_id: &str,
    ) -> Result<EngineApiResult, DispatchError> {
        self.run_action(engine, ActionKind::TaskResume, instance_id, Map::new())
            .await
    }

    pub async fn task_revoke(
        &self,
        engine: EngineType,
        instance_id: &str,
    ) -> Result<EngineApiResult, DispatchError> {
        self.run_action(engine, ActionKind::TaskRevoke, instance_id, Map::new())
            .await
    }

    pub async fn node_retry(
        &self,
        engine: EngineType,
        node_id: &str,
        inputs: Option<Value>,
    ) -> Result<EngineApiResult, DispatchError> {
        let mut body = Map::new();
        body.insert("inputs".into(), inputs.unwrap_or(Value::Null));
        self.run_action(engine, ActionKind::NodeRetry, node_id, body)
            .await
    }

    pub async fn node_skip(
        &self,
        engine: EngineType,
        node_id: &str,
    ) -> Result<EngineApiResult, DispatchError> {
        self.run_action(engine, ActionKind::NodeSkip, node_id, Map::new())
            .await
    }

    /// Delivers callback data to a waiting node. Without an explicit state
    /// `version` the server resolves the node's current one.
    pub async fn node_callback(
        &self,
        engine: EngineType,
        node_id: &str,
        data: Option<Value>,
        version: Option<String>,
    ) -> Result<EngineApiResult, DispatchError> {
        let mut body = Map::new();
        body.insert("data".into(), data.unwrap_or(Value::Null));
        body.insert(
            "version".into(),
            version.map(Value::String).unwrap_or(Value::Null),
        );
        self.run_action(engine, ActionKind::NodeCallback, node_id, body)
            .await
    }

    pub async fn node_skip_exg(
        &self,
        engine: EngineType,
        node_id: &str,
        flow_id: &str,
    ) -> Result<EngineApiResult, DispatchError> {
        let mut body = Map::new();
        body.insert("flow_id".into(), Value::String(flow_id.to_string()));
        self.run_action(engine, ActionKind::NodeSkipExg, node_id, body)
            .await
    }

    pub async fn node_skip_cpg(
        &self,
        engine: EngineType,
        node_id: &str,
        converge_gateway_id: &str,
        flow_ids: &[String],
    ) -> Result<EngineApiResult, DispatchError> {
        let mut body = Map::new();
        body.insert(
            "converge_gateway_id".into(),
            Value::String(converge_gateway_id.to_string()),
        );
        body.insert(
            "flow_ids".into(),
            Value::Array(flow_ids.iter().cloned().map(Value::String).collect()),
        );
        self.run_action(engine, ActionKind::NodeSkipCpg, node_id, body)
            .await
    }

    pub async fn node_forced_fail(
        &self,
        engine: EngineType,
        node_id: &str,
    ) -> Result<EngineApiResult, DispatchError> {
        self.run_action(engine, ActionKind::NodeForcedFail, node_id, Map::new())
            .await
    }

    async fn run_action(
        &self,
        engine: EngineType,
        kind: ActionKind,
        instance_id: &str,
        query: Map<String, Value>,
    ) -> Result<EngineApiResult, DispatchError> {
        let request = ActionRequest::new(
            engine.as_segment(),
            kind.as_segment(),
            ActionMethod::Post,
            instance_id,
            query,
        );
        let response = self.dispatch(&request).await?;
        response.api_result()
    }
}

/// Flattens the payload map into query pairs for bodiless verbs. Nested
/// values are rendered as their JSON text so nothing is silently dropped.
fn query_pairs(query: &Map<String, Value>) -> Vec<(String, String)> {
    query
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), rendered)
        })
        .collect()
}
