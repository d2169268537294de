use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{error_from_status, Error, Result};
use crate::labels::validate_labels;
use crate::params::{CreateSessionParams, ListSessionParams};
use crate::session::Session;
use crate::types::*;

const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_ENDPOINT: &str = "https://wuyingai.cn-shanghai.aliyuncs.com";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;
const REQUEST_ID_HEADER: &str = "x-acs-request-id";

/// Slack added on top of a tool's own timeout when it outlives the client timeout.
const TOOL_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Builder for constructing an [`AgentBay`] client.
pub struct AgentBayBuilder {
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl AgentBayBuilder {
    /// Set the service endpoint.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the default request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client.
    ///
    /// Fails with [`Error::Auth`] when no API key is available and with
    /// [`Error::Config`] when the endpoint is not an http(s) URL.
    pub fn build(self) -> Result<AgentBay> {
        let api_key = self
            .api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::Auth(
                    "API key is required. Pass it to the builder or set AGENTBAY_API_KEY"
                        .to_string(),
                )
            })?;

        let endpoint = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint {:?}: {e}", self.endpoint)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "endpoint must use http or https, got {:?}",
                endpoint.scheme()
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("agentbay-rust-sdk/{SDK_VERSION}"))
                .map_err(|e| Error::Config(e.to_string()))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| Error::Auth(e.to_string()))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()?;

        Ok(AgentBay {
            inner: Arc::new(ClientInner {
                api_key,
                base_url: self.endpoint.trim_end_matches('/').to_string(),
                timeout: self.timeout,
                http,
                sessions: Mutex::new(HashMap::new()),
            }),
        })
    }
}

/// Client for the AgentBay API.
///
/// Cheap to clone; clones share the HTTP connection pool and the local
/// session registry.
///
/// # Example
/// ```no_run
/// # async fn example() -> agentbay_sdk::Result<()> {
/// use agentbay_sdk::{AgentBay, CreateSessionParams};
///
/// let client = AgentBay::builder().api_key("akm-xxx").build()?;
/// let created = client
///     .create(CreateSessionParams::new().with_image_id("code_latest"))
///     .await?;
/// let session = created.data;
/// let out = session.command().execute_command("echo hi", 5000).await?;
/// println!("{}", out.data.output);
/// session.delete().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AgentBay {
    inner: Arc<ClientInner>,
}

impl AgentBay {
    /// Create a new builder with defaults resolved from env vars.
    pub fn builder() -> AgentBayBuilder {
        AgentBayBuilder {
            endpoint: std::env::var("AGENTBAY_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            api_key: std::env::var("AGENTBAY_API_KEY").ok(),
            timeout: Duration::from_millis(
                std::env::var("AGENTBAY_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_MS),
            ),
        }
    }

    /// Shorthand for `AgentBay::builder().api_key(key).build()`.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    pub(crate) fn from_inner(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// The API key this client authenticates with.
    pub fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    /// Whether two handles refer to the same client.
    pub fn ptr_eq(&self, other: &AgentBay) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Create a new session.
    ///
    /// Labels, when given, are validated first; invalid labels fail with
    /// [`Error::InvalidLabels`] and nothing is sent.
    pub async fn create(&self, params: CreateSessionParams) -> Result<OperationResult<Session>> {
        if let Some(labels) = params.labels.as_ref() {
            validate_labels(Some(labels))?;
        }

        let body = CreateSessionRequest {
            image_id: params.image_id,
            labels: params.labels,
            mcp_policy_id: params.policy_id,
        };
        let created: OperationResult<CreatedSession> =
            self.inner.call("CreateMcpSession", &body, None).await?;

        let session = Session::new(
            created.data.session_id,
            created.data.resource_url,
            &self.inner,
        );
        self.inner.register(&session);
        tracing::info!(
            session_id = session.session_id(),
            request_id = %created.request_id,
            "session created"
        );

        Ok(OperationResult {
            request_id: created.request_id,
            data: session,
        })
    }

    /// Release a session on the service.
    pub async fn delete(&self, session: &Session) -> Result<OperationResult<DeleteResult>> {
        self.inner.delete_session(session.session_id()).await
    }

    /// Sessions created or listed through this client that have not been
    /// deleted through it.
    ///
    /// This is a local view: it does not contact the service and therefore
    /// carries no request id.
    pub fn list(&self) -> SessionList {
        let mut sessions: Vec<Session> = self.inner.registry().values().cloned().collect();
        sessions.sort_by(|a, b| a.session_id().cmp(b.session_id()));
        let total = u32::try_from(sessions.len()).unwrap_or(u32::MAX);
        SessionList {
            sessions,
            request_id: None,
            next_token: None,
            total_count: Some(total),
        }
    }

    /// List sessions on the service whose labels match every label in
    /// `params.labels`. Returned sessions join the local registry.
    pub async fn list_by_labels(&self, params: ListSessionParams) -> Result<SessionList> {
        let body = ListSessionRequest {
            labels: &params.labels,
            max_results: params.max_results,
            next_token: params.next_token.as_deref(),
        };
        let reply = self
            .inner
            .send::<Vec<ListedSession>>("ListSession", &body, None)
            .await?;
        let request_id = reply.require_success("ListSession")?;

        let sessions: Vec<Session> = reply
            .response
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|s| Session::new(s.session_id, s.resource_url, &self.inner))
            .collect();
        for session in &sessions {
            self.inner.register(session);
        }

        Ok(SessionList {
            sessions,
            request_id: Some(request_id),
            next_token: reply.response.next_token.filter(|t| !t.is_empty()),
            total_count: reply.response.total_count,
        })
    }

    /// Build a handle for a session that already exists on the service.
    ///
    /// No request is made; the first call on the handle fails if the id is
    /// unknown to the service.
    pub fn attach(&self, session_id: impl Into<String>) -> Session {
        Session::new(session_id.into(), String::new(), &self.inner)
    }

    /// Create a session, hand it to `f`, and always delete it afterwards.
    ///
    /// The closure's result is returned; a failed cleanup is logged, not
    /// returned.
    pub async fn with_session<F, Fut, T>(&self, params: CreateSessionParams, f: F) -> Result<T>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let session = self.create(params).await?.data;
        let result = f(session.clone()).await;
        // Always clean up
        match self.delete(&session).await {
            Ok(deleted) if !deleted.data.success => tracing::warn!(
                session_id = session.session_id(),
                request_id = %deleted.request_id,
                "session cleanup refused by service"
            ),
            Err(e) => tracing::warn!(
                session_id = session.session_id(),
                error = %e,
                "session cleanup failed"
            ),
            Ok(_) => {}
        }
        result
    }
}

/// State shared by an [`AgentBay`] and, weakly, by every [`Session`] it hands out.
pub(crate) struct ClientInner {
    pub(crate) api_key: String,
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
    sessions: Mutex<HashMap<String, Session>>,
}

/// Parsed response envelope plus the request id found in the body or header.
pub(crate) struct Reply<T> {
    request_id: Option<String>,
    pub(crate) response: ApiResponse<T>,
}

impl<T> Reply<T> {
    /// Turn a `Success: false` envelope into [`Error::Api`] and return the
    /// request id of a successful one.
    pub(crate) fn require_success(&self, action: &str) -> Result<String> {
        if !self.response.success {
            return Err(Error::Api {
                code: self.response.code.clone().unwrap_or_default(),
                message: self
                    .response
                    .message
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string()),
                request_id: self.request_id.clone().unwrap_or_default(),
            });
        }
        self.request_id
            .clone()
            .ok_or_else(|| Error::MissingRequestId(action.to_string()))
    }
}

impl ClientInner {
    pub(crate) fn registry(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn register(&self, session: &Session) {
        self.registry()
            .insert(session.session_id().to_string(), session.clone());
    }

    /// HTTP timeout for a tool call that may itself run for `tool_timeout`.
    pub(crate) fn tool_timeout(&self, tool_timeout: Duration) -> Option<Duration> {
        let needed = tool_timeout.saturating_add(TOOL_TIMEOUT_MARGIN);
        (needed > self.timeout).then_some(needed)
    }

    pub(crate) async fn delete_session(
        &self,
        session_id: &str,
    ) -> Result<OperationResult<DeleteResult>> {
        let reply = self
            .send::<serde_json::Value>(
                "ReleaseMcpSession",
                &SessionRequest { session_id },
                None,
            )
            .await?;

        if !reply.response.success {
            let request_id = reply.request_id.unwrap_or_default();
            let message = reply
                .response
                .message
                .unwrap_or_else(|| "Unknown error".to_string());
            tracing::warn!(session_id, request_id = %request_id, %message, "session release refused");
            return Ok(OperationResult {
                request_id,
                data: DeleteResult {
                    success: false,
                    error_message: Some(message),
                },
            });
        }

        // Released on the service side, so forget it even if the id is missing.
        self.registry().remove(session_id);
        let request_id = reply.require_success("ReleaseMcpSession")?;
        tracing::info!(session_id, request_id = %request_id, "session deleted");

        Ok(OperationResult {
            request_id,
            data: DeleteResult {
                success: true,
                error_message: None,
            },
        })
    }

    /// Call `action` and require a successful envelope with a `Data` field.
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        body: &(impl Serialize + ?Sized),
        timeout: Option<Duration>,
    ) -> Result<OperationResult<T>> {
        let reply = self.send::<T>(action, body, timeout).await?;
        let request_id = reply.require_success(action)?;
        let data = reply
            .response
            .data
            .ok_or_else(|| Error::Server(format!("{action}: missing Data field")))?;
        Ok(OperationResult { request_id, data })
    }

    /// Call `action` where the service returns no payload worth keeping.
    pub(crate) async fn call_unit(
        &self,
        action: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<OperationResult<()>> {
        let reply = self.send::<serde_json::Value>(action, body, None).await?;
        let request_id = reply.require_success(action)?;
        Ok(OperationResult {
            request_id,
            data: (),
        })
    }

    /// Run a tool inside a session and return its text output.
    pub(crate) async fn call_tool(
        &self,
        session_id: &str,
        name: &str,
        args: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<OperationResult<String>> {
        let body = ToolCallRequest {
            session_id,
            name,
            args,
        };
        let result: OperationResult<ToolCallData> =
            self.call("CallMcpTool", &body, timeout).await?;

        let text = result.data.text();
        if result.data.is_error {
            tracing::warn!(session_id, tool = name, request_id = %result.request_id, "tool reported an error");
            return Err(Error::Tool {
                message: text,
                request_id: result.request_id,
            });
        }
        Ok(OperationResult {
            request_id: result.request_id,
            data: text,
        })
    }

    // -- Internal --

    async fn send<T: DeserializeOwned>(
        &self,
        action: &str,
        body: &(impl Serialize + ?Sized),
        timeout: Option<Duration>,
    ) -> Result<Reply<T>> {
        let url = format!("{}/{action}", self.base_url);
        let mut req = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let header_request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let text = response.text().await?;

        if status >= 400 {
            tracing::debug!(action, status, request_id = ?header_request_id, "request failed");
            return Err(error_from_status(status, &text));
        }

        let response: ApiResponse<T> = serde_json::from_str(&text)?;
        let request_id = response
            .request_id
            .clone()
            .filter(|id| !id.is_empty())
            .or(header_request_id)
            .filter(|id| !id.is_empty());
        tracing::debug!(action, status, request_id = ?request_id, success = response.success, "request completed");

        Ok(Reply {
            request_id,
            response,
        })
    }
}
