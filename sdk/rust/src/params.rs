use std::collections::HashMap;

/// Default page size for [`ListSessionParams`].
pub const DEFAULT_MAX_RESULTS: u32 = 10;

/// Parameters for [`crate::AgentBay::create`].
///
/// Every field is optional; the service picks defaults for what is left out.
#[derive(Debug, Clone, Default)]
pub struct CreateSessionParams {
    pub image_id: Option<String>,
    pub labels: Option<HashMap<String, String>>,
    pub policy_id: Option<String>,
}

impl CreateSessionParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Image to boot, e.g. `code_latest`, `linux_latest`, `browser_latest`.
    pub fn with_image_id(mut self, image_id: impl Into<String>) -> Self {
        self.image_id = Some(image_id.into());
        self
    }

    /// Labels to attach at creation. Validated before the request is sent.
    pub fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Tool policy to apply to the session.
    pub fn with_policy_id(mut self, policy_id: impl Into<String>) -> Self {
        self.policy_id = Some(policy_id.into());
        self
    }
}

/// Parameters for [`crate::AgentBay::list_by_labels`].
#[derive(Debug, Clone)]
pub struct ListSessionParams {
    pub labels: HashMap<String, String>,
    pub max_results: u32,
    pub next_token: Option<String>,
}

impl Default for ListSessionParams {
    fn default() -> Self {
        Self {
            labels: HashMap::new(),
            max_results: DEFAULT_MAX_RESULTS,
            next_token: None,
        }
    }
}

impl ListSessionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Continue from the `next_token` of a previous page.
    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }
}
