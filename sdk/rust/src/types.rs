use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::session::Session;

/// Result of a remote call: the payload plus the request id the service
/// assigned to it. Quote the request id when contacting support.
#[derive(Debug, Clone)]
pub struct OperationResult<T> {
    pub request_id: String,
    pub data: T,
}

/// Output from code or command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub output: String,
}

/// Outcome of a delete request.
///
/// The service may refuse a release without failing the HTTP call; that is
/// reported here with `success == false` rather than as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    pub success: bool,
    pub error_message: Option<String>,
}

/// Sessions returned by [`crate::AgentBay::list`] or
/// [`crate::AgentBay::list_by_labels`].
///
/// `request_id` is `None` for the local listing, which never contacts the
/// service.
#[derive(Debug, Clone)]
pub struct SessionList {
    pub sessions: Vec<Session>,
    pub request_id: Option<String>,
    pub next_token: Option<String>,
    pub total_count: Option<u32>,
}

/// Snapshot of a session's remote resource.
///
/// Apart from `session_id` and `resource_url`, which fields are filled in
/// depends on the sandbox type; the rest may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub resource_url: String,
    pub app_id: String,
    pub auth_code: String,
    pub connection_properties: String,
    pub resource_id: String,
    pub resource_type: String,
    pub ticket: String,
}

/// How [`crate::FileSystem::write_file`] treats an existing file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

/// Metadata returned by [`crate::FileSystem::get_file_info`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    pub is_directory: bool,
    pub modified: Option<String>,
    pub created: Option<String>,
    pub accessed: Option<String>,
    pub permissions: Option<String>,
}

/// One entry of [`crate::FileSystem::list_directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_directory: bool,
}

/// A single text replacement for [`crate::FileSystem::edit_file`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEdit {
    pub old_text: String,
    pub new_text: String,
}

impl FileEdit {
    pub fn new(old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self {
            old_text: old_text.into(),
            new_text: new_text.into(),
        }
    }
}

/// API response wrapper (internal).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ApiResponse<T> {
    pub request_id: Option<String>,
    pub success: bool,
    pub code: Option<String>,
    pub message: Option<String>,
    pub data: Option<T>,
    pub next_token: Option<String>,
    pub total_count: Option<u32>,
}

/// CreateMcpSession request body (internal).
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CreateSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_policy_id: Option<String>,
}

/// Data of a CreateMcpSession response (internal).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CreatedSession {
    pub session_id: String,
    #[serde(default)]
    pub resource_url: String,
}

/// Body for every call that only names a session (internal).
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SessionRequest<'a> {
    pub session_id: &'a str,
}

/// GetLink request body (internal).
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GetLinkRequest<'a> {
    pub session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct LinkData {
    pub url: String,
}

/// SetLabel request body (internal).
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SetLabelRequest<'a> {
    pub session_id: &'a str,
    pub labels: &'a HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct LabelData {
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// ListSession request body (internal).
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ListSessionRequest<'a> {
    pub labels: &'a HashMap<String, String>,
    pub max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ListedSession {
    pub session_id: String,
    #[serde(default)]
    pub resource_url: String,
}

/// Data of a GetMcpResource response (internal).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ResourceData {
    pub session_id: String,
    #[serde(default)]
    pub resource_url: String,
    pub desktop_info: Option<DesktopInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(crate) struct DesktopInfo {
    pub app_id: String,
    pub auth_code: String,
    pub connection_properties: String,
    pub resource_id: String,
    pub resource_type: String,
    pub ticket: String,
}

impl From<ResourceData> for SessionInfo {
    fn from(data: ResourceData) -> Self {
        let desktop = data.desktop_info.unwrap_or_default();
        Self {
            session_id: data.session_id,
            resource_url: data.resource_url,
            app_id: desktop.app_id,
            auth_code: desktop.auth_code,
            connection_properties: desktop.connection_properties,
            resource_id: desktop.resource_id,
            resource_type: desktop.resource_type,
            ticket: desktop.ticket,
        }
    }
}

/// CallMcpTool request body (internal).
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ToolCallRequest<'a> {
    pub session_id: &'a str,
    pub name: &'a str,
    pub args: serde_json::Value,
}

/// Data of a CallMcpTool response (internal).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ToolCallData {
    pub content: Vec<ToolContent>,
    pub is_error: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ToolContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl ToolCallData {
    /// Concatenated text of every `text` content item.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|c| c.kind == "text")
            .map(|c| c.text.as_str())
            .collect()
    }
}
