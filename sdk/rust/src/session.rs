use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::client::{AgentBay, ClientInner};
use crate::code::Code;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::filesystem::FileSystem;
use crate::labels::{validate_labels, LabelError};
use crate::types::*;

/// Handle to one remote sandbox session.
///
/// Holds only a weak reference to the [`AgentBay`] that created it: the
/// client must outlive its sessions, and calls made after the client is
/// dropped fail with [`Error::ClientDropped`]. Deleting the session on the
/// service does not invalidate the handle locally.
#[derive(Clone)]
pub struct Session {
    session_id: String,
    resource_url: String,
    api_key: String,
    client: Weak<ClientInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("resource_url", &self.resource_url)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(session_id: String, resource_url: String, client: &Arc<ClientInner>) -> Self {
        Self {
            session_id,
            resource_url,
            api_key: client.api_key.clone(),
            client: Arc::downgrade(client),
        }
    }

    /// The id the service assigned to this session.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Resource URL returned at creation. Empty for attached handles.
    pub fn resource_url(&self) -> &str {
        &self.resource_url
    }

    /// API key of the owning client.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The owning client, if it is still alive.
    pub fn client(&self) -> Result<AgentBay> {
        self.inner().map(AgentBay::from_inner)
    }

    pub(crate) fn inner(&self) -> Result<Arc<ClientInner>> {
        self.client.upgrade().ok_or(Error::ClientDropped)
    }

    /// Code execution in this session.
    pub fn code(&self) -> Code<'_> {
        Code::new(self)
    }

    /// Shell command execution in this session.
    pub fn command(&self) -> Command<'_> {
        Command::new(self)
    }

    /// File access in this session.
    pub fn file_system(&self) -> FileSystem<'_> {
        FileSystem::new(self)
    }

    /// Check a label map without sending it. See [`crate::validate_labels`].
    pub fn validate_labels(
        &self,
        labels: Option<&HashMap<String, String>>,
    ) -> std::result::Result<(), LabelError> {
        validate_labels(labels)
    }

    /// Release this session on the service.
    pub async fn delete(&self) -> Result<OperationResult<DeleteResult>> {
        self.inner()?.delete_session(&self.session_id).await
    }

    /// Fetch a snapshot of the session's remote resource.
    pub async fn info(&self) -> Result<OperationResult<SessionInfo>> {
        let result: OperationResult<ResourceData> = self
            .inner()?
            .call(
                "GetMcpResource",
                &SessionRequest {
                    session_id: &self.session_id,
                },
                None,
            )
            .await?;
        Ok(OperationResult {
            request_id: result.request_id,
            data: result.data.into(),
        })
    }

    /// Get an access link for the session.
    ///
    /// `None` for either argument lets the service choose its default.
    pub async fn get_link(
        &self,
        protocol_type: Option<&str>,
        port: Option<u16>,
    ) -> Result<OperationResult<String>> {
        let body = GetLinkRequest {
            session_id: &self.session_id,
            protocol_type,
            port,
        };
        let result: OperationResult<LinkData> = self.inner()?.call("GetLink", &body, None).await?;
        Ok(OperationResult {
            request_id: result.request_id,
            data: result.data.url,
        })
    }

    /// Replace the session's labels. Invalid labels are rejected before
    /// anything is sent.
    pub async fn set_labels(&self, labels: &HashMap<String, String>) -> Result<OperationResult<()>> {
        validate_labels(Some(labels))?;
        let body = SetLabelRequest {
            session_id: &self.session_id,
            labels,
        };
        self.inner()?.call_unit("SetLabel", &body).await
    }

    /// Current labels of the session.
    pub async fn get_labels(&self) -> Result<OperationResult<HashMap<String, String>>> {
        let result: OperationResult<LabelData> = self
            .inner()?
            .call(
                "GetLabel",
                &SessionRequest {
                    session_id: &self.session_id,
                },
                None,
            )
            .await?;
        Ok(OperationResult {
            request_id: result.request_id,
            data: result.data.labels,
        })
    }
}
