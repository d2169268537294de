use serde_json::json;
use std::time::Duration;

use crate::error::Result;
use crate::session::Session;
use crate::types::{OperationResult, RunOutput};

/// Default timeout for [`Command::execute_command`], in milliseconds.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 1000;

/// Runs shell commands inside a session.
pub struct Command<'a> {
    session: &'a Session,
}

impl<'a> Command<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Execute `command` through the session's shell.
    ///
    /// A non-zero exit or a timeout comes back as [`crate::Error::Tool`].
    pub async fn execute_command(
        &self,
        command: &str,
        timeout_ms: u64,
    ) -> Result<OperationResult<RunOutput>> {
        let inner = self.session.inner()?;
        let args = json!({
            "command": command,
            "timeout_ms": timeout_ms,
        });
        let result = inner
            .call_tool(
                self.session.session_id(),
                "shell",
                args,
                inner.tool_timeout(Duration::from_millis(timeout_ms)),
            )
            .await?;
        Ok(OperationResult {
            request_id: result.request_id,
            data: RunOutput {
                output: result.data,
            },
        })
    }
}
