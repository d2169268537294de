use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::session::Session;
use crate::types::{OperationResult, RunOutput};

/// Default execution timeout for [`Code::run_code`], in seconds.
pub const DEFAULT_CODE_TIMEOUT_S: u64 = 300;

/// Languages the code runner accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    JavaScript,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::JavaScript),
            _ => Err(Error::Validation(format!(
                "Unsupported language: {s}. Supported languages are 'python' and 'javascript'"
            ))),
        }
    }
}

/// Runs source code inside a session.
pub struct Code<'a> {
    session: &'a Session,
}

impl<'a> Code<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Run `code` as `language` with the given timeout in seconds.
    ///
    /// The language is checked locally; an unsupported one fails with
    /// [`Error::Validation`] without contacting the service.
    pub async fn run_code(
        &self,
        code: &str,
        language: &str,
        timeout_s: u64,
    ) -> Result<OperationResult<RunOutput>> {
        let language: Language = language.parse()?;
        let inner = self.session.inner()?;
        let args = json!({
            "code": code,
            "language": language.as_str(),
            "timeout_s": timeout_s,
        });
        let result = inner
            .call_tool(
                self.session.session_id(),
                "run_code",
                args,
                inner.tool_timeout(Duration::from_secs(timeout_s)),
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
