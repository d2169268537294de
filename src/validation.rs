//! Validation of command-line inputs before they reach the SDK.

use anyhow::{Result, bail};
use std::collections::HashMap;

/// Maximum length for session ids
const MAX_SESSION_ID_LEN: usize = 128;

/// Validate a session id given on the command line.
///
/// Session ids assigned by the service contain only ASCII letters, digits,
/// hyphens and underscores.
pub fn validate_session_id(id: &str) -> Result<()> {
    if id.is_empty() {
        bail!("Session id cannot be empty");
    }

    if id.len() > MAX_SESSION_ID_LEN {
        bail!("Session id too long (max {} characters)", MAX_SESSION_ID_LEN);
    }

    if let Some(ch) = id
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
    {
        bail!(
            "Session id contains invalid character '{}'. Only letters, numbers, hyphens, and underscores are allowed",
            ch
        );
    }

    Ok(())
}

/// Parse a `KEY=VALUE` label argument.
///
/// Only the shape is checked here; emptiness rules are enforced by the SDK
/// so the messages match what library users see.
pub fn parse_label(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => bail!("Invalid label '{}': expected KEY=VALUE", arg),
    }
}

/// Collect parsed label arguments; a repeated key keeps its last value.
pub fn labels_from_args(args: Vec<(String, String)>) -> HashMap<String, String> {
    args.into_iter().collect()
}
