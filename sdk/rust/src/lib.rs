//! # agentbay-sdk
//!
//! Rust SDK for AgentBay: create remote sandbox sessions and run code, shell
//! commands and file operations inside them.
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn example() -> agentbay_sdk::Result<()> {
//! use agentbay_sdk::{AgentBay, CreateSessionParams};
//!
//! let client = AgentBay::builder().build()?;
//! let session = client
//!     .create(CreateSessionParams::new().with_image_id("code_latest"))
//!     .await?
//!     .data;
//! let result = session.code().run_code("print(1 + 1)", "python", 60).await?;
//! println!("{} (request {})", result.data.output, result.request_id);
//! session.delete().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Every remote call returns an [`OperationResult`] carrying the service's
//! request id. [`AgentBay::list`] is the exception: it reads the local
//! session registry and has no request id.

mod client;
mod code;
mod command;
mod error;
mod filesystem;
mod labels;
mod params;
mod session;
mod types;

pub use client::{AgentBay, AgentBayBuilder};
pub use code::{Code, Language, DEFAULT_CODE_TIMEOUT_S};
pub use command::{Command, DEFAULT_COMMAND_TIMEOUT_MS};
pub use error::{Error, Result};
pub use filesystem::{FileSystem, DEFAULT_CHUNK_SIZE};
pub use labels::{validate_labels, LabelError};
pub use params::{CreateSessionParams, ListSessionParams, DEFAULT_MAX_RESULTS};
pub use session::Session;
pub use types::{
    DeleteResult, DirectoryEntry, FileEdit, FileInfo, OperationResult, RunOutput, SessionInfo,
    SessionList, WriteMode,
};
