use serde_json::json;
use std::collections::HashMap;

use crate::client::ClientInner;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::types::{DirectoryEntry, FileEdit, FileInfo, OperationResult, WriteMode};

/// Largest piece of a file moved by a single `read_file` or `write_file`
/// tool call. Bigger files are split transparently.
pub const DEFAULT_CHUNK_SIZE: usize = 50 * 1024;

/// File access inside a session.
pub struct FileSystem<'a> {
    session: &'a Session,
}

impl<'a> FileSystem<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    async fn tool(
        &self,
        inner: &ClientInner,
        name: &str,
        args: serde_json::Value,
    ) -> Result<OperationResult<String>> {
        inner
            .call_tool(self.session.session_id(), name, args, None)
            .await
    }

    async fn tool_unit(&self, name: &str, args: serde_json::Value) -> Result<OperationResult<()>> {
        let inner = self.session.inner()?;
        let result = self.tool(&inner, name, args).await?;
        Ok(OperationResult {
            request_id: result.request_id,
            data: (),
        })
    }

    /// Create a directory, including missing parents.
    pub async fn create_directory(&self, path: &str) -> Result<OperationResult<()>> {
        self.tool_unit("create_directory", json!({ "path": path })).await
    }

    /// Apply `edits` to a text file in order. With `dry_run` the service
    /// only checks that every edit applies.
    pub async fn edit_file(
        &self,
        path: &str,
        edits: &[FileEdit],
        dry_run: bool,
    ) -> Result<OperationResult<()>> {
        self.tool_unit(
            "edit_file",
            json!({ "path": path, "edits": edits, "dryRun": dry_run }),
        )
        .await
    }

    /// Move or rename a file or directory.
    pub async fn move_file(&self, source: &str, destination: &str) -> Result<OperationResult<()>> {
        self.tool_unit(
            "move_file",
            json!({ "source": source, "destination": destination }),
        )
        .await
    }

    /// Size, type and timestamps of a path.
    pub async fn get_file_info(&self, path: &str) -> Result<OperationResult<FileInfo>> {
        let inner = self.session.inner()?;
        let result = self
            .tool(&inner, "get_file_info", json!({ "path": path }))
            .await?;
        Ok(OperationResult {
            request_id: result.request_id,
            data: parse_file_info(&result.data),
        })
    }

    /// Entries directly under `path`.
    pub async fn list_directory(&self, path: &str) -> Result<OperationResult<Vec<DirectoryEntry>>> {
        let inner = self.session.inner()?;
        let result = self
            .tool(&inner, "list_directory", json!({ "path": path }))
            .await?;
        Ok(OperationResult {
            request_id: result.request_id,
            data: parse_directory_listing(&result.data),
        })
    }

    /// Read several small files in one call, keyed by the path the service reports.
    pub async fn read_multiple_files(
        &self,
        paths: &[&str],
    ) -> Result<OperationResult<HashMap<String, String>>> {
        let inner = self.session.inner()?;
        let result = self
            .tool(&inner, "read_multiple_files", json!({ "paths": paths }))
            .await?;
        Ok(OperationResult {
            request_id: result.request_id,
            data: parse_multiple_files(&result.data),
        })
    }

    /// Paths under `path` whose names match `pattern`, skipping anything
    /// matching one of `exclude_patterns`.
    pub async fn search_files(
        &self,
        path: &str,
        pattern: &str,
        exclude_patterns: &[&str],
    ) -> Result<OperationResult<Vec<String>>> {
        let mut args = json!({ "path": path, "pattern": pattern });
        if !exclude_patterns.is_empty() {
            args["excludePatterns"] = json!(exclude_patterns.join(","));
        }
        let inner = self.session.inner()?;
        let result = self.tool(&inner, "search_files", args).await?;
        let matches = result
            .data
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        Ok(OperationResult {
            request_id: result.request_id,
            data: matches,
        })
    }

    /// Read a text file.
    ///
    /// The size is looked up first; files above [`DEFAULT_CHUNK_SIZE`] are
    /// fetched in pieces and joined. The returned request id is the one of
    /// the last call made. Directories fail with [`Error::Validation`].
    pub async fn read_file(&self, path: &str) -> Result<OperationResult<String>> {
        let info = self.get_file_info(path).await?;
        if info.data.is_directory {
            return Err(Error::Validation(format!(
                "Path {path} is a directory, not a file"
            )));
        }
        let size = usize::try_from(info.data.size).unwrap_or(usize::MAX);
        if size == 0 {
            return Ok(OperationResult {
                request_id: info.request_id,
                data: String::new(),
            });
        }

        let inner = self.session.inner()?;
        let mut content = String::new();
        let mut request_id = info.request_id;
        let mut offset = 0;
        while offset < size {
            let length = DEFAULT_CHUNK_SIZE.min(size - offset);
            let chunk = self
                .tool(
                    &inner,
                    "read_file",
                    json!({ "path": path, "offset": offset, "length": length }),
                )
                .await?;
            content.push_str(&chunk.data);
            request_id = chunk.request_id;
            offset += length;
        }
        tracing::debug!(path, size, "file read");

        Ok(OperationResult {
            request_id,
            data: content,
        })
    }

    /// Write a text file, replacing or appending per `mode`.
    ///
    /// Content above [`DEFAULT_CHUNK_SIZE`] bytes is sent in pieces: the
    /// first with `mode`, the rest appended.
    pub async fn write_file(
        &self,
        path: &str,
        content: &str,
        mode: WriteMode,
    ) -> Result<OperationResult<()>> {
        let inner = self.session.inner()?;
        let mut request_id = String::new();
        for (i, chunk) in chunks(content, DEFAULT_CHUNK_SIZE).into_iter().enumerate() {
            let mode = if i == 0 { mode } else { WriteMode::Append };
            let result = self
                .tool(
                    &inner,
                    "write_file",
                    json!({ "path": path, "content": chunk, "mode": mode }),
                )
                .await?;
            request_id = result.request_id;
        }
        Ok(OperationResult {
            request_id,
            data: (),
        })
    }
}

/// Split `content` into pieces of at most `max` bytes on char boundaries.
/// Always yields at least one piece, so empty content still writes once.
fn chunks(content: &str, max: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = content;
    while rest.len() > max {
        let mut end = max;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        // A single char wider than `max` still has to go out whole.
        if end == 0 {
            end = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let (head, tail) = rest.split_at(end);
        pieces.push(head);
        rest = tail;
    }
    pieces.push(rest);
    pieces
}

/// `key: value` lines as returned by the `get_file_info` tool.
fn parse_file_info(text: &str) -> FileInfo {
    let mut info = FileInfo::default();
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "name" => info.name = value.to_string(),
            "size" => info.size = value.parse().unwrap_or(0),
            "isDirectory" => info.is_directory = value.eq_ignore_ascii_case("true"),
            "modified" => info.modified = Some(value.to_string()),
            "created" => info.created = Some(value.to_string()),
            "accessed" => info.accessed = Some(value.to_string()),
            "permissions" => info.permissions = Some(value.to_string()),
            _ => {}
        }
    }
    info
}

/// `[FILE] name` / `[DIR] name` lines.
fn parse_directory_listing(text: &str) -> Vec<DirectoryEntry> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if let Some(name) = line.strip_prefix("[DIR]") {
                Some(DirectoryEntry {
                    name: name.trim().to_string(),
                    is_directory: true,
                })
            } else {
                line.strip_prefix("[FILE]").map(|name| DirectoryEntry {
                    name: name.trim().to_string(),
                    is_directory: false,
                })
            }
        })
        .collect()
}

/// Blocks of `path:` followed by content lines, each closed by `---`.
fn parse_multiple_files(text: &str) -> HashMap<String, String> {
    let mut files = HashMap::new();
    let mut current: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in text.lines() {
        match current {
            None => {
                if let Some(path) = line.trim().strip_suffix(':') {
                    current = Some(path.to_string());
                }
            }
            Some(_) if line.trim() == "---" => {
                if let Some(path) = current.take() {
                    files.insert(path, body.join("\n"));
                }
                body.clear();
            }
            Some(_) => body.push(line),
        }
    }
    if let Some(path) = current {
        files.insert(path, body.join("\n"));
    }
    files
}
