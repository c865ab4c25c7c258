//! Artifact Sinks
//!
//! Where generated binary documents go once the user asks for them. The
//! orchestrator only hands over bytes and a suggested file name.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use clinical_intake_core::CoreResult;

/// Fallback when a suggested name sanitizes to nothing.
const FALLBACK_FILE_NAME: &str = "artifact";

/// Delivery capability for binary artifacts.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Deliver `bytes`; returns a description of where they went.
    async fn deliver(&self, bytes: Bytes, suggested_filename: &str) -> CoreResult<String>;
}

/// Writes artifacts into a directory.
///
/// An existing file is never overwritten; a ` (n)` suffix is added instead.
#[derive(Debug, Clone)]
pub struct FileSystemSink {
    dir: PathBuf,
}

impl FileSystemSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn available_path(&self, file_name: &str) -> CoreResult<PathBuf> {
        let candidate = self.dir.join(file_name);
        if !tokio::fs::try_exists(&candidate).await? {
            return Ok(candidate);
        }

        let (stem, ext) = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (file_name, None),
        };
        let mut n = 1;
        loop {
            let name = match ext {
                Some(ext) => format!("{} ({}).{}", stem, n, ext),
                None => format!("{} ({})", stem, n),
            };
            let path = self.dir.join(name);
            if !tokio::fs::try_exists(&path).await? {
                return Ok(path);
            }
            n += 1;
        }
    }
}

#[async_trait]
impl ArtifactSink for FileSystemSink {
    async fn deliver(&self, bytes: Bytes, suggested_filename: &str) -> CoreResult<String> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.available_path(&sanitize_file_name(suggested_filename)).await?;
        tokio::fs::write(&path, &bytes).await?;

        tracing::info!(
            "[FileSystemSink] Wrote {} bytes to {}",
            bytes.len(),
            path.display()
        );
        Ok(path.display().to_string())
    }
}

/// An artifact captured by `MemorySink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredArtifact {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Keeps delivered artifacts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<DeliveredArtifact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<DeliveredArtifact> {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn deliver(&self, bytes: Bytes, suggested_filename: &str) -> CoreResult<String> {
        let file_name = sanitize_file_name(suggested_filename);
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(DeliveredArtifact {
                file_name: file_name.clone(),
                bytes,
            });
        Ok(format!("memory://{}", file_name))
    }
}

/// Reduce a suggested name to a single safe path component.
pub fn sanitize_file_name(suggested: &str) -> String {
    let cleaned: String = suggested
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}
