// JSON file page store: the whole page collection lives in one document
use crate::application::page_repository::PageStore;
use crate::domain::dashboard::Page;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct JsonPageStore {
    path: PathBuf,
}

impl JsonPageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PageStore for JsonPageStore {
    async fn load_pages(&self) -> Result<Vec<Page>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read pages from {}", self.path.display()));
            }
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&raw).with_context(|| format!("Failed to parse pages in {}", self.path.display()))
    }

    /// Written to a sibling file first, then renamed over the old document
    async fn save_pages(&self, pages: &[Page]) -> Result<()> {
        let body = serde_json::to_vec_pretty(pages).context("Failed to serialize pages")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, &body)
            .await
            .with_context(|| format!("Failed to write {}", staging.display()))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!(pages = pages.len(), path = %self.path.display(), "pages saved");
        Ok(())
    }
}
