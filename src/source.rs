//! Retrieval of site records from a directory service.
//!
//! The picker only knows the [`SiteSource`] trait; [`JsonDirectory`] is the
//! file-backed implementation used by the binary.

use crate::site::Site;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where the picker is hosted. Interpreted only by the source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SiteContext {
    pub web_url: String,
    pub site_url: String,
    pub hub_site_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("failed to read site directory {path}: {message}")]
    Read { path: String, message: String },
    #[error("malformed site directory {path}: {message}")]
    Malformed { path: String, message: String },
    #[error("site lookup failed: {0}")]
    Lookup(String),
}

#[async_trait]
pub trait SiteSource: Send + Sync {
    /// All sites visible from `ctx`. `web_only` asks for sub-webs instead of
    /// site collections; `limit_to_current_site_collection` keeps only entries
    /// under the context's site collection.
    async fn fetch_all_sites(
        &self,
        ctx: &SiteContext,
        web_only: bool,
        limit_to_current_site_collection: bool,
    ) -> Result<Vec<Site>, SourceError>;

    /// Sites associated with the context's hub.
    async fn fetch_hub_sites(&self, ctx: &SiteContext) -> Result<Vec<Site>, SourceError>;
}

/// One retrieval, as decided by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    AllSites {
        context: SiteContext,
        web_only: bool,
        limit_to_current_site_collection: bool,
    },
    HubSites {
        context: SiteContext,
    },
}

pub async fn execute(source: &dyn SiteSource, request: &FetchRequest) -> Result<Vec<Site>, SourceError> {
    match request {
        FetchRequest::AllSites {
            context,
            web_only,
            limit_to_current_site_collection,
        } => {
            source
                .fetch_all_sites(context, *web_only, *limit_to_current_site_collection)
                .await
        }
        FetchRequest::HubSites { context } => source.fetch_hub_sites(context).await,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum EntryKind {
    #[default]
    Site,
    Web,
}

#[derive(Debug, Clone, Deserialize)]
struct DirectoryEntry {
    #[serde(default)]
    kind: EntryKind,
    #[serde(flatten)]
    site: Site,
}

#[derive(Debug, Clone, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    sites: Vec<DirectoryEntry>,
}

/// A site directory stored as a JSON file:
///
/// ```json
/// { "sites": [ { "kind": "site", "id": "a", "title": "Alpha", "url": "https://host/sites/a", "hubSiteId": "h1" } ] }
/// ```
///
/// The file is re-read on every lookup so edits show up on the next fetch.
#[derive(Debug, Clone)]
pub struct JsonDirectory {
    path: PathBuf,
}

impl JsonDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonDirectory { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<DirectoryEntry>, SourceError> {
        let display = self.path.display().to_string();
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Read {
                path: display.clone(),
                message: e.to_string(),
            })?;
        let file: DirectoryFile = serde_json::from_str(&raw).map_err(|e| SourceError::Malformed {
            path: display,
            message: e.to_string(),
        })?;
        Ok(file.sites)
    }
}

// true when `url` is `base` itself or a path below it
fn is_under(url: &str, base: &str) -> bool {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return false;
    }
    let url_l = url.to_ascii_lowercase();
    let base_l = base.to_ascii_lowercase();
    url_l == base_l || url_l.starts_with(&format!("{base_l}/"))
}

#[async_trait]
impl SiteSource for JsonDirectory {
    async fn fetch_all_sites(
        &self,
        ctx: &SiteContext,
        web_only: bool,
        limit_to_current_site_collection: bool,
    ) -> Result<Vec<Site>, SourceError> {
        let wanted = if web_only { EntryKind::Web } else { EntryKind::Site };
        let sites = self
            .load()
            .await?
            .into_iter()
            .filter(|e| e.kind == wanted)
            .filter(|e| !limit_to_current_site_collection || is_under(&e.site.url, &ctx.site_url))
            .map(|e| e.site)
            .collect();
        Ok(sites)
    }

    async fn fetch_hub_sites(&self, ctx: &SiteContext) -> Result<Vec<Site>, SourceError> {
        let Some(hub) = ctx.hub_site_id.as_deref() else {
            return Ok(Vec::new());
        };
        let sites = self
            .load()
            .await?
            .into_iter()
            .filter(|e| e.kind == EntryKind::Site)
            .filter(|e| e.site.hub_site_id.as_deref() == Some(hub))
            .map(|e| e.site)
            .collect();
        Ok(sites)
    }
}
