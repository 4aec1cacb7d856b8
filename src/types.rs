use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubRelease {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubAsset {
    pub id: u64,
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Release identity recorded next to an installed binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseMetadata {
    pub release_id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub published_at: Option<String>,
    pub asset_id: u64,
    pub asset_name: String,
    pub asset_url: String,
    pub downloaded_at: DateTime<Utc>,
    #[serde(default)]
    pub binary_hash: Option<String>,
}

impl ReleaseMetadata {
    pub fn new(release: &GitHubRelease, asset: &GitHubAsset, binary_hash: Option<String>) -> Self {
        Self {
            release_id: release.id,
            tag_name: release.tag_name.clone(),
            published_at: release.published_at.clone(),
            asset_id: asset.id,
            asset_name: asset.name.clone(),
            asset_url: asset.browser_download_url.clone(),
            downloaded_at: Utc::now(),
            binary_hash,
        }
    }
}
