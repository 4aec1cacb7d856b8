//! GitHub API interaction: latest-release lookup and asset download.

use crate::config::{InstallerSettings, USER_AGENT};
use crate::error::InstallError;
use crate::types::GitHubRelease;
use anyhow::{anyhow, Context, Result};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ReleaseClient {
    client: reqwest::Client,
    latest_release_url: String,
}

impl ReleaseClient {
    pub fn new(settings: &InstallerSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &settings.github_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("GITHUB_TOKEN is not a valid header value")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
            tracing::debug!("Using GITHUB_TOKEN");
        }

        // Redirects are followed by reqwest's default policy.
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            latest_release_url: settings.latest_release_url(),
        })
    }

    pub async fn latest_release(&self) -> Result<GitHubRelease> {
        tracing::info!("Fetching latest release information...");
        tracing::debug!("GET {}", self.latest_release_url);

        let response = self
            .client
            .get(&self.latest_release_url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.latest_release_url))?;

        if !response.status().is_success() {
            return Err(InstallError::HttpStatus {
                url: self.latest_release_url.clone(),
                status: response.status(),
            }
            .into());
        }

        let release: GitHubRelease = response
            .json()
            .await
            .context("Could not parse release information")?;
        tracing::info!("Latest release: {} (ID: {})", release.tag_name, release.id);
        Ok(release)
    }

    /// Streams `url` into `local_path`, creating parent directories.
    pub async fn download_file(&self, url: &str, local_path: &Path) -> Result<u64> {
        let filename = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        tracing::info!("Downloading {}...", filename);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/octet-stream")
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        if !response.status().is_success() {
            return Err(InstallError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            }
            .into());
        }

        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let total_size = response.content_length().unwrap_or(0);
        let pb = ProgressBar::new(total_size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .map_err(|e| anyhow!("Invalid progress template: {}", e))?
                .progress_chars("#>-"),
        );
        pb.set_message(format!("Downloading {}", filename));

        let mut file = fs::File::create(local_path)
            .with_context(|| format!("Could not create {}", local_path.display()))?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.with_context(|| format!("Download of {} interrupted", url))?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }
        file.flush()?;

        pb.finish_and_clear();
        tracing::info!("Downloaded: {} ({} bytes)", local_path.display(), downloaded);
        Ok(downloaded)
    }
}
