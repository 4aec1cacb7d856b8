use crate::config::InstallerSettings;
use crate::download::{materialize, set_executable};
use crate::error::InstallError;
use crate::freshness::{Freshness, FreshnessCheck};
use crate::gatekeeper;
use crate::github::ReleaseClient;
use crate::metadata::{short_hash, store_release_info, try_hash_file};
use crate::platform::{find_asset_for_platform, BinaryLayout, PlatformKey};
use crate::runner::ToolRunner;
use anyhow::Result;
use std::path::PathBuf;

/// Outcome of installing one platform in `--download-all` mode.
#[derive(Debug)]
pub struct PlatformOutcome {
    pub platform: PlatformKey,
    pub result: Result<PathBuf, String>,
}

pub struct Installer {
    settings: InstallerSettings,
    layout: BinaryLayout,
    /// Platform this process runs on; `None` when it is not a supported one.
    host: Option<PlatformKey>,
    client: ReleaseClient,
    runner: Box<dyn ToolRunner>,
}

impl Installer {
    pub fn new(
        settings: InstallerSettings,
        layout: BinaryLayout,
        host: Option<PlatformKey>,
        runner: Box<dyn ToolRunner>,
    ) -> Result<Self> {
        let client = ReleaseClient::new(&settings)?;
        Ok(Self {
            settings,
            layout,
            host,
            client,
            runner,
        })
    }

    pub fn settings(&self) -> &InstallerSettings {
        &self.settings
    }

    pub fn binary_path(&self, platform: PlatformKey) -> PathBuf {
        self.settings
            .bin_dir
            .join(platform.as_str())
            .join(self.layout.binary_name(platform))
    }

    fn host_is_macos(&self) -> bool {
        self.host.is_some_and(|h| h.is_darwin())
    }

    /// Installs the binary for the host platform.
    pub async fn install_current(&self, force: bool) -> Result<PathBuf> {
        let platform = self.host.ok_or_else(|| InstallError::UnsupportedPlatform {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        })?;
        tracing::info!("Detected platform: {}", platform);
        self.install_platform(platform, force).await
    }

    /// Resolves the latest release and installs `platform`'s binary unless the
    /// installed copy is already current. Returns the binary path.
    pub async fn install_platform(&self, platform: PlatformKey, force: bool) -> Result<PathBuf> {
        tracing::info!("Installing for platform: {}", platform);
        let target_path = self.binary_path(platform);

        let release = self.client.latest_release().await?;
        let asset = find_asset_for_platform(&release.assets, platform).ok_or_else(|| {
            InstallError::NoAssetForPlatform {
                platform: platform.to_string(),
                tag: release.tag_name.clone(),
            }
        })?;
        tracing::info!("Target asset: {} (ID: {})", asset.name, asset.id);

        let is_host = self.host == Some(platform);
        let check = FreshnessCheck {
            binary_path: &target_path,
            release: &release,
            asset,
            force,
            smoke_test: is_host,
        };
        match check.evaluate(self.runner.as_ref()) {
            Freshness::UpToDate => {
                tracing::info!("{} binary is already up-to-date", platform);
                return Ok(target_path);
            }
            Freshness::Stale(reason) => tracing::info!("{}", reason),
        }

        let platform_dir = self.settings.bin_dir.join(platform.as_str());
        let download_path = platform_dir.join(&asset.name);
        self.client
            .download_file(&asset.browser_download_url, &download_path)
            .await?;
        if let Some(hash) = try_hash_file(&download_path) {
            tracing::info!("File hash: {}", short_hash(&hash));
        }

        materialize(
            self.runner.as_ref(),
            &download_path,
            &target_path,
            &self.layout.tool_name,
        )?;

        if !target_path.exists() {
            return Err(InstallError::BinaryNotFound(target_path).into());
        }
        set_executable(&target_path)?;
        tracing::info!(
            "Successfully installed {} binary: {}",
            self.layout.tool_name,
            target_path.display()
        );

        if self.host_is_macos() && platform.is_darwin() {
            gatekeeper::remove_quarantine(self.runner.as_ref(), &target_path);
        }

        if let Err(e) = store_release_info(&target_path, &release, asset) {
            tracing::warn!("{:#}", e);
        }

        if is_host {
            gatekeeper::verify_runs(self.runner.as_ref(), &target_path, self.host_is_macos());
        }

        Ok(target_path)
    }

    /// Installs every supported platform in turn. A failure is recorded and
    /// the remaining platforms are still processed.
    pub async fn install_all(&self, force: bool) -> Vec<PlatformOutcome> {
        tracing::info!(
            "Installing {} binaries for all platforms...",
            self.layout.tool_name
        );
        let mut results = Vec::new();

        for platform in PlatformKey::ALL {
            tracing::info!("Processing {}...", platform);
            let result = match self.install_platform(platform, force).await {
                Ok(path) => Ok(path),
                Err(e) => {
                    tracing::error!("Failed to install for {}: {:#}", platform, e);
                    Err(format!("{:#}", e))
                }
            };
            results.push(PlatformOutcome { platform, result });
        }

        results
    }
}

/// Human-readable summary of an all-platforms run.
pub fn summarize(results: &[PlatformOutcome]) -> String {
    let (ok, failed): (Vec<_>, Vec<_>) = results.iter().partition(|r| r.result.is_ok());
    let mut out = String::from("Installation Summary:\n");

    out.push_str(&format!("Successful: {}\n", ok.len()));
    for r in &ok {
        if let Ok(path) = &r.result {
            out.push_str(&format!("  - {}: {}\n", r.platform, path.display()));
        }
    }

    if !failed.is_empty() {
        out.push_str(&format!("Failed: {}\n", failed.len()));
        for r in &failed {
            if let Err(e) = &r.result {
                out.push_str(&format!("  - {}: {}\n", r.platform, e));
            }
        }
    }
    out
}
