use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;

pub const TOOL_NAME: &str = "msdfgen";
pub const DEFAULT_REPO: &str = "soimy/msdfgen";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const BIN_DIR_NAME: &str = "bin";
pub const METADATA_FILE_NAME: &str = ".release-info.json";
pub const USER_AGENT: &str = "msdf-bmfont-xml-installer";

pub const ENV_SKIP_INSTALL: &str = "SKIP_MSDFGEN_INSTALL";
pub const ENV_BIN_DIR: &str = "MSDFGEN_BIN_DIR";
pub const ENV_REPO: &str = "MSDFGEN_REPO";
pub const ENV_API_URL: &str = "MSDFGEN_API_URL";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerSettings {
    /// GitHub repository in `owner/name` form.
    pub repo: String,
    pub api_base_url: String,
    /// Root holding one subdirectory per platform.
    pub bin_dir: PathBuf,
    pub github_token: Option<String>,
    pub skip_install: bool,
}

impl InstallerSettings {
    pub fn with_bin_dir(bin_dir: PathBuf) -> Self {
        Self {
            repo: DEFAULT_REPO.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            bin_dir,
            github_token: None,
            skip_install: false,
        }
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bin_dir = match lookup(ENV_BIN_DIR).filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_bin_dir()?,
        };

        let mut settings = Self::with_bin_dir(bin_dir);

        if let Some(repo) = lookup(ENV_REPO).filter(|v| !v.is_empty()) {
            validate_repo(&repo)?;
            settings.repo = repo;
        }

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            settings.api_base_url = url.trim_end_matches('/').to_string();
        }

        settings.github_token = lookup(ENV_GITHUB_TOKEN).filter(|v| !v.is_empty());
        settings.skip_install = skip_requested(lookup(ENV_SKIP_INSTALL).as_deref());

        tracing::debug!("Bin directory: {}", settings.bin_dir.display());
        Ok(settings)
    }

    pub fn latest_release_url(&self) -> String {
        format!("{}/repos/{}/releases/latest", self.api_base_url, self.repo)
    }

    /// Where users can fetch the binary by hand.
    pub fn releases_page(&self) -> String {
        format!("https://github.com/{}/releases/latest", self.repo)
    }
}

/// Any non-empty value asks to skip.
pub fn skip_requested(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

pub fn default_bin_dir() -> Result<PathBuf> {
    let cwd = env::current_dir().context("Could not determine current directory")?;
    Ok(cwd.join(BIN_DIR_NAME))
}

fn validate_repo(repo: &str) -> Result<()> {
    match repo.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(())
        }
        _ => Err(anyhow!(
            "Invalid {} '{}': expected 'owner/name'",
            ENV_REPO,
            repo
        )),
    }
}
