//! Decides whether a platform's binary has to be downloaded again.

use crate::metadata::{stored_release_info, try_hash_file};
use crate::runner::{smoke_test, ToolRunner};
use crate::types::{GitHubAsset, GitHubRelease};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    Forced,
    BinaryMissing,
    MetadataMissing,
    NewRelease { from: String, to: String },
    AssetChanged,
    HashMismatch,
    NotWorking,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::Forced => write!(f, "Force download requested"),
            StaleReason::BinaryMissing => write!(f, "Binary not found, will download"),
            StaleReason::MetadataMissing => write!(
                f,
                "No release metadata found, will download to ensure latest version"
            ),
            StaleReason::NewRelease { from, to } => {
                write!(f, "New release detected ({} -> {})", from, to)
            }
            StaleReason::AssetChanged => write!(f, "Asset updated for same release"),
            StaleReason::HashMismatch => write!(f, "Binary file hash mismatch, will re-download"),
            StaleReason::NotWorking => write!(f, "Binary exists but not working, will re-download"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    UpToDate,
    Stale(StaleReason),
}

pub struct FreshnessCheck<'a> {
    pub binary_path: &'a Path,
    pub release: &'a GitHubRelease,
    pub asset: &'a GitHubAsset,
    pub force: bool,
    /// Smoke-test the binary too; only meaningful when it targets the host.
    pub smoke_test: bool,
}

impl FreshnessCheck<'_> {
    /// Runs the checks in order, stopping at the first one that fails.
    pub fn evaluate(&self, runner: &dyn ToolRunner) -> Freshness {
        if self.force {
            return Freshness::Stale(StaleReason::Forced);
        }

        if !self.binary_path.exists() {
            return Freshness::Stale(StaleReason::BinaryMissing);
        }

        let stored = match stored_release_info(self.binary_path) {
            Some(stored) => stored,
            None => return Freshness::Stale(StaleReason::MetadataMissing),
        };

        if stored.release_id != self.release.id {
            return Freshness::Stale(StaleReason::NewRelease {
                from: stored.tag_name,
                to: self.release.tag_name.clone(),
            });
        }

        if stored.asset_id != self.asset.id {
            return Freshness::Stale(StaleReason::AssetChanged);
        }

        let current_hash = try_hash_file(self.binary_path);
        if current_hash.is_none() || current_hash != stored.binary_hash {
            return Freshness::Stale(StaleReason::HashMismatch);
        }

        if self.smoke_test && !smoke_test(runner, self.binary_path) {
            return Freshness::Stale(StaleReason::NotWorking);
        }

        Freshness::UpToDate
    }
}
