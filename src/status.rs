//! Read-only inspection of installed binaries, plus metadata cleanup.

use crate::metadata::{hash_file, load_metadata, metadata_path, short_hash};
use crate::runner::{smoke_test, ToolRunner};
use crate::types::ReleaseMetadata;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BinaryStatus {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub hash: Option<String>,
    pub executable: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MetadataStatus {
    Missing,
    Corrupted { error: String },
    Present {
        record: ReleaseMetadata,
        /// `None` when there is no binary to compare against.
        hash_verified: Option<bool>,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlatformStatus {
    pub platform: String,
    pub directory: PathBuf,
    pub binaries: Vec<BinaryStatus>,
    pub metadata: MetadataStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusReport {
    pub bin_dir: PathBuf,
    pub found: bool,
    pub platforms: Vec<PlatformStatus>,
}

impl StatusReport {
    pub fn binary_count(&self) -> usize {
        self.platforms.iter().map(|p| p.binaries.len()).sum()
    }

    /// True when every platform with metadata and a binary passes hash
    /// verification.
    pub fn all_verified(&self) -> bool {
        self.platforms.iter().all(|p| {
            !matches!(
                p.metadata,
                MetadataStatus::Present {
                    hash_verified: Some(false),
                    ..
                }
            )
        })
    }
}

fn sorted_subdirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(root)
        .with_context(|| format!("Could not read {}", root.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn is_binary_name(file_name: &str, tool_name: &str) -> bool {
    file_name.contains(tool_name) && !file_name.ends_with(".json") && !file_name.starts_with('.')
}

fn find_binaries(platform_dir: &Path, tool_name: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(platform_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|e| is_binary_name(&e.file_name().to_string_lossy(), tool_name))
        .map(|e| e.path())
        .collect();
    files.sort();
    Ok(files)
}

fn inspect_binary(runner: &dyn ToolRunner, path: &Path) -> Result<BinaryStatus> {
    let meta = fs::metadata(path)?;
    Ok(BinaryStatus {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        size: meta.len(),
        modified: meta.modified().ok().map(DateTime::<Utc>::from),
        hash: hash_file(path).ok(),
        executable: smoke_test(runner, path),
    })
}

fn inspect_platform(
    runner: &dyn ToolRunner,
    platform_dir: &Path,
    tool_name: &str,
) -> Result<PlatformStatus> {
    let binaries = find_binaries(platform_dir, tool_name)?
        .iter()
        .map(|path| inspect_binary(runner, path))
        .collect::<Result<Vec<_>>>()?;

    let metadata = match load_metadata(platform_dir) {
        Ok(None) => MetadataStatus::Missing,
        Err(e) => MetadataStatus::Corrupted {
            error: format!("{:#}", e),
        },
        Ok(Some(record)) => {
            let hash_verified = binaries
                .first()
                .map(|b| b.hash.is_some() && b.hash == record.binary_hash);
            MetadataStatus::Present {
                record,
                hash_verified,
            }
        }
    };

    Ok(PlatformStatus {
        platform: platform_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        directory: platform_dir.to_path_buf(),
        binaries,
        metadata,
    })
}

/// Inspects every platform directory under `bin_dir`.
pub fn collect_status(
    runner: &dyn ToolRunner,
    bin_dir: &Path,
    tool_name: &str,
) -> Result<StatusReport> {
    if !bin_dir.is_dir() {
        return Ok(StatusReport {
            bin_dir: bin_dir.to_path_buf(),
            found: false,
            platforms: Vec::new(),
        });
    }

    let platforms = sorted_subdirs(bin_dir)?
        .iter()
        .map(|dir| inspect_platform(runner, dir, tool_name))
        .collect::<Result<Vec<_>>>()?;

    Ok(StatusReport {
        bin_dir: bin_dir.to_path_buf(),
        found: true,
        platforms,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Plain,
    Json,
    Yaml,
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(ReportFormat::Plain),
            "json" => Ok(ReportFormat::Json),
            "yaml" | "yml" => Ok(ReportFormat::Yaml),
            other => Err(anyhow!(
                "Unknown format '{}'. Valid formats: plain, json, yaml",
                other
            )),
        }
    }
}

pub fn render(report: &StatusReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Plain => Ok(render_plain(report)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        ReportFormat::Yaml => Ok(serde_yaml::to_string(report)?),
    }
}

fn yes_no(ok: bool) -> String {
    if ok {
        style("Yes").green().to_string()
    } else {
        style("No").red().to_string()
    }
}

fn render_plain(report: &StatusReport) -> String {
    let mut out = String::new();

    if !report.found {
        let _ = writeln!(
            out,
            "{} Bin directory not found: {}",
            style("x").red(),
            report.bin_dir.display()
        );
        let _ = writeln!(out, "Found binaries: 0");
        return out;
    }

    for platform in &report.platforms {
        let _ = writeln!(out, "Platform: {}", style(&platform.platform).bold());

        if platform.binaries.is_empty() {
            let _ = writeln!(out, "   No binary found");
            let _ = writeln!(out);
            continue;
        }

        for binary in &platform.binaries {
            let _ = writeln!(out, "   Binary: {}", binary.name);
            let _ = writeln!(out, "   Size: {} bytes", binary.size);
            let modified = binary
                .modified
                .map(|m| m.to_rfc3339())
                .unwrap_or_else(|| "N/A".to_string());
            let _ = writeln!(out, "   Modified: {}", modified);
            let hash = binary
                .hash
                .as_deref()
                .map(short_hash)
                .unwrap_or_else(|| "N/A".to_string());
            let _ = writeln!(out, "   Hash: {}", hash);
            let _ = writeln!(out, "   Executable: {}", yes_no(binary.executable));
        }

        match &platform.metadata {
            MetadataStatus::Missing => {
                let _ = writeln!(out, "   Metadata: {}", style("Not found").yellow());
            }
            MetadataStatus::Corrupted { .. } => {
                let _ = writeln!(out, "   Metadata: {}", style("Corrupted").red());
            }
            MetadataStatus::Present {
                record: metadata,
                hash_verified,
            } => {
                let _ = writeln!(
                    out,
                    "   Release: {} (ID: {})",
                    metadata.tag_name, metadata.release_id
                );
                let _ = writeln!(
                    out,
                    "   Asset: {} (ID: {})",
                    metadata.asset_name, metadata.asset_id
                );
                let _ = writeln!(out, "   Downloaded: {}", metadata.downloaded_at.to_rfc3339());
                let stored = metadata
                    .binary_hash
                    .as_deref()
                    .map(short_hash)
                    .unwrap_or_else(|| "N/A".to_string());
                let _ = writeln!(out, "   Stored Hash: {}", stored);
                match hash_verified {
                    Some(true) => {
                        let _ = writeln!(out, "   Hash verification: {}", style("Passed").green());
                    }
                    Some(false) => {
                        let _ = writeln!(
                            out,
                            "   Hash verification: {} (file may have been modified)",
                            style("Failed").yellow()
                        );
                    }
                    None => {}
                }
            }
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Found binaries: {}", report.binary_count());
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CleanOutcome {
    Removed,
    NotFound,
    Failed { error: String },
}

/// Result of `clean_metadata`; `found` is false when the bin root is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub bin_dir: PathBuf,
    pub found: bool,
    pub outcomes: Vec<(String, CleanOutcome)>,
}

/// Deletes each platform's metadata file. Binaries are left alone.
pub fn clean_metadata(bin_dir: &Path) -> Result<CleanReport> {
    if !bin_dir.is_dir() {
        return Ok(CleanReport {
            bin_dir: bin_dir.to_path_buf(),
            found: false,
            outcomes: Vec::new(),
        });
    }

    let mut outcomes = Vec::new();
    for dir in sorted_subdirs(bin_dir)? {
        let platform = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let path = metadata_path(&dir);

        let outcome = if !path.exists() {
            CleanOutcome::NotFound
        } else {
            match fs::remove_file(&path) {
                Ok(()) => CleanOutcome::Removed,
                Err(e) => CleanOutcome::Failed {
                    error: e.to_string(),
                },
            }
        };
        tracing::debug!("{}: {:?}", platform, outcome);
        outcomes.push((platform, outcome));
    }

    Ok(CleanReport {
        bin_dir: bin_dir.to_path_buf(),
        found: true,
        outcomes,
    })
}

pub fn render_clean(report: &CleanReport) -> String {
    let mut out = String::new();
    if !report.found {
        let _ = writeln!(
            out,
            "{} Bin directory not found: {}",
            style("x").red(),
            report.bin_dir.display()
        );
        return out;
    }

    for (platform, outcome) in &report.outcomes {
        let _ = match outcome {
            CleanOutcome::Removed => writeln!(out, "Removed metadata for {}", platform),
            CleanOutcome::NotFound => writeln!(out, "No metadata found for {}", platform),
            CleanOutcome::Failed { error } => {
                writeln!(out, "Failed to remove metadata for {}: {}", platform, error)
            }
        };
    }
    out
}
