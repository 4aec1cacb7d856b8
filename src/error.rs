//! Error kinds callers need to tell apart.
//!
//! Everything else travels as a plain `anyhow::Error` with context attached.

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Unsupported platform: {os}-{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Unknown platform key '{0}' (expected one of: darwin, darwin_arm64, linux, linux_arm64, win32)")]
    UnknownPlatformKey(String),

    #[error("No suitable binary found for platform: {platform} (release {tag})")]
    NoAssetForPlatform { platform: String, tag: String },

    #[error("HTTP {status} while requesting {url}")]
    HttpStatus { url: String, status: StatusCode },

    #[error("Could not extract {archive}; extract it manually and place the msdfgen binary at {target}")]
    ExtractionFailed {
        archive: PathBuf,
        target: PathBuf,
        reason: String,
    },

    #[error("Binary not found at expected location: {0}")]
    BinaryNotFound(PathBuf),
}
