//! Installer for prebuilt msdfgen binaries.
//!
//! Resolves the latest `soimy/msdfgen` release on GitHub, picks the asset for
//! each platform, and installs it under `bin/<platform>/` together with a
//! `.release-info.json` record used to skip redundant downloads.

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod freshness;
pub mod gatekeeper;
pub mod github;
pub mod install;
pub mod metadata;
pub mod platform;
pub mod runner;
pub mod status;
pub mod types;
