use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    if let Some(tag) = option_env!("MSDFGEN_INSTALL_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("MSDFGEN_INSTALL_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("MSDFGEN_INSTALL_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup; clap wants a 'static str
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser, Debug)]
#[command(name = "msdfgen-install")]
#[command(about = "Download the prebuilt msdfgen binary from GitHub Releases")]
#[command(version = get_version())]
#[command(after_help = "Examples:\n  \
    msdfgen-install                  Install binary for current platform (with hash check)\n  \
    msdfgen-install --download-all   Download all platform binaries (with hash check)\n  \
    msdfgen-install --force          Force download current platform binary\n  \
    msdfgen-install -a -f            Force download all platform binaries\n  \
    msdfgen-install -a --verify-hash Download all, then report installed hashes\n\n\
    -v raises log verbosity; hash verification is --verify-hash.\n\
    Set SKIP_MSDFGEN_INSTALL to skip the current-platform install.")]
pub struct InstallCli {
    /// Download binaries for all supported platforms
    #[arg(short = 'a', long)]
    pub download_all: bool,

    /// Force download without hash verification
    #[arg(short, long)]
    pub force: bool,

    /// Install a single platform (darwin, darwin_arm64, linux, linux_arm64, win32)
    #[arg(long, conflicts_with = "download_all")]
    pub platform: Option<String>,

    /// Print a hash verification report of installed binaries afterwards (long form only)
    #[arg(long)]
    pub verify_hash: bool,

    /// Root directory holding one subdirectory per platform
    #[arg(long, value_name = "DIR")]
    pub bin_dir: Option<PathBuf>,

    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Parser, Debug)]
#[command(name = "msdfgen-status")]
#[command(about = "Inspect installed msdfgen binaries")]
#[command(version = get_version(), propagate_version = true)]
pub struct StatusCli {
    /// Root directory holding one subdirectory per platform
    #[arg(long, value_name = "DIR", global = true)]
    pub bin_dir: Option<PathBuf>,

    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<StatusCommand>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum StatusCommand {
    /// Show installed binaries and their release metadata (default)
    Status {
        /// Output format (plain, json, yaml)
        #[arg(long, default_value = "plain")]
        format: String,
    },

    /// Delete stored release metadata for every platform
    Clean,

    /// Check a binary against macOS Gatekeeper and apply the quarantine fixes
    Gatekeeper {
        /// Binary to check
        binary: PathBuf,
    },
}

/// Configures the global tracing subscriber. `RUST_LOG` takes precedence
/// over the verbosity flags.
pub fn setup_logging(verbose: u8, quiet: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
