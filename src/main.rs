use anyhow::Result;
use clap::Parser;
use msdfgen_install::cli::{setup_logging, InstallCli};
use msdfgen_install::config::{InstallerSettings, ENV_SKIP_INSTALL, TOOL_NAME};
use msdfgen_install::install::{summarize, Installer};
use msdfgen_install::platform::{BinaryLayout, PlatformKey};
use msdfgen_install::runner::SystemRunner;
use msdfgen_install::status::{collect_status, render, ReportFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = InstallCli::parse();

    setup_logging(cli.verbose, cli.quiet)?;

    let mut settings = InstallerSettings::from_env()?;
    if let Some(bin_dir) = &cli.bin_dir {
        settings.bin_dir = bin_dir.clone();
    }

    let host = match PlatformKey::host() {
        Ok(platform) => Some(platform),
        Err(e) => {
            tracing::debug!("{}", e);
            None
        }
    };

    let installer = Installer::new(
        settings,
        BinaryLayout::for_tool(TOOL_NAME),
        host,
        Box::new(SystemRunner),
    )?;

    let mut failed = false;

    if cli.download_all {
        let results = installer.install_all(cli.force).await;
        println!("{}", summarize(&results));
        failed = results.iter().any(|r| r.result.is_err());
    } else if let Some(platform) = &cli.platform {
        let platform: PlatformKey = platform.parse()?;
        match installer.install_platform(platform, cli.force).await {
            Ok(path) => tracing::info!("{} binary ready at {}", platform, path.display()),
            Err(e) => {
                tracing::error!("Failed to install for {}: {:#}", platform, e);
                failed = true;
            }
        }
    } else if installer.settings().skip_install {
        tracing::info!(
            "Skipping {} installation ({} is set)",
            TOOL_NAME,
            ENV_SKIP_INSTALL
        );
    } else if let Err(e) = installer.install_current(cli.force).await {
        // A failed download must not fail the surrounding package install.
        tracing::error!("Installation failed: {:#}", e);
        tracing::error!("You may need to manually download the {} binary from:", TOOL_NAME);
        tracing::error!("{}", installer.settings().releases_page());
    }

    if cli.verify_hash {
        let report = collect_status(&SystemRunner, &installer.settings().bin_dir, TOOL_NAME)?;
        print!("{}", render(&report, ReportFormat::Plain)?);
        if !report.all_verified() {
            tracing::warn!("Some binaries do not match their recorded hash");
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
