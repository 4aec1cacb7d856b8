use anyhow::Result;
use clap::Parser;
use msdfgen_install::cli::{setup_logging, StatusCli, StatusCommand};
use msdfgen_install::config::{InstallerSettings, TOOL_NAME};
use msdfgen_install::gatekeeper;
use msdfgen_install::runner::SystemRunner;
use msdfgen_install::status::{clean_metadata, collect_status, render, render_clean};
use std::path::Path;

fn main() -> Result<()> {
    let cli = StatusCli::parse();

    setup_logging(cli.verbose, cli.quiet)?;

    let mut settings = InstallerSettings::from_env()?;
    if let Some(bin_dir) = &cli.bin_dir {
        settings.bin_dir = bin_dir.clone();
    }

    let command = cli.command.unwrap_or(StatusCommand::Status {
        format: "plain".to_string(),
    });

    match command {
        StatusCommand::Status { format } => {
            let report = collect_status(&SystemRunner, &settings.bin_dir, TOOL_NAME)?;
            print!("{}", render(&report, format.parse()?)?);
        }
        StatusCommand::Clean => {
            let report = clean_metadata(&settings.bin_dir)?;
            print!("{}", render_clean(&report));
        }
        StatusCommand::Gatekeeper { binary } => check_gatekeeper(&binary),
    }

    Ok(())
}

fn check_gatekeeper(binary: &Path) {
    if !binary.exists() {
        println!("Binary not found: {}", binary.display());
        return;
    }

    let on_macos = cfg!(target_os = "macos");
    println!("Platform: {}", std::env::consts::OS);
    println!("Binary: {}", binary.display());

    println!("\n--- Before applying macOS fixes ---");
    let before = gatekeeper::verify_runs(&SystemRunner, binary, on_macos);

    println!("\n--- Applying macOS security fixes ---");
    if on_macos {
        let report = gatekeeper::remove_quarantine(&SystemRunner, binary);
        println!("Quarantine removed: {}", report.quarantine_removed);
        println!("Ad-hoc signed: {}", report.signed);
    } else {
        println!("Not on macOS, skipping quarantine removal");
    }

    println!("\n--- After applying macOS fixes ---");
    let after = gatekeeper::verify_runs(&SystemRunner, binary, on_macos);
    println!("Runs before: {}, after: {}", before, after);
}
