mod common;

use common::{CommandOutput, TestContext};
use std::fs;

fn seed_platform(ctx: &TestContext, platform: &str, binary: &str, with_metadata: bool) {
    let dir = ctx.bin_dir.join(platform);
    fs::create_dir_all(&dir).expect("Failed to create platform dir");
    fs::write(dir.join(binary), b"binary").expect("Failed to write binary");
    if with_metadata {
        let record = serde_json::json!({
            "release_id": 42,
            "tag_name": "v1.2.3",
            "published_at": "2024-05-01T00:00:00Z",
            "asset_id": 7,
            "asset_name": format!("msdfgen-{}.zip", platform),
            "asset_url": "https://example.invalid/asset.zip",
            "downloaded_at": "2024-05-02T00:00:00Z",
            "binary_hash": "0000"
        });
        fs::write(
            dir.join(".release-info.json"),
            serde_json::to_string_pretty(&record).unwrap(),
        )
        .expect("Failed to write metadata");
    }
}

#[test]
fn test_help_output() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .install()
        .arg("--help")
        .output()
        .expect("Failed to run msdfgen-install")
        .into();
    output
        .assert_success()
        .assert_stdout_contains("Usage: msdfgen-install")
        .assert_stdout_contains("--download-all")
        .assert_stdout_contains("--force")
        .assert_stdout_contains("SKIP_MSDFGEN_INSTALL")
        .assert_stdout_contains("hash verification is --verify-hash");

    let output: CommandOutput = ctx
        .status()
        .arg("--help")
        .output()
        .expect("Failed to run msdfgen-status")
        .into();
    output
        .assert_success()
        .assert_stdout_contains("Usage: msdfgen-status")
        .assert_stdout_contains("clean")
        .assert_stdout_contains("gatekeeper");
}

#[test]
fn test_skip_variable_short_circuits_default_install() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .install()
        .env("SKIP_MSDFGEN_INSTALL", "1")
        .output()
        .expect("Failed to run msdfgen-install")
        .into();

    output
        .assert_success()
        .assert_stderr_contains("Skipping msdfgen installation");
    assert!(!ctx.bin_dir.exists(), "nothing should be written when skipping");
}

#[test]
fn test_failed_default_install_does_not_fail_the_process() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .install()
        .output()
        .expect("Failed to run msdfgen-install")
        .into();

    output.assert_success();
    // On unsupported hosts the error is the platform, elsewhere the network.
    output.assert_stderr_contains("Installation failed");
}

#[test]
fn test_download_all_reports_failures_and_exits_nonzero() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .install()
        .arg("-a")
        .output()
        .expect("Failed to run msdfgen-install")
        .into();

    output
        .assert_exit_code(1)
        .assert_stdout_contains("Installation Summary:")
        .assert_stdout_contains("Successful: 0")
        .assert_stdout_contains("Failed: 5");
}

#[test]
fn test_unknown_platform_is_rejected() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .install()
        .args(["--platform", "amiga"])
        .output()
        .expect("Failed to run msdfgen-install")
        .into();

    assert!(!output.status.success());
    output.assert_stderr_contains("amiga");
}

#[test]
fn test_status_without_bin_dir() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .status()
        .output()
        .expect("Failed to run msdfgen-status")
        .into();

    output
        .assert_success()
        .assert_stdout_contains("Bin directory not found");
}

#[test]
fn test_status_lists_platforms() {
    let ctx = TestContext::new();
    seed_platform(&ctx, "linux", "msdfgen.linux", true);
    seed_platform(&ctx, "win32", "msdfgen.exe", false);

    let output: CommandOutput = ctx
        .status()
        .arg("status")
        .output()
        .expect("Failed to run msdfgen-status")
        .into();

    output
        .assert_success()
        .assert_stdout_contains("linux")
        .assert_stdout_contains("win32")
        .assert_stdout_contains("v1.2.3")
        .assert_stdout_contains("Found binaries: 2");
}

#[test]
fn test_status_json_format() {
    let ctx = TestContext::new();
    seed_platform(&ctx, "darwin", "msdfgen.osx", true);

    let output: CommandOutput = ctx
        .status()
        .args(["status", "--format", "json"])
        .output()
        .expect("Failed to run msdfgen-status")
        .into();

    output.assert_success();
    let report: serde_json::Value =
        serde_json::from_str(&output.stdout).expect("Output was not valid JSON");
    assert_eq!(report["found"], true);
    assert_eq!(report["platforms"][0]["platform"], "darwin");
    assert_eq!(report["platforms"][0]["metadata"]["record"]["release_id"], 42);

    let output: CommandOutput = ctx
        .status()
        .args(["status", "--format", "yaml"])
        .output()
        .expect("Failed to run msdfgen-status")
        .into();

    output.assert_success();
    let _: serde_yaml::Value =
        serde_yaml::from_str(&output.stdout).expect("Output was not valid YAML");
}

#[test]
fn test_clean_removes_metadata_but_keeps_binaries() {
    let ctx = TestContext::new();
    seed_platform(&ctx, "darwin", "msdfgen.osx", true);
    seed_platform(&ctx, "linux", "msdfgen.linux", true);
    seed_platform(&ctx, "win32", "msdfgen.exe", false);

    let output: CommandOutput = ctx
        .status()
        .arg("clean")
        .output()
        .expect("Failed to run msdfgen-status")
        .into();

    output
        .assert_success()
        .assert_stdout_contains("Removed metadata for darwin")
        .assert_stdout_contains("Removed metadata for linux")
        .assert_stdout_contains("No metadata found for win32");

    for (platform, binary) in [
        ("darwin", "msdfgen.osx"),
        ("linux", "msdfgen.linux"),
        ("win32", "msdfgen.exe"),
    ] {
        let dir = ctx.bin_dir.join(platform);
        assert!(dir.join(binary).exists());
        assert!(!dir.join(".release-info.json").exists());
    }
}

#[test]
fn test_clean_without_bin_dir_reports_and_succeeds() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .status()
        .arg("clean")
        .output()
        .expect("Failed to run msdfgen-status")
        .into();

    output
        .assert_success()
        .assert_stdout_contains("Bin directory not found");
}

#[test]
fn test_gatekeeper_missing_binary_reports_and_succeeds() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .status()
        .args(["gatekeeper", "does-not-exist"])
        .output()
        .expect("Failed to run msdfgen-status")
        .into();

    output
        .assert_success()
        .assert_stdout_contains("Binary not found");
}

#[test]
fn test_verify_hash_with_no_binaries() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .install()
        .env("SKIP_MSDFGEN_INSTALL", "1")
        .arg("--verify-hash")
        .output()
        .expect("Failed to run msdfgen-install")
        .into();

    output
        .assert_success()
        .assert_stdout_contains("Bin directory not found")
        .assert_stdout_contains("Found binaries: 0");
}
