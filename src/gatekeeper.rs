//! macOS Gatekeeper workarounds for downloaded binaries.
//!
//! Binaries fetched over HTTP carry the `com.apple.quarantine` attribute and
//! an unsigned binary is refused on Apple Silicon. Clearing the attribute and
//! applying an ad-hoc signature lets the binary run. None of this is fatal:
//! failures are reported along with manual remediation steps.

use crate::runner::{smoke_test, ToolRunner};
use std::ffi::OsStr;
use std::path::Path;

const QUARANTINE_ATTR: &str = "com.apple.quarantine";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostProcessReport {
    pub quarantine_removed: bool,
    pub attributes_cleared: bool,
    pub signed: bool,
}

fn succeeded(runner: &dyn ToolRunner, program: &str, args: &[&OsStr]) -> bool {
    match runner.run(OsStr::new(program), args) {
        Ok(output) => {
            if !output.success {
                tracing::debug!("{} failed: {}", program, output.stderr.trim());
            }
            output.success
        }
        Err(e) => {
            tracing::debug!("Could not run {}: {}", program, e);
            false
        }
    }
}

/// Removes the quarantine attribute (a missing attribute is fine), clears any
/// other extended attributes, then applies an ad-hoc code signature.
pub fn remove_quarantine(runner: &dyn ToolRunner, binary: &Path) -> PostProcessReport {
    let mut report = PostProcessReport::default();
    let path = binary.as_os_str();

    tracing::info!("Removing macOS quarantine attribute...");
    report.quarantine_removed = succeeded(
        runner,
        "xattr",
        &[OsStr::new("-d"), OsStr::new(QUARANTINE_ATTR), path],
    );
    if report.quarantine_removed {
        tracing::info!("Quarantine attribute removed");
    } else {
        tracing::info!("No quarantine attribute found (this is normal)");
    }

    report.attributes_cleared = succeeded(runner, "xattr", &[OsStr::new("-c"), path]);
    if report.attributes_cleared {
        tracing::debug!("Extended attributes cleared");
    } else {
        tracing::info!("No extended attributes to clear");
    }

    tracing::info!("Applying ad-hoc code signature...");
    report.signed = succeeded(
        runner,
        "codesign",
        &[
            OsStr::new("--force"),
            OsStr::new("--deep"),
            OsStr::new("--sign"),
            OsStr::new("-"),
            path,
        ],
    );
    if report.signed {
        tracing::info!("Ad-hoc code signature applied");
    } else {
        tracing::warn!("Could not apply code signature (codesign might not be available)");
        tracing::warn!(
            "You may need to manually allow the binary in System Settings > Privacy & Security"
        );
    }

    report
}

/// Manual steps for getting a blocked binary past Gatekeeper.
pub fn guidance(binary: &Path) -> Vec<String> {
    let path = binary.display();
    vec![
        "If you see a security warning, please follow these steps:".to_string(),
        "1. Open System Settings > Privacy & Security".to_string(),
        "2. Click \"Allow Anyway\" next to the blocked msdfgen binary".to_string(),
        "3. Or run this command in terminal:".to_string(),
        format!("   sudo spctl --add \"{}\"", path),
        "4. Alternative: Disable Gatekeeper temporarily:".to_string(),
        "   sudo spctl --master-disable".to_string(),
        "   (Remember to re-enable: sudo spctl --master-enable)".to_string(),
        "After allowing the binary, you can test it with:".to_string(),
        format!("   \"{}\" --help", path),
    ]
}

/// Smoke-tests the binary, printing Gatekeeper guidance on macOS when it
/// does not run.
pub fn verify_runs(runner: &dyn ToolRunner, binary: &Path, on_macos: bool) -> bool {
    if smoke_test(runner, binary) {
        tracing::info!("Binary is working correctly");
        return true;
    }

    if on_macos {
        tracing::warn!("Binary execution failed on macOS");
        for line in guidance(binary) {
            tracing::warn!("{}", line);
        }
    } else {
        tracing::warn!("Binary may not be working correctly, but installation completed");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ToolOutput;
    use std::io;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        failing: Vec<&'static str>,
    }

    impl ToolRunner for Recorder {
        fn run(&self, program: &OsStr, args: &[&OsStr]) -> io::Result<ToolOutput> {
            let program = program.to_string_lossy().to_string();
            let mut line = program.clone();
            for arg in args {
                line.push(' ');
                line.push_str(&arg.to_string_lossy());
            }
            self.calls.lock().unwrap().push(line.clone());

            if program == "codesign" && self.failing.contains(&"codesign-missing") {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no codesign"));
            }
            if self.failing.iter().any(|f| line.starts_with(f)) {
                Ok(ToolOutput::failed(1, "No such xattr: com.apple.quarantine"))
            } else {
                Ok(ToolOutput::ok())
            }
        }
    }

    #[test]
    fn test_runs_xattr_then_codesign() {
        let runner = Recorder::default();
        let report = remove_quarantine(&runner, Path::new("/bin/darwin/msdfgen.osx"));

        assert_eq!(
            *runner.calls.lock().unwrap(),
            vec![
                "xattr -d com.apple.quarantine /bin/darwin/msdfgen.osx",
                "xattr -c /bin/darwin/msdfgen.osx",
                "codesign --force --deep --sign - /bin/darwin/msdfgen.osx",
            ]
        );
        assert_eq!(
            report,
            PostProcessReport {
                quarantine_removed: true,
                attributes_cleared: true,
                signed: true
            }
        );
    }

    #[test]
    fn test_missing_attribute_and_codesign_are_tolerated() {
        let runner = Recorder {
            failing: vec!["xattr -d", "codesign-missing"],
            ..Default::default()
        };
        let report = remove_quarantine(&runner, Path::new("msdfgen.osx"));

        assert!(!report.quarantine_removed);
        assert!(report.attributes_cleared);
        assert!(!report.signed);
        assert_eq!(runner.calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_verify_runs_uses_help_flag() {
        let runner = Recorder::default();
        assert!(verify_runs(&runner, Path::new("msdfgen.osx"), true));
        assert_eq!(*runner.calls.lock().unwrap(), vec!["msdfgen.osx --help"]);

        let failing = Recorder {
            failing: vec!["msdfgen.osx"],
            ..Default::default()
        };
        assert!(!verify_runs(&failing, Path::new("msdfgen.osx"), true));
    }

    #[test]
    fn test_guidance_mentions_binary_path() {
        let lines = guidance(Path::new("/tmp/msdfgen.osx"));
        assert!(lines.iter().any(|l| l.contains("spctl --add \"/tmp/msdfgen.osx\"")));
    }
}
