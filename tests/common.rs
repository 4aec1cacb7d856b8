use msdfgen_install::runner::{ToolOutput, ToolRunner};
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Mutex;
use tempfile::TempDir;

// Each test binary only uses part of these helpers.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub bin_dir: PathBuf,
    pub install_path: PathBuf,
    pub status_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let bin_dir = temp_dir.path().join("bin");

        Self {
            bin_dir,
            install_path: PathBuf::from(env!("CARGO_BIN_EXE_msdfgen-install")),
            status_path: PathBuf::from(env!("CARGO_BIN_EXE_msdfgen-status")),
            _temp_dir: temp_dir,
        }
    }

    fn isolate(&self, mut cmd: Command) -> Command {
        cmd.current_dir(self._temp_dir.path());
        cmd.env("MSDFGEN_BIN_DIR", &self.bin_dir);
        // Nothing in these tests may reach the real GitHub API.
        cmd.env("MSDFGEN_API_URL", "http://127.0.0.1:9");
        cmd.env_remove("SKIP_MSDFGEN_INSTALL");
        cmd.env_remove("GITHUB_TOKEN");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn install(&self) -> Command {
        self.isolate(Command::new(&self.install_path))
    }

    pub fn status(&self) -> Command {
        self.isolate(Command::new(&self.status_path))
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_exit_code(&self, code: i32) -> &Self {
        assert_eq!(
            self.status.code(),
            Some(code),
            "unexpected exit status\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}

/// Stands in for `unzip`/`tar`/`xattr`/`codesign` and the installed binary.
///
/// "Extracting" an archive copies its bytes to `<dest>/msdfgen-release/msdfgen`,
/// so the installed binary's hash equals the served asset's hash.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeTools {
    pub calls: Mutex<Vec<Vec<String>>>,
    pub broken_binaries: bool,
}

#[allow(dead_code)]
impl FakeTools {
    pub fn calls_to(&self, program: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c[0] == program || c[0].ends_with(program))
            .count()
    }

    fn extract(archive: &Path, dest: &Path) -> io::Result<ToolOutput> {
        let nested = dest.join("msdfgen-release");
        std::fs::create_dir_all(&nested)?;
        std::fs::write(nested.join("README.md"), b"docs")?;
        std::fs::copy(archive, nested.join("msdfgen"))?;
        Ok(ToolOutput::ok())
    }
}

impl ToolRunner for FakeTools {
    fn run(&self, program: &OsStr, args: &[&OsStr]) -> io::Result<ToolOutput> {
        let mut call = vec![program.to_string_lossy().to_string()];
        call.extend(args.iter().map(|a| a.to_string_lossy().to_string()));
        self.calls.lock().unwrap().push(call.clone());

        match call[0].as_str() {
            // unzip -o -q <archive> -d <dest>
            "unzip" => Self::extract(Path::new(&call[3]), Path::new(&call[5])),
            // tar -xf <archive> -C <dest>
            "tar" => Self::extract(Path::new(&call[2]), Path::new(&call[4])),
            "xattr" | "codesign" => Ok(ToolOutput::ok()),
            _ if self.broken_binaries => Ok(ToolOutput::failed(126, "cannot execute")),
            _ => Ok(ToolOutput::ok()),
        }
    }
}
