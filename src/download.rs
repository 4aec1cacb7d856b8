//! Turning a downloaded asset into an installed binary.

use crate::error::InstallError;
use crate::runner::ToolRunner;
use anyhow::{anyhow, Context, Result};
use flate2::read::GzDecoder;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tar::Archive;
use tempfile::TempDir;
use walkdir::WalkDir;

const ARCHIVE_EXTS: [&str; 5] = [".zip", ".tar", ".gz", ".tgz", ".xz"];
const LIBRARY_EXTS: [&str; 3] = [".dll", ".so", ".dylib"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Zip,
    Tar,
    Binary,
}

impl AssetKind {
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.ends_with(".zip") {
            AssetKind::Zip
        } else if name.ends_with(".tar")
            || name.ends_with(".gz")
            || name.ends_with(".tgz")
            || name.ends_with(".tar.xz")
        {
            AssetKind::Tar
        } else {
            AssetKind::Binary
        }
    }
}

/// Moves the binary contained in `download_path` to `target_path`, extracting
/// it first when the download is an archive. The archive is removed afterwards.
pub fn materialize(
    runner: &dyn ToolRunner,
    download_path: &Path,
    target_path: &Path,
    tool_name: &str,
) -> Result<()> {
    if download_path == target_path {
        return Ok(());
    }

    let asset_name = download_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    match AssetKind::from_name(&asset_name) {
        AssetKind::Binary => {
            fs::rename(download_path, target_path).with_context(|| {
                format!(
                    "Could not move {} to {}",
                    download_path.display(),
                    target_path.display()
                )
            })?;
        }
        kind => {
            let install_dir = target_path
                .parent()
                .ok_or_else(|| anyhow!("Target {} has no parent", target_path.display()))?;
            let staging = TempDir::new_in(install_dir)?;

            if let Err(e) = extract_archive(runner, kind, download_path, staging.path()) {
                tracing::warn!("Could not extract {} automatically.", asset_name);
                tracing::warn!(
                    "Please extract manually and place the {} binary at: {}",
                    tool_name,
                    target_path.display()
                );
                return Err(InstallError::ExtractionFailed {
                    archive: download_path.to_path_buf(),
                    target: target_path.to_path_buf(),
                    reason: format!("{:#}", e),
                }
                .into());
            }

            let extracted = find_binary_in_extracted(staging.path(), tool_name)
                .ok_or_else(|| InstallError::BinaryNotFound(target_path.to_path_buf()))?;
            tracing::debug!("Found extracted binary: {}", extracted.display());
            fs::rename(&extracted, target_path).with_context(|| {
                format!(
                    "Could not move {} to {}",
                    extracted.display(),
                    target_path.display()
                )
            })?;
        }
    }

    if download_path.exists() {
        if let Err(e) = fs::remove_file(download_path) {
            tracing::warn!(
                "Could not clean up downloaded file {}: {}",
                download_path.display(),
                e
            );
        }
    }

    Ok(())
}

/// Extracts with the system `unzip`/`tar`, falling back to the built-in
/// decoders when the tool is not installed.
pub fn extract_archive(
    runner: &dyn ToolRunner,
    kind: AssetKind,
    archive_path: &Path,
    extract_dir: &Path,
) -> Result<()> {
    let (program, args): (&str, Vec<&OsStr>) = match kind {
        AssetKind::Zip => {
            tracing::info!("Extracting from zip archive...");
            (
                "unzip",
                vec![
                    OsStr::new("-o"),
                    OsStr::new("-q"),
                    archive_path.as_os_str(),
                    OsStr::new("-d"),
                    extract_dir.as_os_str(),
                ],
            )
        }
        AssetKind::Tar => {
            tracing::info!("Extracting from tar archive...");
            (
                "tar",
                vec![
                    OsStr::new("-xf"),
                    archive_path.as_os_str(),
                    OsStr::new("-C"),
                    extract_dir.as_os_str(),
                ],
            )
        }
        AssetKind::Binary => return Err(anyhow!("{} is not an archive", archive_path.display())),
    };

    match runner.run(OsStr::new(program), &args) {
        Ok(output) if output.success => Ok(()),
        Ok(output) => Err(anyhow!(
            "{} exited with {:?}: {}",
            program,
            output.code,
            output.stderr.trim()
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("{} not available, using built-in extraction", program);
            match kind {
                AssetKind::Zip => extract_zip(archive_path, extract_dir),
                _ => extract_tar(archive_path, extract_dir),
            }
        }
        Err(e) => Err(anyhow!("Failed to run {}: {}", program, e)),
    }
}

fn extract_zip(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = match entry.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => {
                tracing::warn!("Skipping unsafe path in zip: {}", entry.name());
                continue;
            }
        };
        let outpath = extract_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = fs::File::create(&outpath)?;
            io::copy(&mut entry, &mut outfile)?;
        }
    }

    Ok(())
}

fn extract_tar(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let name = archive_path.to_string_lossy().to_lowercase();
    let file = fs::File::open(archive_path)?;

    if name.ends_with(".xz") {
        Archive::new(xz2::read::XzDecoder::new(file)).unpack(extract_dir)?;
    } else if name.ends_with(".gz") || name.ends_with(".tgz") {
        Archive::new(GzDecoder::new(file)).unpack(extract_dir)?;
    } else {
        Archive::new(file).unpack(extract_dir)?;
    }

    Ok(())
}

fn looks_like_binary(file_name: &str, tool_name: &str) -> bool {
    let name = file_name.to_lowercase();
    name.contains(&tool_name.to_lowercase())
        && !ARCHIVE_EXTS.iter().any(|ext| name.contains(ext))
        && !LIBRARY_EXTS.iter().any(|ext| name.ends_with(ext))
}

/// Depth-first walk of `extract_dir` (entries in name order) returning the
/// first file whose name looks like the tool's binary.
pub fn find_binary_in_extracted(extract_dir: &Path, tool_name: &str) -> Option<PathBuf> {
    WalkDir::new(extract_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .find(|e| looks_like_binary(&e.file_name().to_string_lossy(), tool_name))
        .map(|e| e.into_path())
}

/// Sets mode 0755 on Unix; no-op elsewhere.
pub fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
