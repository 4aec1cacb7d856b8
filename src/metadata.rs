use crate::config::METADATA_FILE_NAME;
use crate::types::{GitHubAsset, GitHubRelease, ReleaseMetadata};
use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Hex-encoded SHA-256 of a file's contents.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file =
        fs::File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Could not read {}", path.display()))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Like [`hash_file`], but logs and swallows failures.
pub fn try_hash_file(path: &Path) -> Option<String> {
    match hash_file(path) {
        Ok(hash) => Some(hash),
        Err(e) => {
            tracing::warn!("Could not calculate hash for {}: {:#}", path.display(), e);
            None
        }
    }
}

/// First 16 hex characters, for display.
pub fn short_hash(hash: &str) -> String {
    format!("{}...", hash.get(..16).unwrap_or(hash))
}

pub fn metadata_path(platform_dir: &Path) -> PathBuf {
    platform_dir.join(METADATA_FILE_NAME)
}

fn platform_dir_of(binary_path: &Path) -> Result<&Path> {
    binary_path
        .parent()
        .ok_or_else(|| anyhow!("Binary path {} has no parent", binary_path.display()))
}

/// Parses the metadata file in `platform_dir`.
pub fn load_metadata(platform_dir: &Path) -> Result<Option<ReleaseMetadata>> {
    let path = metadata_path(platform_dir);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Could not read release metadata at {}", path.display()))?;
    let metadata = serde_json::from_str(&content)
        .with_context(|| format!("Could not parse release metadata at {}", path.display()))?;
    Ok(Some(metadata))
}

/// Stored metadata for the binary at `binary_path`. Unreadable or corrupt
/// metadata counts as absent.
pub fn stored_release_info(binary_path: &Path) -> Option<ReleaseMetadata> {
    let platform_dir = platform_dir_of(binary_path).ok()?;
    match load_metadata(platform_dir) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!("{:#}", e);
            None
        }
    }
}

/// Records `release`/`asset` and the binary's current hash beside it.
pub fn store_release_info(
    binary_path: &Path,
    release: &GitHubRelease,
    asset: &GitHubAsset,
) -> Result<ReleaseMetadata> {
    let platform_dir = platform_dir_of(binary_path)?;
    fs::create_dir_all(platform_dir)?;

    let metadata = ReleaseMetadata::new(release, asset, try_hash_file(binary_path));
    let path = metadata_path(platform_dir);
    let content = serde_json::to_string_pretty(&metadata)?;
    fs::write(&path, content)
        .with_context(|| format!("Could not store release metadata at {}", path.display()))?;

    tracing::info!("Stored release metadata: {}", path.display());
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn release() -> GitHubRelease {
        GitHubRelease {
            id: 42,
            tag_name: "v1.12".to_string(),
            published_at: Some("2024-05-01T10:00:00Z".to_string()),
            assets: vec![],
        }
    }

    fn asset() -> GitHubAsset {
        GitHubAsset {
            id: 7,
            name: "msdfgen-linux-x64.zip".to_string(),
            browser_download_url: "https://example.invalid/msdfgen-linux-x64.zip".to_string(),
            size: Some(3),
        }
    }

    #[test]
    fn test_hash_file_known_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            hash_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0123456789abcdef0123"), "0123456789abcdef...");
        assert_eq!(short_hash("abc"), "abc...");
    }

    #[test]
    fn test_store_then_read_matches_binary_hash() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("linux").join("msdfgen.linux");
        fs::create_dir_all(binary.parent().unwrap()).unwrap();
        fs::write(&binary, b"binary contents").unwrap();

        let stored = store_release_info(&binary, &release(), &asset()).unwrap();
        let loaded = stored_release_info(&binary).unwrap();

        assert_eq!(stored, loaded);
        assert_eq!(loaded.release_id, 42);
        assert_eq!(loaded.asset_id, 7);
        assert_eq!(loaded.binary_hash, Some(hash_file(&binary).unwrap()));
    }

    #[test]
    fn test_corrupt_metadata_counts_as_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(metadata_path(dir.path()), "{ not json").unwrap();
        let binary = dir.path().join("msdfgen.linux");

        assert!(load_metadata(dir.path()).is_err());
        assert!(stored_release_info(&binary).is_none());
    }

    #[test]
    fn test_reads_metadata_written_by_node_installer() {
        let dir = TempDir::new().unwrap();
        let json = r#"{
  "release_id": 1,
  "tag_name": "v1.0.0",
  "published_at": "2024-01-01T00:00:00Z",
  "asset_id": 2,
  "asset_name": "msdfgen-linux-x64.zip",
  "asset_url": "https://example.invalid/a.zip",
  "downloaded_at": "2024-01-02T03:04:05.678Z",
  "binary_hash": null
}"#;
        fs::write(metadata_path(dir.path()), json).unwrap();

        let metadata = load_metadata(dir.path()).unwrap().unwrap();
        assert_eq!(metadata.tag_name, "v1.0.0");
        assert_eq!(metadata.binary_hash, None);
    }
}
