//! Config Discovery

use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

const SEPARATOR: char = '/';

/// Errors listing the configuration folder
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to read config folder {path:?}: {source}")]
    ReadDir {
        path: String,
        source: std::io::Error,
    },
}

/// List every entry of `folder` as `folder/ + name`, sorted by name.
///
/// No filtering is applied: sub-directories and non-JSON files are returned
/// too, and deciding what to do with them is up to the consumer.
pub fn discover_config_files(folder: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let read_err = |source| DiscoveryError::ReadDir {
        path: folder.to_string(),
        source,
    };

    let mut names = std::fs::read_dir(folder)
        .map_err(read_err)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_err)?;
    names.sort();

    let prefix = with_trailing_separator(folder);
    let files: Vec<PathBuf> = names
        .into_iter()
        .map(|name| {
            let mut path = OsString::from(&prefix);
            path.push(name);
            PathBuf::from(path)
        })
        .collect();

    debug!(folder, count = files.len(), "discovered config files");
    Ok(files)
}

/// Normalize `folder` to end with exactly one separator
fn with_trailing_separator(folder: &str) -> String {
    let mut normalized = folder.trim_end_matches(SEPARATOR).to_string();
    normalized.push(SEPARATOR);
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_trailing_separator() {
        assert_eq!(with_trailing_separator("/config"), "/config/");
        assert_eq!(with_trailing_separator("/config/"), "/config/");
        assert_eq!(with_trailing_separator("/config//"), "/config/");
        assert_eq!(with_trailing_separator("/"), "/");
        assert_eq!(with_trailing_separator("relative"), "relative/");
    }

    #[test]
    fn test_lists_every_entry_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tenant-b.json"), "{}").unwrap();
        fs::write(dir.path().join("tenant-a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let folder = dir.path().to_str().unwrap().to_string();
        let files = discover_config_files(&folder).unwrap();

        let expected: Vec<PathBuf> = ["nested", "notes.txt", "tenant-a.json", "tenant-b.json"]
            .iter()
            .map(|name| PathBuf::from(format!("{folder}/{name}")))
            .collect();
        assert_eq!(files, expected);
    }

    #[test]
    fn test_folder_with_trailing_separator() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tenant.json"), "{}").unwrap();

        let folder = format!("{}/", dir.path().to_str().unwrap());
        let files = discover_config_files(&folder).unwrap();

        assert_eq!(files, vec![PathBuf::from(format!("{folder}tenant.json"))]);
    }

    #[test]
    fn test_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let files = discover_config_files(dir.path().to_str().unwrap()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_missing_folder() {
        let err = discover_config_files("/nonexistent/postee/config").unwrap_err();
        let DiscoveryError::ReadDir { path, .. } = err;
        assert_eq!(path, "/nonexistent/postee/config");
    }

    #[test]
    fn test_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cfg.json");
        fs::write(&file, "{}").unwrap();

        assert!(discover_config_files(file.to_str().unwrap()).is_err());
    }
}
