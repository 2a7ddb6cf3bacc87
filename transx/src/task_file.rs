//! Loading migration tasks from JSON task files.
//!
//! ```json
//! {
//!   "source": {
//!     "username": "admin",
//!     "hostAddress": "db1.example.com",
//!     "sshPort": 22,
//!     "dataPath": "/var/backups/db/",
//!     "privateKeyPath": "~/.ssh/id_ed25519",
//!     "backupCommand": "mysqldump --all-databases > /var/backups/db/all.sql"
//!   },
//!   "destination": {
//!     "dataPath": "/srv/restore/db",
//!     "restoreCommand": "mysql < /srv/restore/db/all.sql"
//!   },
//!   "syncOptions": { "archive": true, "compress": true, "exclude": ["*.tmp"] }
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use common::MigrationTask;

/// Parse task file contents without validating them
pub fn parse(text: &str) -> Result<MigrationTask> {
    let task = serde_json::from_str(text).context("invalid task file")?;
    Ok(task)
}

fn resolve(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    Ok(cwd.join(path))
}

/// Read, parse, expand `~/` in key paths and validate the task stored at `path`
pub async fn load(path: &Path) -> Result<MigrationTask> {
    let path = resolve(path)?;
    tracing::debug!("loading task file {}", path.display());
    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read task file {}", path.display()))?;
    let mut task =
        parse(&text).with_context(|| format!("failed to parse task file {}", path.display()))?;
    task.expand_key_paths()?;
    common::validate(&task)
        .with_context(|| format!("invalid migration task in {}", path.display()))?;
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{MigrationMode, ValidationError};

    const RELAY: &str = r#"{
        "source": {"username": "u1", "hostAddress": "h1", "dataPath": "/src", "sshPort": 2222},
        "destination": {"username": "u2", "hostAddress": "h2", "dataPath": "/dst"},
        "syncOptions": {"archive": true, "dryRun": true, "include": ["*.sql"]}
    }"#;

    #[test]
    fn parses_camel_case_keys() {
        let task = parse(RELAY).unwrap();
        assert_eq!(task.mode(), MigrationMode::Relay);
        assert_eq!(task.source.ssh_port, 2222);
        assert!(task.sync_options.archive);
        assert!(task.sync_options.dry_run);
        assert_eq!(task.sync_options.include, vec!["*.sql"]);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = parse(
            r#"{"source": {"dataPath": "/a", "hostIP": "h"}, "destination": {"dataPath": "/b"}}"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("hostIP"), "{err:#}");
    }

    #[tokio::test]
    async fn load_expands_home_in_key_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.json");
        std::fs::write(
            &path,
            r#"{"source": {"dataPath": "/a"},
                "destination": {
                    "hostAddress": "h", "dataPath": "/b", "privateKeyPath": "~/.ssh/id"
                }}"#,
        )
        .unwrap();
        let task = load(&path).await.unwrap();
        let expected = common::home::expand_home("~/.ssh/id").unwrap().unwrap();
        assert_eq!(task.destination.private_key_path, expected);
        assert!(!expected.starts_with('~'));
        assert_eq!(task.source.private_key_path, "");
    }

    #[tokio::test]
    async fn load_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.json");
        std::fs::write(
            &path,
            r#"{"source": {"hostAddress": "h", "sshPort": 70000, "dataPath": "/a"},
                "destination": {"dataPath": "/b"}}"#,
        )
        .unwrap();
        let err = load(&path).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::InvalidPort { port: 70000, .. })
        ));
    }

    #[tokio::test]
    async fn negative_port_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.json");
        std::fs::write(
            &path,
            r#"{"source": {"dataPath": "/a"},
                "destination": {"hostAddress": "h", "sshPort": -1, "dataPath": "/b"}}"#,
        )
        .unwrap();
        let err = load(&path).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::InvalidPort { port: -1, .. })
        ));
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("missing.json")).await.unwrap_err();
        assert!(format!("{err:#}").contains("missing.json"));
    }
}
