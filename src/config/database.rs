use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    Delete,
    Truncate,
    #[default]
    Wal,
}

impl JournalMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Wal => "WAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub data_dir: PathBuf,
    pub db_file: String,
    /// How long a call waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    pub journal_mode: JournalMode,
}

impl DatabaseConfig {
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }

    /// Reads a TOML config file. Fields missing from the file keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.db_file.trim().is_empty() {
            return Err(Error::Config("db_file cannot be empty".to_string()));
        }
        if self.db_file.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "db_file must be a file name, not a path: {}",
                self.db_file
            )));
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            db_file: "gitops.db".to_string(),
            busy_timeout_ms: 5000,
            journal_mode: JournalMode::Wal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.db_path(), PathBuf::from("./data/gitops.db"));
        assert_eq!(config.journal_mode.as_str(), "WAL");
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gitops-db.toml");
        std::fs::write(&path, "data_dir = \"/var/lib/gitops\"\njournal_mode = \"delete\"\n")
            .unwrap();

        let config = DatabaseConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/gitops"));
        assert_eq!(config.journal_mode, JournalMode::Delete);
        assert_eq!(config.db_file, "gitops.db");
        assert_eq!(config.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gitops-db.toml");
        std::fs::write(&path, "port = 8080\n").unwrap();

        assert!(matches!(DatabaseConfig::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_rejects_path_as_db_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gitops-db.toml");
        std::fs::write(&path, "db_file = \"nested/gitops.db\"\n").unwrap();

        assert!(matches!(DatabaseConfig::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let result = DatabaseConfig::load(temp.path().join("absent.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
