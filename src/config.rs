use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound (100 years) applied before the value enters signed
/// duration arithmetic
const MAX_CLEANUP_AGE_HOURS: u64 = 24 * 365 * 100;

/// Application configuration, loaded once per process from a JSON file.
/// All fields are optional in the file; absent fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// How often to check drafts, in seconds
    pub check_interval_secs: u64,
    /// Age threshold for deleting empty drafts, in hours (default: 7 days)
    pub cleanup_age_hours: u64,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub address: String,
    pub password: String,
    pub imap_host: String,
    pub imap_port: u16,
    pub drafts_folder: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 3600,
            cleanup_age_hours: 7 * 24,
            email: EmailConfig::default(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            password: String::new(),
            imap_host: "imap.gmail.com".to_string(),
            imap_port: 993,
            drafts_folder: "[Gmail]/Drafts".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file. A missing file yields the
    /// defaults; a present but malformed file is an error. An empty
    /// password falls back to the EMAIL_PASSWORD environment variable.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str::<Self>(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Self::default()
        };

        if config.email.password.is_empty() {
            if let Ok(password) = std::env::var("EMAIL_PASSWORD") {
                config.email.password = password;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration out as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.check_interval_secs == 0 {
            bail!("check_interval_secs must be greater than zero");
        }
        if self.cleanup_age_hours > MAX_CLEANUP_AGE_HOURS {
            bail!(
                "cleanup_age_hours must be at most {}",
                MAX_CLEANUP_AGE_HOURS
            );
        }
        Ok(())
    }

    /// Scheduler period
    pub fn check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.check_interval_secs)
    }

    /// Retention threshold for empty drafts
    pub fn cleanup_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cleanup_age_hours as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.check_interval_secs, 3600);
        assert_eq!(config.cleanup_age_hours, 7 * 24);
        assert_eq!(config.email.imap_host, "imap.gmail.com");
        assert_eq!(config.email.imap_port, 993);
        assert_eq!(config.email.drafts_folder, "[Gmail]/Drafts");
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"cleanup_age_hours": 48}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.cleanup_age_hours, 48);
        assert_eq!(config.check_interval_secs, 3600);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.check_interval_secs = 600;
        config.email.address = "user@gmail.com".to_string();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.check_interval_secs, 600);
        assert_eq!(loaded.email.address, "user@gmail.com");
    }

    #[test]
    fn test_zero_check_interval_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"check_interval_secs": 0}"#).unwrap();

        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn test_oversized_cleanup_age_rejected() {
        // u64::MAX hours would wrap negative in the cutoff arithmetic,
        // putting the retention cutoff in the future
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            format!(r#"{{"cleanup_age_hours": {}}}"#, u64::MAX),
        )
        .unwrap();

        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn test_max_cleanup_age_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            format!(r#"{{"cleanup_age_hours": {}}}"#, MAX_CLEANUP_AGE_HOURS),
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.cleanup_age_hours, MAX_CLEANUP_AGE_HOURS);
        // Still converts to a positive duration
        assert!(config.cleanup_age() > chrono::Duration::zero());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn test_duration_accessors() {
        let config = AppConfig::default();
        assert_eq!(config.check_interval(), std::time::Duration::from_secs(3600));
        assert_eq!(config.cleanup_age(), chrono::Duration::days(7));
    }
}
