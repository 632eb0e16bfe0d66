//! Configuration for vendor analytics

use serde::{Deserialize, Serialize};

/// Analytics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Products listed in the top sellers table
    pub top_products_limit: usize,

    /// Window for "recent sales" (days)
    pub recent_window_days: i64,

    /// Length of each period compared for growth (days)
    pub growth_window_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            top_products_limit: 5,
            recent_window_days: 7,
            growth_window_days: 30,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject non-positive windows
    pub fn validate(&self) -> crate::Result<()> {
        if self.recent_window_days <= 0 || self.growth_window_days <= 0 {
            return Err(crate::Error::Config(
                "recent_window_days and growth_window_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.top_products_limit, 5);
        assert_eq!(config.recent_window_days, 7);
        assert_eq!(config.growth_window_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.toml");
        std::fs::write(&path, "top_products_limit = 3\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.top_products_limit, 3);
        assert_eq!(config.recent_window_days, 7);
    }

    #[test]
    fn test_zero_window_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.toml");
        std::fs::write(&path, "growth_window_days = 0\n").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(crate::Error::Config(_))
        ));
    }
}
