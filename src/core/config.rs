use crate::core::allocation::SectorAllocation;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UniversesConfig {
    /// CSV with a `Symbol` column.
    pub mid_cap: PathBuf,
    /// CSV with `Symbol` and `Sector` columns.
    pub broad_market: PathBuf,
}

impl Default for UniversesConfig {
    fn default() -> Self {
        UniversesConfig {
            mid_cap: PathBuf::from("./mid-cap.csv"),
            broad_market: PathBuf::from("./s&p500.csv"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

impl ProvidersConfig {
    pub fn yahoo_base_url(&self) -> &str {
        self.yahoo
            .as_ref()
            .map_or("https://query1.finance.yahoo.com", |p| &p.base_url)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub universes: UniversesConfig,
    #[serde(default)]
    pub sector_allocation: SectorAllocation,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    /// Loads the default config file, or built-in defaults when it does not exist.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "stockalloc", "stockalloc")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocation::SectorTarget;

    #[test]
    fn test_default_config_matches_defaults() {
        let config: AppConfig =
            serde_yaml::from_str(include_str!("../../docs/example_config.yaml"))
                .expect("Failed to deserialize");
        assert_eq!(config.sector_allocation, SectorAllocation::default());
        assert_eq!(config.universes.mid_cap, PathBuf::from("./mid-cap.csv"));
        assert_eq!(config.universes.broad_market, PathBuf::from("./s&p500.csv"));
        assert_eq!(
            config.providers.yahoo_base_url(),
            "https://query1.finance.yahoo.com"
        );
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
universes:
  mid_cap: "/data/mid.csv"
  broad_market: "/data/sp.csv"
sector_allocation:
  - sector: "Energy"
    fraction: 0.7
  - sector: "Technology"
    fraction: 0.5
providers:
  yahoo:
    base_url: "http://example.com/yahoo"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.universes.mid_cap, PathBuf::from("/data/mid.csv"));
        assert_eq!(config.universes.broad_market, PathBuf::from("/data/sp.csv"));
        // Order is kept and fractions are not renormalized.
        assert_eq!(
            config.sector_allocation,
            SectorAllocation::new(vec![
                SectorTarget::new("Energy", 0.7),
                SectorTarget::new("Technology", 0.5),
            ])
        );
        assert_eq!(config.providers.yahoo_base_url(), "http://example.com/yahoo");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.sector_allocation.len(), 4);
        assert!(config.providers.yahoo.is_some());
    }

    #[test]
    fn test_load_from_path_reports_file() {
        let err = AppConfig::load_from_path("/nonexistent/config.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
