use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};
use tracing::debug;

/// One target holding: a ticker symbol and its target weight in percentage
/// points. Weights are renormalized to a 100-point total on load, so a
/// hand-edited file never has to balance itself.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Holding {
    pub symbol: String,
    pub weight: f64,
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

fn default_usd_to_cad() -> f64 {
    1.4
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Cash to spend, in CAD.
    pub budget: f64,
    pub holdings: Vec<Holding>,
    /// Symbol shielded from donating weight and first in line for freed
    /// weight and leftover cash. Defaults to the first holding.
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// USD→CAD rate used when the live rate cannot be fetched.
    #[serde(default = "default_usd_to_cad")]
    pub usd_to_cad: f64,
}

impl AppConfig {
    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "allot", "allot")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// The effective priority symbol: the configured one, defaulting to the
    /// first holding.
    pub fn effective_priority(&self) -> Option<String> {
        self.priority
            .clone()
            .or_else(|| self.holdings.first().map(|h| h.symbol.clone()))
    }

    /// Writes the configuration back; weight edits are persisted here since
    /// the CLI owns storage for the rebalancer's state.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_str =
            serde_yaml::to_string(self).context("Failed to serialize configuration")?;
        fs::write(path.as_ref(), config_str)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
        debug!("Saved config to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
budget: 1000.0
priority: "SPUS"
holdings:
  - symbol: "SPUS"
    weight: 50
  - symbol: "SPRE"
    weight: 25
  - symbol: "SPSK"
    weight: 15
  - symbol: "WSHR"
    weight: 10
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.budget, 1000.0);
        assert_eq!(config.priority.as_deref(), Some("SPUS"));
        assert_eq!(config.holdings.len(), 4);
        assert_eq!(config.holdings[0].symbol, "SPUS");
        assert_eq!(config.holdings[0].weight, 50.0);
        // Defaults kick in for the omitted sections
        assert_eq!(config.usd_to_cad, 1.4);
        assert!(config.providers.yahoo.is_some());
        assert_eq!(
            config.providers.yahoo.unwrap().base_url,
            "https://query1.finance.yahoo.com"
        );

        let yaml_str_with_providers = r#"
budget: 250.0
holdings:
  - symbol: "VTI"
    weight: 100
providers:
  yahoo:
    base_url: "http://example.com/yahoo"
usd_to_cad: 1.32
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str_with_providers).unwrap();
        assert!(config.priority.is_none());
        assert_eq!(config.usd_to_cad, 1.32);
        assert_eq!(
            config.providers.yahoo.unwrap().base_url,
            "http://example.com/yahoo"
        );
    }

    #[test]
    fn test_config_round_trip() -> Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        let path = temp_dir.path().join("config.yaml");

        let config = AppConfig {
            budget: 500.0,
            holdings: vec![
                Holding {
                    symbol: "SPUS".to_string(),
                    weight: 60.0,
                },
                Holding {
                    symbol: "WSHR".to_string(),
                    weight: 40.0,
                },
            ],
            priority: Some("SPUS".to_string()),
            providers: ProvidersConfig::default(),
            usd_to_cad: 1.4,
        };

        config.save_to_path(&path)?;
        let loaded = AppConfig::load_from_path(&path)?;
        assert_eq!(loaded.budget, 500.0);
        assert_eq!(loaded.holdings.len(), 2);
        assert_eq!(loaded.holdings[1].symbol, "WSHR");
        assert_eq!(loaded.priority.as_deref(), Some("SPUS"));
        Ok(())
    }
}
