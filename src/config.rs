use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub columns: ColumnConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub data_csv: PathBuf,
}

/// Header labels of the identity and area columns in the population table.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ColumnConfig {
    pub country: String,
    pub code: String,
    pub area: String,
    pub capital: Option<String>,
    pub continent: Option<String>,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            country: "Country/Territory".to_string(),
            code: "CCA3".to_string(),
            area: "Area (km²)".to_string(),
            capital: Some("Capital".to_string()),
            continent: Some("Continent".to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub default_country: Option<String>,
    pub template: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_country: Some("India".to_string()),
            template: "plotly_dark".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [input]
            data_csv = "world_population.csv"

            [server]
            port = 8050
            "#,
        )
        .unwrap();

        assert_eq!(config.columns.country, "Country/Territory");
        assert_eq!(config.columns.area, "Area (km²)");
        assert_eq!(config.dashboard.template, "plotly_dark");
        assert_eq!(config.dashboard.default_country.as_deref(), Some("India"));
        assert_eq!(config.server.static_dir, PathBuf::from("static"));
    }

    #[test]
    fn column_overrides_are_respected() {
        let config = AppConfig::from_toml(
            r#"
            [input]
            data_csv = "pop.csv"

            [columns]
            country = "Name"
            code = "ISO3"
            area = "Area"

            [dashboard]
            default_country = "Chile"

            [server]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(config.columns.country, "Name");
        assert_eq!(config.columns.code, "ISO3");
        // Unset fields inside an explicit section still take the struct default
        assert_eq!(config.columns.capital.as_deref(), Some("Capital"));
        assert_eq!(config.dashboard.template, "plotly_dark");
    }

    #[test]
    fn missing_server_section_is_rejected() {
        let err = AppConfig::from_toml("[input]\ndata_csv = \"a.csv\"\n");
        assert!(err.is_err());
    }
}
