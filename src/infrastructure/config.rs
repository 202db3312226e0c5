use crate::domain::grid::GridTemplate;
use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub grid: GridSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageSettings {
    pub pages_file: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            pages_file: PathBuf::from("pages.json"),
            data_dir: PathBuf::from("./database"),
        }
    }
}

/// Optional override of the standard page grid, one list of slot labels per row
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GridSettings {
    pub rows: Option<Vec<Vec<String>>>,
}

impl AppConfig {
    pub fn grid_template(&self) -> anyhow::Result<GridTemplate> {
        match &self.grid.rows {
            Some(rows) => GridTemplate::from_labels(rows).context("invalid grid template in configuration"),
            None => Ok(GridTemplate::standard()),
        }
    }
}

/// Defaults, then `config/dashboard.*` if present, then `DASHBOARD__*` environment variables
pub fn load_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn parse(toml: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = parse("[storage]\ndata_dir = \"/srv/data\"\n");
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.storage.pages_file, PathBuf::from("pages.json"));
        assert_eq!(config.storage.data_dir, PathBuf::from("/srv/data"));
        assert_eq!(config.grid_template().unwrap(), GridTemplate::standard());
    }

    #[test]
    fn test_grid_override() {
        let config = parse(
            r#"
            [grid]
            rows = [["ROW1, COL1", "ROW1, COL2"], ["FULL ROW 2"]]
            "#,
        );
        let grid = config.grid_template().unwrap();
        assert_eq!(grid.rows().len(), 2);
        assert_eq!(grid.rows()[1].number, 2);
    }

    #[test]
    fn test_bad_grid_override_is_rejected() {
        let config = parse("[grid]\nrows = [[\"ROW, COL\"]]\n");
        assert!(config.grid_template().is_err());
    }
}
