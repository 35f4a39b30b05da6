use anyhow::{Context, Result};
use serde::Deserialize;
use sheet_ledger::LedgerConfig;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigWorkbook {
    /// Directory holding `Inventory.csv`, `Sales.csv` and `Purchases.csv`,
    /// relative to the config file.
    pub dir: PathBuf,
}

impl Default for ConfigWorkbook {
    fn default() -> Self {
        ConfigWorkbook {
            dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub workbook: ConfigWorkbook,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl Config {
    /// Load the config at `path`, returning it along with the directory it was found in.
    pub fn load_from_file(path: &Path) -> Result<(PathBuf, Self)> {
        let base_dir = path.parent().map(ToOwned::to_owned).unwrap_or_default();

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok((base_dir, config))
    }

    /// Load `path` if given, otherwise the config in the current directory or the defaults.
    pub fn load(path: Option<&Path>) -> Result<(PathBuf, Self)> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::find_and_load()?.unwrap_or_default()),
        }
    }

    pub fn find_and_load() -> Result<Option<(PathBuf, Self)>> {
        let config_locations = [
            Path::new("sheet-ledger.toml"),
            Path::new(".sheet-ledger.toml"),
        ];

        for location in &config_locations {
            if location.exists() {
                return Self::load_from_file(location).map(Some);
            }
        }

        Ok(None)
    }

    /// The workbook directory, resolved against the directory of the config file.
    pub fn workbook_dir(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.workbook.dir)
    }
}
