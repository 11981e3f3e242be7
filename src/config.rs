use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::script::SplitMode;

/// A dataset and the script it is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub name: String,
    pub script: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlPracticeConfig {
    /// Where `<name>.db` files and `app_meta.db` live
    pub data_dir: String,
    /// Directory searched for scripts before the bundled copies
    pub assets_dir: Option<String>,
    /// Exercise collection file; bundled collection when unset
    pub catalog: Option<String>,
    pub slides_dir: Option<String>,
    /// Dataset exercises are graded against
    pub exercise_dataset: String,
    pub split_mode: SplitMode,
    pub require_sign_in: bool,
    pub datasets: Vec<DatasetSpec>,
}

impl Default for SqlPracticeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().into_owned(),
            assets_dir: None,
            catalog: None,
            slides_dir: None,
            exercise_dataset: "rent_a_house".to_string(),
            split_mode: SplitMode::Lines,
            require_sign_in: true,
            datasets: vec![DatasetSpec {
                name: "rent_a_house".to_string(),
                script: "rent_a_house.sql".to_string(),
            }],
        }
    }
}

impl SqlPracticeConfig {
    pub fn dataset(&self, name: &str) -> Option<&DatasetSpec> {
        self.datasets.iter().find(|d| d.name == name)
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Metadata database, kept in its own directory outside the dataset root
    pub fn meta_db_path(&self) -> PathBuf {
        self.data_path().join(META_DIR).join(crate::storage::META_DB_NAME)
    }
}

/// Subdirectory of `data_dir` holding `app_meta.db`
pub const META_DIR: &str = "meta";

pub fn default_config_path() -> PathBuf {
    PathBuf::from("sqlpractice.toml")
}

pub fn default_data_dir() -> PathBuf {
    PathBuf::from(".sqlpractice")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<SqlPracticeConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: SqlPracticeConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &SqlPracticeConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_data_dir(config: &SqlPracticeConfig) -> anyhow::Result<()> {
    let dir = config.data_path();
    if !dir.as_os_str().is_empty() && !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&tmp.path().join("nope.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_write_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sqlpractice.toml");
        let mut config = SqlPracticeConfig::default();
        config.split_mode = SplitMode::QuoteAware;
        config.datasets.push(DatasetSpec { name: "truck_rental".into(), script: "truck_rental.sql".into() });

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.split_mode, SplitMode::QuoteAware);
        assert_eq!(loaded.dataset("truck_rental").unwrap().script, "truck_rental.sql");
        assert!(loaded.require_sign_in);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SqlPracticeConfig = toml::from_str("data_dir = \"/tmp/practice\"\nsplit_mode = \"quote-aware\"\n").unwrap();
        assert_eq!(config.data_dir, "/tmp/practice");
        assert_eq!(config.split_mode, SplitMode::QuoteAware);
        assert_eq!(config.exercise_dataset, "rent_a_house");
        assert_eq!(config.meta_db_path(), PathBuf::from("/tmp/practice/meta/app_meta.db"));
        assert!(config.dataset("rent_a_house").is_some());
    }
}
