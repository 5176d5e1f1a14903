use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Set once at startup by main() from the --data-dir argument.
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Call this from main() before any load/save operations.
pub fn set_data_dir(path: PathBuf) {
    let _ = DATA_DIR.set(path);
}

pub fn get_data_dir() -> Result<PathBuf> {
    if let Some(dir) = DATA_DIR.get() {
        return Ok(dir.clone());
    }
    // Fallback when running tests or if set_data_dir was not called
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    Ok(cwd.join("config"))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

/// A value stored as a single file in the data directory. A missing file
/// loads as `Default`.
pub trait Persistable: Sized + Default + Serialize + for<'de> Deserialize<'de> {
    fn filename() -> &'static str;
    fn format() -> Format;

    fn load() -> Result<Self> {
        Self::load_from(&get_data_dir()?)
    }

    /// Load from an explicit directory, bypassing the global `DATA_DIR`.
    fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(Self::filename());
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        decode(&contents, Self::format())
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Save to an explicit directory, bypassing the global `DATA_DIR`.
    fn save_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create dir {}", dir.display()))?;
        let path = dir.join(Self::filename());
        let contents = encode(self, Self::format())?;
        fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

fn decode<T: for<'de> Deserialize<'de>>(contents: &str, format: Format) -> Result<T> {
    Ok(match format {
        Format::Json => serde_json::from_str(contents).context("invalid JSON")?,
        Format::Yaml => serde_norway::from_str(contents).context("invalid YAML")?,
    })
}

fn encode<T: Serialize>(value: &T, format: Format) -> Result<String> {
    Ok(match format {
        Format::Json => serde_json::to_string_pretty(value).context("failed to serialize JSON")?,
        Format::Yaml => serde_norway::to_string(value).context("failed to serialize YAML")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
    struct JsonDoc {
        value: String,
    }

    impl Persistable for JsonDoc {
        fn filename() -> &'static str {
            "doc.json"
        }
        fn format() -> Format {
            Format::Json
        }
    }

    #[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
    struct YamlDoc {
        count: u32,
    }

    impl Persistable for YamlDoc {
        fn filename() -> &'static str {
            "doc.yaml"
        }
        fn format() -> Format {
            Format::Yaml
        }
    }

    #[test]
    fn test_get_data_dir_returns_a_path() {
        assert!(get_data_dir().is_ok());
    }

    #[test]
    fn test_load_from_returns_default_when_file_missing() {
        let tmp = TempDir::new().unwrap();
        let result = JsonDoc::load_from(tmp.path()).unwrap();
        assert_eq!(result, JsonDoc::default());
    }

    #[test]
    fn test_json_save_to_and_load_from() {
        let tmp = TempDir::new().unwrap();
        let data = JsonDoc { value: "사유".to_string() };
        data.save_to(tmp.path()).unwrap();
        assert_eq!(JsonDoc::load_from(tmp.path()).unwrap(), data);
    }

    #[test]
    fn test_yaml_save_to_and_load_from() {
        let tmp = TempDir::new().unwrap();
        let data = YamlDoc { count: 99 };
        data.save_to(tmp.path()).unwrap();
        assert_eq!(YamlDoc::load_from(tmp.path()).unwrap(), data);
    }

    #[test]
    fn test_save_to_creates_directory_if_missing() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b");
        let data = JsonDoc { value: "nested".to_string() };
        data.save_to(&nested).unwrap();
        assert_eq!(JsonDoc::load_from(&nested).unwrap(), data);
    }

    #[test]
    fn test_load_from_reports_the_broken_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("doc.json"), "{ not json").unwrap();
        let err = JsonDoc::load_from(tmp.path()).unwrap_err();
        assert!(format!("{err}").contains("doc.json"));
    }
}
