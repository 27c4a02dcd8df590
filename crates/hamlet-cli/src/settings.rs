//! Loading the town configuration and map from disk.

use std::path::Path;

use anyhow::{Context, Result};

use hamlet::engine::TownConfig;

/// Read a TOML [`TownConfig`], or the default when `path` is `None`.
///
/// Missing tables and keys take their defaults. The result is validated
/// before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<TownConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            parse_config(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => TownConfig::default(),
    };
    config.validate().context("Config failed validation")?;
    Ok(config)
}

/// Parse TOML text into a [`TownConfig`] without validating it.
pub fn parse_config(text: &str) -> Result<TownConfig> {
    Ok(toml::from_str(text)?)
}

/// Read map text from `path`, or the built-in village.
pub fn load_map(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read map {}", path.display())),
        None => Ok(hamlet::map::VILLAGE_MAP.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(parse_config("").unwrap(), TownConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_keys() {
        let config = parse_config("seed = 7\n\n[motion]\nspeed = 2.5\n").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.motion.speed, 2.5);
        assert_eq!(config.speech, TownConfig::default().speech);
    }

    #[test]
    fn invalid_config_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[motion]\nspeed = -1.0").unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn missing_map_falls_back_to_village() {
        let text = load_map(None).unwrap();
        assert_eq!(text, hamlet::map::VILLAGE_MAP);
    }

    #[test]
    fn unreadable_map_is_an_error() {
        assert!(load_map(Some(Path::new("/nonexistent/hamlet.map"))).is_err());
    }
}
