//! Layered settings: defaults, config files, then `PARAM2JSON_*` variables.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::converter::Dialect;
use crate::errors::{ConvertError, Result};

/// Config file looked up in the working directory.
pub static LOCAL_CONFIG_FILE: &str = "param2json.toml";

/// Config file looked up relative to the home directory.
pub static USER_CONFIG_FILE: &str = ".config/param2json/config.toml";

/// Prefix for environment overrides, e.g. `PARAM2JSON_OUTPUT_SUFFIX`.
pub static ENV_PREFIX: &str = "PARAM2JSON";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input_suffix: String,
    pub output_suffix: String,
    pub dialect: Dialect,
    /// Manifest read when no files are named on the command line
    pub manifest: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_suffix: ".param".to_string(),
            output_suffix: ".json".to_string(),
            dialect: Dialect::default(),
            manifest: PathBuf::from("params.txt"),
        }
    }
}

impl Settings {
    /// Loads settings from the user config file, `param2json.toml` in the
    /// working directory, an explicit file if given, and finally the
    /// environment. Later sources win.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut files: Vec<(PathBuf, bool)> = Vec::new();
        if let Some(dirs) = BaseDirs::new() {
            files.push((dirs.home_dir().join(USER_CONFIG_FILE), false));
        }
        files.push((PathBuf::from(LOCAL_CONFIG_FILE), false));
        if let Some(path) = explicit {
            files.push((path.to_path_buf(), true));
        }
        Self::load_from(&files, Environment::with_prefix(ENV_PREFIX))
    }

    /// Merges `files` (path, required) in order and then `env` over the
    /// defaults.
    pub fn load_from(files: &[(PathBuf, bool)], env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        for (path, required) in files {
            debug!("Config source: {} (required: {})", path.display(), required);
            builder = builder.add_source(
                File::new(&path.to_string_lossy(), FileFormat::Toml).required(*required),
            );
        }
        let settings: Settings = builder.add_source(env).build()?.try_deserialize()?;
        settings.validate()?;
        trace!("{:?}", settings);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_suffix.is_empty() {
            return Err(ConvertError::invalid_setting(
                "input_suffix",
                "must not be empty",
            ));
        }
        if self.input_suffix == self.output_suffix {
            return Err(ConvertError::invalid_setting(
                "output_suffix",
                format!("must differ from input_suffix ({})", self.input_suffix),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_defaults_without_sources() {
        let settings = Settings::load_from(&[], env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.dialect, Dialect::Strict);
    }

    #[test]
    fn test_missing_optional_file_is_fine() {
        let temp_dir = TempDir::new().unwrap();
        let files = [(temp_dir.path().join("absent.toml"), false)];
        assert!(Settings::load_from(&files, env(&[])).is_ok());
    }

    #[test]
    fn test_missing_required_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let files = [(temp_dir.path().join("absent.toml"), true)];
        let err = Settings::load_from(&files, env(&[])).unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_file_then_environment_layering() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("param2json.toml");
        fs::write(
            &path,
            "output_suffix = \".out.json\"\ndialect = \"legacy\"\nmanifest = \"all.txt\"\n",
        )
        .unwrap();

        let files = [(path, true)];
        let settings = Settings::load_from(&files, env(&[])).unwrap();
        assert_eq!(settings.output_suffix, ".out.json");
        assert_eq!(settings.dialect, Dialect::Legacy);
        assert_eq!(settings.manifest, PathBuf::from("all.txt"));
        assert_eq!(settings.input_suffix, ".param");

        let settings =
            Settings::load_from(&files, env(&[("PARAM2JSON_DIALECT", "strict")])).unwrap();
        assert_eq!(settings.dialect, Dialect::Strict);
        assert_eq!(settings.output_suffix, ".out.json");
    }

    #[test]
    fn test_validation() {
        let settings = Settings {
            input_suffix: String::new(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            output_suffix: ".param".to_string(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let err = Settings::load_from(&[], env(&[("PARAM2JSON_OUTPUT_SUFFIX", ".param")]))
            .unwrap_err();
        assert_eq!(err.category(), "invalid_setting");
    }
}
