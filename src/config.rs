//! Lookout configuration.
//!
//! Loaded once from `~/.lookout/config.toml` (or `--config <path>`) and
//! passed by reference to whatever needs it. Every key has a default, so a
//! missing default file is not an error.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHome,

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Lookout configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub general: GeneralConfig,
    pub ai: AiConfig,
    pub probe: ProbeConfig,
    pub execution: ExecutionConfig,
}

/// Where sessions and reports are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GeneralConfig {
    /// Defaults to `~/.lookout/sessions`.
    pub sessions_dir: Option<PathBuf>,

    /// Defaults to `<sessions-dir>/reports`.
    pub reports_dir: Option<PathBuf>,
}

/// The model endpoint. Without a `base-url` the model phase is skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AiConfig {
    pub base_url: Option<String>,
    pub api_path: String,
    pub model_name: String,
    pub timeout_seconds: u64,

    /// Sent as a bearer token when non-empty.
    pub api_key: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_path: "/api/generate".to_string(),
            model_name: "llama3:latest".to_string(),
            timeout_seconds: 90,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProbeConfig {
    pub ports: Vec<u16>,

    /// Per-check timeout, for both ping replies and TCP connects.
    pub timeout_seconds: u64,
    pub ping_count: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ports: vec![22, 80, 443],
            timeout_seconds: 3,
            ping_count: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExecutionConfig {
    /// Wall-clock ceiling for each executed command.
    pub command_timeout_seconds: u64,
    pub auto_install: AutoInstall,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            command_timeout_seconds: 600,
            auto_install: AutoInstall::Ask,
        }
    }
}

/// What to do when a selected command's tool is not installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoInstall {
    /// Offer to install it with the package manager.
    #[default]
    Ask,

    /// Skip the command.
    Never,
}

impl Config {
    /// Load config from `path`, or from `~/.lookout/config.toml` when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error. Relative directories resolve against the file's directory.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::path().ok_or(ConfigError::NoHome)?, false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::NotFound(path));
            }
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let mut config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        if let Some(base) = path.parent() {
            config.general.resolve_relative(base);
        }
        Ok(config)
    }

    /// The default config file path: `~/.lookout/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".lookout").join("config.toml"))
    }
}

impl GeneralConfig {
    /// The sessions directory, falling back to `~/.lookout/sessions`.
    pub fn sessions_dir(&self) -> Option<PathBuf> {
        self.sessions_dir
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(".lookout").join("sessions")))
    }

    /// The reports directory, falling back to `<sessions-dir>/reports`.
    pub fn reports_dir(&self) -> Option<PathBuf> {
        self.reports_dir
            .clone()
            .or_else(|| self.sessions_dir().map(|s| s.join("reports")))
    }

    fn resolve_relative(&mut self, base: &Path) {
        for dir in [&mut self.sessions_dir, &mut self.reports_dir]
            .into_iter()
            .flatten()
        {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn empty_file_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.ai.api_path, "/api/generate");
        assert_eq!(config.probe.ports, vec![22, 80, 443]);
        assert_eq!(config.execution.command_timeout_seconds, 600);
        assert_eq!(config.execution.auto_install, AutoInstall::Ask);
    }

    #[test]
    fn reads_kebab_case_sections() {
        let config: Config = toml::from_str(
            r#"
            [ai]
            base-url = "http://10.0.0.1:11434"
            model-name = "mistral"
            api-key = "secret"

            [probe]
            ports = [21, 22]
            ping-count = 1

            [execution]
            command-timeout-seconds = 30
            auto-install = "never"
            "#,
        )
        .unwrap();

        assert_eq!(config.ai.base_url.as_deref(), Some("http://10.0.0.1:11434"));
        assert_eq!(config.ai.model_name, "mistral");
        assert_eq!(config.ai.timeout_seconds, 90);
        assert_eq!(config.probe.ports, vec![21, 22]);
        assert_eq!(config.probe.timeout_seconds, 3);
        assert_eq!(config.execution.command_timeout_seconds, 30);
        assert_eq!(config.execution.auto_install, AutoInstall::Never);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn invalid_toml_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[probe]\nports = \"many\"\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn relative_dirs_resolve_against_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[general]\nsessions-dir = \"runs\"\nreports-dir = \"/abs/reports\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.general.sessions_dir(), Some(dir.path().join("runs")));
        assert_eq!(
            config.general.reports_dir(),
            Some(PathBuf::from("/abs/reports"))
        );
    }

    #[test]
    fn reports_default_under_sessions() {
        let general = GeneralConfig {
            sessions_dir: Some(PathBuf::from("/data/sessions")),
            reports_dir: None,
        };
        assert_eq!(
            general.reports_dir(),
            Some(PathBuf::from("/data/sessions/reports"))
        );
    }
}
