//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only ever sees the
//! [`PatchConfig`](railstart_core::application::PatchConfig) built from it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. `RAILSTART_*` environment variables, nested keys separated by `__`
//!    (e.g. `RAILSTART_PATCHER__COMMAND_TIMEOUT_SECS=600`)
//! 3. `--config FILE`, or else `.railstart.toml` in the current directory
//!    layered over the user config file
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// File name of the per-directory configuration.
pub const LOCAL_CONFIG_FILE: &str = ".railstart.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Output settings.
    pub output: OutputConfig,
    /// Where template-owned files come from.
    pub templates: TemplateConfig,
    /// Patch behaviour.
    pub patcher: PatcherConfig,
    /// How `railstart new` invokes Rails.
    pub rails: RailsConfig,
    /// Log file settings.
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub path: Option<PathBuf>,
    pub git: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatcherConfig {
    /// Rails executable used for generators, relative to the project root.
    pub rails_bin: String,
    /// Kill external commands after this many seconds. Unset means wait.
    pub command_timeout_secs: Option<u64>,
    /// `warn` or `fail` when a gem is declared with a different constraint.
    pub constraint_policy: String,
    pub skip_git: bool,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self {
            rails_bin: "bin/rails".into(),
            command_timeout_secs: None,
            constraint_policy: "warn".into(),
            skip_git: false,
        }
    }
}

impl PatcherConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RailsConfig {
    /// Program used for `rails new` and the version probe.
    pub command: String,
    /// Arguments appended after `rails new NAME`.
    pub new_args: Vec<String>,
}

impl Default for RailsConfig {
    fn default() -> Self {
        Self {
            command: "rails".into(),
            new_args: vec!["--javascript".into(), "esbuild".into()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration, starting from defaults.
    ///
    /// `config_file` is the path given with `--config`; it must exist. When
    /// it is absent the user config file and `.railstart.toml` in the
    /// current directory are read if present.
    pub fn load(config_file: Option<&Path>) -> anyhow::Result<Self> {
        let defaults = toml::to_string(&Self::default())
            .context("Failed to serialise default configuration")?;

        let mut builder =
            Config::builder().add_source(File::from_str(&defaults, FileFormat::Toml));

        match config_file {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
            None => {
                builder = builder
                    .add_source(
                        File::from(Self::config_path())
                            .format(FileFormat::Toml)
                            .required(false),
                    )
                    .add_source(
                        File::from(Path::new(LOCAL_CONFIG_FILE))
                            .format(FileFormat::Toml)
                            .required(false),
                    );
            }
        }

        builder
            .add_source(
                Environment::with_prefix("RAILSTART")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Path to the user configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.railstart.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "railstart", "railstart")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_rails_new_invocation() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.rails.command, "rails");
        assert_eq!(cfg.rails.new_args, vec!["--javascript", "esbuild"]);
        assert_eq!(cfg.patcher.rails_bin, "bin/rails");
        assert_eq!(cfg.patcher.constraint_policy, "warn");
        assert!(cfg.patcher.command_timeout().is_none());
    }

    #[test]
    fn zero_timeout_means_none() {
        let patcher = PatcherConfig {
            command_timeout_secs: Some(0),
            ..PatcherConfig::default()
        };
        assert!(patcher.command_timeout().is_none());

        let patcher = PatcherConfig {
            command_timeout_secs: Some(90),
            ..PatcherConfig::default()
        };
        assert_eq!(patcher.command_timeout(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("railstart.toml");
        std::fs::write(
            &path,
            "[patcher]\ncommand_timeout_secs = 120\nconstraint_policy = \"fail\"\n\n\
             [templates]\npath = \"/opt/jumpstart\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.patcher.command_timeout_secs, Some(120));
        assert_eq!(cfg.patcher.constraint_policy, "fail");
        assert_eq!(cfg.templates.path, Some(PathBuf::from("/opt/jumpstart")));
        // Untouched keys keep their defaults.
        assert_eq!(cfg.patcher.rails_bin, "bin/rails");
        assert_eq!(cfg.rails.new_args, vec!["--javascript", "esbuild"]);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let raw = toml::to_string_pretty(&AppConfig::default()).unwrap();
        let parsed: AppConfig = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.rails.new_args, AppConfig::default().rails.new_args);
    }

    #[test]
    fn config_path_is_not_empty() {
        assert!(!AppConfig::config_path().as_os_str().is_empty());
    }
}
