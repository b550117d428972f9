//! Application configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional YAML
//! file, then `AUTOFILL__SECTION__KEY` environment variables.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use action_flow::{PacingConfig, PortalLayout, StepPolicy};
use anyhow::{Context, Result};
use autofill_scheduler::ManagerConfig;
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const ENV_PREFIX: &str = "AUTOFILL";
const LOCAL_CONFIG: &str = "config/autofill.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub portal: PortalLayout,
    pub pacing: PacingConfig,
    pub tasks: TasksConfig,
    pub supervisor: SupervisorConfig,
    pub policy: StepPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8790)),
        }
    }
}

/// Lifecycle manager settings plus the completed-task sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    #[serde(flatten)]
    pub manager: ManagerConfig,
    /// How long an ended task stays queryable
    pub retention_secs: u64,
    pub sweep_interval_secs: u64,
}

impl TasksConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            manager: ManagerConfig::default(),
            retention_secs: 60 * 60,
            sweep_interval_secs: 5 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Absolute deadline for one streamed task
    pub deadline_secs: u64,
    /// Keepalive after this much silence on the progress channel
    pub heartbeat_secs: u64,
}

impl SupervisorConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            deadline_secs: 30 * 60,
            heartbeat_secs: 30,
        }
    }
}

pub struct LoadedConfig {
    pub config: AppConfig,
    /// The YAML file that was layered in, if one was found.
    pub path: Option<PathBuf>,
}

/// Loads the configuration.
///
/// An explicit path must exist. Without one the local `config/autofill.yaml`
/// is tried, then `<config_dir>/autofill/config.yaml`.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            Some(path.to_path_buf())
        }
        None => discover_config_file(),
    };

    let defaults = config::Config::try_from(&AppConfig::default())
        .context("failed to encode default configuration")?;
    let mut builder = config::Config::builder().add_source(defaults);
    if let Some(path) = &path {
        debug!(path = %path.display(), "layering configuration file");
        builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Yaml));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .context("failed to assemble configuration")?
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    match &path {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => info!("configuration loaded from defaults"),
    }
    Ok(LoadedConfig { config, path })
}

fn discover_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        return Some(local);
    }
    let mut user = dirs::config_dir()?;
    user.push("autofill");
    user.push("config.yaml");
    user.exists().then_some(user)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let config = AppConfig::default();
        assert_eq!(config.tasks.manager.progress_capacity, 64);
        assert_eq!(config.tasks.retention(), Duration::from_secs(3600));
        assert_eq!(config.tasks.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.supervisor.deadline(), Duration::from_secs(1800));
        assert_eq!(config.supervisor.heartbeat(), Duration::from_secs(30));
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "server:\n  bind: \"0.0.0.0:9000\"\nsupervisor:\n  heartbeat_secs: 5\ntasks:\n  progress_capacity: 16\n"
        )
        .unwrap();

        let loaded = load_config(Some(file.path())).unwrap();
        assert_eq!(loaded.path.as_deref(), Some(file.path()));
        let config = loaded.config;
        assert_eq!(config.server.bind, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.supervisor.heartbeat_secs, 5);
        assert_eq!(config.supervisor.deadline_secs, 1800);
        assert_eq!(config.tasks.manager.progress_capacity, 16);
        assert_eq!(config.portal, PortalLayout::default());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/autofill.yaml")))
            .err()
            .unwrap();
        assert!(err.to_string().contains("does not exist"));
    }
}
