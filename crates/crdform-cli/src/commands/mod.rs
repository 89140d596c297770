//! CLI command implementations

pub mod apply;
pub mod describe;
pub mod destroy;
pub mod list;
pub mod render;
pub mod show;
pub mod state;
pub mod validate;

use crdform_core::{ResourceRegistry, ResourceType};
use crdform_provider::{MemoryStore, Provider, ProviderConfig, load_registry};
use serde_json::Value as JsonValue;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{CliError, Result};

/// Resolved configuration shared by all commands
pub struct Context {
    pub config: ProviderConfig,
    /// `--schema` paths, loaded after the configured ones
    pub extra_schema_paths: Vec<PathBuf>,
}

impl Context {
    pub fn load(config_path: Option<&Path>, extra_schema_paths: Vec<PathBuf>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => ProviderConfig::load_from(path)?,
            None => ProviderConfig::load()?,
        };
        config.apply_env()?;

        tracing::debug!(
            state_dir = %config.state_dir.display(),
            id_policy = %config.id_policy,
            "Resolved configuration"
        );

        Ok(Self {
            config,
            extra_schema_paths,
        })
    }

    fn schema_paths(&self) -> Result<Vec<PathBuf>> {
        let paths: Vec<PathBuf> = self
            .config
            .schema_paths
            .iter()
            .chain(&self.extra_schema_paths)
            .cloned()
            .collect();

        if paths.is_empty() {
            return Err(CliError::Schema {
                message: "no schema paths configured".to_string(),
                help: Some(
                    "Pass --schema <path> or set schemaPaths in crdform.yaml".to_string(),
                ),
            });
        }
        Ok(paths)
    }

    /// Load every configured CRD and schema table
    pub fn registry(&self) -> Result<ResourceRegistry> {
        let (registry, _) = load_registry(&self.schema_paths()?)?;
        Ok(registry)
    }

    /// Look up one resource type
    pub fn resource_type(&self, name: &str) -> Result<ResourceType> {
        Ok(self.registry()?.require(name)?.clone())
    }

    /// Provider backed by the configured state directory
    pub fn provider(&self) -> Result<Provider> {
        self.schema_paths()?;
        let (provider, _) = Provider::from_config(&self.config, &self.extra_schema_paths)?;
        Ok(provider)
    }

    /// Provider that never touches the state directory
    pub fn dry_run_provider(&self) -> Result<Provider> {
        Ok(Provider::new(
            self.registry()?,
            self.config.projector(),
            Arc::new(MemoryStore::new()),
        ))
    }

    /// Provider for state-only commands; schema paths are optional
    pub fn state_provider(&self) -> Result<Provider> {
        let (provider, _) = Provider::from_config(&self.config, &self.extra_schema_paths)?;
        Ok(provider)
    }
}

/// Read resource configuration from a YAML or JSON file (`-` for stdin)
pub fn read_config(path: &Path) -> Result<JsonValue> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|e| CliError::Io {
            message: format!("{}: {}", path.display(), e),
        })?
    };

    serde_yaml::from_str(&content).map_err(|e| {
        CliError::validation_with_help(
            format!("failed to parse {}: {}", path.display(), e),
            "Resource configuration must be a YAML or JSON mapping",
        )
    })
}
