//! Provider configuration
//!
//! Looked up in order: an explicit path, `crdform.yaml` in the working
//! directory, then `~/.config/crdform/config.yaml`. Missing files mean
//! defaults. `CRDFORM_STATE_DIR` and `CRDFORM_ID_POLICY` override the file.

use crdform_core::{IdPolicy, ProjectOptions, Projector};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ProviderError, Result};

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "crdform.yaml";

pub const ENV_STATE_DIR: &str = "CRDFORM_STATE_DIR";
pub const ENV_ID_POLICY: &str = "CRDFORM_ID_POLICY";

/// Provider configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// CRD files, schema tables, or directories of either
    #[serde(default)]
    pub schema_paths: Vec<PathBuf>,

    /// Directory holding resource state records
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Identifier policy for new records
    #[serde(default)]
    pub id_policy: IdPolicy,

    /// Sort map-of-string keys in manifests
    #[serde(default)]
    pub sort_map_keys: bool,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".crdform").join("state")
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            schema_paths: Vec::new(),
            state_dir: default_state_dir(),
            id_policy: IdPolicy::default(),
            sort_map_keys: false,
        }
    }
}

impl ProviderConfig {
    /// Load from the first config file found, or defaults
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        match Self::discover(&cwd) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from a specific path
    ///
    /// Relative paths in the file are resolved against the file's directory.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yaml::from_str(&content).map_err(|e| {
            ProviderError::InvalidConfig {
                message: format!("{}: {}", path.display(), e),
            }
        })?;

        if let Some(base) = path.parent() {
            config.resolve_relative(base);
        }
        Ok(config)
    }

    /// First existing config file for a working directory
    pub fn discover(cwd: &Path) -> Option<PathBuf> {
        let local = cwd.join(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }
        Self::default_path().ok().filter(|p| p.is_file())
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| ProviderError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("crdform").join("config.yaml"))
    }

    /// Apply `CRDFORM_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup(ENV_STATE_DIR).filter(|v| !v.is_empty()) {
            self.state_dir = PathBuf::from(dir);
        }
        if let Some(policy) = lookup(ENV_ID_POLICY).filter(|v| !v.is_empty()) {
            self.id_policy = policy.parse().map_err(|message: String| {
                ProviderError::InvalidConfig {
                    message: format!("{}: {}", ENV_ID_POLICY, message),
                }
            })?;
        }
        Ok(())
    }

    /// Projector configured from this file
    pub fn projector(&self) -> Projector {
        Projector::from_policy(self.id_policy).with_options(ProjectOptions {
            sort_map_keys: self.sort_map_keys,
        })
    }

    fn resolve_relative(&mut self, base: &Path) {
        for path in &mut self.schema_paths {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if self.state_dir.is_relative() {
            self.state_dir = base.join(&self.state_dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert!(config.schema_paths.is_empty());
        assert_eq!(config.state_dir, PathBuf::from(".crdform/state"));
        assert_eq!(config.id_policy, IdPolicy::WallClock);
        assert!(!config.sort_map_keys);
    }

    #[test]
    fn test_load_from_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "schemaPaths:\n  - crds\n  - /abs/table.yaml\nidPolicy: monotonic\nsortMapKeys: true\n",
        )
        .unwrap();

        let config = ProviderConfig::load_from(&path).unwrap();
        assert_eq!(
            config.schema_paths,
            vec![dir.path().join("crds"), PathBuf::from("/abs/table.yaml")]
        );
        assert_eq!(config.state_dir, dir.path().join(".crdform/state"));
        assert_eq!(config.id_policy, IdPolicy::Monotonic);
        assert!(config.sort_map_keys);
    }

    #[test]
    fn test_load_from_rejects_unknown_policy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "idPolicy: uuid\n").unwrap();

        let err = ProviderConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidConfig { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [(ENV_STATE_DIR, "/var/lib/crdform"), (ENV_ID_POLICY, "random")]
            .into_iter()
            .collect();

        let mut config = ProviderConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/crdform"));
        assert_eq!(config.id_policy, IdPolicy::Random);
    }

    #[test]
    fn test_env_override_invalid_policy() {
        let mut config = ProviderConfig::default();
        let err = config
            .apply_overrides(|k| (k == ENV_ID_POLICY).then(|| "sequential".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_ID_POLICY));
    }

    #[test]
    fn test_discover_prefers_working_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{}\n").unwrap();
        assert_eq!(
            ProviderConfig::discover(dir.path()),
            Some(dir.path().join(CONFIG_FILE_NAME))
        );
    }

    #[test]
    fn test_projector_options() {
        let config = ProviderConfig {
            sort_map_keys: true,
            ..Default::default()
        };
        assert!(config.projector().options().sort_map_keys);
    }
}
