//! Configuration file loading and backend factories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use perlan_core::engine::SessionSettings;
use perlan_core::traits::{QuestionGenerator, RemoteStore};

use crate::file::FileRemote;
use crate::http::HttpRemote;
use crate::memory::MemoryRemote;
use crate::mock::MockGenerator;
use crate::openai::OpenAiGenerator;

/// Where the authoritative copy of the content lives.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RemoteConfig {
    Http {
        base_url: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    File {
        dir: PathBuf,
    },
    /// Process-local; contents vanish on exit.
    Memory,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteConfig::Http {
                base_url,
                api_key,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
            RemoteConfig::File { dir } => f.debug_struct("File").field("dir", dir).finish(),
            RemoteConfig::Memory => f.write_str("Memory"),
        }
    }
}

/// Which backend drafts new questions.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeneratorConfig {
    OpenAi {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
    Mock,
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorConfig::OpenAi {
                api_key: _,
                base_url,
                model,
            } => f
                .debug_struct("OpenAi")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
            GeneratorConfig::Mock => f.write_str("Mock"),
        }
    }
}

/// Top-level perlan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerlanConfig {
    /// Directory of the local content cache.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Remote store; offline when absent.
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub generator: Option<GeneratorConfig>,
    #[serde(default)]
    pub game: SessionSettings,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./perlan-data")
}

impl Default for PerlanConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            remote: None,
            generator: None,
            game: SessionSettings::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + end]).unwrap_or_default();
        result.replace_range(start..start + end + 1, &value);
    }
    result
}

fn resolve_remote_config(config: RemoteConfig) -> RemoteConfig {
    match config {
        RemoteConfig::Http {
            base_url,
            api_key,
            timeout_secs,
        } => RemoteConfig::Http {
            base_url: resolve_env_vars(&base_url),
            api_key: api_key.map(|k| resolve_env_vars(&k)),
            timeout_secs,
        },
        RemoteConfig::File { dir } => RemoteConfig::File {
            dir: PathBuf::from(resolve_env_vars(&dir.to_string_lossy())),
        },
        RemoteConfig::Memory => RemoteConfig::Memory,
    }
}

fn resolve_generator_config(config: GeneratorConfig) -> GeneratorConfig {
    match config {
        GeneratorConfig::OpenAi {
            api_key,
            base_url,
            model,
        } => GeneratorConfig::OpenAi {
            api_key: resolve_env_vars(&api_key),
            base_url: base_url.map(|u| resolve_env_vars(&u)),
            model,
        },
        GeneratorConfig::Mock => GeneratorConfig::Mock,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `perlan.toml` in the current directory
/// 2. `~/.config/perlan/config.toml`
///
/// Environment variable overrides: `PERLAN_REMOTE_URL`, `PERLAN_REMOTE_KEY`,
/// `PERLAN_OPENAI_KEY`.
pub fn load_config() -> Result<PerlanConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PerlanConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("perlan.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => PerlanConfig::default(),
    };

    Ok(apply_env_overrides(config))
}

/// Parse a config document and resolve `${VAR}` references in it.
pub fn parse_config(content: &str) -> Result<PerlanConfig> {
    let mut config: PerlanConfig = toml::from_str(content)?;
    config.data_dir = PathBuf::from(resolve_env_vars(&config.data_dir.to_string_lossy()));
    config.remote = config.remote.map(resolve_remote_config);
    config.generator = config.generator.map(resolve_generator_config);
    Ok(config)
}

fn apply_env_overrides(mut config: PerlanConfig) -> PerlanConfig {
    if let Ok(url) = std::env::var("PERLAN_REMOTE_URL") {
        let (api_key, timeout_secs) = match config.remote.take() {
            Some(RemoteConfig::Http {
                api_key,
                timeout_secs,
                ..
            }) => (api_key, timeout_secs),
            _ => (None, None),
        };
        config.remote = Some(RemoteConfig::Http {
            base_url: url,
            api_key,
            timeout_secs,
        });
    }

    if let Ok(key) = std::env::var("PERLAN_REMOTE_KEY") {
        if let Some(RemoteConfig::Http { api_key, .. }) = config.remote.as_mut() {
            *api_key = Some(key);
        }
    }

    if let Ok(key) = std::env::var("PERLAN_OPENAI_KEY") {
        match config.generator.as_mut() {
            Some(GeneratorConfig::OpenAi { api_key, .. }) => *api_key = key,
            _ => {
                config.generator = Some(GeneratorConfig::OpenAi {
                    api_key: key,
                    base_url: None,
                    model: None,
                })
            }
        }
    }

    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("perlan"))
}

/// Create a remote store from its configuration.
pub fn create_remote(config: &RemoteConfig) -> Result<Arc<dyn RemoteStore>> {
    match config {
        RemoteConfig::Http {
            base_url,
            api_key,
            timeout_secs,
        } => Ok(Arc::new(HttpRemote::new(
            base_url,
            api_key.clone(),
            *timeout_secs,
        )?)),
        RemoteConfig::File { dir } => Ok(Arc::new(FileRemote::new(dir.clone()))),
        RemoteConfig::Memory => Ok(Arc::new(MemoryRemote::new())),
    }
}

/// Create a question generator from its configuration.
pub fn create_generator(config: &GeneratorConfig) -> Result<Box<dyn QuestionGenerator>> {
    match config {
        GeneratorConfig::OpenAi {
            api_key,
            base_url,
            model,
        } => {
            if api_key.is_empty() {
                anyhow::bail!("openai generator needs an api_key (or PERLAN_OPENAI_KEY)");
            }
            Ok(Box::new(OpenAiGenerator::new(
                api_key,
                base_url.clone(),
                model.clone(),
            )?))
        }
        GeneratorConfig::Mock => Ok(Box::new(MockGenerator::new())),
    }
}
