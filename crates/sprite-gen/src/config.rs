//! Layered configuration system
//!
//! Config is loaded with four layers of precedence (highest wins):
//! 1. Explicit overrides passed by the caller (e.g. `--tripo-key`)
//! 2. Environment variables: `LIBLIB_ACCESS_KEY`, `LIBLIB_SECRET_KEY`, `TRIPO_API_KEY`
//! 3. An explicit config file (`--config`), then project-local `.sprite/config.toml`
//! 4. Global: `~/.sprite/config.toml`

use crate::signing::Credentials;
use serde::{Deserialize, Serialize};
use sprite_core::{Result, SpriteError};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LIBLIB_URL: &str = "https://openapi.liblibai.cloud";
pub const DEFAULT_TRIPO_URL: &str = "https://api.tripo3d.ai/v2/openapi";
pub const DEFAULT_TEMPLATE_UUID: &str = "6f7c4652458d4802969f8d089cf5b91f";

/// Style prefix prepended to every UI prompt unless the caller or plan overrides it
pub const DEFAULT_STYLE_PREFIX: &str = "World of Warcraft UI style, epic fantasy game UI, \
ornate metal and leather frame, embossed details, dramatic lighting, subtle wear and scratches, \
high detail, clean transparent background, no text, no watermark, no logo, no characters, no scenery";

const ENV_LIBLIB_ACCESS_KEY: &str = "LIBLIB_ACCESS_KEY";
const ENV_LIBLIB_SECRET_KEY: &str = "LIBLIB_SECRET_KEY";
const ENV_TRIPO_API_KEY: &str = "TRIPO_API_KEY";

/// `[liblib]` section: the key-pair signed image service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiblibConfig {
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub template_uuid: Option<String>,
}

/// `[tripo]` section: the bearer-token 3D model service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripoConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// `[defaults]` section. Every field is optional so layers can be merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub model_timeout_secs: Option<u64>,
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub submit_delay_secs: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub retry_delay_secs: Option<u64>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub download_timeout_secs: Option<u64>,
    #[serde(default)]
    pub style_prefix: Option<String>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpriteConfigFile {
    #[serde(default)]
    pub liblib: LiblibConfig,
    #[serde(default)]
    pub tripo: TripoConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Timing and retry defaults with every value resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    /// Overall deadline for one image task
    pub timeout: Duration,
    /// Overall deadline for one 3D model task
    pub model_timeout: Duration,
    pub poll_interval: Duration,
    pub submit_delay: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Per-request timeout for submit and status calls
    pub request_timeout: Duration,
    /// Per-request timeout for artifact downloads
    pub download_timeout: Duration,
    pub style_prefix: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(900),
            model_timeout: Duration::from_secs(600),
            poll_interval: Duration::from_secs(10),
            submit_delay: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(60),
            request_timeout: Duration::from_secs(60),
            download_timeout: Duration::from_secs(120),
            style_prefix: DEFAULT_STYLE_PREFIX.to_string(),
        }
    }
}

/// Resolved configuration with environment and explicit overrides applied
#[derive(Debug, Clone, Default)]
pub struct SpriteConfig {
    pub liblib: LiblibConfig,
    pub tripo: TripoConfig,
    pub defaults: Defaults,
}

impl SpriteConfig {
    /// Load config with layered precedence: global < project < explicit file < env vars
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = SpriteConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        let local_path = PathBuf::from(".sprite/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(SpriteError::ConfigurationError(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            let file = Self::load_file(path)?;
            Self::merge_into(&mut config, file);
        }

        Self::apply_env_overrides(&mut config);
        Ok(Self::resolve(config))
    }

    /// Apply an explicit bearer token override for the model service
    pub fn with_tripo_key(mut self, key: Option<&str>) -> Self {
        if let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) {
            self.tripo.api_key = Some(key.to_string());
        }
        self
    }

    /// Key-pair credentials for the image service, or a `ConfigurationError`
    pub fn image_credentials(&self) -> Result<Credentials> {
        Credentials::key_pair(
            self.liblib.access_key.as_deref(),
            self.liblib.secret_key.as_deref(),
        )
    }

    /// Bearer credentials for the model service, or a `ConfigurationError`
    pub fn model_credentials(&self) -> Result<Credentials> {
        Credentials::bearer(self.tripo.api_key.as_deref())
    }

    pub fn liblib_url(&self) -> &str {
        self.liblib.base_url.as_deref().unwrap_or(DEFAULT_LIBLIB_URL)
    }

    pub fn tripo_url(&self) -> &str {
        self.tripo.base_url.as_deref().unwrap_or(DEFAULT_TRIPO_URL)
    }

    pub fn template_uuid(&self) -> &str {
        self.liblib
            .template_uuid
            .as_deref()
            .unwrap_or(DEFAULT_TEMPLATE_UUID)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".sprite").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<SpriteConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            SpriteError::ConfigurationError(format!(
                "Failed to parse config {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn merge_into(base: &mut SpriteConfigFile, overlay: SpriteConfigFile) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut base.liblib.access_key, overlay.liblib.access_key);
        take(&mut base.liblib.secret_key, overlay.liblib.secret_key);
        take(&mut base.liblib.base_url, overlay.liblib.base_url);
        take(&mut base.liblib.template_uuid, overlay.liblib.template_uuid);

        take(&mut base.tripo.api_key, overlay.tripo.api_key);
        take(&mut base.tripo.base_url, overlay.tripo.base_url);

        let (d, o) = (&mut base.defaults, overlay.defaults);
        take(&mut d.timeout_secs, o.timeout_secs);
        take(&mut d.model_timeout_secs, o.model_timeout_secs);
        take(&mut d.poll_interval_secs, o.poll_interval_secs);
        take(&mut d.submit_delay_secs, o.submit_delay_secs);
        take(&mut d.max_retries, o.max_retries);
        take(&mut d.retry_delay_secs, o.retry_delay_secs);
        take(&mut d.request_timeout_secs, o.request_timeout_secs);
        take(&mut d.download_timeout_secs, o.download_timeout_secs);
        take(&mut d.style_prefix, o.style_prefix);
    }

    fn apply_env_overrides(config: &mut SpriteConfigFile) {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(key) = read(ENV_LIBLIB_ACCESS_KEY) {
            config.liblib.access_key = Some(key);
        }
        if let Some(key) = read(ENV_LIBLIB_SECRET_KEY) {
            config.liblib.secret_key = Some(key);
        }
        if let Some(key) = read(ENV_TRIPO_API_KEY) {
            config.tripo.api_key = Some(key);
        }
    }

    fn resolve(file: SpriteConfigFile) -> Self {
        let base = Defaults::default();
        let d = file.defaults;
        let secs =
            |v: Option<u64>, fallback: Duration| v.map(Duration::from_secs).unwrap_or(fallback);

        let defaults = Defaults {
            timeout: secs(d.timeout_secs, base.timeout),
            model_timeout: secs(d.model_timeout_secs, base.model_timeout),
            poll_interval: secs(d.poll_interval_secs, base.poll_interval),
            submit_delay: secs(d.submit_delay_secs, base.submit_delay),
            max_retries: d.max_retries.unwrap_or(base.max_retries),
            retry_delay: secs(d.retry_delay_secs, base.retry_delay),
            request_timeout: secs(d.request_timeout_secs, base.request_timeout),
            download_timeout: secs(d.download_timeout_secs, base.download_timeout),
            style_prefix: d.style_prefix.unwrap_or(base.style_prefix),
        };

        Self {
            liblib: file.liblib,
            tripo: file.tripo,
            defaults,
        }
    }
}
