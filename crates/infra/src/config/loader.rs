//! Configuration loader
//!
//! ## Loading Strategy
//! 1. If `SECURECACHE_SECRET_KEY` is set, build settings from the
//!    `SECURECACHE_*` environment variables; any error there is returned
//! 2. Only when that variable is absent, fall back to a config file
//! 3. Search standard paths when no file is given
//! 4. Accept JSON and TOML formats
//!
//! Every successful load runs [`SecureCacheSettings::validate`], so a bad key
//! fails here rather than on the first cache write.
//!
//! ## Environment Variables
//! - `SECURECACHE_SECRET_KEY`: url-safe base64 AES-256 key (required)
//! - `SECURECACHE_CACHE_NAME`: name of the secure cache (default `default`)
//! - `SECURECACHE_KEY_PREFIX`: key prefix of the secure cache
//! - `SECURECACHE_KEY_VERSION`: key version (default 1)
//! - `SECURECACHE_CACHE_TIMEOUT`: entry lifetime in seconds, `0` for no expiry
//! - `SECURECACHE_TOKEN_TTL`: maximum token age in seconds
//! - `SECURECACHE_QUEUE_TIMEOUT`: default queue timeout in seconds
//! - `SECURECACHE_DEBUG`: enables debug mode (true/false)
//!
//! ## File Locations
//! 1. `./securecache.{json,toml}` and `./config.{json,toml}`
//! 2. The same names one and two directories up
//! 3. The same names next to the executable

use std::env::VarError;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use securecache_common::CommonError;
use securecache_core::{
    CacheOptions, CacheSettings, QueueSettings, SecureCacheError, SecureCacheResult,
    SecureCacheSettings, SerializerKind,
};

const SECRET_KEY_VAR: &str = "SECURECACHE_SECRET_KEY";

const FILE_NAMES: [&str; 4] =
    ["securecache.json", "securecache.toml", "config.json", "config.toml"];

/// Load settings from the environment, falling back to a file.
///
/// The file is only consulted when `SECURECACHE_SECRET_KEY` is unset. A key
/// that is set but invalid, or any other bad variable, is returned as an
/// error instead of being replaced by file settings.
///
/// # Errors
/// Returns the environment error when the key variable is set, otherwise
/// whatever [`load_from_file`] returns.
pub fn load() -> SecureCacheResult<SecureCacheSettings> {
    if let Err(VarError::NotPresent) = std::env::var(SECRET_KEY_VAR) {
        tracing::debug!(var = SECRET_KEY_VAR, "secret key not in environment, trying file");
        return load_from_file(None);
    }

    let settings = load_from_env()?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(settings)
}

/// Build settings for a single secure cache from environment variables.
///
/// # Errors
/// Returns `SecureCacheError::Config` if `SECURECACHE_SECRET_KEY` is
/// missing, a numeric variable does not parse, or validation fails.
pub fn load_from_env() -> SecureCacheResult<SecureCacheSettings> {
    let secret_key = env_var(SECRET_KEY_VAR)?;
    let cache_name =
        std::env::var("SECURECACHE_CACHE_NAME").unwrap_or_else(|_| "default".to_string());
    let key_prefix = std::env::var("SECURECACHE_KEY_PREFIX").unwrap_or_default();
    let version = env_parse::<u32>("SECURECACHE_KEY_VERSION")?.unwrap_or(1);
    let timeout_secs = match env_parse::<u64>("SECURECACHE_CACHE_TIMEOUT")? {
        Some(0) => None,
        Some(secs) => Some(secs),
        None => CacheSettings::default().timeout_secs,
    };
    let token_ttl_secs = env_parse::<u64>("SECURECACHE_TOKEN_TTL")?;
    let default_timeout_secs = env_parse::<u64>("SECURECACHE_QUEUE_TIMEOUT")?;

    let mut settings = SecureCacheSettings {
        secure_cache_name: Some(cache_name.clone()),
        debug: env_bool("SECURECACHE_DEBUG", false),
        queues: QueueSettings { default_timeout_secs },
        ..SecureCacheSettings::default()
    };
    settings.caches.insert(
        cache_name,
        CacheSettings {
            key_prefix,
            version,
            timeout_secs,
            options: Some(CacheOptions {
                serializer: SerializerKind::Secure,
                secret_key: Some(secret_key),
                token_ttl_secs,
                data_recovery: None,
            }),
        },
    );

    settings.validate()?;
    Ok(settings)
}

/// Load settings from a file.
///
/// If `path` is `None`, searches the standard locations (see
/// [`search_config_paths`]).
///
/// # Errors
/// Returns `SecureCacheError::Config` if the file is missing, cannot be
/// parsed, or fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> SecureCacheResult<SecureCacheSettings> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SecureCacheError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => search_config_paths().ok_or_else(|| {
            SecureCacheError::config("No config file found in any of the standard locations")
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CommonError::persistence_op("read config file", e.to_string()))?;

    let settings = parse_config(&contents, &config_path)?;
    settings.validate()?;
    Ok(settings)
}

/// Parse settings, picking the format from the file extension.
fn parse_config(contents: &str, path: &Path) -> SecureCacheResult<SecureCacheSettings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => Ok(toml::from_str(contents).map_err(CommonError::from)?),
        "json" => Ok(serde_json::from_str(contents)?),
        _ => Err(SecureCacheError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
pub fn search_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf))
    {
        roots.extend([exe_dir.clone(), exe_dir.join(".."), exe_dir.join("../..")]);
    }

    roots
        .iter()
        .flat_map(|root| FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> SecureCacheResult<String> {
    std::env::var(key).map_err(|e| match e {
        VarError::NotPresent => {
            SecureCacheError::Config(format!("Missing required environment variable: {key}"))
        }
        VarError::NotUnicode(_) => {
            SecureCacheError::Config(format!("Environment variable {key} is not valid unicode"))
        }
    })
}

/// Parse an optional numeric variable; unset yields `None`.
fn env_parse<T>(key: &str) -> SecureCacheResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .ok()
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| SecureCacheError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
