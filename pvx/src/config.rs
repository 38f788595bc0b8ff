//! Configuration for PVX.
//!
//! Resolution order:
//! 1. Explicit resource passed with `WITH <file>` (".toml" appended when the name has no '.')
//! 2. POINTFLOW_ROOT environment variable (reads $POINTFLOW_ROOT/config.toml when present)
//! 3. Default: the platform data directory for "pointflow"

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::{Error, Result};

/// Environment variable overriding the data root.
pub const POINTFLOW_ROOT_VAR: &str = "POINTFLOW_ROOT";

/// Extension appended to a `WITH` resource that has none.
pub const CONFIG_FILE_EXT: &str = ".toml";

/// File extension of local store databases.
pub const STORE_FILE_EXT: &str = ".duckdb";

/// PVX configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root directory for all pointflow data.
    pub root: PathBuf,

    /// Store used when no `FROM` (dump) or `INTO` (load) is given.
    #[serde(default = "default_store")]
    pub default_store: String,

    /// Rows fetched per round trip when streaming query results.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Interpret date-time literals without a zone as UTC instead of local time.
    #[serde(default)]
    pub utc: bool,

    /// Client identifier reported when opening store sessions.
    #[serde(default = "default_client_id")]
    pub client_id: String,
}

fn default_store() -> String {
    "Store".to_string()
}

fn default_batch_size() -> usize {
    1_000
}

fn default_client_id() -> String {
    // Deterministic: username@hostname
    let username = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    let hostname = gethostname::gethostname()
        .to_string_lossy()
        .to_string();
    format!("{}@{}", username, hostname)
}

impl Config {
    /// Create a new config with the given root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_store: default_store(),
            batch_size: default_batch_size(),
            utc: false,
            client_id: default_client_id(),
        }
    }

    /// Load the config named by a `WITH` clause, or the default one.
    pub fn resolve(with: Option<&str>) -> Result<Self> {
        match with {
            Some(resource) => Self::load_file(&resource_path(resource)),
            None => Self::load(),
        }
    }

    /// Load config from the default root, or create default.
    pub fn load() -> Result<Self> {
        let root = resolve_root()?;
        Self::load_from(&root)
    }

    /// Load config from ROOT/config.toml, falling back to defaults.
    pub fn load_from(root: &Path) -> Result<Self> {
        let config_path = root.join("config.toml");

        if config_path.exists() {
            let mut config = Self::load_file(&config_path)?;
            // Ensure root matches the actual location
            config.root = root.to_path_buf();
            Ok(config)
        } else {
            Ok(Self::with_root(root))
        }
    }

    /// Load config from an explicit file. A missing `root` defaults to the file's directory.
    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let mut value: toml::Table = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        if !value.contains_key("root") {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            value.insert(
                "root".to_string(),
                toml::Value::String(dir.display().to_string()),
            );
        }
        toml::Value::Table(value)
            .try_into()
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    // Path helpers

    /// Directory holding named local stores.
    pub fn stores_dir(&self) -> PathBuf {
        self.root.join("stores")
    }

    /// Path of the database backing a store name.
    ///
    /// Names that look like paths are used as given.
    pub fn store_path(&self, name: &str) -> PathBuf {
        let looks_like_path = name.contains('/')
            || name.contains(std::path::MAIN_SEPARATOR)
            || name.to_lowercase().ends_with(STORE_FILE_EXT);
        if looks_like_path {
            PathBuf::from(name)
        } else {
            self.stores_dir()
                .join(format!("{}{}", sanitize_for_filename(name), STORE_FILE_EXT))
        }
    }
}

/// Apply the default extension to a `WITH` resource name.
pub fn resource_path(resource: &str) -> PathBuf {
    if has_extension(resource) {
        PathBuf::from(resource)
    } else {
        PathBuf::from(format!("{}{}", resource, CONFIG_FILE_EXT))
    }
}

/// Whether the last component of a path-like name carries a '.'.
pub fn has_extension(name: &str) -> bool {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().contains('.'))
        .unwrap_or(false)
}

/// Sanitize a store name for use as a file name.
fn sanitize_for_filename(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ' ' => '-',
            c if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' => c,
            _ => '_',
        })
        .collect()
}

/// Resolve the data root using the standard resolution order.
fn resolve_root() -> Result<PathBuf> {
    // 1. Environment variable
    if let Ok(path) = std::env::var(POINTFLOW_ROOT_VAR) {
        return Ok(PathBuf::from(path));
    }

    // 2. XDG data directory (via directories crate)
    if let Some(proj_dirs) = ProjectDirs::from("", "", "pointflow") {
        return Ok(proj_dirs.data_dir().to_path_buf());
    }

    // 3. Fallback to ~/.local/share/pointflow
    let home = std::env::var("HOME")
        .map_err(|_| Error::Config("Could not determine home directory".to_string()))?;
    Ok(PathBuf::from(home).join(".local/share/pointflow"))
}
