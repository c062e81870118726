use directories::{BaseDirs, ProjectDirs};
use eyre::{eyre, Context, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::service::{ConnectParams, DEFAULT_PORT};

pub const CONFIG_FILE_NAME: &str = "ftree.toml";

/// Directory chosen by the embedding application; wins over the platform location.
static CONFIG_HOME: Lazy<RwLock<Option<PathBuf>>> = Lazy::new(|| RwLock::new(None));

/// Points [`CoreConfig::load_default`] at `dir`, or back at the platform
/// location when `dir` is `None`.
pub fn use_config_home(dir: Option<&Path>) {
    *CONFIG_HOME.write() = dir.map(Path::to_path_buf);
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "Ftree", "Ftree")
}

/// Directory expected to hold `ftree.toml`.
pub fn config_home() -> Result<PathBuf> {
    if let Some(dir) = CONFIG_HOME.read().as_ref() {
        return Ok(dir.clone());
    }
    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .or_else(|| BaseDirs::new().map(|base| base.home_dir().join(".config").join("ftree")))
        .ok_or_else(|| eyre!("no home directory to look for {} in", CONFIG_FILE_NAME))
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    session: RawSession,
    #[serde(default)]
    staging: RawStaging,
}

#[derive(Debug, Default, Deserialize)]
struct RawSession {
    port: Option<u16>,
    passive_mode: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStaging {
    dir: Option<PathBuf>,
}

/// Settings shared by every session the process opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub port: u16,
    pub passive_mode: bool,
    /// Parent of the staging directory; `None` picks the platform cache dir.
    pub staging_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            passive_mode: true,
            staging_dir: None,
        }
    }
}

impl CoreConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .wrap_err_with(|| format!("failed to parse config file {}", path.display()))
    }

    /// Loads `ftree.toml` from the configuration directory, or the defaults
    /// when the file does not exist.
    pub fn load_default() -> Result<Self> {
        let path = config_home()?.join(CONFIG_FILE_NAME);
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// [`load_default`](Self::load_default), falling back to the defaults
    /// when the file cannot be read or parsed.
    pub fn resolve() -> Self {
        Self::load_default().unwrap_or_else(|err| {
            log::warn!("ignoring configuration: {:#}", err);
            Self::default()
        })
    }

    fn parse(contents: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(contents)?;
        let defaults = Self::default();
        Ok(Self {
            port: raw.session.port.unwrap_or(defaults.port),
            passive_mode: raw.session.passive_mode.unwrap_or(defaults.passive_mode),
            staging_dir: raw.staging.dir,
        })
    }

    /// Directory under which staging directories are created.
    /// Priority: configured dir -> platform cache dir -> system temp dir
    pub fn staging_root(&self) -> PathBuf {
        if let Some(dir) = &self.staging_dir {
            return dir.clone();
        }
        if let Some(dirs) = project_dirs() {
            return dirs.cache_dir().join("staging");
        }
        std::env::temp_dir()
    }

    pub fn connect_params(&self, host: &str, user: &str, password: &str) -> ConnectParams {
        ConnectParams::new(host, user, password).with_port(self.port)
    }

    pub fn anonymous_params(&self, host: &str) -> ConnectParams {
        ConnectParams::anonymous(host).with_port(self.port)
    }
}
