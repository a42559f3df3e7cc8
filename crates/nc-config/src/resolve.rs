//! Locating `nextcheck.toml`.

use std::path::{Path, PathBuf};

/// Where the configuration file was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided by the caller.
    CliArgument,

    /// `NEXTCHECK_CONFIG` or `NEXTCHECK_CONFIG_DIR`.
    Environment,

    /// `~/.config/nextcheck/`.
    XdgConfig,

    /// Found in /etc/nextcheck/.
    SystemConfig,

    /// No file found.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConfigSource::CliArgument => "CLI argument",
            ConfigSource::Environment => "environment variable",
            ConfigSource::XdgConfig => "XDG config",
            ConfigSource::SystemConfig => "system config",
            ConfigSource::BuiltinDefault => "builtin default",
        })
    }
}

/// Discovered configuration file path.
#[derive(Debug, Clone, Default)]
pub struct ConfigPath {
    /// Path to nextcheck.toml (or None if not found).
    pub path: Option<PathBuf>,

    /// Source of the config (for diagnostics).
    pub source: ConfigSource,
}

const ENV_CONFIG_PATH: &str = "NEXTCHECK_CONFIG";
const ENV_CONFIG_DIR: &str = "NEXTCHECK_CONFIG_DIR";

/// Standard config file name.
pub const CONFIG_FILENAME: &str = "nextcheck.toml";

const APP_NAME: &str = "nextcheck";

/// Find `nextcheck.toml`, first existing file wins:
///
/// 1. `cli_path`
/// 2. `$NEXTCHECK_CONFIG`
/// 3. `$NEXTCHECK_CONFIG_DIR/nextcheck.toml`
/// 4. `<XDG config>/nextcheck/nextcheck.toml`
/// 5. `/etc/nextcheck/nextcheck.toml`
///
/// With none present the result carries no path and
/// [`ConfigSource::BuiltinDefault`].
pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPath {
    let env_file = std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from);
    let env_dir_file =
        std::env::var_os(ENV_CONFIG_DIR).map(|dir| PathBuf::from(dir).join(CONFIG_FILENAME));
    let xdg_file = xdg_config_dir().map(|dir| dir.join(CONFIG_FILENAME));
    let system_file = Some(system_config_dir().join(CONFIG_FILENAME));

    let candidates = [
        (cli_path.map(Path::to_path_buf), ConfigSource::CliArgument),
        (env_file, ConfigSource::Environment),
        (env_dir_file, ConfigSource::Environment),
        (xdg_file, ConfigSource::XdgConfig),
        (system_file, ConfigSource::SystemConfig),
    ];

    candidates
        .into_iter()
        .find_map(|(path, source)| {
            path.filter(|p| p.is_file()).map(|path| ConfigPath {
                path: Some(path),
                source,
            })
        })
        .unwrap_or_default()
}

/// Get the XDG config directory for nextcheck.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// `/etc/nextcheck`.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}
