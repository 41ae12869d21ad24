use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use ratatui::style::{Modifier, Style};

use crate::console::{
    parse_color, DuplicatePolicy, HistoryBuffer, Matcher, PatternMatcher, PatternRule,
    ScrollbackBuffer,
};
use crate::transport::{TransportSpec, DEFAULT_BAUD, DEFAULT_DEVICE, DEFAULT_TCP_PORT};
use crate::ConsoleArgs;

pub const DEFAULT_INPUT_WINDOW_HEIGHT: u16 = 1;
pub const DEFAULT_SCROLLBACK_LINES: usize = 1000;
pub const DEFAULT_MAX_HISTORY: usize = 500;
pub const DEFAULT_LOG_FILE_NAME: &str = "serial-split.log";

/// Looked up in the home directory, in order, when `--config` is not given.
pub const CONFIG_FILE_CANDIDATES: [&str; 2] = [".serial-split.json", ".serial-split.toml"];

/// Output pane frame (2), input pane frame (2), footer (1) and two output rows.
const FIXED_LAYOUT_ROWS: u16 = 7;

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        error: std::io::Error,
    },
    Parse {
        path: PathBuf,
        message: String,
    },
    InvalidPattern {
        name: String,
        error: regex::Error,
    },
    InvalidColor {
        name: String,
        value: String,
    },
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, error } => {
                write!(f, "failed to read config {}: {error}", path.display())
            }
            ConfigError::Parse { path, message } => {
                write!(f, "failed to parse config {}: {message}", path.display())
            }
            ConfigError::InvalidPattern { name, error } => {
                write!(f, "color pattern `{name}` is not a valid regex: {error}")
            }
            ConfigError::InvalidColor { name, value } => {
                write!(f, "color pattern `{name}` uses unknown color `{value}`")
            }
            ConfigError::InvalidValue { field, message } => write!(f, "`{field}` {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    device: Option<String>,
    #[serde(default)]
    baud: Option<u32>,
    #[serde(default)]
    remote: Option<RemoteSection>,
    #[serde(default)]
    input_window_height: Option<u16>,
    #[serde(default)]
    history_length: Option<usize>,
    #[serde(default)]
    max_history: Option<usize>,
    #[serde(default)]
    history_duplicates: Option<DuplicatePolicy>,
    #[serde(default)]
    show_timestamp: Option<bool>,
    #[serde(default)]
    logfile: Option<String>,
    #[serde(default)]
    debug_log: Option<String>,
    #[serde(default)]
    common_commands: Vec<String>,
    #[serde(default)]
    color_patterns: IndexMap<String, ColorRuleSection>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RemoteSection {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ColorRuleSection {
    pattern: String,
    #[serde(default)]
    fg: Option<String>,
    #[serde(default)]
    bg: Option<String>,
    #[serde(default)]
    bold: bool,
    #[serde(default)]
    italic: bool,
    #[serde(default)]
    underline: bool,
    #[serde(default)]
    literal: bool,
    #[serde(default = "default_ignore_case")]
    ignore_case: bool,
}

fn default_ignore_case() -> bool {
    true
}

/// Settings for one session, fixed before the console starts.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub transport: TransportSpec,
    pub input_window_height: u16,
    /// `None` keeps every received line.
    pub scrollback_limit: Option<usize>,
    pub max_history: usize,
    pub duplicate_policy: DuplicatePolicy,
    pub show_timestamp: bool,
    pub logfile: Option<PathBuf>,
    pub debug_log: Option<PathBuf>,
    pub common_commands: Vec<String>,
    pub rules: Vec<PatternRule>,
    pub source: Option<PathBuf>,
}

impl ConsoleConfig {
    pub fn matcher(&self) -> PatternMatcher {
        PatternMatcher::new(self.rules.clone())
    }

    pub fn history(&self) -> HistoryBuffer {
        HistoryBuffer::with_seed(
            self.common_commands.iter().map(String::as_str),
            self.max_history,
            self.duplicate_policy,
        )
    }

    pub fn scrollback(&self) -> ScrollbackBuffer {
        ScrollbackBuffer::new(self.scrollback_limit)
    }

    pub fn min_terminal_height(&self) -> u16 {
        FIXED_LAYOUT_ROWS.saturating_add(self.input_window_height)
    }

    /// Effective settings, in display order.
    pub fn settings(&self) -> Vec<(String, String)> {
        let path_or = |path: &Option<PathBuf>, fallback: &str| {
            path.as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| fallback.to_owned())
        };
        vec![
            ("transport".to_owned(), self.transport.describe()),
            ("config".to_owned(), path_or(&self.source, "<defaults>")),
            (
                "input_window_height".to_owned(),
                self.input_window_height.to_string(),
            ),
            (
                "history_length".to_owned(),
                self.scrollback_limit
                    .map(|limit| limit.to_string())
                    .unwrap_or_else(|| "unbounded".to_owned()),
            ),
            ("max_history".to_owned(), self.max_history.to_string()),
            (
                "history_duplicates".to_owned(),
                self.duplicate_policy.label().to_owned(),
            ),
            ("show_timestamp".to_owned(), self.show_timestamp.to_string()),
            ("logfile".to_owned(), path_or(&self.logfile, "<disabled>")),
            ("debug_log".to_owned(), path_or(&self.debug_log, "<disabled>")),
            (
                "common_commands".to_owned(),
                self.common_commands.len().to_string(),
            ),
            ("color_patterns".to_owned(), self.rules.len().to_string()),
        ]
    }
}

/// Builds the session config: command-line values win over the config file,
/// which wins over built-in defaults.
pub fn resolve(args: &ConsoleArgs, home: Option<&Path>) -> Result<ConsoleConfig, ConfigError> {
    let source = discover(args.config.as_deref(), home)?;
    let file = match source.as_deref() {
        Some(path) => load_file(path)?,
        None => ConfigFile::default(),
    };
    tracing::debug!(source = ?source, "config resolved");
    merge(args, file, source, home)
}

pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// An explicit path must exist. Home-directory candidates are optional.
fn discover(explicit: Option<&Path>, home: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        let path = expand_home(&path.to_string_lossy(), home);
        if !path.is_file() {
            return Err(ConfigError::Read {
                path,
                error: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
        return Ok(Some(path));
    }
    let Some(home) = home else {
        return Ok(None);
    };
    Ok(CONFIG_FILE_CANDIDATES
        .iter()
        .map(|name| home.join(name))
        .find(|candidate| candidate.is_file()))
}

fn load_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
        path: path.to_path_buf(),
        error,
    })?;
    parse_file(path, &raw)
}

fn parse_file(path: &Path, raw: &str) -> Result<ConfigFile, ConfigError> {
    let is_toml = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("toml"));
    let parsed = if is_toml {
        toml::from_str::<ConfigFile>(raw).map_err(|err| err.to_string())
    } else {
        serde_json::from_str::<ConfigFile>(raw).map_err(|err| err.to_string())
    };
    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

fn merge(
    args: &ConsoleArgs,
    file: ConfigFile,
    source: Option<PathBuf>,
    home: Option<&Path>,
) -> Result<ConsoleConfig, ConfigError> {
    let transport = resolve_transport(args, &file, home)?;

    let input_window_height = args
        .input_window_height
        .or(file.input_window_height)
        .unwrap_or(DEFAULT_INPUT_WINDOW_HEIGHT);
    if input_window_height == 0 {
        return Err(ConfigError::InvalidValue {
            field: "input_window_height",
            message: "must be at least 1".to_owned(),
        });
    }

    let max_history = args
        .max_history
        .or(file.max_history)
        .unwrap_or(DEFAULT_MAX_HISTORY);
    if max_history == 0 {
        return Err(ConfigError::InvalidValue {
            field: "max_history",
            message: "must be at least 1".to_owned(),
        });
    }

    let scrollback_lines = args
        .history_length
        .or(file.history_length)
        .unwrap_or(DEFAULT_SCROLLBACK_LINES);

    let logfile = match args.logfile.as_deref().or(file.logfile.as_deref()) {
        Some("") => None,
        Some(raw) => Some(expand_home(raw, home)),
        None => home.map(|home| home.join(DEFAULT_LOG_FILE_NAME)),
    };
    let debug_log = args
        .debug_log
        .as_deref()
        .or(file.debug_log.as_deref())
        .filter(|raw| !raw.is_empty())
        .map(|raw| expand_home(raw, home));

    let rules = file
        .color_patterns
        .iter()
        .map(|(name, section)| build_rule(name, section))
        .collect::<Result<Vec<PatternRule>, ConfigError>>()?;

    Ok(ConsoleConfig {
        transport,
        input_window_height,
        scrollback_limit: (scrollback_lines > 0).then_some(scrollback_lines),
        max_history,
        duplicate_policy: file.history_duplicates.unwrap_or_default(),
        show_timestamp: args.show_timestamp || file.show_timestamp.unwrap_or(false),
        logfile,
        debug_log,
        common_commands: file.common_commands,
        rules,
        source,
    })
}

fn resolve_transport(
    args: &ConsoleArgs,
    file: &ConfigFile,
    home: Option<&Path>,
) -> Result<TransportSpec, ConfigError> {
    let file_host = file
        .remote
        .as_ref()
        .and_then(|remote| remote.host.as_deref())
        .filter(|host| !host.is_empty());
    let file_port = file.remote.as_ref().and_then(|remote| remote.port);
    let serial_requested = args.device.is_some() || args.baud.is_some();

    let spec = match (&args.host, file_host) {
        (Some(host), _) => TransportSpec::Tcp {
            host: host.clone(),
            port: args.port.or(file_port).unwrap_or(DEFAULT_TCP_PORT),
        },
        (None, Some(host)) if !serial_requested => TransportSpec::Tcp {
            host: host.to_owned(),
            port: args.port.or(file_port).unwrap_or(DEFAULT_TCP_PORT),
        },
        _ => {
            let device = args
                .device
                .as_deref()
                .or(file.device.as_deref())
                .unwrap_or(DEFAULT_DEVICE);
            TransportSpec::Serial {
                device: expand_home(device, home),
                baud: args.baud.or(file.baud).unwrap_or(DEFAULT_BAUD),
            }
        }
    };

    match &spec {
        TransportSpec::Serial { baud: 0, .. } => Err(ConfigError::InvalidValue {
            field: "baud",
            message: "must be greater than 0".to_owned(),
        }),
        TransportSpec::Tcp { port: 0, .. } => Err(ConfigError::InvalidValue {
            field: "remote.port",
            message: "must be greater than 0".to_owned(),
        }),
        _ => Ok(spec),
    }
}

fn build_rule(name: &str, section: &ColorRuleSection) -> Result<PatternRule, ConfigError> {
    let matcher = if section.literal {
        Matcher::literal(section.pattern.clone(), section.ignore_case)
    } else {
        Matcher::regex(&section.pattern, section.ignore_case).map_err(|error| {
            ConfigError::InvalidPattern {
                name: name.to_owned(),
                error,
            }
        })?
    };

    let color = |value: &Option<String>| match value.as_deref() {
        None => Ok(None),
        Some(raw) => parse_color(raw)
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidColor {
                name: name.to_owned(),
                value: raw.to_owned(),
            }),
    };
    let mut style = Style::default();
    if let Some(fg) = color(&section.fg)? {
        style = style.fg(fg);
    }
    if let Some(bg) = color(&section.bg)? {
        style = style.bg(bg);
    }
    for (enabled, modifier) in [
        (section.bold, Modifier::BOLD),
        (section.italic, Modifier::ITALIC),
        (section.underline, Modifier::UNDERLINED),
    ] {
        if enabled {
            style = style.add_modifier(modifier);
        }
    }
    Ok(PatternRule::new(name, matcher, style))
}

/// `~` and `~/...` resolve against `home`. Anything else is taken as is.
pub fn expand_home(raw: &str, home: Option<&Path>) -> PathBuf {
    match (raw, home) {
        ("~", Some(home)) => home.to_path_buf(),
        (raw, Some(home)) if raw.starts_with("~/") => home.join(&raw[2..]),
        (raw, _) => PathBuf::from(raw),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
