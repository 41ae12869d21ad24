pub mod config;
pub mod console;
pub mod logging;
pub mod transport;
pub mod tui;
pub mod ui;

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(ConsoleArgs),
    CheckConfig(ConsoleArgs),
    Help,
}

/// Values given on the command line. `None` leaves the setting to the config
/// file or the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleArgs {
    pub device: Option<String>,
    pub baud: Option<u32>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub logfile: Option<String>,
    pub debug_log: Option<String>,
    pub show_timestamp: bool,
    pub history_length: Option<usize>,
    pub max_history: Option<usize>,
    pub input_window_height: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliParseError {
    MissingValue(String),
    InvalidNumber { flag: String, value: String },
    UnknownArgument(String),
    Conflict { first: String, second: String },
}

impl std::fmt::Display for CliParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliParseError::MissingValue(flag) => write!(f, "{flag} requires a value"),
            CliParseError::InvalidNumber { flag, value } => {
                write!(f, "{flag} expects a number, got `{value}`")
            }
            CliParseError::UnknownArgument(arg) => write!(f, "unknown argument: {arg}"),
            CliParseError::Conflict { first, second } => {
                write!(f, "{first} cannot be combined with {second}")
            }
        }
    }
}

impl std::error::Error for CliParseError {}

pub fn parse_command<I>(args: I) -> Result<Command, CliParseError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut parsed = ConsoleArgs::default();
    let mut check_config = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--device" | "-d" => parsed.device = Some(take_value(&arg, &mut args)?),
            "--baud" | "-b" => parsed.baud = Some(take_number(&arg, &mut args)?),
            "--host" => parsed.host = Some(take_value(&arg, &mut args)?),
            "--port" | "-p" => parsed.port = Some(take_number(&arg, &mut args)?),
            "--config" | "-c" => {
                parsed.config = Some(PathBuf::from(take_value(&arg, &mut args)?));
            }
            "--logfile" | "-l" => parsed.logfile = Some(take_value(&arg, &mut args)?),
            "--debug-log" | "-dl" => parsed.debug_log = Some(take_value(&arg, &mut args)?),
            "--show-timestamp" | "-t" => parsed.show_timestamp = true,
            "--history-length" | "-hl" => {
                parsed.history_length = Some(take_number(&arg, &mut args)?);
            }
            "--max-history" | "-mh" => parsed.max_history = Some(take_number(&arg, &mut args)?),
            "--input-window-height" | "-iwl" => {
                parsed.input_window_height = Some(take_number(&arg, &mut args)?);
            }
            "--check-config" => check_config = true,
            other => return Err(CliParseError::UnknownArgument(other.to_owned())),
        }
    }

    if parsed.host.is_some() {
        if parsed.device.is_some() {
            return Err(conflict("--host", "--device"));
        }
        if parsed.baud.is_some() {
            return Err(conflict("--host", "--baud"));
        }
    }

    if check_config {
        Ok(Command::CheckConfig(parsed))
    } else {
        Ok(Command::Run(parsed))
    }
}

fn take_value<I>(flag: &str, args: &mut I) -> Result<String, CliParseError>
where
    I: Iterator<Item = String>,
{
    args.next()
        .ok_or_else(|| CliParseError::MissingValue(flag.to_owned()))
}

fn take_number<T, I>(flag: &str, args: &mut I) -> Result<T, CliParseError>
where
    T: std::str::FromStr,
    I: Iterator<Item = String>,
{
    let value = take_value(flag, args)?;
    value
        .parse::<T>()
        .map_err(|_| CliParseError::InvalidNumber {
            flag: flag.to_owned(),
            value,
        })
}

fn conflict(first: &str, second: &str) -> CliParseError {
    CliParseError::Conflict {
        first: first.to_owned(),
        second: second.to_owned(),
    }
}

pub fn usage() -> String {
    format!(
        "serial-split {}\n\nUSAGE:\n  serial-split [OPTIONS]\n\nLINK:\n  -d, --device <PATH>              Serial device (default /dev/ttyUSB1)\n  -b, --baud <RATE>                Serial speed (default 1000000)\n      --host <HOST>                Connect to a TCP serial bridge instead\n  -p, --port <PORT>                TCP port (default 5001)\n\nSESSION:\n  -c, --config <PATH>              Config file (default ~/.serial-split.json or ~/.serial-split.toml)\n  -l, --logfile <PATH>             Output log file, \"\" disables (default ~/serial-split.log)\n  -dl, --debug-log <PATH>          Debug log file\n  -t, --show-timestamp             Timestamp each received line\n  -hl, --history-length <N>        Output lines kept for scrollback, 0 keeps all (default 1000)\n  -mh, --max-history <N>           Commands kept in history (default 500)\n  -iwl, --input-window-height <N>  Rows of the command pane (default 1)\n\nGENERAL:\n      --check-config               Validate the config, print it and exit\n  -h, --help                       Print help\n\nKEYS:\n  enter send  up/down history  pgup/pgdn alt+up/down scroll  end follow  f1 help  esc quit\n",
        env!("CARGO_PKG_VERSION")
    )
}

pub fn print_usage() {
    print!("{}", usage());
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
