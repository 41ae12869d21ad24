use super::{parse_command, usage, CliParseError, Command, ConsoleArgs};
use std::path::PathBuf;

fn args(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|arg| (*arg).to_owned()).collect()
}

#[test]
fn parse_without_arguments_runs_with_defaults() {
    let cmd = parse_command(Vec::<String>::new()).expect("parse should succeed");
    assert_eq!(cmd, Command::Run(ConsoleArgs::default()));
}

#[test]
fn parse_help_wins_over_other_flags() {
    let cmd = parse_command(args(&["-d", "/dev/ttyUSB0", "--help"])).expect("parse");
    assert_eq!(cmd, Command::Help);
}

#[test]
fn parse_serial_session_with_short_flags() {
    let cmd = parse_command(args(&[
        "-d",
        "/dev/ttyACM0",
        "-b",
        "115200",
        "-t",
        "-hl",
        "0",
        "-mh",
        "25",
        "-iwl",
        "2",
        "-l",
        "",
        "-dl",
        "/tmp/debug.log",
        "-c",
        "/etc/serial-split.toml",
    ]))
    .expect("parse should succeed");

    assert_eq!(
        cmd,
        Command::Run(ConsoleArgs {
            device: Some("/dev/ttyACM0".to_owned()),
            baud: Some(115_200),
            show_timestamp: true,
            history_length: Some(0),
            max_history: Some(25),
            input_window_height: Some(2),
            logfile: Some(String::new()),
            debug_log: Some("/tmp/debug.log".to_owned()),
            config: Some(PathBuf::from("/etc/serial-split.toml")),
            ..ConsoleArgs::default()
        })
    );
}

#[test]
fn parse_tcp_session_with_long_flags() {
    let cmd = parse_command(args(&["--host", "bridge.local", "--port", "6001"])).expect("parse");
    assert_eq!(
        cmd,
        Command::Run(ConsoleArgs {
            host: Some("bridge.local".to_owned()),
            port: Some(6001),
            ..ConsoleArgs::default()
        })
    );
}

#[test]
fn parse_check_config_keeps_other_values() {
    let cmd = parse_command(args(&["--check-config", "-b", "9600"])).expect("parse");
    assert_eq!(
        cmd,
        Command::CheckConfig(ConsoleArgs {
            baud: Some(9600),
            ..ConsoleArgs::default()
        })
    );
}

#[test]
fn parse_missing_value_names_the_flag() {
    let err = parse_command(args(&["--device"])).expect_err("missing value");
    assert_eq!(err, CliParseError::MissingValue("--device".to_owned()));
    assert_eq!(err.to_string(), "--device requires a value");
}

#[test]
fn parse_rejects_non_numeric_and_out_of_range_values() {
    let err = parse_command(args(&["-b", "fast"])).expect_err("bad baud");
    assert_eq!(
        err,
        CliParseError::InvalidNumber {
            flag: "-b".to_owned(),
            value: "fast".to_owned(),
        }
    );
    assert!(parse_command(args(&["--port", "70000"])).is_err());
    assert!(parse_command(args(&["-iwl", "-1"])).is_err());
}

#[test]
fn parse_rejects_host_with_serial_flags() {
    let err = parse_command(args(&["--host", "bridge", "-d", "/dev/ttyUSB0"]))
        .expect_err("conflict");
    assert_eq!(err.to_string(), "--host cannot be combined with --device");
    assert!(parse_command(args(&["--host", "bridge", "-b", "9600"])).is_err());
}

#[test]
fn parse_rejects_unknown_arguments() {
    let err = parse_command(args(&["--colour"])).expect_err("unknown");
    assert_eq!(err, CliParseError::UnknownArgument("--colour".to_owned()));
}

#[test]
fn usage_lists_every_flag() {
    let text = usage();
    for flag in [
        "--device",
        "--baud",
        "--host",
        "--port",
        "--config",
        "--logfile",
        "--debug-log",
        "--show-timestamp",
        "--history-length",
        "--max-history",
        "--input-window-height",
        "--check-config",
        "--help",
    ] {
        assert!(text.contains(flag), "usage is missing {flag}");
    }
}
