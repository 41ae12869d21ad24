use std::fs;
use std::path::{Path, PathBuf};

use ratatui::style::{Color, Modifier};
use tempfile::TempDir;

use super::*;

fn home() -> TempDir {
    tempfile::tempdir().expect("temp home")
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn defaults_apply_without_a_config_file() {
    let home = home();
    let config = resolve(&ConsoleArgs::default(), Some(home.path())).expect("resolve");

    assert_eq!(
        config.transport,
        TransportSpec::Serial {
            device: PathBuf::from("/dev/ttyUSB1"),
            baud: 1_000_000,
        }
    );
    assert_eq!(config.input_window_height, 1);
    assert_eq!(config.scrollback_limit, Some(1000));
    assert_eq!(config.max_history, 500);
    assert_eq!(config.duplicate_policy, DuplicatePolicy::MoveToEnd);
    assert!(!config.show_timestamp);
    assert_eq!(config.logfile, Some(home.path().join("serial-split.log")));
    assert_eq!(config.debug_log, None);
    assert!(config.rules.is_empty());
    assert_eq!(config.source, None);
    assert_eq!(config.min_terminal_height(), 8);
}

#[test]
fn home_json_config_is_discovered_and_keeps_rule_order() {
    let home = home();
    write(
        home.path(),
        ".serial-split.json",
        r#"{
            "baud": 115200,
            "history_length": 0,
            "common_commands": ["help", "ls"],
            "color_patterns": {
                "zeta": { "pattern": "warn", "fg": "COLOR_YELLOW" },
                "alpha": { "pattern": "^E \\d+", "fg": "red", "bg": "black", "bold": true }
            }
        }"#,
    );

    let config = resolve(&ConsoleArgs::default(), Some(home.path())).expect("resolve");

    assert_eq!(
        config.source,
        Some(home.path().join(".serial-split.json"))
    );
    assert_eq!(config.scrollback_limit, None);
    let names = config
        .rules
        .iter()
        .map(|rule| rule.name.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(names, vec!["zeta", "alpha"]);
    assert_eq!(config.rules[0].style.fg, Some(Color::Yellow));
    assert_eq!(config.rules[1].style.bg, Some(Color::Black));
    assert!(config.rules[1].style.add_modifier.contains(Modifier::BOLD));
    assert_eq!(config.history().to_vec(), vec!["help", "ls"]);
    assert_eq!(
        config.matcher().resolve_style("e 42 disk").fg,
        Some(Color::Red)
    );
}

#[test]
fn toml_config_is_parsed_by_extension() {
    let home = home();
    let path = write(
        home.path(),
        "console.toml",
        r#"
input_window_height = 3
history_duplicates = "keep_original"
show_timestamp = true
logfile = ""

[remote]
host = "bridge.local"

[color_patterns.panic]
pattern = "panic["
literal = true
fg = "lightred"
"#,
    );
    let args = ConsoleArgs {
        config: Some(path.clone()),
        ..ConsoleArgs::default()
    };

    let config = resolve(&args, Some(home.path())).expect("resolve");

    assert_eq!(
        config.transport,
        TransportSpec::Tcp {
            host: "bridge.local".to_owned(),
            port: 5001,
        }
    );
    assert_eq!(config.input_window_height, 3);
    assert_eq!(config.duplicate_policy, DuplicatePolicy::KeepOriginal);
    assert!(config.show_timestamp);
    assert_eq!(config.logfile, None);
    assert_eq!(config.source, Some(path));
    assert!(config.rules[0].matcher.is_match("kernel PANIC[0]"));
}

#[test]
fn command_line_values_win_over_the_file() {
    let home = home();
    write(
        home.path(),
        ".serial-split.json",
        r#"{ "device": "/dev/ttyACM0", "baud": 9600, "max_history": 20, "logfile": "~/from-file.log" }"#,
    );
    let args = ConsoleArgs {
        baud: Some(115_200),
        max_history: Some(7),
        logfile: Some("~/cli.log".to_owned()),
        debug_log: Some("~/debug.log".to_owned()),
        ..ConsoleArgs::default()
    };

    let config = resolve(&args, Some(home.path())).expect("resolve");

    assert_eq!(
        config.transport,
        TransportSpec::Serial {
            device: PathBuf::from("/dev/ttyACM0"),
            baud: 115_200,
        }
    );
    assert_eq!(config.max_history, 7);
    assert_eq!(config.logfile, Some(home.path().join("cli.log")));
    assert_eq!(config.debug_log, Some(home.path().join("debug.log")));
}

#[test]
fn explicit_serial_flags_override_a_remote_in_the_file() {
    let home = home();
    write(
        home.path(),
        ".serial-split.json",
        r#"{ "remote": { "host": "bridge.local", "port": 6000 } }"#,
    );
    let args = ConsoleArgs {
        device: Some("/dev/ttyUSB0".to_owned()),
        ..ConsoleArgs::default()
    };
    let config = resolve(&args, Some(home.path())).expect("resolve");
    assert!(matches!(config.transport, TransportSpec::Serial { .. }));

    let args = ConsoleArgs {
        port: Some(7000),
        ..ConsoleArgs::default()
    };
    let config = resolve(&args, Some(home.path())).expect("resolve");
    assert_eq!(
        config.transport,
        TransportSpec::Tcp {
            host: "bridge.local".to_owned(),
            port: 7000,
        }
    );
}

#[test]
fn null_remote_host_keeps_the_serial_link() {
    let home = home();
    write(
        home.path(),
        ".serial-split.json",
        r#"{ "remote": { "host": null, "port": 5001 } }"#,
    );
    let config = resolve(&ConsoleArgs::default(), Some(home.path())).expect("resolve");
    assert!(matches!(config.transport, TransportSpec::Serial { .. }));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let home = home();
    let args = ConsoleArgs {
        config: Some(home.path().join("absent.json")),
        ..ConsoleArgs::default()
    };
    let err = resolve(&args, Some(home.path())).expect_err("missing config");
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn unknown_keys_are_rejected() {
    let home = home();
    write(home.path(), ".serial-split.json", r#"{ "bauds": 9600 }"#);
    let err = resolve(&ConsoleArgs::default(), Some(home.path())).expect_err("unknown key");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("bauds"));
}

#[test]
fn invalid_regex_names_the_rule() {
    let home = home();
    write(
        home.path(),
        ".serial-split.json",
        r#"{ "color_patterns": { "broken": { "pattern": "(unclosed", "fg": "red" } } }"#,
    );
    let err = resolve(&ConsoleArgs::default(), Some(home.path())).expect_err("bad regex");
    assert!(matches!(err, ConfigError::InvalidPattern { ref name, .. } if name == "broken"));
}

#[test]
fn unknown_color_names_the_rule_and_value() {
    let home = home();
    write(
        home.path(),
        ".serial-split.json",
        r#"{ "color_patterns": { "odd": { "pattern": "x", "fg": "COLOR_PUCE" } } }"#,
    );
    let err = resolve(&ConsoleArgs::default(), Some(home.path())).expect_err("bad color");
    assert_eq!(
        err.to_string(),
        "color pattern `odd` uses unknown color `COLOR_PUCE`"
    );
}

#[test]
fn zero_sizes_are_rejected() {
    let home = home();
    let args = ConsoleArgs {
        input_window_height: Some(0),
        ..ConsoleArgs::default()
    };
    let err = resolve(&args, Some(home.path())).expect_err("zero height");
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            field: "input_window_height",
            ..
        }
    ));

    let args = ConsoleArgs {
        max_history: Some(0),
        ..ConsoleArgs::default()
    };
    assert!(resolve(&args, Some(home.path())).is_err());
}

#[test]
fn settings_list_the_effective_values() {
    let home = home();
    let config = resolve(&ConsoleArgs::default(), Some(home.path())).expect("resolve");
    let settings = config.settings();
    assert_eq!(
        settings[0],
        (
            "transport".to_owned(),
            "Port: /dev/ttyUSB1 Speed: 1000000 bit/s".to_owned()
        )
    );
    assert!(settings
        .iter()
        .any(|(key, value)| key == "debug_log" && value == "<disabled>"));
}

#[test]
fn expand_home_only_touches_leading_tilde() {
    let home = Path::new("/home/op");
    assert_eq!(expand_home("~", Some(home)), PathBuf::from("/home/op"));
    assert_eq!(
        expand_home("~/logs/a.log", Some(home)),
        PathBuf::from("/home/op/logs/a.log")
    );
    assert_eq!(expand_home("/tmp/~x", Some(home)), PathBuf::from("/tmp/~x"));
    assert_eq!(expand_home("~/a", None), PathBuf::from("~/a"));
}
