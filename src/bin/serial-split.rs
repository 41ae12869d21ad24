use std::io::IsTerminal;

use serial_split::config::{self, ConsoleConfig};
use serial_split::logging::{self, OutputLog};
use serial_split::transport;
use serial_split::tui::{self, format_elapsed, styled_text, ConsoleError, ConsoleOutcome};
use serial_split::ui::theme::{ansi_style, resolve_color_enabled};
use serial_split::ui::{
    KeyValue, MessageBlock, NoticeLevel, OutputMode, PlainRenderer, Renderer, TableSpec,
};
use serial_split::{parse_command, print_usage, usage, Command, ConsoleArgs};

const PROGRAM: &str = "serial-split";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let output_mode = OutputMode::from_env();
    let cmd = match parse_command(args) {
        Ok(cmd) => cmd,
        Err(err) => {
            let mut renderer = PlainRenderer::stderr(output_mode);
            let _ = renderer.error_block(
                &MessageBlock::new("Invalid command arguments", err.to_string())
                    .with_hint("Run `serial-split --help` to see supported options"),
            );
            eprint!("{}", usage());
            std::process::exit(2);
        }
    };

    match cmd {
        Command::Help => print_usage(),
        Command::CheckConfig(args) => {
            let config = resolve_or_exit(&args, output_mode);
            if let Err(err) = print_config(&config, output_mode) {
                eprintln!("{err}");
                std::process::exit(1);
            }
        }
        Command::Run(args) => {
            let config = resolve_or_exit(&args, output_mode);
            std::process::exit(run_session(&config, output_mode));
        }
    }
}

fn resolve_or_exit(args: &ConsoleArgs, output_mode: OutputMode) -> ConsoleConfig {
    match config::resolve(args, config::home_dir().as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let mut renderer = PlainRenderer::stderr(output_mode);
            let _ = renderer.error_block(
                &MessageBlock::new("Invalid configuration", err.to_string())
                    .with_hint("Fix the config file or pass --config with another path"),
            );
            std::process::exit(2);
        }
    }
}

fn print_config(
    config: &ConsoleConfig,
    output_mode: OutputMode,
) -> Result<(), serial_split::ui::UiError> {
    let mut renderer = PlainRenderer::stdout(output_mode);
    renderer.section("Configuration")?;
    renderer.key_values(&KeyValue::from_pairs(&config.settings()))?;
    renderer.text("")?;

    renderer.section("Color patterns")?;
    let rows = config
        .rules
        .iter()
        .map(|rule| {
            vec![
                rule.name.clone(),
                rule.matcher.describe(),
                rule.style_summary(),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    renderer.table(&TableSpec::new(
        vec!["name".to_owned(), "match".to_owned(), "style".to_owned()],
        rows,
    ))?;
    let color_enabled = resolve_color_enabled(output_mode, std::io::stdout().is_terminal());
    if color_enabled && !config.rules.is_empty() {
        let samples = config
            .rules
            .iter()
            .map(|rule| styled_text(ansi_style(rule.style), &rule.name))
            .collect::<Vec<String>>();
        renderer.bullet_list("Samples", &samples)?;
    }
    renderer.text("")?;

    renderer.bullet_list("Common commands", &config.common_commands)?;
    Ok(())
}

/// Opens the link, runs the console and prints the session summary. Returns
/// the process exit code.
fn run_session(config: &ConsoleConfig, output_mode: OutputMode) -> i32 {
    let header = logging::session_header(PROGRAM, &config.settings());
    let mut errors = PlainRenderer::stderr(output_mode);

    if let Some(path) = &config.debug_log {
        if let Err(err) = logging::init_debug_log(path, &header) {
            let _ = errors.warning_block(
                &MessageBlock::new("Debug log unavailable", err.to_string())
                    .with_hint("The session continues without a debug log"),
            );
        }
    }

    let mut log_warning = None;
    let log = match &config.logfile {
        Some(path) => match OutputLog::open(path, &header) {
            Ok(log) => Some(log),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "output log unavailable");
                log_warning = Some(err.to_string());
                None
            }
        },
        None => None,
    };

    let description = config.transport.describe();
    let link = match errors.spinner(&format!("Opening {description}")) {
        Ok(spinner) => {
            let opened = transport::open(&config.transport);
            match &opened {
                Ok(_) => spinner.finish_success(&format!("Connected: {description}")),
                Err(_) => spinner.finish_error(&format!("Could not open {description}")),
            }
            opened
        }
        Err(_) => transport::open(&config.transport),
    };
    let link = match link {
        Ok(link) => link,
        Err(err) => {
            let _ = errors.error_block(
                &MessageBlock::new("Could not open link", err.to_string())
                    .with_hint("Check --device and --baud, or use --host for a TCP bridge"),
            );
            return 1;
        }
    };

    let outcome = match tui::run_console(config, link, log) {
        Ok(outcome) => outcome,
        Err(err) => {
            let hint = match err {
                ConsoleError::TerminalTooSmall { .. } => {
                    "Enlarge the terminal or lower --input-window-height"
                }
                ConsoleError::Io(_) => "The console needs an interactive terminal",
            };
            let _ = errors.error_block(
                &MessageBlock::new("Console failed", err.to_string()).with_hint(hint),
            );
            return 1;
        }
    };

    let _ = print_summary(config, &outcome, output_mode);
    if let Some(warning) = log_warning {
        let _ = errors.warning_block(
            &MessageBlock::new("Output log unavailable", warning)
                .with_hint("Received lines were not written to disk"),
        );
    }
    if outcome.reason.is_link_loss() {
        1
    } else {
        0
    }
}

fn print_summary(
    config: &ConsoleConfig,
    outcome: &ConsoleOutcome,
    output_mode: OutputMode,
) -> Result<(), serial_split::ui::UiError> {
    let mut renderer = PlainRenderer::stdout(output_mode);
    renderer.section("Session")?;
    let logfile = config
        .logfile
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<disabled>".to_owned());
    renderer.key_values(&[
        KeyValue::new("link", config.transport.describe()),
        KeyValue::new("ended", outcome.reason.describe()),
        KeyValue::new("duration", format_elapsed(outcome.elapsed)),
        KeyValue::new("lines received", outcome.lines_received.to_string()),
        KeyValue::new("commands sent", outcome.stats.commands_sent.to_string()),
        KeyValue::new("failed writes", outcome.stats.write_failures.to_string()),
        KeyValue::new("logfile", logfile),
    ])?;
    if !outcome.reader_joined {
        renderer.notice(
            NoticeLevel::Warning,
            "reader thread was still blocked when the session ended",
        )?;
    }
    Ok(())
}
