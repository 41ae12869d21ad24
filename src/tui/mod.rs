//! Full-screen console: ratatui over crossterm in the alternate screen.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::backend::Backend;
use ratatui::layout::Rect;
use ratatui::Terminal;

use crate::config::ConsoleConfig;
use crate::console::reader::{LineSink, ReaderHandle};
use crate::console::scrollback::{lock, shared};
use crate::console::{ConsoleEngine, SessionStats, ShutdownReason};
use crate::logging::OutputLog;
use crate::transport::Transport;

mod config;
mod lifecycle;
mod render;
mod terminal_text;
mod view_model;

use config::{EVENT_DRAIN_WAIT, INPUT_POLL_WAIT, MAX_EVENTS_PER_TICK, SHUTDOWN_GRACE_TIMEOUT};
use lifecycle::{draw_shutdown_status, init_terminal, restore_terminal, terminal_rows};
use render::{render_console, split_panes, ScreenState};
use view_model::{build_output_view, InputView, PaneCache};

pub use terminal_text::{format_elapsed, styled_text};

#[derive(Debug)]
pub enum ConsoleError {
    Io(io::Error),
    TerminalTooSmall { height: u16, required: u16 },
}

impl std::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsoleError::Io(err) => write!(f, "{err}"),
            ConsoleError::TerminalTooSmall { height, required } => write!(
                f,
                "terminal has {height} rows, the console needs at least {required}"
            ),
        }
    }
}

impl std::error::Error for ConsoleError {}

impl From<io::Error> for ConsoleError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleOutcome {
    pub reason: ShutdownReason,
    pub stats: SessionStats,
    pub lines_received: usize,
    pub elapsed: Duration,
    /// False when the reader was still blocked after the grace period.
    pub reader_joined: bool,
}

/// Runs one console session over an open transport until the operator quits
/// or the link goes away. The terminal is restored before returning, also on
/// error.
pub fn run_console(
    config: &ConsoleConfig,
    transport: Transport,
    log: Option<OutputLog>,
) -> Result<ConsoleOutcome, ConsoleError> {
    let required = config.min_terminal_height();
    let height = terminal_rows()?;
    if height < required {
        return Err(ConsoleError::TerminalTooSmall { height, required });
    }

    let Transport {
        reader,
        writer,
        description,
    } = transport;
    let scrollback = shared(config.scrollback());
    let sink = LineSink::new(
        scrollback.clone(),
        Arc::new(config.matcher()),
        log,
        config.show_timestamp,
    );
    let mut engine = ConsoleEngine::new(scrollback, config.history(), writer);
    let mut reader = match ReaderHandle::spawn(reader, sink) {
        Ok(reader) => reader,
        Err(error) => {
            engine.begin_shutdown(ShutdownReason::TransportFailed(error.to_string()));
            return Err(error.into());
        }
    };
    tracing::info!(link = %description, "console session started");

    let started = Instant::now();
    let mut terminal = match init_terminal() {
        Ok(terminal) => terminal,
        Err(error) => {
            engine.begin_shutdown(ShutdownReason::TransportFailed(error.to_string()));
            reader.join_timeout(SHUTDOWN_GRACE_TIMEOUT);
            return Err(error.into());
        }
    };

    let screen = SessionScreen {
        description,
        input_rows: config.input_window_height,
    };
    let loop_result = drive(&mut terminal, &mut engine, &mut reader, &screen);
    if let Err(error) = &loop_result {
        tracing::error!(%error, "console loop failed");
        engine.begin_shutdown(ShutdownReason::Quit);
    }

    let _ = draw_shutdown_status(&mut terminal, "Closing link...");
    let reader_joined = reader.join_timeout(SHUTDOWN_GRACE_TIMEOUT);
    engine.complete_shutdown();
    let restored = restore_terminal(&mut terminal);
    loop_result?;
    restored?;

    let lines_received = lock(engine.scrollback()).total_received();
    Ok(ConsoleOutcome {
        reason: engine
            .shutdown_reason()
            .cloned()
            .unwrap_or(ShutdownReason::Quit),
        stats: engine.stats(),
        lines_received,
        elapsed: started.elapsed(),
        reader_joined,
    })
}

struct SessionScreen {
    description: String,
    input_rows: u16,
}

fn drive<B: Backend>(
    terminal: &mut Terminal<B>,
    engine: &mut ConsoleEngine,
    reader: &mut ReaderHandle,
    screen: &SessionScreen,
) -> Result<(), ConsoleError> {
    let mut cache = PaneCache::default();
    while engine.is_running() {
        let mut drained_events = 0usize;
        while drained_events < MAX_EVENTS_PER_TICK && engine.is_running() {
            let Some(reader_event) = reader.next_event_timeout(EVENT_DRAIN_WAIT) else {
                break;
            };
            drained_events += 1;
            engine.on_reader_event(reader_event);
        }
        if !engine.is_running() {
            break;
        }

        draw_if_dirty(terminal, engine, &mut cache, screen)?;

        if event::poll(INPUT_POLL_WAIT)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => engine.handle_key(&key),
                Event::Resize(_, _) => engine.mark_all_dirty(),
                _ => {}
            }
        }
    }
    Ok(())
}

/// Draws a frame when some pane changed. Returns whether a frame was drawn.
fn draw_if_dirty<B: Backend>(
    terminal: &mut Terminal<B>,
    engine: &mut ConsoleEngine,
    cache: &mut PaneCache,
    screen: &SessionScreen,
) -> Result<bool, io::Error> {
    let size = terminal.size()?;
    let areas = split_panes(Rect::new(0, 0, size.width, size.height), screen.input_rows);
    let output_rows = areas.output_rows();
    engine.set_page_size(output_rows);

    let mut dirty = engine.take_dirty();
    dirty.output |= cache.output_stale(output_rows);
    dirty.input |= cache.input.is_none();
    if !dirty.any() {
        return Ok(false);
    }

    if dirty.full {
        terminal.clear()?;
    }
    if dirty.output {
        cache.output = Some(build_output_view(engine.scrollback(), output_rows));
    }
    if dirty.input {
        cache.input = Some(InputView::capture(engine));
    }
    let (Some(output), Some(input)) = (&cache.output, &cache.input) else {
        return Ok(false);
    };

    let state = ScreenState {
        description: &screen.description,
        input_rows: screen.input_rows,
        show_help: engine.show_help(),
        running: engine.is_running(),
    };
    terminal.draw(|frame| render_console(frame, output, input, &state))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ratatui::style::Style;

    use super::*;
    use crate::console::scrollback::{OutputLine, ScrollbackBuffer};
    use crate::console::{DuplicatePolicy, HistoryBuffer};
    use crate::transport::{TransportError, TransportWriter};

    struct SinkWriter(Arc<Mutex<Vec<u8>>>);

    impl TransportWriter for SinkWriter {
        fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            self.0.lock().expect("sink").extend_from_slice(bytes);
            Ok(())
        }

        fn close(&mut self) {}
    }

    fn engine() -> (ConsoleEngine, Arc<Mutex<Vec<u8>>>) {
        let wire = Arc::new(Mutex::new(Vec::new()));
        let engine = ConsoleEngine::new(
            shared(ScrollbackBuffer::new(Some(50))),
            HistoryBuffer::new(10, DuplicatePolicy::MoveToEnd),
            Box::new(SinkWriter(wire.clone())),
        );
        (engine, wire)
    }

    fn screen() -> SessionScreen {
        SessionScreen {
            description: "Host: bridge Port: 5001".to_owned(),
            input_rows: 1,
        }
    }

    fn press(engine: &mut ConsoleEngine, code: KeyCode) {
        engine.handle_key(&KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn frames_are_only_drawn_when_a_pane_changes() {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).expect("terminal");
        let (mut engine, _wire) = engine();
        let mut cache = PaneCache::default();
        let screen = screen();

        assert!(draw_if_dirty(&mut terminal, &mut engine, &mut cache, &screen).expect("draw"));
        assert!(!draw_if_dirty(&mut terminal, &mut engine, &mut cache, &screen).expect("draw"));

        press(&mut engine, KeyCode::Char('x'));
        assert!(draw_if_dirty(&mut terminal, &mut engine, &mut cache, &screen).expect("draw"));
        assert_eq!(cache.input.as_ref().map(|view| view.text.as_str()), Some("x"));
    }

    #[test]
    fn typing_reuses_the_cached_output_view() {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).expect("terminal");
        let (mut engine, _wire) = engine();
        let mut cache = PaneCache::default();
        let screen = screen();
        draw_if_dirty(&mut terminal, &mut engine, &mut cache, &screen).expect("draw");

        // Appended without a dirty flag so only a rebuild could pick it up.
        lock(engine.scrollback()).append(OutputLine::new("late", Style::default()));
        lock(engine.scrollback()).take_dirty();
        press(&mut engine, KeyCode::Char('y'));
        draw_if_dirty(&mut terminal, &mut engine, &mut cache, &screen).expect("draw");

        let output = cache.output.as_ref().expect("output view");
        assert_eq!(output.retained, 0);
    }

    #[test]
    fn page_size_follows_the_output_pane() {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).expect("terminal");
        let (mut engine, _wire) = engine();
        let mut cache = PaneCache::default();
        draw_if_dirty(&mut terminal, &mut engine, &mut cache, &screen()).expect("draw");
        // 12 rows - footer - 3 input rows - 2 borders
        assert_eq!(engine.page_size(), 6);
    }

    #[test]
    fn submitted_command_reaches_the_writer_and_clears_the_pane() {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).expect("terminal");
        let (mut engine, wire) = engine();
        let mut cache = PaneCache::default();
        for c in "ver".chars() {
            press(&mut engine, KeyCode::Char(c));
        }
        press(&mut engine, KeyCode::Enter);
        draw_if_dirty(&mut terminal, &mut engine, &mut cache, &screen()).expect("draw");

        assert_eq!(wire.lock().expect("wire").as_slice(), b"ver\n");
        assert_eq!(cache.input.as_ref().map(|view| view.text.as_str()), Some(""));
    }
}
