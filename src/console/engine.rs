use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::transport::TransportWriter;

use super::editor::InputEditor;
use super::history::{HistoryBuffer, HistoryDirection};
use super::reader::ReaderEvent;
use super::scrollback::{lock, SharedScrollback};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    ShuttingDown,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    Quit,
    TransportClosed,
    TransportFailed(String),
}

impl ShutdownReason {
    pub fn describe(&self) -> String {
        match self {
            ShutdownReason::Quit => "quit by operator".to_owned(),
            ShutdownReason::TransportClosed => "link closed by peer".to_owned(),
            ShutdownReason::TransportFailed(error) => format!("link failed: {error}"),
        }
    }

    pub fn is_link_loss(&self) -> bool {
        !matches!(self, ShutdownReason::Quit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    InsertChar(char),
    Backspace,
    DeleteForward,
    CursorLeft,
    CursorRight,
    CursorToStart,
    CursorToEnd,
    KillToEnd,
    KillLine,
    HistoryOlder,
    HistoryNewer,
    Submit,
    /// Positive values move toward older output.
    ScrollLines(isize),
    ScrollPages(isize),
    ScrollToStart,
    ScrollToEnd,
    ToggleHelp,
    Redraw,
}

/// Maps a key press to what it means to the console. Keys with no meaning
/// return `None` and are dropped.
pub fn classify_key(key: &KeyEvent) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    if ctrl {
        if let KeyCode::Char(c) = key.code {
            return match c.to_ascii_lowercase() {
                'c' => Some(KeyAction::Quit),
                'a' => Some(KeyAction::CursorToStart),
                'e' => Some(KeyAction::CursorToEnd),
                'b' => Some(KeyAction::CursorLeft),
                'f' => Some(KeyAction::CursorRight),
                'd' => Some(KeyAction::DeleteForward),
                'h' => Some(KeyAction::Backspace),
                'k' => Some(KeyAction::KillToEnd),
                'u' => Some(KeyAction::KillLine),
                'l' => Some(KeyAction::Redraw),
                _ => None,
            };
        }
    }

    let action = match key.code {
        KeyCode::Esc => KeyAction::Quit,
        KeyCode::Up if alt => KeyAction::ScrollLines(1),
        KeyCode::Down if alt => KeyAction::ScrollLines(-1),
        KeyCode::Up => KeyAction::HistoryOlder,
        KeyCode::Down => KeyAction::HistoryNewer,
        KeyCode::PageUp => KeyAction::ScrollPages(1),
        KeyCode::PageDown => KeyAction::ScrollPages(-1),
        KeyCode::Home if alt || ctrl => KeyAction::ScrollToStart,
        KeyCode::Home => KeyAction::CursorToStart,
        KeyCode::End => KeyAction::ScrollToEnd,
        KeyCode::Left => KeyAction::CursorLeft,
        KeyCode::Right => KeyAction::CursorRight,
        KeyCode::Backspace | KeyCode::Delete => KeyAction::Backspace,
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::F(1) => KeyAction::ToggleHelp,
        KeyCode::Char(c) if !ctrl && !alt => KeyAction::InsertChar(c),
        _ => return None,
    };
    Some(action)
}

/// Which panes changed since the last frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyPanes {
    pub output: bool,
    pub input: bool,
    /// The whole screen must be cleared and repainted.
    pub full: bool,
}

impl DirtyPanes {
    pub fn any(self) -> bool {
        self.output || self.input || self.full
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub commands_sent: usize,
    pub write_failures: usize,
}

/// Owns the input side of the session and routes key presses and reader
/// notifications to the editor, the history and the shared scrollback.
///
/// Everything here runs on the UI thread. The only state shared with the
/// reader is the scrollback, and it is only touched under its lock.
pub struct ConsoleEngine {
    state: EngineState,
    scrollback: SharedScrollback,
    history: HistoryBuffer,
    editor: InputEditor,
    draft: Option<String>,
    writer: Box<dyn TransportWriter>,
    page_size: usize,
    show_help: bool,
    output_dirty: bool,
    input_dirty: bool,
    full_redraw: bool,
    last_write_error: Option<String>,
    stats: SessionStats,
    reason: Option<ShutdownReason>,
}

impl ConsoleEngine {
    pub fn new(
        scrollback: SharedScrollback,
        history: HistoryBuffer,
        writer: Box<dyn TransportWriter>,
    ) -> Self {
        Self {
            state: EngineState::Running,
            scrollback,
            history,
            editor: InputEditor::new(),
            draft: None,
            writer,
            page_size: 1,
            show_help: false,
            output_dirty: true,
            input_dirty: true,
            full_redraw: false,
            last_write_error: None,
            stats: SessionStats::default(),
            reason: None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    pub fn editor(&self) -> &InputEditor {
        &self.editor
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn scrollback(&self) -> &SharedScrollback {
        &self.scrollback
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn last_write_error(&self) -> Option<&str> {
        self.last_write_error.as_deref()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn shutdown_reason(&self) -> Option<&ShutdownReason> {
        self.reason.as_ref()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Page scroll distance follows the visible height of the output pane.
    pub fn set_page_size(&mut self, rows: usize) {
        self.page_size = rows.max(1);
    }

    pub fn handle_key(&mut self, key: &KeyEvent) {
        if !self.is_running() {
            return;
        }
        if let Some(action) = classify_key(key) {
            tracing::debug!(?action, "key routed");
            self.apply(action);
        }
    }

    pub fn apply(&mut self, action: KeyAction) {
        if !self.is_running() {
            return;
        }
        match action {
            KeyAction::Quit => self.begin_shutdown(ShutdownReason::Quit),
            KeyAction::InsertChar(c) => self.edit(|editor| editor.insert_char(c)),
            KeyAction::Backspace => self.edit(InputEditor::backspace),
            KeyAction::DeleteForward => self.edit(InputEditor::delete_forward),
            KeyAction::CursorLeft => self.edit(|editor| editor.move_cursor(-1)),
            KeyAction::CursorRight => self.edit(|editor| editor.move_cursor(1)),
            KeyAction::CursorToStart => self.edit(InputEditor::move_to_start),
            KeyAction::CursorToEnd => self.edit(InputEditor::move_to_end),
            KeyAction::KillToEnd => self.edit(InputEditor::kill_to_end),
            KeyAction::KillLine => self.edit(InputEditor::clear),
            KeyAction::HistoryOlder => self.recall(HistoryDirection::Older),
            KeyAction::HistoryNewer => self.recall(HistoryDirection::Newer),
            KeyAction::Submit => self.submit(),
            KeyAction::ScrollLines(lines) => lock(&self.scrollback).scroll_by(lines),
            KeyAction::ScrollPages(pages) => {
                let page = isize::try_from(self.page_size).unwrap_or(isize::MAX);
                lock(&self.scrollback).scroll_by(pages.saturating_mul(page));
            }
            KeyAction::ScrollToStart => lock(&self.scrollback).scroll_to_start(),
            KeyAction::ScrollToEnd => lock(&self.scrollback).scroll_to_end(),
            KeyAction::ToggleHelp => {
                self.show_help = !self.show_help;
                self.output_dirty = true;
            }
            KeyAction::Redraw => self.full_redraw = true,
        }
    }

    fn edit(&mut self, change: impl FnOnce(&mut InputEditor)) {
        change(&mut self.editor);
        self.input_dirty = true;
    }

    /// The line being typed is kept aside on the first step into history and
    /// comes back when the operator steps past the newest entry.
    /// Steps that do not move the recall cursor leave the editor untouched.
    fn recall(&mut self, direction: HistoryDirection) {
        let was_navigating = self.history.is_navigating();
        match self.history.navigate(direction) {
            Some(entry) => {
                if !was_navigating {
                    self.draft = Some(self.editor.text().to_owned());
                }
                self.editor.set_text(&entry);
            }
            None if was_navigating => {
                let draft = self.draft.take().unwrap_or_default();
                self.editor.set_text(&draft);
            }
            None => return,
        }
        self.input_dirty = true;
    }

    fn submit(&mut self) {
        let raw = self.editor.submit_and_clear();
        self.draft = None;
        self.history.reset_navigation();
        self.input_dirty = true;

        let command = raw.trim();
        if command.is_empty() {
            return;
        }
        let mut payload = String::with_capacity(command.len() + 1);
        payload.push_str(command);
        payload.push('\n');
        match self.writer.write(payload.as_bytes()) {
            Ok(()) => {
                self.stats.commands_sent += 1;
                self.last_write_error = None;
                tracing::debug!(command, "command sent");
            }
            Err(error) => {
                self.stats.write_failures += 1;
                tracing::warn!(command, %error, "write to transport failed");
                self.last_write_error = Some(error.to_string());
            }
        }
        self.history.submit(command);
    }

    pub fn on_reader_event(&mut self, event: ReaderEvent) {
        match event {
            ReaderEvent::LineAppended => self.output_dirty = true,
            ReaderEvent::Closed => self.begin_shutdown(ShutdownReason::TransportClosed),
            ReaderEvent::Failed(error) => {
                self.begin_shutdown(ShutdownReason::TransportFailed(error))
            }
        }
    }

    /// `Running -> ShuttingDown`. Closing the writer unblocks the reader,
    /// which then reports `Closed` and exits.
    pub fn begin_shutdown(&mut self, reason: ShutdownReason) {
        if !self.is_running() {
            return;
        }
        tracing::info!(reason = %reason.describe(), "console shutting down");
        self.state = EngineState::ShuttingDown;
        self.writer.close();
        self.reason = Some(reason);
        self.output_dirty = true;
    }

    /// `ShuttingDown -> Terminated`, once the reader has been joined or given up on.
    pub fn complete_shutdown(&mut self) {
        if self.state == EngineState::ShuttingDown {
            self.state = EngineState::Terminated;
            tracing::info!("console terminated");
        }
    }

    /// Clears and returns the pending redraw work. The scrollback's own dirty
    /// flag covers appends and scrolling.
    pub fn take_dirty(&mut self) -> DirtyPanes {
        let buffer_dirty = lock(&self.scrollback).take_dirty();
        let dirty = DirtyPanes {
            output: self.output_dirty || buffer_dirty || self.full_redraw,
            input: self.input_dirty || self.full_redraw,
            full: self.full_redraw,
        };
        self.output_dirty = false;
        self.input_dirty = false;
        self.full_redraw = false;
        dirty
    }

    pub fn mark_all_dirty(&mut self) {
        self.output_dirty = true;
        self.input_dirty = true;
    }
}

#[cfg(test)]
#[path = "../tests/engine_tests.rs"]
mod tests;
