use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::console::scrollback::{lock, OutputLine, SharedScrollback};
use crate::console::ConsoleEngine;

use super::terminal_text::{ansi_line, sanitize_log_text};

/// What the output pane shows, copied out of the scrollback in one locked
/// section so a frame never mixes two states of the buffer.
#[derive(Debug, Clone)]
pub(super) struct OutputView {
    pub(super) lines: Vec<Line<'static>>,
    pub(super) height: usize,
    pub(super) view_offset: usize,
    pub(super) max_offset: usize,
    pub(super) retained: usize,
}

impl OutputView {
    pub(super) fn is_following(&self) -> bool {
        self.view_offset == 0
    }

    /// Scrollbar position counted from the oldest line.
    pub(super) fn position_from_top(&self) -> usize {
        self.max_offset.saturating_sub(self.view_offset)
    }
}

pub(super) fn build_output_view(scrollback: &SharedScrollback, height: usize) -> OutputView {
    let (slice, view_offset, max_offset, retained) = {
        let buffer = lock(scrollback);
        (
            buffer.visible_slice(height),
            buffer.view_offset(),
            buffer.max_offset(),
            buffer.len(),
        )
    };
    OutputView {
        lines: slice.iter().map(output_line).collect(),
        height,
        view_offset,
        max_offset,
        retained,
    }
}

fn output_line(line: &OutputLine) -> Line<'static> {
    let body = ansi_line(&sanitize_log_text(&line.text), line.style);
    match &line.received_at {
        Some(stamp) => {
            let mut spans = vec![Span::styled(
                stamp.display_prefix(),
                Style::default().fg(Color::DarkGray),
            )];
            spans.extend(body.spans);
            Line::from(spans)
        }
        None => body,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct InputView {
    pub(super) text: String,
    pub(super) cursor: usize,
    pub(super) write_error: Option<String>,
}

impl InputView {
    pub(super) fn capture(engine: &ConsoleEngine) -> Self {
        Self {
            text: engine.editor().text().to_owned(),
            cursor: engine.editor().cursor(),
            write_error: engine.last_write_error().map(str::to_owned),
        }
    }
}

/// The last view of each pane. A pane is rebuilt only when it is dirty, so
/// typing never touches the scrollback lock.
#[derive(Debug, Default)]
pub(super) struct PaneCache {
    pub(super) output: Option<OutputView>,
    pub(super) input: Option<InputView>,
}

impl PaneCache {
    pub(super) fn output_stale(&self, height: usize) -> bool {
        self.output.as_ref().is_none_or(|view| view.height != height)
    }
}
