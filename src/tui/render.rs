use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;

use super::config::{FOOTER_ROWS, PANE_BORDER_ROWS};
use super::view_model::{InputView, OutputView};

mod footer;
mod header;
mod help_overlay;
mod panes;

use footer::render_footer;
use help_overlay::render_help_overlay;
use panes::{render_input_pane, render_output_pane};

/// Per-frame chrome that does not live in either pane's view.
#[derive(Debug, Clone, Copy)]
pub(super) struct ScreenState<'a> {
    pub(super) description: &'a str,
    pub(super) input_rows: u16,
    pub(super) show_help: bool,
    pub(super) running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct PaneAreas {
    pub(super) output: Rect,
    pub(super) input: Rect,
    pub(super) footer: Rect,
}

impl PaneAreas {
    /// Rows of received text the output pane can show.
    pub(super) fn output_rows(&self) -> usize {
        usize::from(self.output.height.saturating_sub(PANE_BORDER_ROWS)).max(1)
    }
}

pub(super) fn split_panes(area: Rect, input_rows: u16) -> PaneAreas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(input_rows.saturating_add(PANE_BORDER_ROWS)),
            Constraint::Length(FOOTER_ROWS),
        ])
        .split(area);
    PaneAreas {
        output: chunks[0],
        input: chunks[1],
        footer: chunks[2],
    }
}

pub(super) fn render_console(
    frame: &mut Frame<'_>,
    output: &OutputView,
    input: &InputView,
    screen: &ScreenState<'_>,
) {
    let areas = split_panes(frame.area(), screen.input_rows);

    if screen.show_help {
        render_help_overlay(frame, areas.output);
    } else {
        render_output_pane(frame, areas.output, output, screen.description);
    }
    render_input_pane(frame, areas.input, input, screen.running);
    render_footer(
        frame,
        areas.footer,
        output.is_following(),
        screen.show_help,
        screen.running,
    );
}
