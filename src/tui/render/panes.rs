use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;
use unicode_width::UnicodeWidthChar;

use super::super::view_model::{InputView, OutputView};
use super::header::{follow_badge, panel_block};

const PROMPT: &str = "> ";
const PROMPT_WIDTH: usize = 2;

pub(super) fn render_output_pane(
    frame: &mut Frame<'_>,
    area: Rect,
    view: &OutputView,
    description: &str,
) {
    let panel = panel_block(Some(description), true, Color::DarkGray).title_top(follow_badge(view));
    let output = Paragraph::new(view.lines.clone()).block(panel);
    frame.render_widget(output, area);

    if view.retained > view.height {
        let mut scrollbar_state = ScrollbarState::new(view.max_offset.saturating_add(1))
            .viewport_content_length(view.height.max(1))
            .position(view.position_from_top());
        frame.render_stateful_widget(
            Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

pub(super) fn render_input_pane(
    frame: &mut Frame<'_>,
    area: Rect,
    view: &InputView,
    show_cursor: bool,
) {
    let mut block = panel_block(Some("Commands"), false, Color::Magenta);
    if let Some(error) = &view.write_error {
        block = block.title_top(
            Line::from(Span::styled(
                format!(" write failed: {error} "),
                Style::default().fg(Color::Red),
            ))
            .right_aligned(),
        );
    }
    let inner = block.inner(area);
    let rows = usize::from(inner.height);
    let layout = layout_input(&view.text, view.cursor, usize::from(inner.width));
    let (col, row) = layout.cursor;
    let top = row.saturating_sub(rows.saturating_sub(1));

    let input = Paragraph::new(layout.lines())
        .block(block)
        .scroll((u16::try_from(top).unwrap_or(u16::MAX), 0));
    frame.render_widget(input, area);

    if show_cursor && rows > 0 {
        let x = inner.x.saturating_add(u16::try_from(col).unwrap_or(u16::MAX));
        let y = inner
            .y
            .saturating_add(u16::try_from(row - top).unwrap_or(u16::MAX));
        frame.set_cursor_position((x, y));
    }
}

/// The command as `> ` followed by the text, hard-wrapped at `width` display
/// cells, with the cell the editor cursor sits on.
struct InputLayout {
    rows: Vec<String>,
    cursor: (usize, usize),
}

impl InputLayout {
    fn lines(self) -> Vec<Line<'static>> {
        let text_style = Style::default().fg(Color::Gray);
        self.rows
            .into_iter()
            .enumerate()
            .map(|(idx, row)| {
                let body = Span::styled(row, text_style);
                if idx == 0 {
                    Line::from(vec![
                        Span::styled(PROMPT, Style::default().fg(Color::Yellow)),
                        body,
                    ])
                } else {
                    Line::from(body)
                }
            })
            .collect()
    }
}

/// A character that does not fit in what is left of a row starts the next
/// one, so wide characters are never split.
fn layout_input(text: &str, cursor: usize, width: usize) -> InputLayout {
    let width = width.max(PROMPT_WIDTH + 1);
    let mut rows = vec![String::new()];
    let (mut col, mut row) = (PROMPT_WIDTH, 0usize);
    let mut cursor_cell = None;

    for (idx, c) in text.chars().enumerate() {
        let cells = c.width().unwrap_or(0);
        if col + cells > width {
            rows.push(String::new());
            row += 1;
            col = 0;
        }
        if idx == cursor {
            cursor_cell = Some((col, row));
        }
        rows[row].push(c);
        col += cells;
    }

    let cursor = cursor_cell.unwrap_or(if col >= width {
        (0, row + 1)
    } else {
        (col, row)
    });
    InputLayout { rows, cursor }
}
