use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::border;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders};

use super::super::view_model::OutputView;

pub(super) fn panel_block<'a>(
    title: Option<&str>,
    show_version: bool,
    border_color: Color,
) -> Block<'a> {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(border_color));
    if let Some(title) = title {
        block = block.title_top(
            Line::from(Span::styled(
                format!(" {title} "),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ))
            .left_aligned(),
        );
    }
    if show_version {
        let version = format!(" v{} ", env!("CARGO_PKG_VERSION"));
        block = block.title_bottom(
            Line::from(Span::styled(
                version,
                Style::default().fg(Color::LightMagenta),
            ))
            .right_aligned(),
        );
    }
    block
}

/// `[follow]` while pinned to the newest line, `[scrolled +N]` otherwise.
pub(super) fn follow_badge(view: &OutputView) -> Line<'static> {
    let span = if view.is_following() {
        Span::styled(" [follow] ", Style::default().fg(Color::Green))
    } else {
        Span::styled(
            format!(" [scrolled +{}] ", view.view_offset),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    };
    Line::from(span).right_aligned()
}
