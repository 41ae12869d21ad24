use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

pub(super) fn render_footer(
    frame: &mut Frame<'_>,
    area: Rect,
    following: bool,
    show_help: bool,
    running: bool,
) {
    let muted = Style::default().fg(Color::DarkGray);
    let active = Style::default().fg(Color::Yellow);
    let separator = || Span::styled("  |  ", muted);

    let footer_spans = if running {
        vec![
            Span::styled("enter send", muted),
            separator(),
            Span::styled("up/down history", muted),
            separator(),
            Span::styled("pgup/pgdn scroll", if following { muted } else { active }),
            separator(),
            Span::styled("end follow", if following { active } else { muted }),
            separator(),
            Span::styled("help (f1)", if show_help { active } else { muted }),
            separator(),
            Span::styled("quit (esc)", muted),
        ]
    } else {
        vec![Span::styled("closing link...", active)]
    };
    frame.render_widget(Paragraph::new(Line::from(footer_spans)), area);
}
