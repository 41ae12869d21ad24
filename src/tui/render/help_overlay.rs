use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::header::panel_block;

fn heading(label: &str) -> Line<'static> {
    Line::from(vec![Span::styled(
        label.to_owned(),
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
    )])
}

pub(super) fn render_help_overlay(frame: &mut Frame<'_>, area: Rect) {
    let help_lines = vec![
        heading("Command Line"),
        Line::from("enter            send the line to the device"),
        Line::from("up/down          step through command history"),
        Line::from("left/right       move the cursor (ctrl+b / ctrl+f)"),
        Line::from("home, ctrl+a     start of line"),
        Line::from("ctrl+e           end of line"),
        Line::from("backspace, del   delete before the cursor (ctrl+h)"),
        Line::from("ctrl+d           delete under the cursor"),
        Line::from("ctrl+k / ctrl+u  kill to end of line / whole line"),
        Line::from(""),
        heading("Output"),
        Line::from("pgup/pgdn        scroll by page"),
        Line::from("alt+up/down      scroll line-by-line"),
        Line::from("alt+home         jump to the oldest line"),
        Line::from("end              jump to the newest line and follow"),
        Line::from(""),
        heading("Session"),
        Line::from("f1               toggle this help"),
        Line::from("ctrl+l           redraw the screen"),
        Line::from("esc, ctrl+c      close the link and quit"),
    ];
    let help = Paragraph::new(help_lines).block(panel_block(Some("Help"), false, Color::Magenta));
    frame.render_widget(help, area);
}
