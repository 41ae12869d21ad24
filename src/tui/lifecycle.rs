use std::io;

use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnableLineWrap, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;
use ratatui::Terminal;

pub(super) type ConsoleTerminal = Terminal<CrosstermBackend<io::Stdout>>;

pub(super) fn terminal_rows() -> Result<u16, io::Error> {
    let (_, rows) = crossterm::terminal::size()?;
    Ok(rows)
}

pub(super) fn init_terminal() -> Result<ConsoleTerminal, io::Error> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(error) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(error);
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

/// Leaves the alternate screen. Every step runs even if an earlier one fails;
/// the first error is returned.
pub(super) fn restore_terminal(terminal: &mut ConsoleTerminal) -> Result<(), io::Error> {
    let raw = disable_raw_mode();
    let screen = execute!(terminal.backend_mut(), LeaveAlternateScreen, EnableLineWrap);
    let cursor = terminal.show_cursor();
    raw.and(screen).and(cursor)
}

pub(super) fn draw_shutdown_status<B: Backend>(
    terminal: &mut Terminal<B>,
    status: &str,
) -> Result<(), io::Error> {
    terminal.draw(|frame| {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.area());
        let footer = Paragraph::new(status.to_owned()).style(Style::default().fg(Color::Yellow));
        frame.render_widget(footer, chunks[1]);
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;

    use super::*;

    #[test]
    fn shutdown_status_lands_on_the_last_row() {
        let mut terminal = Terminal::new(TestBackend::new(30, 4)).expect("terminal");
        draw_shutdown_status(&mut terminal, "Closing link...").expect("draw");
        let buffer = terminal.backend().buffer();
        let last_row = (0..30u16)
            .map(|x| buffer[(x, 3u16)].symbol())
            .collect::<String>();
        assert!(last_row.starts_with("Closing link..."));
        assert_eq!(buffer[(0u16, 3u16)].fg, Color::Yellow);
    }
}
