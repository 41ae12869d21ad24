use anstyle::{Ansi256Color, AnsiColor, Color, RgbColor, Style};
use ratatui::style::{Color as CellColor, Modifier, Style as CellStyle};

pub const COLOR_ENV: &str = "SERIAL_SPLIT_COLOR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Auto,
    Always,
    Never,
}

impl OutputMode {
    pub fn from_env() -> Self {
        match std::env::var(COLOR_ENV).ok().as_deref() {
            Some("always") => OutputMode::Always,
            Some("never") => OutputMode::Never,
            _ => OutputMode::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub accent: Style,
    pub muted: Style,
    pub warning: Style,
    pub error: Style,
    pub label: Style,
    pub value: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Style::new()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan)))
                .bold(),
            muted: Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))),
            warning: Style::new()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow)))
                .bold(),
            error: Style::new()
                .fg_color(Some(Color::Ansi(AnsiColor::Red)))
                .bold(),
            label: Style::new()
                .fg_color(Some(Color::Ansi(AnsiColor::Blue)))
                .bold(),
            value: Style::new().fg_color(Some(Color::Ansi(AnsiColor::White))),
        }
    }
}

pub fn resolve_color_enabled(mode: OutputMode, is_tty: bool) -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    match mode {
        OutputMode::Always => true,
        OutputMode::Never => false,
        OutputMode::Auto => is_tty,
    }
}

pub fn is_ci_environment() -> bool {
    std::env::var_os("CI").is_some()
}

/// Same look as a console cell style, for printing rule samples outside the
/// console.
pub fn ansi_style(style: CellStyle) -> Style {
    let mut ansi = Style::new()
        .fg_color(style.fg.and_then(ansi_color))
        .bg_color(style.bg.and_then(ansi_color));
    if style.add_modifier.contains(Modifier::BOLD) {
        ansi = ansi.bold();
    }
    if style.add_modifier.contains(Modifier::ITALIC) {
        ansi = ansi.italic();
    }
    if style.add_modifier.contains(Modifier::UNDERLINED) {
        ansi = ansi.underline();
    }
    ansi
}

fn ansi_color(color: CellColor) -> Option<Color> {
    let ansi = match color {
        CellColor::Reset => return None,
        CellColor::Black => AnsiColor::Black,
        CellColor::Red => AnsiColor::Red,
        CellColor::Green => AnsiColor::Green,
        CellColor::Yellow => AnsiColor::Yellow,
        CellColor::Blue => AnsiColor::Blue,
        CellColor::Magenta => AnsiColor::Magenta,
        CellColor::Cyan => AnsiColor::Cyan,
        CellColor::Gray => AnsiColor::White,
        CellColor::DarkGray => AnsiColor::BrightBlack,
        CellColor::LightRed => AnsiColor::BrightRed,
        CellColor::LightGreen => AnsiColor::BrightGreen,
        CellColor::LightYellow => AnsiColor::BrightYellow,
        CellColor::LightBlue => AnsiColor::BrightBlue,
        CellColor::LightMagenta => AnsiColor::BrightMagenta,
        CellColor::LightCyan => AnsiColor::BrightCyan,
        CellColor::White => AnsiColor::BrightWhite,
        CellColor::Rgb(r, g, b) => return Some(Color::Rgb(RgbColor(r, g, b))),
        CellColor::Indexed(index) => return Some(Color::Ansi256(Ansi256Color(index))),
    };
    Some(Color::Ansi(ansi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_styles_map_to_terminal_styles() {
        let cell = CellStyle::default()
            .fg(CellColor::LightRed)
            .bg(CellColor::Indexed(17))
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        let ansi = ansi_style(cell);
        assert_eq!(ansi.get_fg_color(), Some(Color::Ansi(AnsiColor::BrightRed)));
        assert_eq!(ansi.get_bg_color(), Some(Color::Ansi256(Ansi256Color(17))));
        assert!(ansi.get_effects().contains(anstyle::Effects::BOLD));
        assert!(ansi.get_effects().contains(anstyle::Effects::UNDERLINE));
        assert!(!ansi.get_effects().contains(anstyle::Effects::ITALIC));
    }

    #[test]
    fn reset_color_means_terminal_default() {
        let ansi = ansi_style(CellStyle::default().fg(CellColor::Reset));
        assert_eq!(ansi.get_fg_color(), None);
    }

    #[test]
    fn never_mode_disables_color_even_on_a_tty() {
        assert!(!resolve_color_enabled(OutputMode::Never, true));
    }
}
