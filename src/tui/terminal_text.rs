use std::time::Duration;

use anstyle::Style as AnsiStyle;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Drops control bytes that would corrupt the pane. ESC stays so SGR
/// sequences can be turned into styles by [`ansi_line`].
pub(crate) fn sanitize_log_text(raw: &str) -> String {
    raw.chars()
        .map(|ch| if ch == '\t' { ' ' } else { ch })
        .filter(|ch| {
            !matches!(
                ch,
                '\r'
                    | '\n'
                    | '\u{0000}'..='\u{0008}'
                    | '\u{000B}'
                    | '\u{000C}'
                    | '\u{000E}'..='\u{001A}'
                    | '\u{001C}'..='\u{001F}'
                    | '\u{007F}'
            )
        })
        .collect()
}

/// Splits a received line into spans. SGR sequences sent by the device are
/// layered on top of `base`; any other escape sequence is dropped.
pub(crate) fn ansi_line(raw: &str, base: Style) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut style = base;
    let mut buf = String::new();
    let chars: Vec<char> = raw.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        if chars[i] == '\u{1b}' && i + 1 < chars.len() && chars[i + 1] == '[' {
            if !buf.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut buf), style));
            }
            i += 2;
            let mut code = String::new();
            while i < chars.len() {
                let final_byte = chars[i];
                if ('@'..='~').contains(&final_byte) {
                    if final_byte == 'm' {
                        style = apply_sgr(style, &code, base);
                    }
                    break;
                }
                code.push(final_byte);
                i += 1;
            }
        } else if chars[i] != '\u{1b}' {
            buf.push(chars[i]);
        }
        i += 1;
    }
    if !buf.is_empty() {
        spans.push(Span::styled(buf, style));
    }
    if spans.is_empty() {
        return Line::from(Span::styled(String::new(), base));
    }
    Line::from(spans)
}

fn apply_sgr(current: Style, sgr: &str, base: Style) -> Style {
    let mut style = current;
    let params = if sgr.is_empty() {
        vec![0u16]
    } else {
        sgr.split(';')
            .map(|part| part.parse::<u16>().unwrap_or(u16::MAX))
            .collect::<Vec<u16>>()
    };
    let mut params = params.into_iter();
    while let Some(param) = params.next() {
        style = match param {
            0 => base,
            1 => style.add_modifier(Modifier::BOLD),
            2 => style.add_modifier(Modifier::DIM),
            3 => style.add_modifier(Modifier::ITALIC),
            4 => style.add_modifier(Modifier::UNDERLINED),
            7 => style.add_modifier(Modifier::REVERSED),
            22 => style.remove_modifier(Modifier::BOLD | Modifier::DIM),
            23 => style.remove_modifier(Modifier::ITALIC),
            24 => style.remove_modifier(Modifier::UNDERLINED),
            27 => style.remove_modifier(Modifier::REVERSED),
            30..=37 => style.fg(basic_color(param - 30)),
            38 => match extended_color(&mut params) {
                Some(color) => style.fg(color),
                None => style,
            },
            39 => style.fg(base.fg.unwrap_or(Color::Reset)),
            40..=47 => style.bg(basic_color(param - 40)),
            48 => match extended_color(&mut params) {
                Some(color) => style.bg(color),
                None => style,
            },
            49 => style.bg(base.bg.unwrap_or(Color::Reset)),
            90..=97 => style.fg(bright_color(param - 90)),
            100..=107 => style.bg(bright_color(param - 100)),
            _ => style,
        };
    }
    style
}

/// `5;n` (256-colour index) or `2;r;g;b` after a 38/48 parameter.
fn extended_color(params: &mut impl Iterator<Item = u16>) -> Option<Color> {
    match params.next()? {
        5 => u8::try_from(params.next()?).ok().map(Color::Indexed),
        2 => {
            let r = u8::try_from(params.next()?).ok()?;
            let g = u8::try_from(params.next()?).ok()?;
            let b = u8::try_from(params.next()?).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

fn basic_color(index: u16) -> Color {
    match index {
        0 => Color::Black,
        1 => Color::Red,
        2 => Color::Green,
        3 => Color::Yellow,
        4 => Color::Blue,
        5 => Color::Magenta,
        6 => Color::Cyan,
        _ => Color::Gray,
    }
}

fn bright_color(index: u16) -> Color {
    match index {
        0 => Color::DarkGray,
        1 => Color::LightRed,
        2 => Color::LightGreen,
        3 => Color::LightYellow,
        4 => Color::LightBlue,
        5 => Color::LightMagenta,
        6 => Color::LightCyan,
        _ => Color::White,
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h{minutes:02}m{secs:02}s")
    } else if minutes > 0 {
        format!("{minutes}m{secs:02}s")
    } else {
        format!("{secs}s")
    }
}

pub fn styled_text(style: AnsiStyle, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
