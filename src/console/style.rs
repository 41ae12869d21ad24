use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};
use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone)]
pub enum Matcher {
    Literal { needle: String, ignore_case: bool },
    Regex(Regex),
}

impl Matcher {
    pub fn literal(needle: impl Into<String>, ignore_case: bool) -> Self {
        let needle = needle.into();
        let needle = if ignore_case {
            needle.to_lowercase()
        } else {
            needle
        };
        Matcher::Literal {
            needle,
            ignore_case,
        }
    }

    pub fn regex(pattern: &str, ignore_case: bool) -> Result<Self, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map(Matcher::Regex)
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Literal {
                needle,
                ignore_case: true,
            } => text.to_lowercase().contains(needle.as_str()),
            Matcher::Literal { needle, .. } => text.contains(needle.as_str()),
            Matcher::Regex(regex) => regex.is_match(text),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Matcher::Literal { needle, .. } => format!("\"{needle}\""),
            Matcher::Regex(regex) => format!("/{}/", regex.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: String,
    pub matcher: Matcher,
    pub style: Style,
}

impl PatternRule {
    pub fn new(name: impl Into<String>, matcher: Matcher, style: Style) -> Self {
        Self {
            name: name.into(),
            matcher,
            style,
        }
    }

    /// `fg=Red bg=Black bold`, or `default` for an unstyled rule.
    pub fn style_summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(fg) = self.style.fg {
            parts.push(format!("fg={fg}"));
        }
        if let Some(bg) = self.style.bg {
            parts.push(format!("bg={bg}"));
        }
        for (modifier, label) in [
            (Modifier::BOLD, "bold"),
            (Modifier::ITALIC, "italic"),
            (Modifier::UNDERLINED, "underline"),
        ] {
            if self.style.add_modifier.contains(modifier) {
                parts.push(label.to_owned());
            }
        }
        if parts.is_empty() {
            return "default".to_owned();
        }
        parts.join(" ")
    }
}

/// Maps a received line to the display style of the first rule that matches it.
///
/// Rules are immutable once the matcher is built, so a single instance can be
/// shared between the reader thread and the UI behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    rules: Vec<PatternRule>,
    default_style: Style,
}

impl PatternMatcher {
    pub fn new(rules: Vec<PatternRule>) -> Self {
        Self {
            rules,
            default_style: Style::default(),
        }
    }

    pub fn with_default_style(mut self, style: Style) -> Self {
        self.default_style = style;
        self
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Matching runs against the visible text, so device-side color escapes
    /// do not hide a line from a pattern anchored at `^`.
    pub fn matching_rule(&self, line: &str) -> Option<&PatternRule> {
        let visible = visible_text(line);
        self.rules
            .iter()
            .find(|rule| rule.matcher.is_match(&visible))
    }

    pub fn resolve_style(&self, line: &str) -> Style {
        self.matching_rule(line)
            .map(|rule| rule.style)
            .unwrap_or(self.default_style)
    }
}

/// Accepts ratatui color names (`red`, `lightblue`, `#ff8800`, `202`) and
/// curses constants (`COLOR_RED`).
pub fn parse_color(raw: &str) -> Option<Color> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let name = trimmed
        .strip_prefix("COLOR_")
        .or_else(|| trimmed.strip_prefix("color_"))
        .unwrap_or(trimmed)
        .to_ascii_lowercase();
    Color::from_str(&name).ok()
}

pub(crate) fn visible_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\u{1b}' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some('[') => {
                chars.next();
                for next in chars.by_ref() {
                    if ('@'..='~').contains(&next) {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                while let Some(next) = chars.next() {
                    if next == '\u{7}' {
                        break;
                    }
                    if next == '\u{1b}' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    out
}
