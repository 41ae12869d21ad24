use tabled::builder::Builder;
use tabled::settings::{Padding, Style};

use crate::ui::widgets::TableSpec;

/// Borderless table. An empty body renders as a single `<none>` row so the
/// headers never stand alone.
pub fn render_table(spec: &TableSpec) -> String {
    let mut builder = Builder::default();
    if !spec.headers.is_empty() {
        builder.push_record(spec.headers.iter().map(String::as_str));
    }
    if spec.rows.is_empty() {
        builder.push_record(["<none>"]);
    }
    for row in &spec.rows {
        builder.push_record(row.iter().map(String::as_str));
    }
    let mut table = builder.build();
    table.with(Style::blank());
    table.with(Padding::new(0, 2, 0, 0));
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_line_up_without_borders() {
        let rendered = render_table(&TableSpec::new(
            vec!["rule".to_owned(), "match".to_owned()],
            vec![
                vec!["err".to_owned(), "/error/".to_owned()],
                vec!["warning".to_owned(), "\"warn\"".to_owned()],
            ],
        ));
        let lines = rendered.lines().collect::<Vec<&str>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("rule"));
        assert_eq!(lines[1].find("/error/"), lines[2].find("\"warn\""));
        assert!(!rendered.contains('|'));
    }

    #[test]
    fn empty_body_shows_none() {
        let rendered = render_table(&TableSpec::new(vec!["rule".to_owned()], Vec::new()));
        assert!(rendered.contains("<none>"));
    }
}
