//! Serializes spans back into equivalent inline HTML.

use crate::types::{Color, RichTextSpan};

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("<br>"),
            c => out.push(c),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// Renders spans as inline HTML that the rich text builder reads back into
/// the same spans.
pub fn spans_to_html(spans: &[RichTextSpan]) -> String {
    let mut html = String::new();

    for span in spans {
        let a = &span.annotations;
        let mut open = String::new();
        let mut close: Vec<&str> = Vec::new();

        if let Some(link) = &span.link {
            open.push_str(&format!("<a href=\"{}\">", escape_attr(&link.url)));
            close.push("</a>");
        }
        for (on, tag) in [
            (a.bold, "strong"),
            (a.italic, "em"),
            (a.strikethrough, "s"),
            (a.underline, "u"),
            (a.code, "code"),
        ] {
            if on {
                open.push_str(&format!("<{}>", tag));
                close.push(match tag {
                    "strong" => "</strong>",
                    "em" => "</em>",
                    "s" => "</s>",
                    "u" => "</u>",
                    _ => "</code>",
                });
            }
        }
        match a.color {
            Color::Default => {}
            Color::YellowBackground => {
                open.push_str("<mark>");
                close.push("</mark>");
            }
            color => {
                open.push_str(&format!("<span style=\"color: {}\">", color.as_str()));
                close.push("</span>");
            }
        }

        html.push_str(&open);
        html.push_str(&escape_text(&span.content));
        for tag in close.iter().rev() {
            html.push_str(tag);
        }
    }
    html
}
