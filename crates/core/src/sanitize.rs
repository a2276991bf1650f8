//! Escaping of user-supplied text before it is embedded in preview markup.
//!
//! Template text, typed values and dictated values all pass through
//! [`escape_html`] before the preview renderer sees them, so a value such as
//! `<mark>` or `</span>` is displayed literally instead of being interpreted.

/// Escapes the five characters that are significant in HTML text and
/// attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders saved document text as an HTML fragment: escaped, one `<p>` per
/// paragraph, single line breaks as `<br />`.
pub fn text_to_html(text: &str) -> String {
    let normalised = text.replace("\r\n", "\n");
    normalised
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .map(|p| {
            let lines: Vec<String> = p.lines().map(escape_html).collect();
            format!("<p>{}</p>", lines.join("<br />"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
