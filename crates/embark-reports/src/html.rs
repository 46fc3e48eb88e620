//! HTML rendering for report mail bodies.
//!
//! Every report body is the same shape: a banner with the report name and
//! description, then one table of rows. All cell values pass through
//! HTML escaping — names regularly contain `&`, `<` shows up in free-text
//! titles, and the output is mailed to real inboxes.

use crate::rows::HtmlRow;

/// Escape a value for inclusion in HTML text content.
#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// Render a report body: banner followed by an HTML table of rows.
#[must_use]
pub fn render_report<R: HtmlRow>(name: &str, description: &str, rows: &[R]) -> String {
    let mut body = String::new();

    body.push_str("<html><body>");
    body.push_str(&format!("<h2>{}</h2>", escape_html(name)));
    body.push_str(&format!("<p>{}</p>", escape_html(description)));

    body.push_str("<table border=\"1\" cellpadding=\"4\" cellspacing=\"0\"><tr>");
    for header in R::headers() {
        body.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    body.push_str("</tr>");

    for row in rows {
        body.push_str("<tr>");
        for cell in row.cells() {
            body.push_str(&format!("<td>{}</td>", escape_html(&cell)));
        }
        body.push_str("</tr>");
    }

    body.push_str("</table></body></html>");
    body
}
