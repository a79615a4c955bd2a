//! Rendering of widget contents and values for failure messages.

/// Placeholder for an element without readable text
pub const NO_VALUE: &str = "<none>";

/// `[A, B, C]`, with absent values rendered as [`NO_VALUE`]
pub fn format_contents(contents: &[Option<String>]) -> String {
    let items: Vec<&str> = contents
        .iter()
        .map(|c| c.as_deref().unwrap_or(NO_VALUE))
        .collect();
    format!("[{}]", items.join(", "))
}

/// Double-quoted, with embedded quotes and backslashes escaped
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}
