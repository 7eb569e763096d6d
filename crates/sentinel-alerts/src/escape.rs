//! Markdown-safe rendering of alert payloads for chat transports: string
//! fields are escaped, nested values are recursively escaped and rendered
//! as code blocks so user-controlled content in `details` cannot inject
//! formatting.

use serde_json::Value;

const MARKDOWN_SPECIAL: &[char] = &['_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!'];

pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if MARKDOWN_SPECIAL.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Renders an arbitrary JSON value as an escaped Markdown fragment. Scalars
/// are escaped inline; objects and arrays are rendered as an escaped code
/// block so embedded formatting characters in `details` never leak into the
/// rendered structure.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "`null`".to_string(),
        Value::Bool(b) => format!("`{b}`"),
        Value::Number(n) => format!("`{n}`"),
        Value::String(s) => escape_markdown(s),
        Value::Array(_) | Value::Object(_) => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_default();
            format!("```\n{}\n```", escape_code_block(&pretty))
        }
    }
}

/// Code blocks only need their own fence escaped; triple backticks inside
/// content would otherwise terminate the block early.
fn escape_code_block(text: &str) -> String {
    text.replace("```", "`\u{200b}``")
}
