//! Minimal markdown to markup conversion for chat turns.
//!
//! This is not a parser. It is a fixed list of textual substitutions applied in
//! order, each one seeing the output of the previous one.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static RE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("valid regex"));
static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```(.*?)```").expect("valid regex"));
static RE_INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.*?)`").expect("valid regex"));
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Escape the characters that would otherwise be read as markup.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Reverse [`escape`].
pub fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn line_breaks(text: &str) -> String {
    text.replace('\n', "<br>")
}

/// Render model output: bold, italic, fenced code, inline code, then line breaks.
pub fn to_markup(text: &str) -> String {
    let text = escape(text);
    let text = RE_BOLD.replace_all(&text, "<strong>${1}</strong>");
    let text = RE_ITALIC.replace_all(&text, "<em>${1}</em>");
    let text = RE_FENCE.replace_all(&text, "<pre><code>${1}</code></pre>");
    let text = RE_INLINE_CODE.replace_all(&text, "<code>${1}</code>");
    line_breaks(&text)
}

/// Render user input. Only line breaks are converted.
pub fn user_markup(text: &str) -> String {
    line_breaks(&escape(text))
}

/// Text as a reader would see it: tags dropped, `<br>` as newlines.
pub fn visible_text(markup: &str) -> String {
    let text = markup.replace("<br>", "\n");
    unescape(&RE_TAG.replace_all(&text, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_before_italic() {
        assert_eq!(to_markup("**Hi**"), "<strong>Hi</strong>");
        assert_eq!(to_markup("*Hi*"), "<em>Hi</em>");
        assert_eq!(
            to_markup("**a** and *b*"),
            "<strong>a</strong> and <em>b</em>"
        );
    }

    #[test]
    fn test_code_and_line_breaks() {
        assert_eq!(to_markup("use `cargo`"), "use <code>cargo</code>");
        assert_eq!(
            to_markup("```\nfn main() {}\n```"),
            "<pre><code><br>fn main() {}<br></code></pre>"
        );
        assert_eq!(to_markup("one\ntwo"), "one<br>two");
    }

    #[test]
    fn test_unclosed_markers_are_left_alone() {
        assert_eq!(to_markup("2 * 3"), "2 * 3");
        assert_eq!(to_markup("*open"), "*open");
    }

    #[test]
    fn test_raw_markup_is_escaped() {
        assert_eq!(
            to_markup("<script>alert(1)</script>"),
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
        assert_eq!(user_markup("a < b\nc"), "a &lt; b<br>c");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let raw = "a < b && c > d &lt;";
        assert_eq!(unescape(&escape(raw)), raw);
    }

    #[test]
    fn test_visible_text() {
        assert_eq!(visible_text(&to_markup("**Error:** rate limited")), "Error: rate limited");
        assert_eq!(visible_text(&to_markup("x < y\n`z`")), "x < y\nz");
    }
}
