//! HTML escaping helpers.

/// Escapes text for use in HTML element content or a double-quoted
/// attribute value.
#[must_use]
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// Makes serialized JSON safe to place inside a `<script>` element.
///
/// JSON strings may contain `</script>`; `<`, `>` and `&` are rewritten to
/// their `\u` escapes, which JavaScript decodes to the same characters.
#[must_use]
pub fn script_safe_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(escape("100 N STATE ST"), "100 N STATE ST");
    }

    #[test]
    fn json_cannot_close_script() {
        let safe = script_safe_json(r#"{"label":"</script><b>"}"#);
        assert!(!safe.contains("</script>"));
        assert!(safe.contains("\\u003c/script\\u003e"));
    }
}
