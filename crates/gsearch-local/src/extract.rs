use html_scraper::Html;
use serde::Serialize;

/// Elements whose content is never page text. They are detached from the tree
/// before text collection, so nested text disappears with them.
pub const REMOVED_TAGS: [&str; 5] = ["script", "style", "meta", "noscript", "iframe"];

/// Upper bound (in chars) on returned page text.
pub const MAX_TEXT_CHARS: usize = 5_000;

/// Appended after the first `MAX_TEXT_CHARS` chars when the text was cut.
pub const TRUNCATION_MARKER: &str = "\n[Content truncated]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    pub content: String,
    pub truncated: bool,
}

/// Extract cleaned, bounded text from an HTML document.
///
/// Never fails: html5ever recovers from broken markup (unclosed tags, stray end
/// tags, missing doctype) and whatever tree it builds is used as-is.
pub fn extract_text(html: &str) -> ExtractedText {
    let cleaned = clean_text(html);
    let (content, truncated) = truncate_with_marker(&cleaned, MAX_TEXT_CHARS);
    ExtractedText { content, truncated }
}

/// Parse, strip non-content elements, and normalize whitespace (no truncation).
pub fn clean_text(html: &str) -> String {
    let mut doc = Html::parse_document(html);
    remove_non_content(&mut doc);

    let raw = doc
        .tree
        .root()
        .descendants()
        .filter_map(|n| n.value().as_text().map(|t| &**t))
        .collect::<Vec<_>>()
        .join("\n");

    split_lines(&raw)
        .map(trim_line)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn remove_non_content(doc: &mut Html) {
    // html5ever lowercases element names, so a plain name match covers `<SCRIPT>` too.
    // Collect first: the tree can't be mutated while it is being walked.
    let ids = doc
        .tree
        .root()
        .descendants()
        .filter(|n| {
            n.value()
                .as_element()
                .is_some_and(|el| REMOVED_TAGS.contains(&el.name()))
        })
        .map(|n| n.id())
        .collect::<Vec<_>>();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split on every Unicode line boundary, treating `\r\n` as one break.
/// A trailing break does not produce a final empty line.
fn split_lines(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.char_indices().find(|&(_, c)| is_line_break(c)) {
            Some((i, c)) => {
                let line = &rest[..i];
                let mut next = i + c.len_utf8();
                if c == '\r' && rest[next..].starts_with('\n') {
                    next += 1;
                }
                rest = &rest[next..];
                Some(line)
            }
            None => {
                let line = rest;
                rest = "";
                Some(line)
            }
        }
    })
}

fn trim_line(line: &str) -> &str {
    // Unicode whitespace plus the ASCII information separators.
    line.trim_matches(|c: char| c.is_whitespace() || ('\x1c'..='\x1f').contains(&c))
}

/// Keep the first `max_chars` chars and append [`TRUNCATION_MARKER`] when `s` is longer.
pub fn truncate_with_marker(s: &str, max_chars: usize) -> (String, bool) {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + TRUNCATION_MARKER.len());
            out.push_str(&s[..cut]);
            out.push_str(TRUNCATION_MARKER);
            (out, true)
        }
        None => (s.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn extracts_text_from_simple_html() {
        let html = "<html><head><title>T</title></head><body><h1>Hello</h1><p>world</p></body></html>";
        let out = extract_text(html);
        assert_eq!(out.content, "T\nHello\nworld");
        assert!(!out.truncated);
    }

    #[test]
    fn script_text_never_leaks() {
        let out = extract_text("<script>evil()</script><p>Hello  world</p>");
        assert_eq!(out.content, "Hello  world");
        assert!(!out.content.contains("evil"));
    }

    #[test]
    fn removed_tags_take_nested_content_with_them() {
        let html = r#"<html><head>
            <meta charset="utf-8"><style>body { color: red }</style>
            </head><body>
            <p>keep</p>
            <noscript><p>enable js</p></noscript>
            <iframe src="x">frame text</iframe>
            <div><script>var a = "<p>nope</p>";</script>also keep</div>
            </body></html>"#;
        let out = extract_text(html);
        assert_eq!(out.content, "keep\nalso keep");
    }

    #[test]
    fn removed_tags_match_regardless_of_case_and_attributes() {
        let html = r#"<body><SCRIPT type="module">evil()</SCRIPT><Style media="x">p{}</Style><p>kept</p><IFRAME srcdoc="y">f</IFRAME></body>"#;
        assert_eq!(extract_text(html).content, "kept");
    }

    #[test]
    fn stray_table_text_is_hoisted_before_the_table() {
        // HTML5 foster parenting: text directly inside <table> is moved in front of it.
        let out = extract_text("<table><tr><td>a</td></tr>b</table>");
        assert_eq!(out.content, "b\na");
    }

    #[test]
    fn blank_lines_between_blocks_are_dropped() {
        let out = extract_text("<div>A</div>\n\n<div>   </div>\n<div>B</div>");
        assert_eq!(out.content, "A\nB");
    }

    #[test]
    fn inline_elements_are_separated_by_newlines() {
        let out = extract_text("<p>one <b>two</b> three</p>");
        assert_eq!(out.content, "one\ntwo\nthree");
    }

    #[test]
    fn comments_are_not_text() {
        let out = extract_text("<!doctype html><body><!-- hidden --><p>shown</p></body>");
        assert_eq!(out.content, "shown");
    }

    #[test]
    fn malformed_markup_still_yields_text() {
        let out = extract_text("<div><p>unclosed <span>nested</div></i><b>tail");
        assert_eq!(out.content, "unclosed\nnested\ntail");
    }

    #[test]
    fn empty_input_yields_empty_text() {
        assert_eq!(
            extract_text(""),
            ExtractedText {
                content: String::new(),
                truncated: false
            }
        );
    }

    #[test]
    fn splits_on_every_line_boundary() {
        let out = extract_text("<pre>a\r\nb\rc\u{2028}d\x0ce</pre>");
        assert_eq!(out.content, "a\nb\nc\nd\ne");
    }

    #[test]
    fn lines_are_trimmed_independently() {
        let out = extract_text("<pre>  left\n\tright\t\n \u{a0}both\u{a0} </pre>");
        assert_eq!(out.content, "left\nright\nboth");
    }

    #[test]
    fn text_at_limit_is_not_truncated() {
        let body = "x".repeat(MAX_TEXT_CHARS);
        let out = extract_text(&format!("<p>{body}</p>"));
        assert_eq!(out.content, body);
        assert!(!out.truncated);
    }

    #[test]
    fn long_text_is_cut_and_marked() {
        let body = "y".repeat(MAX_TEXT_CHARS + 1);
        let out = extract_text(&format!("<p>{body}</p>"));
        assert!(out.truncated);
        assert_eq!(
            out.content,
            format!("{}{}", "y".repeat(MAX_TEXT_CHARS), TRUNCATION_MARKER)
        );
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let s = "é".repeat(10);
        let (out, truncated) = truncate_with_marker(&s, 4);
        assert!(truncated);
        assert_eq!(out, format!("éééé{TRUNCATION_MARKER}"));

        let (out, truncated) = truncate_with_marker(&s, 10);
        assert!(!truncated);
        assert_eq!(out, s);
    }

    proptest! {
        #[test]
        fn extraction_is_deterministic_and_never_panics(html in any::<String>()) {
            let a = extract_text(&html);
            let b = extract_text(&html);
            prop_assert_eq!(&a, &b);
        }

        #[test]
        fn output_lines_are_trimmed_and_non_empty(
            parts in prop::collection::vec("[ a-z\t\n]{0,12}", 0..20),
        ) {
            let html = parts
                .iter()
                .map(|p| format!("<div>{p}</div>"))
                .collect::<String>();
            let out = extract_text(&html);
            prop_assert!(!out.truncated);
            if !out.content.is_empty() {
                for line in out.content.split('\n') {
                    prop_assert!(!line.is_empty());
                    prop_assert_eq!(line, line.trim());
                }
            }
        }

        #[test]
        fn truncated_output_has_fixed_shape(n in (MAX_TEXT_CHARS + 1)..(MAX_TEXT_CHARS + 300)) {
            let out = extract_text(&format!("<p>{}</p>", "z".repeat(n)));
            prop_assert!(out.truncated);
            prop_assert_eq!(
                out.content.chars().count(),
                MAX_TEXT_CHARS + TRUNCATION_MARKER.chars().count()
            );
            prop_assert!(out.content.ends_with(TRUNCATION_MARKER));
        }
    }
}
