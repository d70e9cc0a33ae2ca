use std::sync::LazyLock;

use regex::Regex;

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Percent-encodes a single query value.
pub fn encode_component(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Readable text of block markup, whitespace collapsed and cut to `max_chars`.
pub fn excerpt(markup: &str, max_chars: usize) -> String {
    let without_comments = BLOCK_COMMENT.replace_all(markup, " ");
    let text = HTML_TAG.replace_all(&without_comments, " ");

    let mut out = String::new();
    for (index, word) in text.split_whitespace().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        out.push_str(word);
    }

    if out.chars().count() <= max_chars {
        return out;
    }

    let mut cut = out.chars().take(max_chars.saturating_sub(1)).collect::<String>();
    cut.push('…');
    cut
}
