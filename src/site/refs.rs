//! Embedding references inside serialized block markup.
//!
//! Patterns are embedded as `<!-- wp:pattern {"slug":"ns/name"} /-->` and template
//! parts as `<!-- wp:template-part {"slug":"header","tagName":"header"} /-->`. The
//! attribute object may carry other keys in any order; only `slug` is read.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

static PATTERN_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| directive("pattern"));
static PART_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| directive("template-part"));

#[derive(Deserialize)]
struct DirectiveAttributes {
    #[serde(default)]
    slug: Option<String>,
}

/// Captures the whole attribute object, nested objects included, up to the
/// end of the comment.
fn directive(block: &str) -> Regex {
    let source = format!(r"<!--\s*wp:{}\s+(\{{.*?\}})\s*/?-->", regex::escape(block));
    Regex::new(&source).expect("valid directive regex")
}

fn slug_of(attributes: &str) -> Option<String> {
    serde_json::from_str::<DirectiveAttributes>(attributes)
        .ok()?
        .slug
        .filter(|slug| !slug.is_empty())
}

fn extract(regex: &Regex, content: &str) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }

    regex
        .captures_iter(content)
        .filter_map(|captures| captures.get(1))
        .filter_map(|attributes| slug_of(attributes.as_str()))
        .collect()
}

/// Pattern slugs in order of appearance, duplicates included.
pub fn extract_pattern_refs(content: &str) -> Vec<String> {
    extract(&PATTERN_DIRECTIVE, content)
}

/// Template-part slugs in order of appearance, duplicates included.
pub fn extract_part_refs(content: &str) -> Vec<String> {
    extract(&PART_DIRECTIVE, content)
}
