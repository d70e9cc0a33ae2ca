use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::site::VisualNode;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Node ids whose title fuzzy-matches `query`, best match first.
pub fn title_matches<'a>(
    nodes: impl IntoIterator<Item = &'a VisualNode>,
    query: &str,
) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = nodes
        .into_iter()
        .filter_map(|node| {
            fuzzy_match_score(&matcher, &node.data.title, query).map(|score| (score, &node.id))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

    scored.into_iter().map(|(_, id)| id.clone()).collect()
}
