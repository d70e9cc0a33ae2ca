use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::trace;

use super::entity::Entity;
use super::nodes::{page_node_id, part_node_id, pattern_node_id};
use super::refs::{extract_part_refs, extract_pattern_refs};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeKind {
    #[serde(rename = "pattern-ref")]
    PatternRef,
    #[serde(rename = "part-ref")]
    PartRef,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PatternRef => "pattern-ref",
            Self::PartRef => "part-ref",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "`source` is embedded in `target`".
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(source: String, target: String, kind: EdgeKind) -> Self {
        Self {
            id: format!("{source}-{target}-{kind}"),
            source,
            target,
            kind,
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelationshipGraph {
    pub edges: Vec<Edge>,
}

struct EdgeCollector {
    edges: Vec<Edge>,
    seen: HashSet<(String, String, EdgeKind)>,
}

impl EdgeCollector {
    fn push(&mut self, source: String, target: String, kind: EdgeKind) {
        if self
            .seen
            .insert((source.clone(), target.clone(), kind))
        {
            self.edges.push(Edge::new(source, target, kind));
        }
    }
}

fn keyed<'a>(entities: &'a [Entity]) -> HashMap<&'a str, &'a Entity> {
    entities
        .iter()
        .filter_map(|entity| entity.key().map(|key| (key, entity)))
        .collect()
}

/// Infers embed edges from page and template-part markup.
///
/// Pages may embed patterns and template parts; template parts may embed
/// patterns. Patterns are leaves. References to unknown fragments are dropped.
pub fn build_graph(
    pages: &[Entity],
    template_parts: &[Entity],
    patterns: &[Entity],
) -> RelationshipGraph {
    let patterns_by_name = keyed(patterns);
    let parts_by_slug = keyed(template_parts);

    let mut collector = EdgeCollector {
        edges: Vec::new(),
        seen: HashSet::new(),
    };

    for page in pages {
        let target = page_node_id(&page.id);

        for slug in extract_pattern_refs(&page.raw_content) {
            if patterns_by_name.contains_key(slug.as_str()) {
                collector.push(pattern_node_id(&slug), target.clone(), EdgeKind::PatternRef);
            } else {
                trace!(page = %page.id, %slug, "dangling pattern reference");
            }
        }

        for slug in extract_part_refs(&page.raw_content) {
            if parts_by_slug.contains_key(slug.as_str()) {
                collector.push(part_node_id(&slug), target.clone(), EdgeKind::PartRef);
            } else {
                trace!(page = %page.id, %slug, "dangling template part reference");
            }
        }
    }

    let mut scanned_parts = HashSet::new();
    for part in template_parts {
        let Some(part_slug) = part.key() else {
            continue;
        };
        // Only the first part with a slug becomes a node.
        if !scanned_parts.insert(part_slug) {
            continue;
        }
        let target = part_node_id(part_slug);

        for slug in extract_pattern_refs(&part.raw_content) {
            if patterns_by_name.contains_key(slug.as_str()) {
                collector.push(pattern_node_id(&slug), target.clone(), EdgeKind::PatternRef);
            } else {
                trace!(part = %part_slug, %slug, "dangling pattern reference");
            }
        }
    }

    RelationshipGraph {
        edges: collector.edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::entity::EntityKind;

    fn page(id: u32, content: &str) -> Entity {
        Entity::new(EntityKind::Page, id.to_string()).with_content(content)
    }

    fn part(slug: &str, content: &str) -> Entity {
        Entity::new(EntityKind::TemplatePart, format!("theme//{slug}"))
            .with_slug(slug)
            .with_content(content)
    }

    fn pattern(name: &str) -> Entity {
        Entity::new(EntityKind::Pattern, name).with_slug(name)
    }

    fn pairs(graph: &RelationshipGraph) -> Vec<(&str, &str, EdgeKind)> {
        graph
            .edges
            .iter()
            .map(|edge| (edge.source.as_str(), edge.target.as_str(), edge.kind))
            .collect()
    }

    #[test]
    fn dangling_pattern_reference_is_dropped() {
        let pages = [page(1, r#"<!-- wp:pattern {"slug":"ns/missing"} /-->"#)];

        let graph = build_graph(&pages, &[], &[pattern("ns/other")]);

        assert!(graph.edges.is_empty());
    }

    #[test]
    fn pattern_shared_by_page_and_part_yields_two_edges() {
        let embed = r#"<!-- wp:pattern {"slug":"p1"} /-->"#;
        let pages = [page(4, embed)];
        let parts = [part("header", embed)];

        let graph = build_graph(&pages, &parts, &[pattern("p1")]);

        assert_eq!(
            pairs(&graph),
            [
                ("pattern-p1", "page-4", EdgeKind::PatternRef),
                ("pattern-p1", "part-header", EdgeKind::PatternRef),
            ]
        );
    }

    #[test]
    fn page_embedding_footer_part() {
        let pages = [page(7, r#"<!-- wp:template-part {"slug":"footer"} /-->"#)];
        let parts = [part("footer", "")];

        let graph = build_graph(&pages, &parts, &[]);

        assert_eq!(graph.edges.len(), 1);
        let edge = &graph.edges[0];
        assert_eq!(edge.source, "part-footer");
        assert_eq!(edge.target, "page-7");
        assert_eq!(edge.kind, EdgeKind::PartRef);
        assert_eq!(edge.id, "part-footer-page-7-part-ref");
    }

    #[test]
    fn repeated_embeds_collapse_but_kinds_stay_apart() {
        let content = concat!(
            r#"<!-- wp:pattern {"slug":"p1"} /-->"#,
            r#"<!-- wp:pattern {"slug":"p1"} /-->"#,
            r#"<!-- wp:template-part {"slug":"header"} /-->"#,
        );
        let pages = [page(2, content)];
        let parts = [part("header", "")];

        let graph = build_graph(&pages, &parts, &[pattern("p1")]);

        assert_eq!(
            pairs(&graph),
            [
                ("pattern-p1", "page-2", EdgeKind::PatternRef),
                ("part-header", "page-2", EdgeKind::PartRef),
            ]
        );
    }

    #[test]
    fn pattern_markup_is_not_scanned() {
        let mut nested = pattern("outer");
        nested.raw_content = r#"<!-- wp:pattern {"slug":"inner"} /-->"#.to_owned();

        let graph = build_graph(&[], &[], &[nested, pattern("inner")]);

        assert!(graph.edges.is_empty());
    }

    #[test]
    fn only_the_first_part_with_a_slug_is_scanned() {
        let parts = [
            part("header", ""),
            Entity::new(EntityKind::TemplatePart, "child//header")
                .with_slug("header")
                .with_content(r#"<!-- wp:pattern {"slug":"p1"} /-->"#),
        ];

        let graph = build_graph(&[], &parts, &[pattern("p1")]);

        assert!(graph.edges.is_empty());
    }
}
