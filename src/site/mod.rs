mod collect;
mod entity;
mod nodes;
mod refs;
mod relations;
mod source;

use tracing::debug;

use crate::config::AppConfig;
use crate::positions::PositionMap;

pub use collect::{LoadFailure, LoadGenerations, SiteSnapshot, collect_site};
pub use entity::SiteData;
#[cfg(test)]
pub use entity::{Entity, EntityKind};
#[cfg(test)]
pub use nodes::NodeData;
pub use nodes::{NodeType, VisualNode};
pub use relations::{Edge, EdgeKind};
pub use source::{ExportSource, RestSource, SiteSource};

use nodes::build_nodes;
use relations::build_graph;

/// Nodes and edges ready for the canvas.
#[derive(Clone, Debug, Default)]
pub struct SiteGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<Edge>,
}

/// Builds the diagram for one load. Only the first `pattern_limit` patterns
/// become nodes, and edges are built against the same subset.
pub fn prepare_graph(data: &SiteData, saved: &PositionMap, config: &AppConfig) -> SiteGraph {
    let shown = data.patterns.len().min(config.pattern_limit);
    if shown < data.patterns.len() {
        debug!(
            total = data.patterns.len(),
            shown, "pattern list capped"
        );
    }

    let capped = SiteData {
        patterns: data.patterns[..shown].to_vec(),
        ..data.clone()
    };

    let nodes = build_nodes(&capped, saved, &config.site);
    let graph = build_graph(&capped.pages, &capped.template_parts, &capped.patterns);

    SiteGraph {
        nodes,
        edges: graph.edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_embedding_footer_part() {
        let data = SiteData {
            pages: vec![
                Entity::new(EntityKind::Page, "7")
                    .with_content(r#"<!-- wp:template-part {"slug":"footer"} /-->"#),
            ],
            template_parts: vec![Entity::new(EntityKind::TemplatePart, "tt4//footer").with_slug("footer")],
            ..SiteData::default()
        };

        let graph = prepare_graph(&data, &PositionMap::new(), &AppConfig::default());

        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].source, "part-footer");
        assert_eq!(graph.edges[0].target, "page-7");
        assert_eq!(graph.edges[0].kind, EdgeKind::PartRef);
        assert!(graph.nodes.iter().any(|node| node.id == "part-footer"));
        assert!(graph.nodes.iter().any(|node| node.id == "page-7"));
    }

    #[test]
    fn pattern_cap_applies_to_nodes_and_edges() {
        let patterns = (0..5)
            .map(|i| Entity::new(EntityKind::Pattern, format!("ns/p{i}")).with_slug(format!("ns/p{i}")))
            .collect();
        let data = SiteData {
            pages: vec![Entity::new(EntityKind::Page, "1").with_content(
                r#"<!-- wp:pattern {"slug":"ns/p0"} /--><!-- wp:pattern {"slug":"ns/p4"} /-->"#,
            )],
            patterns,
            ..SiteData::default()
        };
        let config = AppConfig {
            pattern_limit: 2,
            ..AppConfig::default()
        };

        let graph = prepare_graph(&data, &PositionMap::new(), &config);

        let pattern_nodes = graph
            .nodes
            .iter()
            .filter(|node| node.node_type == NodeType::Pattern)
            .count();
        assert_eq!(pattern_nodes, 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].source, "pattern-ns/p0");
    }
}
