use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::config::SiteConfig;
use crate::layout::{fragment_lane_position, home_position, page_grid_position};
use crate::positions::{Position, PositionMap};
use crate::util::encode_component;

use super::entity::{Entity, SiteData};

pub const HOME_NODE_ID: &str = "template-index";
const HOME_TEMPLATE_SLUGS: [&str; 3] = ["index", "front-page", "home"];
const FALLBACK_HOME_TEMPLATE_ID: &str = "theme//index";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Page,
    TemplatePart,
    Pattern,
}

impl NodeType {
    pub const ALL: [Self; 3] = [Self::Page, Self::TemplatePart, Self::Pattern];

    pub fn label(self) -> &'static str {
        match self {
            Self::Page => "Page",
            Self::TemplatePart => "Template Part",
            Self::Pattern => "Pattern",
        }
    }

    pub fn plural_label(self) -> &'static str {
        match self {
            Self::Page => "Pages",
            Self::TemplatePart => "Template Parts",
            Self::Pattern => "Patterns",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub edit_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VisualNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Saved position if there is one, otherwise `default_position`.
    pub position: Position,
    #[serde(skip)]
    pub default_position: Position,
    pub data: NodeData,
}

impl VisualNode {
    fn placed(
        id: String,
        node_type: NodeType,
        default_position: Position,
        data: NodeData,
        saved: &PositionMap,
    ) -> Self {
        let position = saved.get(&id).copied().unwrap_or(default_position);
        Self {
            id,
            node_type,
            position,
            default_position,
            data,
        }
    }
}

pub fn page_node_id(page_id: &str) -> String {
    format!("page-{page_id}")
}

pub fn part_node_id(slug: &str) -> String {
    format!("part-{slug}")
}

pub fn pattern_node_id(name: &str) -> String {
    format!("pattern-{name}")
}

fn home_template(templates: &[Entity]) -> Option<&Entity> {
    templates.iter().find(|template| {
        template
            .slug
            .as_deref()
            .is_some_and(|slug| HOME_TEMPLATE_SLUGS.contains(&slug))
    })
}

fn non_empty(text: &str, fallback: &str) -> String {
    if text.is_empty() {
        fallback.to_owned()
    } else {
        text.to_owned()
    }
}

/// Maps entities to diagram nodes: the home node, template parts, patterns, pages.
pub fn build_nodes(data: &SiteData, saved: &PositionMap, config: &SiteConfig) -> Vec<VisualNode> {
    let mut nodes = Vec::with_capacity(1 + data.entity_count());

    let home = home_template(&data.templates);
    let home_edit_id = home.map_or(FALLBACK_HOME_TEMPLATE_ID, |template| template.id.as_str());
    nodes.push(VisualNode::placed(
        HOME_NODE_ID.to_owned(),
        NodeType::Page,
        home_position(),
        NodeData {
            title: home.map_or_else(
                || "Front Page".to_owned(),
                |template| non_empty(&template.title, "Front Page"),
            ),
            content: home
                .map(|template| template.raw_content.clone())
                .unwrap_or_default(),
            status: Some("publish".to_owned()),
            area: None,
            link: Some(config.home_url.clone()),
            edit_url: format!(
                "{}?postType=wp_template&postId={}",
                config.site_editor_url,
                encode_component(home_edit_id)
            ),
            preview_url: None,
        },
        saved,
    ));

    // First entity wins when two share a key.
    let mut emitted = HashSet::from([HOME_NODE_ID.to_owned()]);
    let mut lane_slot = 0usize;

    for part in &data.template_parts {
        let Some(slug) = part.key() else {
            continue;
        };
        let id = part_node_id(slug);
        if !emitted.insert(id.clone()) {
            debug!(%slug, "skipping duplicate template part");
            continue;
        }
        nodes.push(VisualNode::placed(
            id,
            NodeType::TemplatePart,
            fragment_lane_position(lane_slot),
            NodeData {
                title: non_empty(&part.title, slug),
                content: part.raw_content.clone(),
                status: None,
                area: part.area.clone(),
                link: None,
                edit_url: format!(
                    "{}?postType=wp_template_part&postId={}",
                    config.site_editor_url,
                    encode_component(&part.id)
                ),
                preview_url: Some(format!(
                    "{}?action=flow_editor_template_part_preview&slug={}",
                    config.ajax_url,
                    encode_component(slug)
                )),
            },
            saved,
        ));
        lane_slot += 1;
    }

    for pattern in &data.patterns {
        let Some(name) = pattern.key() else {
            continue;
        };
        let id = pattern_node_id(name);
        if !emitted.insert(id.clone()) {
            debug!(%name, "skipping duplicate pattern");
            continue;
        }
        nodes.push(VisualNode::placed(
            id,
            NodeType::Pattern,
            fragment_lane_position(lane_slot),
            NodeData {
                title: non_empty(&pattern.title, name),
                content: pattern.raw_content.clone(),
                status: None,
                area: None,
                link: None,
                edit_url: format!("{}?path=%2Fpatterns", config.site_editor_url),
                preview_url: Some(format!(
                    "{}?action=flow_editor_pattern_preview&pattern={}",
                    config.ajax_url,
                    encode_component(name)
                )),
            },
            saved,
        ));
        lane_slot += 1;
    }

    let mut page_slot = 1usize;
    for page in &data.pages {
        let id = page_node_id(&page.id);
        if !emitted.insert(id.clone()) {
            debug!(page = %page.id, "skipping duplicate page");
            continue;
        }
        nodes.push(VisualNode::placed(
            id,
            NodeType::Page,
            page_grid_position(page_slot),
            NodeData {
                title: non_empty(&page.title, "Untitled"),
                content: page.raw_content.clone(),
                status: page.status.clone(),
                area: None,
                link: page.link.clone(),
                edit_url: format!("{}post.php?post={}&action=edit", config.admin_url, page.id),
                preview_url: None,
            },
            saved,
        ));
        page_slot += 1;
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::entity::EntityKind;

    fn sample_data() -> SiteData {
        SiteData {
            pages: vec![
                Entity::new(EntityKind::Page, "7")
                    .with_title("About")
                    .with_status("publish"),
                Entity::new(EntityKind::Page, "5").with_status("draft"),
            ],
            templates: vec![
                Entity::new(EntityKind::Template, "tt4//single").with_slug("single"),
                Entity::new(EntityKind::Template, "tt4//home")
                    .with_slug("home")
                    .with_title("Blog Home"),
            ],
            template_parts: vec![
                Entity::new(EntityKind::TemplatePart, "tt4//5").with_slug("5"),
            ],
            patterns: vec![
                Entity::new(EntityKind::Pattern, "ns/a").with_slug("ns/a"),
                Entity::new(EntityKind::Pattern, "ns/b").with_slug("ns/b"),
                Entity::new(EntityKind::Pattern, "ns/c")
                    .with_slug("ns/c")
                    .with_title("Call to action"),
            ],
        }
    }

    #[test]
    fn ids_are_unique_and_positions_finite() {
        let nodes = build_nodes(&sample_data(), &PositionMap::new(), &SiteConfig::default());

        assert_eq!(nodes.len(), 1 + 2 + 1 + 3);
        let ids = nodes.iter().map(|node| node.id.as_str()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), nodes.len());
        assert!(ids.contains("page-5"));
        assert!(ids.contains("part-5"));

        for node in &nodes {
            assert!(node.position.is_finite());
            assert!(node.position.x >= 0.0 && node.position.y >= 0.0);
            assert_eq!(node.position, node.default_position);
        }
    }

    #[test]
    fn default_lanes_separate_types() {
        let nodes = build_nodes(&sample_data(), &PositionMap::new(), &SiteConfig::default());
        let position = |id: &str| {
            nodes
                .iter()
                .find(|node| node.id == id)
                .map(|node| node.position)
                .unwrap()
        };

        assert_eq!(position(HOME_NODE_ID), Position::new(550.0, 50.0));
        assert_eq!(position("part-5"), Position::new(50.0, 50.0));
        assert_eq!(position("pattern-ns/a"), Position::new(50.0, 480.0));
        assert_eq!(position("pattern-ns/c"), Position::new(50.0, 1340.0));
        assert_eq!(position("page-7"), Position::new(900.0, 50.0));
        assert_eq!(position("page-5"), Position::new(1250.0, 50.0));
    }

    #[test]
    fn saved_positions_take_precedence() {
        let saved = PositionMap::from([
            ("page-7".to_owned(), Position::new(-40.0, 12.5)),
            ("page-404".to_owned(), Position::new(1.0, 1.0)),
        ]);

        let nodes = build_nodes(&sample_data(), &saved, &SiteConfig::default());
        let page = nodes.iter().find(|node| node.id == "page-7").unwrap();

        assert_eq!(page.position, Position::new(-40.0, 12.5));
        assert_eq!(page.default_position, Position::new(900.0, 50.0));
        assert!(nodes.iter().all(|node| node.id != "page-404"));
    }

    #[test]
    fn home_node_uses_first_matching_template() {
        let nodes = build_nodes(&sample_data(), &PositionMap::new(), &SiteConfig::default());
        let home = &nodes[0];

        assert_eq!(home.id, HOME_NODE_ID);
        assert_eq!(home.node_type, NodeType::Page);
        assert_eq!(home.data.title, "Blog Home");
        assert_eq!(
            home.data.edit_url,
            "/wp-admin/site-editor.php?postType=wp_template&postId=tt4%2F%2Fhome"
        );
    }

    #[test]
    fn placeholder_home_node_without_templates() {
        let nodes = build_nodes(&SiteData::default(), &PositionMap::new(), &SiteConfig::default());

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].data.title, "Front Page");
        assert!(nodes[0].data.content.is_empty());
        assert!(nodes[0].data.edit_url.ends_with("postId=theme%2F%2Findex"));
    }

    #[test]
    fn links_come_from_site_config() {
        let config = SiteConfig {
            admin_url: "https://example.test/wp-admin/".to_owned(),
            site_editor_url: "https://example.test/wp-admin/site-editor.php".to_owned(),
            home_url: "https://example.test/".to_owned(),
            ajax_url: "https://example.test/wp-admin/admin-ajax.php".to_owned(),
        };

        let nodes = build_nodes(&sample_data(), &PositionMap::new(), &config);
        let find = |id: &str| nodes.iter().find(|node| node.id == id).unwrap();

        assert_eq!(
            find("page-7").data.edit_url,
            "https://example.test/wp-admin/post.php?post=7&action=edit"
        );
        assert_eq!(find("page-5").data.title, "Untitled");
        assert_eq!(
            find("pattern-ns/a").data.preview_url.as_deref(),
            Some(
                "https://example.test/wp-admin/admin-ajax.php?action=flow_editor_pattern_preview&pattern=ns%2Fa"
            )
        );
        assert_eq!(find("pattern-ns/c").data.title, "Call to action");
        assert_eq!(
            find("part-5").data.edit_url,
            "https://example.test/wp-admin/site-editor.php?postType=wp_template_part&postId=tt4%2F%2F5"
        );
        assert_eq!(find(HOME_NODE_ID).data.link.as_deref(), Some("https://example.test/"));
    }

    #[test]
    fn serializes_to_widget_shape() {
        let nodes = build_nodes(&sample_data(), &PositionMap::new(), &SiteConfig::default());
        let value = serde_json::to_value(&nodes[1]).unwrap();

        assert_eq!(value["id"], "part-5");
        assert_eq!(value["type"], "templatePart");
        assert_eq!(value["position"]["x"], 50.0);
        assert!(value["data"]["editUrl"].is_string());
        assert!(value["data"]["previewUrl"].is_string());
        assert!(value.get("default_position").is_none());
    }

    #[test]
    fn shared_keys_keep_the_first_entity() {
        let data = SiteData {
            pages: vec![
                Entity::new(EntityKind::Page, "7").with_title("First"),
                Entity::new(EntityKind::Page, "7").with_title("Second"),
                Entity::new(EntityKind::Page, "9"),
            ],
            template_parts: vec![
                Entity::new(EntityKind::TemplatePart, "parent//header")
                    .with_slug("header")
                    .with_title("Parent header"),
                Entity::new(EntityKind::TemplatePart, "child//header").with_slug("header"),
            ],
            patterns: vec![
                Entity::new(EntityKind::Pattern, "ns/a").with_slug("ns/a"),
                Entity::new(EntityKind::Pattern, "ns/a").with_slug("ns/a"),
            ],
            ..SiteData::default()
        };

        let nodes = build_nodes(&data, &PositionMap::new(), &SiteConfig::default());
        let ids = nodes.iter().map(|node| node.id.as_str()).collect::<Vec<_>>();

        assert_eq!(
            ids,
            ["template-index", "part-header", "pattern-ns/a", "page-7", "page-9"]
        );
        assert_eq!(nodes[1].data.title, "Parent header");
        assert_eq!(nodes[3].data.title, "First");
        assert_eq!(nodes[2].position, fragment_lane_position(1));
        assert_eq!(nodes[4].position, page_grid_position(2));
    }
}
