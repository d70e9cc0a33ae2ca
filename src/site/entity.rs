use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Page,
    Template,
    TemplatePart,
    Pattern,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Template => "template",
            Self::TemplatePart => "template part",
            Self::Pattern => "pattern",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One content record as fetched from the host.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: String,
    pub kind: EntityKind,
    pub title: String,
    pub raw_content: String,
    pub status: Option<String>,
    pub slug: Option<String>,
    pub area: Option<String>,
    pub link: Option<String>,
}

impl Entity {
    /// Name a fragment is referenced by: slug for template parts, name for patterns.
    pub fn key(&self) -> Option<&str> {
        self.slug.as_deref().filter(|slug| !slug.is_empty())
    }
}

#[cfg(test)]
impl Entity {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: String::new(),
            raw_content: String::new(),
            status: None,
            slug: None,
            area: None,
            link: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.raw_content = content.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// All collections from one load cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SiteData {
    pub pages: Vec<Entity>,
    pub templates: Vec<Entity>,
    pub template_parts: Vec<Entity>,
    pub patterns: Vec<Entity>,
}

impl SiteData {
    pub fn entity_count(&self) -> usize {
        self.pages.len() + self.templates.len() + self.template_parts.len() + self.patterns.len()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawText {
    Plain(String),
    Fields {
        #[serde(default)]
        raw: Option<String>,
        #[serde(default)]
        rendered: Option<String>,
    },
}

impl RawText {
    fn raw_first(self) -> String {
        match self {
            Self::Plain(text) => text,
            Self::Fields { raw, rendered } => raw
                .filter(|text| !text.is_empty())
                .or(rendered)
                .unwrap_or_default(),
        }
    }

    fn rendered_first(self) -> String {
        match self {
            Self::Plain(text) => text,
            Self::Fields { raw, rendered } => rendered
                .filter(|text| !text.is_empty())
                .or(raw)
                .unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    title: Option<RawText>,
    #[serde(default)]
    content: Option<RawText>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    area: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

fn id_string(value: Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.is_empty() => Some(text),
        _ => None,
    }
}

impl RawRecord {
    fn into_entity(self, kind: EntityKind) -> Option<Entity> {
        let title = self.title.map(RawText::rendered_first).unwrap_or_default();
        let raw_content = self.content.map(RawText::raw_first).unwrap_or_default();

        let (id, slug) = match kind {
            EntityKind::Pattern => {
                let name = self.name.filter(|name| !name.is_empty())?;
                (name.clone(), Some(name))
            }
            EntityKind::TemplatePart => {
                let slug = self.slug.filter(|slug| !slug.is_empty())?;
                let id = self.id.and_then(id_string).unwrap_or_else(|| slug.clone());
                (id, Some(slug))
            }
            EntityKind::Page | EntityKind::Template => {
                (self.id.and_then(id_string)?, self.slug)
            }
        };

        Some(Entity {
            id,
            kind,
            title,
            raw_content,
            status: self.status,
            slug,
            area: self.area,
            link: self.link,
        })
    }
}

/// Decodes a REST collection body. Anything but an array is an empty collection;
/// records without a usable key are skipped.
pub fn decode_collection(kind: EntityKind, body: &Value) -> Vec<Entity> {
    let Some(records) = body.as_array() else {
        debug!(%kind, "collection body is not an array");
        return Vec::new();
    };

    records
        .iter()
        .filter_map(|record| {
            RawRecord::deserialize(record)
                .ok()
                .and_then(|raw| raw.into_entity(kind))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_rest_page_shape() {
        let body = json!([{
            "id": 42,
            "slug": "about",
            "status": "publish",
            "link": "https://example.test/about/",
            "title": {"raw": "About", "rendered": "About us"},
            "content": {"raw": "<!-- wp:pattern {\"slug\":\"ns/hero\"} /-->", "rendered": "<p>x</p>"}
        }]);

        let pages = decode_collection(EntityKind::Page, &body);

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, "42");
        assert_eq!(pages[0].title, "About us");
        assert_eq!(pages[0].raw_content, "<!-- wp:pattern {\"slug\":\"ns/hero\"} /-->");
        assert_eq!(pages[0].status.as_deref(), Some("publish"));
    }

    #[test]
    fn rendered_content_is_used_when_raw_is_missing() {
        let body = json!([{"id": 3, "content": {"rendered": "<p>hi</p>"}}]);

        let pages = decode_collection(EntityKind::Page, &body);

        assert_eq!(pages[0].raw_content, "<p>hi</p>");
        assert_eq!(pages[0].title, "");
    }

    #[test]
    fn patterns_are_keyed_by_name_with_plain_strings() {
        let body = json!([
            {"name": "ns/hero", "title": "Hero", "content": "<!-- wp:heading /-->"},
            {"title": "nameless"}
        ]);

        let patterns = decode_collection(EntityKind::Pattern, &body);

        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].id, "ns/hero");
        assert_eq!(patterns[0].key(), Some("ns/hero"));
        assert_eq!(patterns[0].title, "Hero");
    }

    #[test]
    fn template_parts_keep_theme_id_and_area() {
        let body = json!([{
            "id": "twentyfour//header",
            "slug": "header",
            "area": "header",
            "title": {"rendered": "Header"},
            "content": {"raw": ""}
        }]);

        let parts = decode_collection(EntityKind::TemplatePart, &body);

        assert_eq!(parts[0].id, "twentyfour//header");
        assert_eq!(parts[0].key(), Some("header"));
        assert_eq!(parts[0].area.as_deref(), Some("header"));
    }

    #[test]
    fn error_bodies_become_empty_collections() {
        let body = json!({"code": "rest_forbidden", "message": "Sorry"});

        assert!(decode_collection(EntityKind::Page, &body).is_empty());
        assert!(decode_collection(EntityKind::Page, &Value::Null).is_empty());
    }
}
