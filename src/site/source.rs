use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::GatewayError;
use crate::http::HostClient;

use super::entity::{Entity, EntityKind, decode_collection};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Pages,
    Templates,
    TemplateParts,
    Patterns,
}

impl Collection {
    pub const ALL: [Self; 4] = [
        Self::Pages,
        Self::Templates,
        Self::TemplateParts,
        Self::Patterns,
    ];

    pub fn kind(self) -> EntityKind {
        match self {
            Self::Pages => EntityKind::Page,
            Self::Templates => EntityKind::Template,
            Self::TemplateParts => EntityKind::TemplatePart,
            Self::Patterns => EntityKind::Pattern,
        }
    }

    /// REST route, relative to `/wp-json/`.
    pub fn route(self) -> &'static str {
        match self {
            Self::Pages => "wp/v2/pages?per_page=100&status=publish&context=edit",
            Self::Templates => "wp/v2/templates?per_page=100&context=edit",
            Self::TemplateParts => "wp/v2/template-parts?per_page=100&context=edit",
            Self::Patterns => "wp/v2/block-patterns/patterns",
        }
    }

    pub fn export_file(self) -> &'static str {
        match self {
            Self::Pages => "pages.json",
            Self::Templates => "templates.json",
            Self::TemplateParts => "template-parts.json",
            Self::Patterns => "patterns.json",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pages => "pages",
            Self::Templates => "templates",
            Self::TemplateParts => "template parts",
            Self::Patterns => "patterns",
        })
    }
}

/// Where entity collections come from.
pub trait SiteSource: Send + Sync {
    fn fetch(&self, collection: Collection) -> Result<Vec<Entity>, GatewayError>;
}

/// Live site over the REST API.
pub struct RestSource {
    client: HostClient,
}

impl RestSource {
    pub fn new(client: HostClient) -> Self {
        Self { client }
    }
}

impl SiteSource for RestSource {
    fn fetch(&self, collection: Collection) -> Result<Vec<Entity>, GatewayError> {
        let body = self.client.get_json(collection.route())?;
        Ok(decode_collection(collection.kind(), &body))
    }
}

/// Directory of REST responses saved as `pages.json`, `templates.json`, …
pub struct ExportSource {
    dir: PathBuf,
}

impl ExportSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SiteSource for ExportSource {
    fn fetch(&self, collection: Collection) -> Result<Vec<Entity>, GatewayError> {
        let path = self.dir.join(collection.export_file());
        let raw = fs::read_to_string(&path).map_err(|source| GatewayError::Io {
            path: path.clone(),
            source,
        })?;
        let body: Value = serde_json::from_str(&raw).map_err(|source| GatewayError::Decode {
            origin: path.display().to_string(),
            source,
        })?;
        Ok(decode_collection(collection.kind(), &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_directory_reads_rest_shapes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("template-parts.json"),
            r#"[{"id":"tt4//footer","slug":"footer","title":{"rendered":"Footer"},"content":{"raw":""}}]"#,
        )
        .unwrap();
        let source = ExportSource::new(dir.path());

        let parts = source.fetch(Collection::TemplateParts).unwrap();

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].key(), Some("footer"));
    }

    #[test]
    fn missing_export_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = ExportSource::new(dir.path());

        assert!(matches!(
            source.fetch(Collection::Pages),
            Err(GatewayError::Io { .. })
        ));
    }

    #[test]
    fn routes_request_edit_context_for_raw_markup() {
        for collection in [Collection::Pages, Collection::Templates, Collection::TemplateParts] {
            assert!(collection.route().contains("context=edit"));
        }
        assert!(Collection::Pages.route().contains("status=publish"));
    }
}
