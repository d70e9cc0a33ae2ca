use anyhow::{Context, Result};
use url::Url;

pub const DEFAULT_PATTERN_LIMIT: usize = 12;

/// Host URLs used to build edit, preview and view links for nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteConfig {
    pub admin_url: String,
    pub site_editor_url: String,
    pub home_url: String,
    pub ajax_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            admin_url: "/wp-admin/".to_owned(),
            site_editor_url: "/wp-admin/site-editor.php".to_owned(),
            home_url: "/".to_owned(),
            ajax_url: "/wp-admin/admin-ajax.php".to_owned(),
        }
    }
}

impl SiteConfig {
    pub fn for_site(site: &Url) -> Result<Self> {
        let admin = site
            .join("wp-admin/")
            .with_context(|| format!("cannot derive admin URL from {site}"))?;
        let site_editor = admin.join("site-editor.php")?;
        let ajax = admin.join("admin-ajax.php")?;

        Ok(Self {
            admin_url: admin.to_string(),
            site_editor_url: site_editor.to_string(),
            home_url: site.to_string(),
            ajax_url: ajax.to_string(),
        })
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub pattern_limit: usize,
    pub source_label: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            pattern_limit: DEFAULT_PATTERN_LIMIT,
            source_label: String::new(),
        }
    }
}

/// Parses a site address and makes sure relative joins stay below its path.
pub fn normalize_site_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("invalid site URL: {raw}"))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

pub fn rest_root(site: &Url) -> Result<Url> {
    site.join("wp-json/")
        .with_context(|| format!("cannot derive REST root from {site}"))
}
