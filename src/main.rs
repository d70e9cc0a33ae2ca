mod app;
mod canvas;
mod config;
mod error;
mod http;
mod layout;
mod positions;
mod site;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::config::{AppConfig, DEFAULT_PATTERN_LIMIT, SiteConfig, normalize_site_url, rest_root};
use crate::http::{Credentials, HostClient};
use crate::positions::{PositionStore, RestPositionStore, SettingsFileStore};
use crate::site::{ExportSource, RestSource, SiteSource};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Site address, e.g. https://example.test/
    #[arg(long)]
    site_url: Option<String>,

    /// Read saved REST responses from this directory instead of a live site.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    #[arg(long)]
    user: Option<String>,

    #[arg(long, env = "SITE_FLOW_APP_PASSWORD", hide_env_values = true)]
    app_password: Option<String>,

    /// Local settings document holding saved positions.
    #[arg(long, default_value = "site-flow-settings.json")]
    settings: PathBuf,

    /// Save positions through the site's REST endpoint.
    #[arg(long, requires = "site_url")]
    remote_positions: bool,

    #[arg(long, default_value_t = DEFAULT_PATTERN_LIMIT)]
    pattern_limit: usize,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("site_flow=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn host_client(site: &Url, args: &Args) -> Result<HostClient> {
    let credentials = match (&args.user, &args.app_password) {
        (Some(user), Some(password)) => Some(Credentials {
            user: user.clone(),
            password: password.clone(),
        }),
        _ => None,
    };
    HostClient::new(rest_root(site)?, credentials)
        .with_context(|| format!("cannot create HTTP client for {site}"))
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let site = args
        .site_url
        .as_deref()
        .map(normalize_site_url)
        .transpose()?;

    let (source, source_label): (Arc<dyn SiteSource>, String) =
        match (&args.export_dir, &site) {
            (Some(dir), _) => (
                Arc::new(ExportSource::new(dir)),
                format!("export {}", dir.display()),
            ),
            (None, Some(site)) => (
                Arc::new(RestSource::new(host_client(site, &args)?)),
                site.to_string(),
            ),
            (None, None) => bail!("either --site-url or --export-dir is required"),
        };

    let store: Arc<dyn PositionStore> = match (&site, args.remote_positions) {
        (Some(site), true) => Arc::new(RestPositionStore::new(host_client(site, &args)?)),
        _ => {
            let store = SettingsFileStore::new(&args.settings);
            info!(path = %store.path().display(), "positions stored in settings file");
            Arc::new(store)
        }
    };

    let config = AppConfig {
        site: site
            .as_ref()
            .map(SiteConfig::for_site)
            .transpose()?
            .unwrap_or_default(),
        pattern_limit: args.pattern_limit,
        source_label,
    };
    info!(source = %config.source_label, pattern_limit = config.pattern_limit, "starting");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "site-flow",
        options,
        Box::new(move |cc| Ok(Box::new(app::FlowApp::new(cc, config, source, store)))),
    )
    .map_err(|error| anyhow!("window closed with an error: {error}"))
}
