use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use eframe::egui::{self, Context};
use tracing::{debug, info};

use crate::canvas::Canvas;
use crate::config::AppConfig;
use crate::positions::{PositionMap, PositionSaver, PositionStore};
use crate::site::{
    LoadFailure, LoadGenerations, SiteData, SiteSnapshot, SiteSource, VisualNode, collect_site,
    prepare_graph,
};
use crate::util::excerpt;

mod graph;
mod render_utils;
mod ui;

const EXCERPT_CHARS: usize = 240;

pub struct FlowApp {
    config: Arc<AppConfig>,
    source: Arc<dyn SiteSource>,
    store: Arc<dyn PositionStore>,
    saver: PositionSaver,
    generations: LoadGenerations,
    snapshot_tx: Sender<SiteSnapshot>,
    snapshot_rx: Receiver<SiteSnapshot>,
    reloading: bool,
    state: AppState,
}

enum AppState {
    Loading,
    Ready(Box<ViewModel>),
}

#[derive(Clone, Copy, Debug, Default)]
struct SiteCounts {
    pages: usize,
    templates: usize,
    template_parts: usize,
    patterns: usize,
}

impl SiteCounts {
    fn of(data: &SiteData) -> Self {
        Self {
            pages: data.pages.len(),
            templates: data.templates.len(),
            template_parts: data.template_parts.len(),
            patterns: data.patterns.len(),
        }
    }
}

/// What one frame of UI asked the app to do.
#[derive(Default)]
struct FrameActions {
    reload: bool,
    persist: Option<PositionMap>,
}

struct ViewModel {
    config: Arc<AppConfig>,
    canvas: Canvas,
    counts: SiteCounts,
    failures: Vec<LoadFailure>,
    search: String,
    search_query: String,
    search_matches: Vec<String>,
    context_node: Option<String>,
    excerpts: HashMap<String, String>,
    show_minimap: bool,
    canvas_size: egui::Vec2,
}

fn card_excerpts(nodes: &[VisualNode]) -> HashMap<String, String> {
    nodes
        .iter()
        .map(|node| (node.id.clone(), excerpt(&node.data.content, EXCERPT_CHARS)))
        .collect()
}

impl ViewModel {
    fn new(snapshot: SiteSnapshot, config: Arc<AppConfig>) -> Self {
        let saved = snapshot.positions.unwrap_or_default();
        let graph = prepare_graph(&snapshot.data, &saved, &config);
        info!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "diagram ready"
        );

        Self {
            excerpts: card_excerpts(&graph.nodes),
            canvas: Canvas::new(graph.nodes, graph.edges),
            counts: SiteCounts::of(&snapshot.data),
            failures: snapshot.failures,
            search: String::new(),
            search_query: String::new(),
            search_matches: Vec::new(),
            context_node: None,
            show_minimap: true,
            canvas_size: egui::Vec2::ZERO,
            config,
        }
    }

    /// Refetched entities replace the graph; the arrangement on screen is kept.
    fn apply_refetch(&mut self, snapshot: SiteSnapshot) {
        let current = self.canvas.snapshot();
        let graph = prepare_graph(&snapshot.data, &current, &self.config);
        debug!(
            generation = snapshot.generation,
            nodes = graph.nodes.len(),
            "applying refetched site data"
        );

        self.excerpts = card_excerpts(&graph.nodes);
        self.canvas.replace_graph(graph.nodes, graph.edges);
        self.counts = SiteCounts::of(&snapshot.data);
        self.failures = snapshot.failures;
        self.search_query.clear();
    }
}

impl FlowApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        source: Arc<dyn SiteSource>,
        store: Arc<dyn PositionStore>,
    ) -> Self {
        let (snapshot_tx, snapshot_rx) = mpsc::channel();
        let mut app = Self {
            config: Arc::new(config),
            saver: PositionSaver::spawn(Arc::clone(&store)),
            source,
            store,
            generations: LoadGenerations::default(),
            snapshot_tx,
            snapshot_rx,
            reloading: false,
            state: AppState::Loading,
        };
        app.spawn_load(true);
        app
    }

    /// Starts a background load. Saved positions are only read on the first load;
    /// later loads keep whatever is on screen.
    fn spawn_load(&mut self, with_positions: bool) {
        let generation = self.generations.issue();
        let source = Arc::clone(&self.source);
        let store = with_positions.then(|| Arc::clone(&self.store));
        let tx = self.snapshot_tx.clone();

        debug!(generation, with_positions, "starting site load");
        thread::spawn(move || {
            let snapshot = collect_site(source.as_ref(), store.as_deref(), generation);
            let _ = tx.send(snapshot);
        });
    }

    fn receive_snapshots(&mut self) {
        while let Ok(snapshot) = self.snapshot_rx.try_recv() {
            if apply_snapshot(&mut self.state, &self.generations, &self.config, snapshot) {
                self.reloading = false;
            }
        }
    }
}

/// Applies a finished load unless a newer one has been issued since.
/// Returns whether the snapshot was used.
fn apply_snapshot(
    state: &mut AppState,
    generations: &LoadGenerations,
    config: &Arc<AppConfig>,
    snapshot: SiteSnapshot,
) -> bool {
    if !generations.is_current(snapshot.generation) {
        debug!(
            generation = snapshot.generation,
            latest = generations.latest(),
            "dropping stale site load"
        );
        return false;
    }

    if let AppState::Ready(model) = state {
        model.apply_refetch(snapshot);
    } else {
        let model = ViewModel::new(snapshot, Arc::clone(config));
        *state = AppState::Ready(Box::new(model));
    }
    true
}

impl eframe::App for FlowApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.receive_snapshots();

        match &mut self.state {
            AppState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(format!("Loading {}...", self.config.source_label));
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint_after(std::time::Duration::from_millis(100));
            }
            AppState::Ready(model) => {
                let mut actions = FrameActions::default();
                model.show(ctx, self.reloading, &mut actions);

                if let Some(positions) = actions.persist {
                    self.saver.save(positions);
                }
                if actions.reload {
                    self.reloading = true;
                    self.spawn_load(false);
                }
                if self.reloading {
                    ctx.request_repaint_after(std::time::Duration::from_millis(100));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{Entity, EntityKind};

    fn snapshot(generation: u64, page_ids: &[&str]) -> SiteSnapshot {
        SiteSnapshot {
            generation,
            data: SiteData {
                pages: page_ids
                    .iter()
                    .map(|id| Entity::new(EntityKind::Page, *id))
                    .collect(),
                ..SiteData::default()
            },
            positions: Some(PositionMap::new()),
            failures: Vec::new(),
        }
    }

    fn node_ids(state: &AppState) -> Vec<String> {
        match state {
            AppState::Ready(model) => model
                .canvas
                .nodes()
                .iter()
                .map(|node| node.id.clone())
                .collect(),
            AppState::Loading => Vec::new(),
        }
    }

    #[test]
    fn older_load_finishing_last_is_ignored() {
        let config = Arc::new(AppConfig::default());
        let mut generations = LoadGenerations::default();
        let mut state = AppState::Loading;

        let first = generations.issue();
        assert!(apply_snapshot(&mut state, &generations, &config, snapshot(first, &["1"])));

        let older = generations.issue();
        let newer = generations.issue();
        assert!(apply_snapshot(&mut state, &generations, &config, snapshot(newer, &["1", "2"])));
        let after_newer = node_ids(&state);

        assert!(!apply_snapshot(&mut state, &generations, &config, snapshot(older, &["9"])));

        assert_eq!(node_ids(&state), after_newer);
        assert_eq!(after_newer, ["template-index", "page-1", "page-2"]);
    }

    #[test]
    fn stale_first_load_keeps_waiting() {
        let config = Arc::new(AppConfig::default());
        let mut generations = LoadGenerations::default();
        let mut state = AppState::Loading;

        let stale = generations.issue();
        generations.issue();

        assert!(!apply_snapshot(&mut state, &generations, &config, snapshot(stale, &["1"])));
        assert!(matches!(state, AppState::Loading));
    }
}
