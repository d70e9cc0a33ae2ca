//! Pan/zoom/drag state for the diagram, independent of any UI toolkit loop.
//!
//! Screen coordinates are relative to the canvas origin:
//! `screen = pan + world * zoom`.

use std::collections::{HashMap, HashSet};

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};
use tracing::debug;

use crate::layout::{NODE_HEIGHT, NODE_WIDTH, organize_layout};
use crate::positions::{Position, PositionMap};
use crate::site::{Edge, NodeType, VisualNode};

mod filter;
mod highlight;
mod search;

pub use filter::StatusFilter;
pub use highlight::EdgeEmphasis;
pub use search::title_matches;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 3.0;
/// Toolbar zoom stops earlier than the wheel.
pub const BUTTON_MAX_ZOOM: f32 = 2.0;
pub const DEFAULT_PAN: Vec2 = vec2(100.0, 80.0);
pub const DEFAULT_ZOOM: f32 = 0.5;
pub const ANIMATION_SECS: f64 = 0.6;

const WHEEL_ZOOM_STEP: f32 = 0.01;
const BUTTON_ZOOM_IN: f32 = 1.25;
const BUTTON_ZOOM_OUT: f32 = 0.8;

#[derive(Clone, Debug, PartialEq)]
pub struct CanvasView {
    pub pan: Vec2,
    pub zoom: f32,
    pub dragging_node: Option<String>,
    pub is_panning: bool,
    pub animating_until: Option<f64>,
    pub hidden_types: HashSet<NodeType>,
    pub status_filter: StatusFilter,
}

impl Default for CanvasView {
    fn default() -> Self {
        Self {
            pan: DEFAULT_PAN,
            zoom: DEFAULT_ZOOM,
            dragging_node: None,
            is_panning: false,
            animating_until: None,
            hidden_types: HashSet::new(),
            status_filter: StatusFilter::All,
        }
    }
}

struct Transition {
    from: PositionMap,
    started: f64,
}

fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

pub struct Canvas {
    nodes: Vec<VisualNode>,
    edges: Vec<Edge>,
    index_by_id: HashMap<String, usize>,
    overrides: PositionMap,
    hovered: Option<String>,
    view: CanvasView,
    transition: Option<Transition>,
}

impl Canvas {
    pub fn new(nodes: Vec<VisualNode>, edges: Vec<Edge>) -> Self {
        let mut canvas = Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            index_by_id: HashMap::new(),
            overrides: PositionMap::new(),
            hovered: None,
            view: CanvasView::default(),
            transition: None,
        };
        canvas.replace_graph(nodes, edges);
        canvas
    }

    /// Swaps in freshly loaded nodes and edges. View state survives; state that
    /// points at nodes which no longer exist is dropped.
    pub fn replace_graph(&mut self, nodes: Vec<VisualNode>, edges: Vec<Edge>) {
        self.index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
        self.nodes = nodes;
        self.edges = edges;

        let index = &self.index_by_id;
        self.overrides.retain(|id, _| index.contains_key(id));
        if self
            .hovered
            .as_ref()
            .is_some_and(|id| !index.contains_key(id))
        {
            self.hovered = None;
        }
        if self
            .view
            .dragging_node
            .as_ref()
            .is_some_and(|id| !index.contains_key(id))
        {
            self.view.dragging_node = None;
        }
    }

    pub fn nodes(&self) -> &[VisualNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn view(&self) -> &CanvasView {
        &self.view
    }

    pub fn node(&self, id: &str) -> Option<&VisualNode> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    /// Override if the node was moved this session, else its loaded position.
    pub fn effective_position(&self, id: &str) -> Option<Position> {
        self.overrides
            .get(id)
            .copied()
            .or_else(|| self.node(id).map(|node| node.position))
    }

    /// Every node's effective position, hidden nodes included.
    pub fn snapshot(&self) -> PositionMap {
        self.nodes
            .iter()
            .map(|node| {
                let position = self.overrides.get(&node.id).copied().unwrap_or(node.position);
                (node.id.clone(), position)
            })
            .collect()
    }

    // Pointer

    pub fn pointer_down_background(&mut self) {
        self.view.dragging_node = None;
        self.view.is_panning = true;
    }

    pub fn pointer_down_node(&mut self, id: &str) {
        if self.node(id).is_none() {
            self.pointer_down_background();
            return;
        }
        self.view.dragging_node = Some(id.to_owned());
        self.view.is_panning = false;
        // A grabbed node follows the pointer, not the settle animation.
        self.transition = None;
        self.view.animating_until = None;
    }

    /// Grabs the top-most visible node under `screen`, or starts a pan.
    pub fn pointer_down_at(&mut self, screen: Pos2) -> Option<String> {
        let world = self.screen_to_world(screen);
        match self.node_at(world).map(|node| node.id.clone()) {
            Some(id) => {
                self.pointer_down_node(&id);
                Some(id)
            }
            None => {
                self.pointer_down_background();
                None
            }
        }
    }

    pub fn pointer_move(&mut self, delta: Vec2) {
        if let Some(id) = self.view.dragging_node.clone() {
            let zoom = f64::from(self.view.zoom.max(MIN_ZOOM));
            if let Some(current) = self.effective_position(&id) {
                let moved =
                    current.offset(f64::from(delta.x) / zoom, f64::from(delta.y) / zoom);
                if moved.is_finite() {
                    self.overrides.insert(id, moved);
                }
            }
        } else if self.view.is_panning {
            self.view.pan += delta;
        }
    }

    /// Ends a drag or pan. Returns the layout to persist when a node was dropped.
    pub fn pointer_up(&mut self) -> Option<PositionMap> {
        self.view.is_panning = false;
        let dropped = self.view.dragging_node.take()?;
        debug!(node = %dropped, "node dropped");
        Some(self.snapshot())
    }

    pub fn pointer_leave(&mut self) -> Option<PositionMap> {
        self.pointer_up()
    }

    // Wheel and zoom

    /// `delta` uses the browser convention: positive `y` scrolls down.
    pub fn wheel(&mut self, delta: Vec2, cursor: Pos2, zoom_modifier: bool) {
        if zoom_modifier {
            self.zoom_at(cursor, 1.0 - delta.y * WHEEL_ZOOM_STEP);
        } else {
            self.view.pan -= delta;
        }
    }

    /// Zooms by `factor`, keeping the world point under `cursor` fixed.
    pub fn zoom_at(&mut self, cursor: Pos2, factor: f32) {
        if !factor.is_finite() {
            return;
        }
        let old_zoom = self.view.zoom;
        let new_zoom = (old_zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if new_zoom == old_zoom {
            return;
        }

        let cursor = cursor.to_vec2();
        self.view.pan = cursor - (cursor - self.view.pan) * (new_zoom / old_zoom);
        self.view.zoom = new_zoom;
    }

    pub fn zoom_in(&mut self) {
        let zoom = self.view.zoom;
        self.view.zoom = (zoom * BUTTON_ZOOM_IN).min(BUTTON_MAX_ZOOM).max(zoom);
    }

    pub fn zoom_out(&mut self) {
        self.view.zoom = (self.view.zoom * BUTTON_ZOOM_OUT).max(MIN_ZOOM);
    }

    pub fn reset_view(&mut self) {
        self.view.pan = DEFAULT_PAN;
        self.view.zoom = DEFAULT_ZOOM;
    }

    /// Pans so the world point `world` sits in the middle of a canvas of size `container`.
    pub fn center_on_point(&mut self, world: Position, container: Vec2) {
        if !world.is_finite() {
            return;
        }
        let world = vec2(world.x as f32, world.y as f32);
        self.view.pan = container / 2.0 - world * self.view.zoom;
    }

    pub fn center_on(&mut self, id: &str, container: Vec2) {
        if let Some(position) = self.effective_position(id) {
            self.center_on_point(
                position.offset(NODE_WIDTH / 2.0, NODE_HEIGHT / 2.0),
                container,
            );
        }
    }

    // Layout actions

    fn begin_transition(&mut self, now: f64) {
        self.transition = Some(Transition {
            from: self.snapshot(),
            started: now,
        });
        self.view.animating_until = Some(now + ANIMATION_SECS);
    }

    /// Forgets every moved position. Returns the (empty) layout to persist.
    pub fn reset(&mut self, now: f64) -> PositionMap {
        self.begin_transition(now);
        self.overrides.clear();
        for node in &mut self.nodes {
            node.position = node.default_position;
        }
        self.view.dragging_node = None;
        self.reset_view();
        debug!(nodes = self.nodes.len(), "layout reset to defaults");
        PositionMap::new()
    }

    /// Grid-arranges the visible nodes. Returns the layout to persist, or
    /// `None` when there was nothing to arrange.
    pub fn organize(&mut self, now: f64) -> Option<PositionMap> {
        let visible = self
            .visible_nodes()
            .into_iter()
            .map(|node| VisualNode {
                position: self.effective_position(&node.id).unwrap_or(node.position),
                ..node.clone()
            })
            .collect::<Vec<_>>();
        let layout = organize_layout(&visible);
        if layout.is_empty() {
            return None;
        }

        self.begin_transition(now);
        let arranged = layout.len();
        self.overrides.extend(layout);
        self.reset_view();
        debug!(arranged, "organized visible nodes");
        Some(self.snapshot())
    }

    // Hover and filters

    pub fn hover(&mut self, id: Option<&str>) {
        self.hovered = id.filter(|id| self.index_by_id.contains_key(*id)).map(str::to_owned);
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn edge_emphasis(&self, edge: &Edge) -> EdgeEmphasis {
        highlight::emphasis(edge, self.hovered.as_deref())
    }

    pub fn toggle_type(&mut self, node_type: NodeType) {
        if !self.view.hidden_types.remove(&node_type) {
            self.view.hidden_types.insert(node_type);
        }
    }

    pub fn is_type_visible(&self, node_type: NodeType) -> bool {
        !self.view.hidden_types.contains(&node_type)
    }

    pub fn set_status_filter(&mut self, status_filter: StatusFilter) {
        self.view.status_filter = status_filter;
    }

    fn is_visible(&self, node: &VisualNode) -> bool {
        filter::is_visible(node, &self.view.hidden_types, self.view.status_filter)
    }

    pub fn visible_nodes(&self) -> Vec<&VisualNode> {
        self.nodes.iter().filter(|node| self.is_visible(node)).collect()
    }

    /// Edges whose both ends are visible.
    pub fn visible_edges(&self) -> Vec<&Edge> {
        let shown = |id: &str| self.node(id).is_some_and(|node| self.is_visible(node));
        self.edges
            .iter()
            .filter(|edge| shown(&edge.source) && shown(&edge.target))
            .collect()
    }

    // Animation

    pub fn tick(&mut self, now: f64) {
        if self.view.animating_until.is_some_and(|until| now >= until) {
            self.view.animating_until = None;
            self.transition = None;
        }
    }

    pub fn is_animating(&self, now: f64) -> bool {
        self.view.animating_until.is_some_and(|until| now < until)
    }

    /// Where to draw `id` at time `now`, easing from the pre-action layout.
    pub fn display_position(&self, id: &str, now: f64) -> Option<Position> {
        let target = self.effective_position(id)?;
        let Some(transition) = &self.transition else {
            return Some(target);
        };
        let Some(from) = transition.from.get(id) else {
            return Some(target);
        };

        let t = ((now - transition.started) / ANIMATION_SECS).clamp(0.0, 1.0);
        Some(from.lerp(target, ease_out_cubic(t)))
    }

    // Coordinates

    pub fn world_to_screen(&self, world: Position) -> Pos2 {
        pos2(
            self.view.pan.x + world.x as f32 * self.view.zoom,
            self.view.pan.y + world.y as f32 * self.view.zoom,
        )
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Position {
        let zoom = f64::from(self.view.zoom.max(MIN_ZOOM));
        Position::new(
            f64::from(screen.x - self.view.pan.x) / zoom,
            f64::from(screen.y - self.view.pan.y) / zoom,
        )
    }

    /// Top-most visible node whose card contains `world`.
    pub fn node_at(&self, world: Position) -> Option<&VisualNode> {
        self.visible_nodes().into_iter().rev().find(|node| {
            let Some(origin) = self.effective_position(&node.id) else {
                return false;
            };
            world.x >= origin.x
                && world.x <= origin.x + NODE_WIDTH
                && world.y >= origin.y
                && world.y <= origin.y + NODE_HEIGHT
        })
    }

    /// World-space rectangle currently shown in a canvas of size `container`.
    pub fn viewport_world_rect(&self, container: Vec2) -> Rect {
        let min = self.screen_to_world(Pos2::ZERO);
        let max = self.screen_to_world(container.to_pos2());
        Rect::from_min_max(pos2(min.x as f32, min.y as f32), pos2(max.x as f32, max.y as f32))
    }

    /// Bounding box of the visible node cards, in world space.
    pub fn content_bounds(&self) -> Option<Rect> {
        self.visible_nodes()
            .into_iter()
            .filter_map(|node| self.effective_position(&node.id))
            .map(|origin| {
                Rect::from_min_size(
                    pos2(origin.x as f32, origin.y as f32),
                    vec2(NODE_WIDTH as f32, NODE_HEIGHT as f32),
                )
            })
            .reduce(|a, b| a.union(b))
    }
}
