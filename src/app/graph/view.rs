use eframe::egui::{
    self, Align2, Color32, CursorIcon, FontId, Painter, Pos2, Rect, Sense, Stroke, StrokeKind, Ui,
    vec2,
};

use crate::canvas::EdgeEmphasis;
use crate::layout::{NODE_BODY_HEIGHT, NODE_HEIGHT, NODE_LABEL_HEIGHT, NODE_WIDTH};
use crate::site::VisualNode;

use super::super::render_utils::{
    CARD_FILL, CARD_MUTED_TEXT, CARD_TEXT, SEARCH_MATCH, blend_color, dim_color, draw_background,
    draw_edge_curve, draw_status_badge, edge_stroke, type_color,
};
use super::super::{FrameActions, ViewModel};

const MIN_TEXT_SIZE: f32 = 6.0;

struct CardStyle {
    accent: Color32,
    border: Stroke,
    fill: Color32,
    text: Color32,
}

impl ViewModel {
    fn screen_of(&self, rect: Rect, id: &str, now: f64) -> Option<Pos2> {
        let world = self.canvas.display_position(id, now)?;
        Some(self.canvas.world_to_screen(world) + rect.min.to_vec2())
    }

    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui, actions: &mut FrameActions) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.canvas_size = rect.size();
        let now = ui.input(|input| input.time);
        self.canvas.tick(now);

        self.handle_canvas_wheel(ui, rect, &response);
        self.handle_canvas_pointer(ui, rect, &response, actions);
        let hovered = self.update_canvas_hover(ui, rect);

        if response.double_clicked()
            && let Some(node) = hovered.as_deref().and_then(|id| self.canvas.node(id))
        {
            let url = node.data.edit_url.clone();
            self.open_node_url(ui, &url);
        }
        if response.secondary_clicked() {
            self.context_node = hovered.clone();
        }

        let cursor = if self.canvas.view().dragging_node.is_some() || self.canvas.view().is_panning
        {
            CursorIcon::Grabbing
        } else if hovered.is_some() {
            CursorIcon::PointingHand
        } else {
            CursorIcon::Grab
        };
        if response.hovered() || response.dragged() {
            ui.ctx().set_cursor_icon(cursor);
        }

        let painter = ui.painter_at(rect);
        let view = self.canvas.view();
        draw_background(&painter, rect, view.pan, view.zoom);
        self.draw_edges(&painter, rect, now);
        self.draw_nodes(&painter, rect, now);
        if let Some(id) = hovered.as_deref() {
            self.draw_hover_summary(&painter, rect, id);
        }

        response.context_menu(|ui| self.node_menu(ui));

        self.draw_zoom_toolbar(ui.ctx(), rect);
        self.draw_legend(ui.ctx(), rect);
        if self.show_minimap {
            self.draw_minimap(ui, rect);
        }

        if self.canvas.is_animating(now) {
            ui.ctx().request_repaint();
        }
    }

    fn draw_edges(&self, painter: &Painter, rect: Rect, now: f64) {
        let zoom = self.canvas.view().zoom;
        let port_y = (NODE_LABEL_HEIGHT + NODE_BODY_HEIGHT / 2.0) as f32 * zoom;
        let card_width = NODE_WIDTH as f32 * zoom;

        let mut curves = self
            .canvas
            .visible_edges()
            .into_iter()
            .filter_map(|edge| {
                let start = self.screen_of(rect, &edge.source, now)? + vec2(card_width, port_y);
                let end = self.screen_of(rect, &edge.target, now)? + vec2(0.0, port_y);
                if !Rect::from_two_pos(start, end).expand(80.0).intersects(rect) {
                    return None;
                }
                Some((self.canvas.edge_emphasis(edge), edge.kind, start, end))
            })
            .collect::<Vec<_>>();

        // Highlighted edges go on top.
        curves.sort_by_key(|(emphasis, ..)| *emphasis == EdgeEmphasis::Connected);

        for (emphasis, kind, start, end) in curves {
            draw_edge_curve(painter, start, end, edge_stroke(kind, emphasis, zoom));
        }
    }

    fn card_style(&self, node: &VisualNode) -> CardStyle {
        let accent = type_color(node.node_type);
        let is_hovered = self.canvas.hovered() == Some(node.id.as_str());
        let is_dragging = self.canvas.view().dragging_node.as_deref() == Some(node.id.as_str());
        let searching = !self.search_matches.is_empty();
        let is_match = self.search_matches.iter().any(|id| *id == node.id);

        let border = if is_dragging {
            Stroke::new(2.5, blend_color(accent, Color32::WHITE, 0.35))
        } else if is_hovered {
            Stroke::new(2.0, accent)
        } else if is_match {
            Stroke::new(2.0, SEARCH_MATCH)
        } else {
            Stroke::new(1.0, Color32::from_gray(70))
        };

        if searching && !is_match && !is_hovered {
            CardStyle {
                accent: dim_color(accent, 0.45),
                border: Stroke::new(border.width, dim_color(border.color, 0.45)),
                fill: dim_color(CARD_FILL, 0.7),
                text: dim_color(CARD_TEXT, 0.45),
            }
        } else {
            CardStyle {
                accent,
                border,
                fill: CARD_FILL,
                text: CARD_TEXT,
            }
        }
    }

    fn draw_nodes(&self, painter: &Painter, rect: Rect, now: f64) {
        let zoom = self.canvas.view().zoom;
        let dragging = self.canvas.view().dragging_node.as_deref();

        let mut visible = self.canvas.visible_nodes();
        // The dragged card is drawn last so it stays on top.
        visible.sort_by_key(|node| Some(node.id.as_str()) == dragging);

        for node in visible {
            let Some(origin) = self.screen_of(rect, &node.id, now) else {
                continue;
            };
            let card = Rect::from_min_size(
                origin,
                vec2(NODE_WIDTH as f32 * zoom, NODE_HEIGHT as f32 * zoom),
            );
            if !card.intersects(rect) {
                continue;
            }
            self.draw_card(painter, node, card, zoom);
        }
    }

    fn draw_card(&self, painter: &Painter, node: &VisualNode, card: Rect, zoom: f32) {
        let style = self.card_style(node);
        let label_height = NODE_LABEL_HEIGHT as f32 * zoom;
        let label = Rect::from_min_size(card.min, vec2(card.width(), label_height));
        let frame = Rect::from_min_max(card.min + vec2(0.0, label_height), card.max);
        let title_size = 22.0 * zoom;

        // Label row above the frame: type dot, title, non-published status.
        let dot_radius = (8.0 * zoom).max(2.0);
        let dot_center = label.left_center() + vec2(dot_radius, 0.0);
        painter.circle_filled(dot_center, dot_radius, style.accent);

        if title_size >= MIN_TEXT_SIZE {
            let title_pos = dot_center + vec2(dot_radius * 2.0, 0.0);
            let title_rect = painter.text(
                title_pos,
                Align2::LEFT_CENTER,
                &node.data.title,
                FontId::proportional(title_size),
                style.text,
            );
            if let Some(status) = node.data.status.as_deref()
                && status != "publish"
            {
                let badge_size = (title_size * 0.75).max(MIN_TEXT_SIZE);
                let anchor = title_rect.right_top() + vec2(6.0 * zoom.max(0.5), 0.0);
                draw_status_badge(painter, anchor, status, badge_size);
            }
        }

        let rounding = 12.0 * zoom;
        painter.rect_filled(frame, rounding, style.fill);
        painter.rect_stroke(frame, rounding, style.border, StrokeKind::Inside);

        let body_size = 18.0 * zoom;
        if body_size < MIN_TEXT_SIZE {
            return;
        }
        let padding = 16.0 * zoom;
        let inner = frame.shrink(padding);
        let excerpt = self
            .excerpts
            .get(&node.id)
            .map(String::as_str)
            .unwrap_or_default();

        if excerpt.is_empty() {
            painter.text(
                frame.center(),
                Align2::CENTER_CENTER,
                "No content",
                FontId::proportional(body_size),
                CARD_MUTED_TEXT,
            );
            return;
        }

        let galley = painter.layout(
            excerpt.to_owned(),
            FontId::proportional(body_size),
            CARD_MUTED_TEXT,
            inner.width().max(1.0),
        );
        painter
            .with_clip_rect(inner.intersect(painter.clip_rect()))
            .galley(inner.min, galley, CARD_MUTED_TEXT);
    }

    fn draw_hover_summary(&self, painter: &Painter, rect: Rect, id: &str) {
        let Some(node) = self.canvas.node(id) else {
            return;
        };
        let connections = self
            .canvas
            .edges()
            .iter()
            .filter(|edge| edge.touches(id))
            .count();

        let mut summary = format!(
            "{}  |  {}  |  {} connection{}",
            node.data.title,
            node.node_type.label(),
            connections,
            if connections == 1 { "" } else { "s" }
        );
        if let Some(area) = node.data.area.as_deref() {
            summary.push_str(&format!("  |  area: {area}"));
        }

        painter.text(
            rect.left_top() + vec2(10.0, 10.0),
            Align2::LEFT_TOP,
            summary,
            FontId::proportional(13.0),
            Color32::from_gray(240),
        );
    }

    fn node_menu(&self, ui: &mut Ui) {
        let Some(node) = self
            .context_node
            .as_deref()
            .and_then(|id| self.canvas.node(id))
        else {
            ui.label("No node here");
            return;
        };

        ui.label(egui::RichText::new(&node.data.title).strong());
        ui.separator();
        if ui.button("Open in editor").clicked() {
            self.open_node_url(ui, &node.data.edit_url);
            ui.close();
        }
        if let Some(preview) = node.data.preview_url.as_deref()
            && ui.button("Open preview").clicked()
        {
            self.open_node_url(ui, preview);
            ui.close();
        }
        if let Some(link) = node.data.link.as_deref()
            && ui.button("View on site").clicked()
        {
            self.open_node_url(ui, link);
            ui.close();
        }
    }
}
