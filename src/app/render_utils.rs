use eframe::egui::epaint::CubicBezierShape;
use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, Vec2, pos2, vec2};

use crate::canvas::EdgeEmphasis;
use crate::site::{EdgeKind, NodeType};

pub(super) const CANVAS_BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
pub(super) const CARD_FILL: Color32 = Color32::from_rgb(34, 39, 47);
pub(super) const CARD_TEXT: Color32 = Color32::from_gray(232);
pub(super) const CARD_MUTED_TEXT: Color32 = Color32::from_gray(150);
pub(super) const SEARCH_MATCH: Color32 = Color32::from_rgb(103, 196, 255);

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn type_color(node_type: NodeType) -> Color32 {
    match node_type {
        NodeType::Page => Color32::from_rgb(74, 184, 102),
        NodeType::TemplatePart => Color32::from_rgb(52, 152, 219),
        NodeType::Pattern => Color32::from_rgb(155, 89, 182),
    }
}

fn edge_base_color(kind: EdgeKind) -> Color32 {
    match kind {
        EdgeKind::PartRef => Color32::from_rgb(98, 150, 190),
        EdgeKind::PatternRef => Color32::from_rgb(150, 112, 172),
    }
}

pub(super) fn edge_stroke(kind: EdgeKind, emphasis: EdgeEmphasis, zoom: f32) -> Stroke {
    let zoom_sqrt = zoom.sqrt();
    match emphasis {
        EdgeEmphasis::Connected => Stroke::new(
            (3.2 * zoom_sqrt).clamp(1.6, 5.0),
            blend_color(edge_base_color(kind), Color32::from_rgb(246, 206, 104), 0.55),
        ),
        EdgeEmphasis::Normal => Stroke::new(
            (1.8 * zoom_sqrt).clamp(0.8, 3.0),
            edge_base_color(kind).gamma_multiply(0.85),
        ),
        EdgeEmphasis::Dimmed => Stroke::new(
            (1.2 * zoom_sqrt).clamp(0.6, 2.0),
            dim_color(edge_base_color(kind), 0.35),
        ),
    }
}

/// Grid anchored at the world origin so it moves with pan and zoom.
pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, CANVAS_BACKGROUND);

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], stroke);
        y += step;
    }
}

/// Horizontal S-curve from the right side of the source card to the left side
/// of the target card, with a port dot at each end.
pub(super) fn draw_edge_curve(painter: &Painter, start: Pos2, end: Pos2, stroke: Stroke) {
    let control = ((end.x - start.x).abs() * 0.5).min(80.0);
    let curve = CubicBezierShape::from_points_stroke(
        [
            start,
            start + vec2(control, 0.0),
            end - vec2(control, 0.0),
            end,
        ],
        false,
        Color32::TRANSPARENT,
        stroke,
    );
    painter.add(curve);

    let port_radius = (stroke.width * 1.6).max(2.5);
    for port in [start, end] {
        painter.circle_filled(port, port_radius, CANVAS_BACKGROUND);
        painter.circle_stroke(port, port_radius, stroke);
    }
}

pub(super) fn draw_status_badge(painter: &Painter, anchor: Pos2, status: &str, size: f32) -> Rect {
    let galley = painter.layout_no_wrap(
        status.to_uppercase(),
        eframe::egui::FontId::proportional(size),
        CARD_MUTED_TEXT,
    );
    let padding = vec2(size * 0.4, size * 0.2);
    let badge = Rect::from_min_size(anchor, galley.size() + padding * 2.0);
    painter.rect_filled(badge, size * 0.3, Color32::from_rgb(52, 57, 66));
    painter.add(Shape::galley(anchor + padding, galley, CARD_MUTED_TEXT));
    badge
}
