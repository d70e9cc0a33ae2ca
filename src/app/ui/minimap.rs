use eframe::egui::{Color32, Pos2, Rect, Sense, Stroke, StrokeKind, Ui, Vec2, pos2, vec2};

use crate::positions::Position;

use super::super::ViewModel;
use super::super::render_utils::type_color;

const MINIMAP_SIZE: Vec2 = vec2(200.0, 130.0);
const MINIMAP_MARGIN: f32 = 12.0;
const MINIMAP_PADDING: f32 = 6.0;
const WORLD_MARGIN: f32 = 40.0;

/// Uniform fit of a world rectangle into a screen rectangle, centred.
#[derive(Clone, Copy, Debug)]
struct MinimapTransform {
    world: Rect,
    offset: Vec2,
    scale: f32,
}

impl MinimapTransform {
    fn fit(world: Rect, screen: Rect) -> Self {
        let scale = (screen.width() / world.width().max(1.0))
            .min(screen.height() / world.height().max(1.0))
            .max(f32::EPSILON);
        let used = world.size() * scale;
        let offset = screen.min.to_vec2() + (screen.size() - used) / 2.0;
        Self {
            world,
            offset,
            scale,
        }
    }

    fn to_screen(self, world: Pos2) -> Pos2 {
        ((world - self.world.min) * self.scale + self.offset).to_pos2()
    }

    fn to_world(self, screen: Pos2) -> Pos2 {
        self.world.min + (screen.to_vec2() - self.offset) / self.scale
    }

    fn rect_to_screen(self, world: Rect) -> Rect {
        Rect::from_min_max(self.to_screen(world.min), self.to_screen(world.max))
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_minimap(&mut self, ui: &mut Ui, rect: Rect) {
        let frame = Rect::from_min_size(
            rect.right_bottom() - MINIMAP_SIZE - vec2(MINIMAP_MARGIN, MINIMAP_MARGIN),
            MINIMAP_SIZE,
        );
        if !rect.contains_rect(frame) {
            return;
        }

        let viewport = self.canvas.viewport_world_rect(rect.size());
        let world = self
            .canvas
            .content_bounds()
            .map_or(viewport, |content| content.union(viewport))
            .expand(WORLD_MARGIN);
        let transform = MinimapTransform::fit(world, frame.shrink(MINIMAP_PADDING));

        let response = ui.interact(frame, ui.id().with("minimap"), Sense::click_and_drag());
        if (response.clicked() || response.dragged())
            && let Some(pointer) = response.interact_pointer_pos()
        {
            let target = transform.to_world(pointer);
            self.canvas.center_on_point(
                Position::new(f64::from(target.x), f64::from(target.y)),
                rect.size(),
            );
        }

        let painter = ui.painter_at(frame);
        painter.rect_filled(frame, 4.0, Color32::from_rgba_unmultiplied(28, 32, 39, 235));
        painter.rect_stroke(
            frame,
            4.0,
            Stroke::new(1.0, Color32::from_gray(80)),
            StrokeKind::Inside,
        );

        let card = vec2(
            crate::layout::NODE_WIDTH as f32,
            crate::layout::NODE_HEIGHT as f32,
        );
        for node in self.canvas.visible_nodes() {
            let Some(origin) = self.canvas.effective_position(&node.id) else {
                continue;
            };
            let world_rect = Rect::from_min_size(pos2(origin.x as f32, origin.y as f32), card);
            painter.rect_filled(
                transform.rect_to_screen(world_rect),
                1.0,
                type_color(node.node_type).gamma_multiply(0.7),
            );
        }

        let shown = transform.rect_to_screen(viewport);
        painter.rect_filled(shown, 0.0, Color32::from_rgba_unmultiplied(13, 153, 255, 26));
        painter.rect_stroke(
            shown,
            0.0,
            Stroke::new(1.0, Color32::from_rgb(13, 153, 255)),
            StrokeKind::Inside,
        );
    }
}
