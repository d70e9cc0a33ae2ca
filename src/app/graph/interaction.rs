use eframe::egui::{self, MouseWheelUnit, PointerButton, Pos2, Rect, Response, Ui, Vec2, vec2};
use tracing::debug;
use url::Url;

use super::super::{FrameActions, ViewModel};

const LINE_SCROLL_POINTS: f32 = 40.0;

/// Screen position relative to the canvas origin.
pub(super) fn to_local(rect: Rect, screen: Pos2) -> Pos2 {
    (screen - rect.min).to_pos2()
}

/// Browser-style wheel delta: positive `y` means scrolling down.
fn wheel_delta(unit: MouseWheelUnit, delta: Vec2, rect: Rect) -> Vec2 {
    let points = match unit {
        MouseWheelUnit::Point => delta,
        MouseWheelUnit::Line => delta * LINE_SCROLL_POINTS,
        MouseWheelUnit::Page => vec2(delta.x * rect.width(), delta.y * rect.height()),
    };
    -points
}

impl ViewModel {
    pub(in crate::app) fn handle_canvas_pointer(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &Response,
        actions: &mut FrameActions,
    ) {
        if response.drag_started() {
            let press = ui
                .input(|input| input.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            match press {
                Some(press) if response.drag_started_by(PointerButton::Primary) => {
                    self.canvas.pointer_down_at(to_local(rect, press));
                }
                _ => self.canvas.pointer_down_background(),
            }
        }

        if response.dragged() {
            let delta = response.drag_delta();
            if delta != Vec2::ZERO {
                self.canvas.pointer_move(delta);
            }
        }

        if response.drag_stopped() {
            if let Some(positions) = self.canvas.pointer_up() {
                actions.persist = Some(positions);
            }
        } else if self.canvas.view().dragging_node.is_some()
            && !ui.input(|input| input.pointer.has_pointer())
            && let Some(positions) = self.canvas.pointer_leave()
        {
            actions.persist = Some(positions);
        }
    }

    pub(in crate::app) fn handle_canvas_wheel(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        if !response.hovered() {
            return;
        }

        let (wheel_events, pinch, pointer) = ui.input(|input| {
            let wheel_events = input
                .events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::MouseWheel {
                        unit,
                        delta,
                        modifiers,
                        ..
                    } => Some((
                        wheel_delta(*unit, *delta, rect),
                        modifiers.ctrl || modifiers.command,
                    )),
                    _ => None,
                })
                .collect::<Vec<_>>();
            (
                wheel_events,
                input.multi_touch().map(|touch| touch.zoom_delta),
                input.pointer.hover_pos(),
            )
        });

        let cursor = to_local(rect, pointer.unwrap_or_else(|| rect.center()));
        for (delta, zoom_modifier) in wheel_events {
            self.canvas.wheel(delta, cursor, zoom_modifier);
        }
        if let Some(factor) = pinch
            && (factor - 1.0).abs() > f32::EPSILON
        {
            self.canvas.zoom_at(cursor, factor);
        }
    }

    /// Hover follows the pointer; returns the id under it.
    pub(in crate::app) fn update_canvas_hover(&mut self, ui: &Ui, rect: Rect) -> Option<String> {
        let hovered = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer))
            .and_then(|pointer| {
                let world = self.canvas.screen_to_world(to_local(rect, pointer));
                self.canvas.node_at(world).map(|node| node.id.clone())
            });

        if self.canvas.view().dragging_node.is_none() {
            self.canvas.hover(hovered.as_deref());
        }
        hovered
    }

    pub(in crate::app) fn open_node_url(&self, ui: &Ui, url: &str) {
        if Url::parse(url).is_err() {
            debug!(%url, "not an absolute URL; nothing to open");
            return;
        }
        ui.ctx().open_url(egui::OpenUrl::new_tab(url));
    }
}
