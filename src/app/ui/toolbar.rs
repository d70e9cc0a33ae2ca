use eframe::egui::{self, Align2, Context, Rect, Sense, Stroke, vec2};

use crate::site::NodeType;

use super::super::ViewModel;
use super::super::render_utils::type_color;

const OVERLAY_MARGIN: f32 = 12.0;

impl ViewModel {
    /// `−  50%  +` at the bottom centre; clicking the percentage resets the view.
    pub(in crate::app) fn draw_zoom_toolbar(&mut self, ctx: &Context, rect: Rect) {
        egui::Area::new(egui::Id::new("zoom_toolbar"))
            .order(egui::Order::Foreground)
            .pivot(Align2::CENTER_BOTTOM)
            .fixed_pos(rect.center_bottom() - vec2(0.0, OVERLAY_MARGIN))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("−").on_hover_text("Zoom out").clicked() {
                            self.canvas.zoom_out();
                        }

                        let percent = (self.canvas.view().zoom * 100.0).round();
                        let label = ui
                            .add(egui::Label::new(format!("{percent:.0}%")).sense(Sense::click()))
                            .on_hover_text("Reset view");
                        if label.clicked() {
                            self.canvas.reset_view();
                        }

                        if ui.button("+").on_hover_text("Zoom in").clicked() {
                            self.canvas.zoom_in();
                        }
                    });
                });
            });
    }

    /// Type legend doubling as visibility toggles.
    pub(in crate::app) fn draw_legend(&mut self, ctx: &Context, rect: Rect) {
        egui::Area::new(egui::Id::new("type_legend"))
            .order(egui::Order::Foreground)
            .pivot(Align2::LEFT_BOTTOM)
            .fixed_pos(rect.left_bottom() + vec2(OVERLAY_MARGIN, -OVERLAY_MARGIN))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        for node_type in NodeType::ALL {
                            let visible = self.canvas.is_type_visible(node_type);
                            let count = self
                                .canvas
                                .nodes()
                                .iter()
                                .filter(|node| node.node_type == node_type)
                                .count();

                            let (dot, _) = ui.allocate_exact_size(vec2(10.0, 10.0), Sense::hover());
                            let color = type_color(node_type);
                            if visible {
                                ui.painter().circle_filled(dot.center(), 4.0, color);
                            } else {
                                ui.painter()
                                    .circle_stroke(dot.center(), 4.0, Stroke::new(1.5, color));
                            }

                            let label = format!("{} ({count})", node_type.plural_label());
                            if ui.selectable_label(visible, label).clicked() {
                                self.canvas.toggle_type(node_type);
                                self.search_query.clear();
                            }
                        }
                    });
                });
            });
    }
}
