use eframe::egui::{self, Align, Color32, Context, Key, Layout, RichText, Ui};

use crate::canvas::{StatusFilter, title_matches};

use super::super::{FrameActions, ViewModel};

const WARNING_TEXT: Color32 = Color32::from_rgb(240, 180, 90);

impl ViewModel {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        is_reloading: bool,
        actions: &mut FrameActions,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_top_bar(ui, is_reloading, actions));

        egui::TopBottomPanel::top("filter_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_filter_bar(ui, actions));

        if !self.failures.is_empty() {
            egui::TopBottomPanel::bottom("load_notices")
                .resizable(false)
                .show(ctx, |ui| self.draw_notices(ui));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_canvas(ui, actions));
    }

    fn draw_top_bar(&mut self, ui: &mut Ui, is_reloading: bool, actions: &mut FrameActions) {
        ui.horizontal(|ui| {
            ui.heading("site-flow");
            ui.separator();
            ui.label(&self.config.source_label);
            ui.separator();
            ui.label(format!("pages: {}", self.counts.pages));
            ui.label(format!("templates: {}", self.counts.templates));
            ui.label(format!("template parts: {}", self.counts.template_parts));
            if self.counts.patterns > self.config.pattern_limit {
                ui.label(format!(
                    "patterns: {} (showing {})",
                    self.counts.patterns, self.config.pattern_limit
                ));
            } else {
                ui.label(format!("patterns: {}", self.counts.patterns));
            }

            if ui.button("Reload").clicked() {
                actions.reload = true;
            }
            if is_reloading {
                ui.spinner();
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(format!(
                    "visible: {} nodes / {} edges",
                    self.canvas.visible_nodes().len(),
                    self.canvas.visible_edges().len()
                ));
            });
        });
    }

    fn draw_filter_bar(&mut self, ui: &mut Ui, actions: &mut FrameActions) {
        let now = ui.input(|input| input.time);

        ui.horizontal(|ui| {
            let current = self.canvas.view().status_filter;
            for filter in StatusFilter::ALL {
                if ui.selectable_label(current == filter, filter.label()).clicked() {
                    self.canvas.set_status_filter(filter);
                    self.search_query.clear();
                }
            }

            ui.separator();
            if ui
                .button("Organize")
                .on_hover_text("Arrange visible nodes in a grid")
                .clicked()
                && let Some(positions) = self.canvas.organize(now)
            {
                actions.persist = Some(positions);
            }
            if ui
                .button("Reset")
                .on_hover_text("Forget moved positions")
                .clicked()
            {
                actions.persist = Some(self.canvas.reset(now));
            }

            ui.separator();
            let search = ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text("Search titles")
                    .desired_width(220.0),
            );
            self.refresh_search_matches();

            if search.lost_focus()
                && ui.input(|input| input.key_pressed(Key::Enter))
                && let Some(best) = self.search_matches.first().cloned()
            {
                self.canvas.center_on(&best, self.canvas_size);
            }
            if !self.search.trim().is_empty() {
                ui.label(format!("{} match(es)", self.search_matches.len()));
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.checkbox(&mut self.show_minimap, "Minimap");
            });
        });
    }

    fn refresh_search_matches(&mut self) {
        if self.search == self.search_query {
            return;
        }
        self.search_matches = title_matches(self.canvas.visible_nodes(), &self.search);
        self.search_query = self.search.clone();
    }

    fn draw_notices(&mut self, ui: &mut Ui) {
        let mut dismissed = false;
        ui.horizontal_wrapped(|ui| {
            for failure in &self.failures {
                ui.label(RichText::new(format!("⚠ {failure}")).color(WARNING_TEXT));
            }
            if ui.small_button("Dismiss").clicked() {
                dismissed = true;
            }
        });
        if dismissed {
            self.failures.clear();
        }
    }
}
