use eframe::egui::{self, Align, Context, Layout, RichText};

use super::ViewModel;

const TOP_STATIONS: usize = 15;

impl ViewModel {
    /// Returns whether a reload was requested.
    pub(super) fn show_top_bar(&mut self, ctx: &Context, source: &str, is_reloading: bool) -> bool {
        let mut reload_requested = false;

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("packet-topo");
                    ui.separator();
                    ui.label(format!("source: {source}"));
                    if let Some(call) = &self.self_call {
                        ui.label(format!("station: {call}"));
                    }
                    ui.label(format!("nodes: {}", self.scene.graph().node_count()));
                    ui.label(format!("edges: {}", self.scene.graph().edge_count()));
                    ui.separator();

                    if ui.button("Fit").clicked() {
                        self.scene.request_fit_to_view();
                    }
                    if ui.button("Reset view").clicked() {
                        self.scene.request_reset();
                    }
                    let reload = ui.add_enabled(!is_reloading, egui::Button::new("Reload"));
                    if reload.clicked() {
                        reload_requested = true;
                    }
                    if is_reloading {
                        ui.spinner();
                    }
                    ui.checkbox(&mut self.focus_selection, "Focus selection");

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                        if let Some(data) = self.scene.render_data() {
                            ui.label(format!(
                                "drawn: {} nodes / {} edges",
                                data.node_count(),
                                data.edge_count()
                            ));
                        }
                    });
                });
            });

        reload_requested
    }

    pub(super) fn show_status_bar(&mut self, ctx: &Context) {
        egui::TopBottomPanel::bottom("status_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(format!("zoom {:.2}x", self.zoom));
                    ui.separator();
                    match &self.hovered {
                        Some(id) => ui.label(format!("hover: {id}")),
                        None => ui.weak("hover: -"),
                    };
                    if let Some(status) = &self.status {
                        ui.separator();
                        ui.label(status.as_str());
                    }
                    if !self.scene.rendering_enabled() {
                        ui.separator();
                        ui.colored_label(ui.visuals().warn_fg_color, "drawing disabled");
                    }
                });
            });
    }

    pub(super) fn show_search_panel(&mut self, ctx: &Context) {
        egui::SidePanel::left("search")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Find station");
                ui.add(
                    egui::TextEdit::singleline(&mut self.search)
                        .hint_text("callsign or label")
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(4.0);

                let mut jump = None;
                let hits = self.search_hits().to_vec();
                if hits.is_empty() && !self.search.trim().is_empty() {
                    ui.weak("no matches");
                }
                for (id, _) in &hits {
                    if ui.selectable_label(false, id.as_str()).clicked() {
                        jump = Some(id.clone());
                    }
                }

                ui.separator();
                ui.label(RichText::new("Busiest stations").strong());
                egui::ScrollArea::vertical()
                    .id_salt("top_stations")
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        for node in self.scene.graph().top_by_weight(TOP_STATIONS) {
                            let selected = self.scene.selection().is_selected(&node.id);
                            let text = format!("{}  ({})", node.display_label(), node.weight);
                            if ui.selectable_label(selected, text).clicked() {
                                jump = Some(node.id.clone());
                            }
                        }
                    });

                if let Some(id) = jump {
                    self.jump_to(&id);
                }
            });
    }
}
