use eframe::egui::{self, Context, RichText, Ui};
use packet_topo::graph::EdgeKind;
use packet_topo::util::matches_self_call;

use super::ViewModel;

impl ViewModel {
    pub(super) fn show_details_panel(&mut self, ctx: &Context) {
        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_details(ui));
    }

    fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection");
        ui.add_space(6.0);

        let selected = self.scene.selection().selected().iter().cloned().collect::<Vec<_>>();
        if selected.is_empty() {
            ui.label("Click a node, or shift-drag to select an area.");
            return;
        }

        ui.horizontal(|ui| {
            ui.label(format!("{} selected", selected.len()));
            if ui.button("Clear").clicked() {
                self.scene.clear_selection();
            }
        });
        ui.separator();

        let mut focus = None;
        egui::ScrollArea::vertical()
            .id_salt("selection_details")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for id in &selected {
                    let Some(node) = self.scene.graph().node(id) else {
                        continue;
                    };
                    let is_self = node.is_self_node
                        || self
                            .self_call
                            .as_deref()
                            .is_some_and(|call| matches_self_call(&node.id, call));

                    ui.horizontal(|ui| {
                        ui.label(RichText::new(node.display_label()).strong());
                        if is_self {
                            ui.label("(this station)");
                        }
                        if node.is_official {
                            ui.label("(official)");
                        }
                    });
                    if node.display_label() != node.id {
                        ui.small(node.id.as_str());
                    }
                    ui.label(format!("traffic: {}", node.weight));
                    ui.label(format!("links: {}", node.degree));

                    let links = self
                        .scene
                        .graph()
                        .edges
                        .iter()
                        .filter(|edge| edge.touches(id))
                        .collect::<Vec<_>>();
                    let relayed = links
                        .iter()
                        .filter(|edge| edge.kind == EdgeKind::ViaRelay)
                        .count();
                    let stale = links.iter().filter(|edge| edge.is_stale).count();
                    if relayed > 0 || stale > 0 {
                        ui.weak(format!("{relayed} via relay, {stale} stale"));
                    }
                    if ui.small_button("Focus").clicked() {
                        focus = Some(id.clone());
                    }
                    ui.separator();
                }
            });

        if let Some(id) = focus
            && !self.scene.request_focus(&id)
        {
            self.status = Some(format!("{id} is not drawn"));
        }
    }
}
