use std::time::Instant;

use eframe::egui::{self, Color32, Context, RichText};

use crate::api::JobState;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn show(&mut self, ctx: &Context, now: Instant) {
        self.process_background(ctx, now);

        self.top_bar(ctx);
        self.job_progress_bar(ctx);

        egui::SidePanel::right("details_panel")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_details(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Search:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.search)
                        .hint_text("topic label")
                        .desired_width(220.0),
                );
                if !self.search.is_empty() && ui.small_button("✕").clicked() {
                    self.search.clear();
                }
                ui.separator();
                let (nodes, edges) = self
                    .render_graph
                    .as_ref()
                    .map(|graph| (graph.nodes.len(), graph.edges.len()))
                    .unwrap_or((0, 0));
                ui.label(format!("topics: {nodes}"));
                ui.label(format!("links: {edges}"));
                if let Some(error) = &self.graph_error {
                    ui.colored_label(Color32::from_rgb(235, 110, 100), error.as_str());
                }
            });
            ui.add_space(4.0);
            self.draw_graph(ui);
        });

        self.add_document_window(ctx);
        self.document_preview_window(ctx);
    }

    fn top_bar(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("topic-atlas");
                    ui.separator();

                    let options = self
                        .collections
                        .iter()
                        .map(|collection| {
                            (
                                collection.id,
                                format!(
                                    "{} ({} docs, {} topics)",
                                    collection.name,
                                    collection.document_count,
                                    collection.topic_count
                                ),
                                collection.description.clone(),
                            )
                        })
                        .collect::<Vec<_>>();
                    let selected_label = self
                        .selected_collection
                        .and_then(|selected| {
                            options
                                .iter()
                                .find(|(id, _, _)| *id == selected)
                                .map(|(_, label, _)| label.clone())
                        })
                        .unwrap_or_else(|| "Select a collection".to_owned());

                    let mut switch_to = None;
                    egui::ComboBox::from_id_salt("collection_picker")
                        .selected_text(selected_label)
                        .width(260.0)
                        .show_ui(ui, |ui| {
                            for (id, label, description) in &options {
                                let mut row = ui
                                    .selectable_label(self.selected_collection == Some(*id), label);
                                if let Some(text) = description {
                                    row = row.on_hover_text(text.as_str());
                                }
                                if row.clicked() {
                                    switch_to = Some(*id);
                                }
                            }
                        });
                    if let Some(id) = switch_to
                        && self.selected_collection != Some(id)
                    {
                        self.select_collection(id);
                    }

                    let busy = self.discovery_rx.is_some() || self.add_documents_rx.is_some();
                    let has_collection = self.selected_collection.is_some();

                    if ui
                        .add_enabled(
                            has_collection && !busy,
                            egui::Button::new("Full discovery"),
                        )
                        .clicked()
                    {
                        self.request_discovery(false);
                    }
                    if ui
                        .add_enabled(
                            has_collection && !busy,
                            egui::Button::new("Incremental update"),
                        )
                        .clicked()
                    {
                        self.request_discovery(true);
                    }
                    if ui
                        .add_enabled(has_collection && !busy, egui::Button::new("Add document"))
                        .clicked()
                    {
                        self.add_document_open = true;
                    }

                    if ui
                        .add_enabled(
                            self.collections_rx.is_none(),
                            egui::Button::new("Reload collections"),
                        )
                        .clicked()
                    {
                        self.reload_collections();
                    }

                    if busy {
                        ui.spinner();
                    }
                    if let Some(error) = &self.action_error {
                        ui.colored_label(Color32::from_rgb(235, 110, 100), error.as_str());
                    } else if let Some(notice) = &self.action_notice {
                        ui.colored_label(Color32::from_rgb(120, 210, 130), notice.as_str());
                    }
                });
            });
    }

    fn job_progress_bar(&mut self, ctx: &Context) {
        let Some(status) = self.poller.status().cloned() else {
            return;
        };

        egui::TopBottomPanel::top("job_progress")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let (label, color) = match status.state {
                        JobState::Pending => ("pending", Color32::from_rgb(180, 180, 120)),
                        JobState::Running => ("running", Color32::from_rgb(106, 198, 255)),
                        JobState::Succeeded => ("succeeded", Color32::from_rgb(120, 210, 130)),
                        JobState::Failed => ("failed", Color32::from_rgb(235, 110, 100)),
                    };
                    ui.label(RichText::new(format!("Discovery {label}")).color(color).strong());
                    ui.label(format!("job #{}", status.job_id));

                    ui.add(
                        egui::ProgressBar::new(status.progress.clamp(0.0, 1.0))
                            .desired_width(260.0)
                            .show_percentage(),
                    );

                    if let Some(step) = &status.current_step {
                        ui.label(step.as_str());
                    }
                    if let Some(message) = &status.error_message {
                        ui.colored_label(Color32::from_rgb(235, 110, 100), message.as_str());
                    }
                    if self.poller.is_live() {
                        ui.spinner();
                    }
                });
            });
    }

    fn add_document_window(&mut self, ctx: &Context) {
        if !self.add_document_open {
            return;
        }

        let mut open = true;
        let mut submit = false;
        egui::Window::new("Add document")
            .open(&mut open)
            .collapsible(false)
            .default_width(420.0)
            .show(ctx, |ui| {
                ui.label("Title (optional):");
                ui.text_edit_singleline(&mut self.add_document_title);
                ui.add_space(4.0);
                ui.label("Content:");
                ui.add(
                    egui::TextEdit::multiline(&mut self.add_document_content)
                        .desired_rows(8)
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    let can_submit = !self.add_document_content.trim().is_empty()
                        && self.add_documents_rx.is_none();
                    if ui
                        .add_enabled(can_submit, egui::Button::new("Add and rediscover"))
                        .clicked()
                    {
                        submit = true;
                    }
                    if ui.button("Cancel").clicked() {
                        self.add_document_open = false;
                    }
                });
            });

        if submit {
            self.submit_new_document();
            self.add_document_open = false;
        } else if !open {
            self.add_document_open = false;
        }
    }
}
