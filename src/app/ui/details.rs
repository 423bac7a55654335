use eframe::egui::{self, Color32, Context, RichText, Ui};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Topic details");
        ui.add_space(6.0);

        let Some(topic) = self.selected_topic.clone() else {
            ui.label("Click a node in the graph to inspect a topic.");
            return;
        };

        ui.label(RichText::new(&topic.name).strong());
        ui.label(format!("{} documents", topic.document_count));
        ui.label(format!("size score {:.2}", topic.size_score));

        if let Some(insights) = &topic.insights {
            ui.separator();
            if let Some(summary) = &insights.summary {
                ui.label(summary.as_str());
                ui.add_space(4.0);
            }
            if !insights.themes.is_empty() {
                ui.label(RichText::new("Themes").strong());
                for theme in &insights.themes {
                    ui.label(format!("• {theme}"));
                }
            }
            if !insights.common_questions.is_empty() {
                ui.label(RichText::new("Common questions").strong());
                for question in &insights.common_questions {
                    ui.label(format!("• {question}"));
                }
            }
            if !insights.related_concepts.is_empty() {
                ui.label(RichText::new("Related concepts").strong());
                ui.label(insights.related_concepts.join(", "));
            }
        }

        if !topic.documents.is_empty() {
            ui.separator();
            ui.label(RichText::new("Documents").strong());
            for document in &topic.documents {
                let marker = if document.is_primary { "★ " } else { "" };
                let row = format!(
                    "{marker}{}  ({:.2})",
                    document.title, document.relevance_score
                );
                if ui.link(row).clicked() {
                    self.pending_document_click = Some(document.id);
                }
                if !document.content_preview.is_empty() {
                    ui.small(document.content_preview.as_str());
                }
            }
        }

        if !topic.related_topics.is_empty() {
            ui.separator();
            ui.label(RichText::new("Related topics").strong());
            for related in &topic.related_topics {
                let row = format!(
                    "{}  ({}, {:.2})",
                    related.name, related.relationship_type, related.similarity_score
                );
                if ui.link(row).clicked() {
                    self.pending_related_topic_click = Some(related.id);
                }
            }
        }

        ui.separator();
        ui.label(RichText::new("Ask about this topic").strong());
        let pending = self.answer_rx.is_some();
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.question)
                    .hint_text("e.g. what do these documents have in common?")
                    .desired_width(220.0),
            );
            let can_ask = !pending && !self.question.trim().is_empty();
            if ui.add_enabled(can_ask, egui::Button::new("Ask")).clicked() {
                self.ask_question();
            }
            if pending {
                ui.spinner();
            }
        });
        if let Some(answer) = &self.answer {
            ui.add_space(4.0);
            ui.label(answer.as_str());
        }
    }

    pub(in crate::app) fn document_preview_window(&mut self, ctx: &Context) {
        let Some(preview) = self.document_preview.clone() else {
            return;
        };

        let mut open = true;
        let title = preview.title.as_deref().unwrap_or("Untitled document");
        egui::Window::new(title)
            .id(egui::Id::new(("document_preview", preview.id)))
            .open(&mut open)
            .default_width(460.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().max_height(380.0).show(ui, |ui| {
                    match preview.content.as_deref() {
                        Some(content) if !content.is_empty() => {
                            ui.label(content);
                        }
                        _ => {
                            ui.colored_label(
                                Color32::from_gray(140),
                                "This document has no stored content.",
                            );
                        }
                    }
                });
            });

        if !open {
            self.document_preview = None;
        }
    }
}
