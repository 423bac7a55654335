use std::collections::HashSet;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::truncate_label;

use super::super::ViewModel;
use super::super::physics;
use super::super::render_utils::{
    blend_color, circle_visible, dim_color, draw_background, edge_width, world_to_screen,
};

impl ViewModel {
    /// Steps the simulation and paints the graph for one frame. Node clicks
    /// land in `pending_node_click` for the host to turn into a detail
    /// fetch; drags pin the grabbed node to the pointer.
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);
        self.handle_graph_zoom(ui, rect, &response);

        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }

        let frame_delta_seconds = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        let pointer_world = self.pointer_world(ui, rect);
        let pan = self.pan;
        let zoom = self.zoom;
        let search_query = self.search.trim().to_owned();
        let selected_node = self.selected_node.clone();
        let mut drag_node = self.drag_node;
        let mut pan_delta = egui::Vec2::ZERO;

        let Some(cache) = self.render_graph.as_mut() else {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No topics yet. Run discovery to build the graph.",
                FontId::proportional(14.0),
                Color32::from_gray(140),
            );
            return;
        };

        let moving = physics::step(cache, frame_delta_seconds);
        if moving || response.dragged() {
            ui.ctx().request_repaint();
        }

        let screen_positions = cache
            .positions()
            .map(|(_id, world_pos)| world_to_screen(rect, pan, zoom, world_pos))
            .collect::<Vec<_>>();
        let screen_radii = cache
            .nodes
            .iter()
            .map(|node| (node.radius * zoom).clamp(3.0, 64.0))
            .collect::<Vec<_>>();

        let hovered = Self::hovered_index(ui, rect, &screen_positions, &screen_radii);
        if hovered.is_some() || drag_node.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        // A primary drag that starts on a node pins it to the pointer for
        // the whole gesture; on empty canvas it pans instead. egui's own
        // click/drag disambiguation keeps a short unmoved press a click.
        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some((index, _)) = hovered
            && let Some(world) = pointer_world
        {
            drag_node = Some(index);
            cache.set_drag_active(true);
            cache.pin(index, world);
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            match (drag_node, pointer_world) {
                (Some(index), Some(world)) => cache.pin(index, world),
                (None, _) => pan_delta = response.drag_delta(),
                _ => {}
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary)
            && let Some(index) = drag_node.take()
        {
            cache.unpin(index);
            cache.set_drag_active(false);
        }

        let mut clicked_node = None;
        if response.clicked_by(egui::PointerButton::Primary)
            && let Some((index, _)) = hovered
        {
            clicked_node = Some(cache.nodes[index].id.clone());
            cache.reheat(0.1);
        }

        let search_matches: HashSet<usize> = if search_query.is_empty() {
            HashSet::new()
        } else {
            let matcher = SkimMatcherV2::default();
            cache
                .nodes
                .iter()
                .enumerate()
                .filter_map(|(index, node)| {
                    matcher
                        .fuzzy_match(&node.label, &search_query)
                        .map(|_score| index)
                })
                .collect()
        };
        let search_active = !search_matches.is_empty();

        let selected_index = selected_node.as_deref().and_then(|id| cache.index_of(id));
        let selection_active = selected_index.is_some();
        let mut related = HashSet::new();
        if let Some(selected) = selected_index {
            for edge in &cache.edges {
                if edge.source == selected {
                    related.insert(edge.target);
                }
                if edge.target == selected {
                    related.insert(edge.source);
                }
            }
        }

        let zoom_sqrt = zoom.sqrt();
        for edge in &cache.edges {
            let start = screen_positions[edge.source];
            let end = screen_positions[edge.target];
            if !circle_visible(rect, start, 4.0) && !circle_visible(rect, end, 4.0) {
                continue;
            }

            let touches_selection = selection_active
                && (Some(edge.source) == selected_index || Some(edge.target) == selected_index);
            let (width, color) = if touches_selection {
                (
                    (edge_width(edge.weight) * zoom_sqrt).clamp(1.2, 5.0),
                    Color32::from_rgb(241, 196, 94),
                )
            } else if selection_active {
                (
                    (edge_width(edge.weight) * zoom_sqrt * 0.6).clamp(0.4, 2.4),
                    Color32::from_rgba_unmultiplied(110, 120, 130, 90),
                )
            } else {
                (
                    (edge_width(edge.weight) * zoom_sqrt).clamp(0.6, 4.0),
                    Color32::from_rgba_unmultiplied(153, 153, 153, 150),
                )
            };
            painter.line_segment([start, end], Stroke::new(width, color));
        }

        let hovered_index = hovered.map(|(index, _)| index);
        for (index, node) in cache.nodes.iter().enumerate() {
            let position = screen_positions[index];
            let radius = screen_radii[index];
            if !circle_visible(rect, position, radius + 2.0) {
                continue;
            }

            let is_selected = Some(index) == selected_index;
            let is_hovered = Some(index) == hovered_index;
            let is_related = related.contains(&index);
            let is_match = search_matches.contains(&index);

            let base = node.color;
            let fill = if is_hovered {
                blend_color(base, Color32::from_rgb(255, 164, 101), 0.45)
            } else if is_match {
                blend_color(base, Color32::from_rgb(103, 196, 255), 0.60)
            } else if is_selected {
                base
            } else if is_related {
                blend_color(base, Color32::from_rgb(246, 160, 94), 0.35)
            } else if selection_active {
                dim_color(base, 0.50)
            } else if search_active {
                dim_color(base, 0.40)
            } else {
                base
            };

            let selection_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("node-selection", node.id.as_str())),
                is_selected,
            );
            let color = blend_color(fill, Color32::from_rgb(245, 206, 93), selection_mix * 0.5);

            painter.circle_filled(position, radius, color);
            if selection_mix > 0.0 {
                let halo_alpha = (40.0 + selection_mix * 150.0) as u8;
                painter.circle_stroke(
                    position,
                    radius + 3.0 + ((1.0 - selection_mix) * 5.0),
                    Stroke::new(
                        1.0 + (selection_mix * 1.5),
                        Color32::from_rgba_unmultiplied(245, 206, 93, halo_alpha),
                    ),
                );
                if selection_mix < 1.0 {
                    ui.ctx().request_repaint();
                }
            }
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(
                    if is_selected { 3.0 } else { 2.0 },
                    if is_selected {
                        Color32::from_rgb(255, 107, 107)
                    } else {
                        Color32::WHITE
                    },
                ),
            );

            let show_label = is_selected
                || is_hovered
                || is_related
                || is_match
                || radius > 16.0
                || zoom > 1.25;
            if show_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    truncate_label(&node.label, 28),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        if let Some(index) = hovered_index {
            let node = &cache.nodes[index];
            let info = format!(
                "{}  |  {} docs  |  confidence {:.2}",
                node.label, node.document_count, node.avg_confidence
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                info,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        self.pan += pan_delta;
        self.drag_node = drag_node;
        if let Some(id) = clicked_node {
            self.selected_node = Some(id.clone());
            self.pending_node_click = Some(id);
        }
    }
}
