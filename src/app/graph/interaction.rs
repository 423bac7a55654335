use eframe::egui::{self, Pos2, Rect, Ui, Vec2};

use super::super::ViewModel;
use super::super::render_utils::screen_to_world;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    /// Pointer position translated into simulation space, when it is over
    /// the graph canvas.
    pub(in crate::app) fn pointer_world(&self, ui: &Ui, rect: Rect) -> Option<Vec2> {
        let pointer = ui.input(|input| input.pointer.interact_pos())?;
        rect.contains(pointer)
            .then(|| screen_to_world(rect, self.pan, self.zoom, pointer))
    }

    pub(in crate::app) fn hovered_index(
        ui: &Ui,
        rect: Rect,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<(usize, f32)> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        if !rect.contains(pointer) {
            return None;
        }

        (0..screen_positions.len())
            .filter_map(|index| {
                let distance = screen_positions[index].distance(pointer);
                (distance <= screen_radii[index]).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}
