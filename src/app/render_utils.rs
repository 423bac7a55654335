use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

pub(super) const DEFAULT_NODE_COLOR: Color32 = Color32::from_rgb(52, 152, 219);

/// Render and hit-test radius for a topic node.
pub(super) fn node_radius(size_score: f32) -> f32 {
    10.0 + size_score.clamp(0.0, 1.0) * 20.0
}

pub(super) fn edge_width(weight: f32) -> f32 {
    weight.max(0.0).sqrt() * 3.0
}

/// Parses the backend's "#rrggbb" node color, falling back to the default
/// palette blue for anything it cannot read.
pub(super) fn parse_node_color(color: Option<&str>) -> Color32 {
    let Some(hex) = color.map(|value| value.trim_start_matches('#')) else {
        return DEFAULT_NODE_COLOR;
    };
    if hex.len() != 6 {
        return DEFAULT_NODE_COLOR;
    }

    match (
        u8::from_str_radix(&hex[0..2], 16),
        u8::from_str_radix(&hex[2..4], 16),
        u8::from_str_radix(&hex[4..6], 16),
    ) {
        (Ok(r), Ok(g), Ok(b)) => Color32::from_rgb(r, g, b),
        _ => DEFAULT_NODE_COLOR,
    }
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_follows_size_score() {
        assert_eq!(node_radius(0.0), 10.0);
        assert_eq!(node_radius(1.0), 30.0);
        assert_eq!(node_radius(2.0), 30.0); // clamped
    }

    #[test]
    fn color_parsing_tolerates_garbage() {
        assert_eq!(parse_node_color(Some("#3498db")), Color32::from_rgb(52, 152, 219));
        assert_eq!(parse_node_color(Some("e74c3c")), Color32::from_rgb(231, 76, 60));
        assert_eq!(parse_node_color(Some("not-a-color")), DEFAULT_NODE_COLOR);
        assert_eq!(parse_node_color(None), DEFAULT_NODE_COLOR);
    }

    #[test]
    fn world_screen_round_trip() {
        let rect = Rect::from_min_size(Pos2::ZERO, eframe::egui::vec2(800.0, 600.0));
        let world = eframe::egui::vec2(42.0, -17.0);
        let screen = world_to_screen(rect, eframe::egui::vec2(12.0, 3.0), 1.5, world);
        let back = screen_to_world(rect, eframe::egui::vec2(12.0, 3.0), 1.5, screen);
        assert!((back - world).length() < 1.0e-3);
    }
}
