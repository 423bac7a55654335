use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic pseudo-random direction in [-1, 1]^2 derived from an id, so
/// a node always seeds at the same spot across rebuilds.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_owned();
    }

    let mut truncated = label
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    truncated.push('…');
    truncated
}

/// Graph node ids arrive as "t<topic id>"; the detail endpoint wants the
/// numeric part.
pub fn topic_id_from_node(node_id: &str) -> Option<i64> {
    node_id.strip_prefix('t').unwrap_or(node_id).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_id_strips_prefix() {
        assert_eq!(topic_id_from_node("t42"), Some(42));
        assert_eq!(topic_id_from_node("17"), Some(17));
        assert_eq!(topic_id_from_node("topic-42"), None);
    }

    #[test]
    fn truncation_keeps_short_labels() {
        assert_eq!(truncate_label("billing", 12), "billing");
        assert_eq!(truncate_label("a very long topic label", 8), "a very …");
    }

    #[test]
    fn stable_pair_is_stable_and_bounded() {
        let first = stable_pair("t1");
        let second = stable_pair("t1");
        assert_eq!(first, second);
        assert!(first.0.abs() <= 1.0 && first.1.abs() <= 1.0);
        assert_ne!(stable_pair("t1"), stable_pair("t2"));
    }
}
