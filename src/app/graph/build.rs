use std::collections::{HashMap, HashSet};

use eframe::egui::{Vec2, vec2};

use crate::api::TopicGraph;
use crate::util::stable_pair;

use super::super::render_utils::{node_radius, parse_node_color};
use super::super::{RenderEdge, RenderGraph, RenderNode};

fn seed_position(id: &str, index: usize) -> Vec2 {
    let (jx, jy) = stable_pair(id);
    let mut direction = vec2(jx, jy);
    if direction.length_sq() <= 0.0001 {
        let angle = ((index as f32) * 0.618_034 + 0.11) * std::f32::consts::TAU;
        direction = vec2(angle.cos(), angle.sin());
    } else {
        direction = direction.normalized();
    }

    direction * (60.0 + 12.0 * index as f32)
}

impl RenderGraph {
    /// Builds a layout-ready graph from the wire payload. Node identity maps
    /// to an index table; edges are resolved against it and silently dropped
    /// when an endpoint is missing (upstream data may reference deleted
    /// topics). Positions and velocities carry over from `prior` for ids
    /// that persist, so a redraw does not scatter the layout.
    pub(in crate::app) fn build(wire: &TopicGraph, prior: Option<&RenderGraph>) -> RenderGraph {
        let mut index_by_id = HashMap::with_capacity(wire.nodes.len());
        let mut nodes: Vec<RenderNode> = Vec::with_capacity(wire.nodes.len());

        for node in &wire.nodes {
            if index_by_id.contains_key(&node.id) {
                continue;
            }
            let index = nodes.len();
            index_by_id.insert(node.id.clone(), index);

            let carried = prior.and_then(|previous| {
                previous
                    .index_by_id
                    .get(&node.id)
                    .map(|&prior_index| &previous.nodes[prior_index])
            });
            let (world_pos, velocity) = match carried {
                Some(prior_node) => (prior_node.world_pos, prior_node.velocity),
                None => (seed_position(&node.id, index), Vec2::ZERO),
            };

            nodes.push(RenderNode {
                id: node.id.clone(),
                label: node.label.clone(),
                color: parse_node_color(node.color.as_deref()),
                document_count: node.document_count,
                avg_confidence: node.avg_confidence,
                radius: node_radius(node.size_score),
                world_pos,
                velocity,
                pinned: None,
            });
        }

        let mut seen = HashSet::with_capacity(wire.edges.len());
        let mut edges = Vec::with_capacity(wire.edges.len());
        for edge in &wire.edges {
            let (Some(&source), Some(&target)) = (
                index_by_id.get(&edge.source),
                index_by_id.get(&edge.target),
            ) else {
                continue;
            };
            if source == target || !seen.insert((source, target)) {
                continue;
            }
            edges.push(RenderEdge {
                source,
                target,
                weight: edge.weight,
            });
        }

        RenderGraph {
            nodes,
            edges,
            index_by_id,
            alpha: 1.0,
            alpha_target: 0.0,
            forces_scratch: Vec::new(),
        }
    }

    pub(in crate::app) fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }
}
