//! Force-directed layout for the topic graph.
//!
//! Four forces act each tick: a per-edge spring toward a weight-derived
//! separation, pairwise charge repulsion, a weak pull toward the world
//! origin, and a soft minimum-separation push between node pairs. The
//! accumulate-then-integrate shape and the motion flag follow the same
//! scheme as the rest of the app's render loop: `step` is pure with respect
//! to its inputs and is driven either by the frame callback or directly by
//! tests.
//!
//! Cooling uses a decaying alpha that every force is scaled by; the
//! simulation sleeps once alpha reaches its floor and is re-heated by drag
//! gestures or graph rebuilds. Pinned nodes take their pin position verbatim
//! and hold zero velocity, so releasing a drag resumes from rest.

use eframe::egui::{Vec2, vec2};

use super::RenderGraph;

/// Preferred edge separation is `LINK_BASE_DISTANCE - weight * LINK_DISTANCE_SCALE`.
const LINK_BASE_DISTANCE: f32 = 200.0;
const LINK_DISTANCE_SCALE: f32 = 100.0;
const LINK_STIFFNESS: f32 = 0.08;

const CHARGE_STRENGTH: f32 = 300.0;
const CENTER_STRENGTH: f32 = 0.001;

/// Fixed per-node collision radius; two centers resist coming closer than
/// twice this.
const COLLISION_RADIUS: f32 = 50.0;
const COLLISION_STRENGTH: f32 = 0.7;

const VELOCITY_DAMPING: f32 = 0.6;
const MIN_DISTANCE: f32 = 1.0e-3;
const MAX_FORCE: f32 = 200.0;
const MAX_SPEED: f32 = 30.0;

const ALPHA_MIN: f32 = 0.001;
const ALPHA_DECAY: f32 = 0.0228;
const DRAG_ALPHA_TARGET: f32 = 0.3;

/// Distance-epsilon guard: coincident nodes get a deterministic push
/// direction instead of a singular force.
fn safe_direction(delta: Vec2, from: usize, to: usize) -> (Vec2, f32) {
    let distance = delta.length();
    if distance > MIN_DISTANCE {
        (delta / distance, distance)
    } else {
        let angle =
            ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
        (vec2(angle.cos(), angle.sin()), MIN_DISTANCE)
    }
}

/// Advances the simulation one tick. Returns true while anything is still
/// moving (or held pinned), which the caller turns into a repaint request.
pub(in crate::app) fn step(graph: &mut RenderGraph, dt: f32) -> bool {
    let node_count = graph.nodes.len();
    if node_count == 0 {
        return false;
    }

    if graph.alpha < ALPHA_MIN && graph.alpha_target < ALPHA_MIN {
        // Asleep; pinned nodes still track the pointer exactly.
        let mut any_pinned = false;
        for node in &mut graph.nodes {
            if let Some(pin) = node.pinned {
                node.world_pos = pin;
                node.velocity = Vec2::ZERO;
                any_pinned = true;
            }
        }
        return any_pinned;
    }

    graph.alpha += (graph.alpha_target - graph.alpha) * ALPHA_DECAY;
    let alpha = graph.alpha;

    let forces = &mut graph.forces_scratch;
    forces.resize(node_count, Vec2::ZERO);
    forces.fill(Vec2::ZERO);

    for edge in &graph.edges {
        let (from, to) = (edge.source, edge.target);
        if from >= node_count || to >= node_count || from == to {
            continue;
        }

        let delta = graph.nodes[to].world_pos - graph.nodes[from].world_pos;
        let (direction, distance) = safe_direction(delta, from, to);
        let preferred = LINK_BASE_DISTANCE - edge.weight * LINK_DISTANCE_SCALE;
        let pull = (distance - preferred) * LINK_STIFFNESS;

        forces[from] += direction * pull;
        forces[to] -= direction * pull;
    }

    // Pairwise charge + collision. Topic graphs are tens of nodes, so the
    // O(n^2) sweep stays well under frame budget.
    let min_separation = COLLISION_RADIUS * 2.0;
    for i in 0..node_count {
        for j in (i + 1)..node_count {
            let delta = graph.nodes[i].world_pos - graph.nodes[j].world_pos;
            let (direction, distance) = safe_direction(delta, i, j);

            let repulsion = CHARGE_STRENGTH / (distance * distance).max(MIN_DISTANCE);
            forces[i] += direction * repulsion;
            forces[j] -= direction * repulsion;

            if distance < min_separation {
                let push = (min_separation - distance) * COLLISION_STRENGTH;
                forces[i] += direction * push;
                forces[j] -= direction * push;
            }
        }
    }

    for (index, force) in forces.iter_mut().enumerate() {
        *force -= graph.nodes[index].world_pos * CENTER_STRENGTH;
    }

    let time_scale = (dt * 60.0).clamp(0.25, 3.0);
    let damping_factor = VELOCITY_DAMPING.powf(time_scale);
    for (index, node) in graph.nodes.iter_mut().enumerate() {
        if let Some(pin) = node.pinned {
            node.world_pos = pin;
            node.velocity = Vec2::ZERO;
            continue;
        }

        let mut force = forces[index];
        let force_len = force.length();
        if force_len > MAX_FORCE {
            force *= MAX_FORCE / force_len;
        }

        node.velocity = (node.velocity + force * (alpha * time_scale)) * damping_factor;
        let speed = node.velocity.length();
        if speed > MAX_SPEED {
            node.velocity *= MAX_SPEED / speed;
        }
        node.world_pos += node.velocity * time_scale;
    }

    true
}

impl RenderGraph {
    /// Overrides a node's position for the duration of a drag; forces are
    /// ignored for it until `unpin`.
    pub(in crate::app) fn pin(&mut self, index: usize, world: Vec2) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.pinned = Some(world);
            node.world_pos = world;
            node.velocity = Vec2::ZERO;
        }
    }

    /// Releases a pinned node at rest, so letting go never flings it.
    pub(in crate::app) fn unpin(&mut self, index: usize) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.pinned = None;
            node.velocity = Vec2::ZERO;
        }
    }

    /// Bumps alpha so motion propagates again (graph rebuilds, drag starts).
    pub(in crate::app) fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
    }

    /// While a drag is active the simulation holds a warm alpha target so
    /// neighbors keep reacting to the dragged node.
    pub(in crate::app) fn set_drag_active(&mut self, active: bool) {
        if active {
            self.alpha_target = DRAG_ALPHA_TARGET;
            self.reheat(DRAG_ALPHA_TARGET);
        } else {
            self.alpha_target = 0.0;
        }
    }

    pub(in crate::app) fn positions(&self) -> impl Iterator<Item = (&str, Vec2)> {
        self.nodes
            .iter()
            .map(|node| (node.id.as_str(), node.world_pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TopicEdge, TopicGraph, TopicNode};

    fn wire_node(id: &str, size_score: f32) -> TopicNode {
        TopicNode {
            id: id.to_owned(),
            label: id.to_owned(),
            size_score,
            document_count: 1,
            avg_confidence: 0.5,
            color: None,
        }
    }

    fn wire_edge(source: &str, target: &str, weight: f32) -> TopicEdge {
        TopicEdge {
            source: source.to_owned(),
            target: target.to_owned(),
            weight,
            edge_type: "related".to_owned(),
        }
    }

    fn settle(graph: &mut RenderGraph) {
        for _ in 0..2000 {
            if !step(graph, 1.0 / 60.0) {
                return;
            }
        }
    }

    fn distance(graph: &RenderGraph, a: usize, b: usize) -> f32 {
        (graph.nodes[a].world_pos - graph.nodes[b].world_pos).length()
    }

    #[test]
    fn pinned_node_tracks_drag_exactly_and_releases_at_rest() {
        let wire = TopicGraph {
            nodes: vec![wire_node("a", 0.5), wire_node("b", 0.5), wire_node("c", 0.5)],
            edges: vec![wire_edge("a", "b", 0.5), wire_edge("b", "c", 0.5)],
        };
        let mut graph = RenderGraph::build(&wire, None);

        let pin_point = vec2(30.0, 40.0);
        graph.set_drag_active(true);
        graph.pin(0, pin_point);
        for _ in 0..60 {
            step(&mut graph, 1.0 / 60.0);
            assert_eq!(graph.nodes[0].world_pos, pin_point);
            assert_eq!(graph.nodes[0].velocity, Vec2::ZERO);
        }

        graph.unpin(0);
        graph.set_drag_active(false);
        assert!(graph.nodes[0].pinned.is_none());
        assert_eq!(graph.nodes[0].velocity, Vec2::ZERO);
    }

    #[test]
    fn collision_keeps_stabilized_nodes_separated() {
        // Repeated "random" seeding: different id sets hash to different
        // starting layouts.
        for seed in 0..5 {
            let nodes = (0..6)
                .map(|index| wire_node(&format!("s{seed}-n{index}"), 0.4))
                .collect();
            let wire = TopicGraph {
                nodes,
                edges: Vec::new(),
            };
            let mut graph = RenderGraph::build(&wire, None);
            settle(&mut graph);

            let min_separation = COLLISION_RADIUS * 2.0;
            for i in 0..graph.nodes.len() {
                for j in (i + 1)..graph.nodes.len() {
                    assert!(
                        distance(&graph, i, j) >= min_separation * 0.95,
                        "seed {seed}: nodes {i} and {j} ended {} apart",
                        distance(&graph, i, j)
                    );
                }
            }
        }
    }

    #[test]
    fn coincident_nodes_do_not_produce_nan() {
        let wire = TopicGraph {
            nodes: vec![wire_node("x", 0.5), wire_node("y", 0.5)],
            edges: vec![wire_edge("x", "y", 1.0)],
        };
        let mut graph = RenderGraph::build(&wire, None);
        graph.nodes[0].world_pos = Vec2::ZERO;
        graph.nodes[1].world_pos = Vec2::ZERO;

        settle(&mut graph);
        for node in &graph.nodes {
            assert!(node.world_pos.x.is_finite() && node.world_pos.y.is_finite());
        }
        assert!(distance(&graph, 0, 1) > MIN_DISTANCE);
    }

    #[test]
    fn heavier_edges_converge_to_smaller_separation() {
        let wire = TopicGraph {
            nodes: vec![wire_node("a", 0.5), wire_node("b", 0.5), wire_node("c", 0.5)],
            edges: vec![wire_edge("a", "b", 0.5), wire_edge("b", "c", 0.9)],
        };
        let mut graph = RenderGraph::build(&wire, None);
        settle(&mut graph);

        let d_ab = distance(&graph, 0, 1);
        let d_bc = distance(&graph, 1, 2);

        // Preferred separations: 200 - 0.5*100 = 150 and 200 - 0.9*100 = 110.
        assert!((d_ab - 150.0).abs() < 30.0, "d(a,b) = {d_ab}");
        assert!((d_bc - 110.0).abs() < 30.0, "d(b,c) = {d_bc}");
        assert!(d_bc < d_ab);
    }

    #[test]
    fn simulation_sleeps_and_reheats() {
        let wire = TopicGraph {
            nodes: vec![wire_node("a", 0.5), wire_node("b", 0.5)],
            edges: vec![wire_edge("a", "b", 0.5)],
        };
        let mut graph = RenderGraph::build(&wire, None);
        settle(&mut graph);
        assert!(!step(&mut graph, 1.0 / 60.0));

        graph.reheat(0.5);
        assert!(step(&mut graph, 1.0 / 60.0));
    }
}
