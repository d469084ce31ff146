//! Radial layout: the frontman at the center, every other reachable agent on
//! a ring whose radius grows with its call depth.

use super::{GraphLayout, HandleSide, HighlightState, LayoutError, LayoutSettings, Point};
use crate::graph::{ConnectivityEntry, ConnectivityGraph};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::f64::consts::PI;
use tracing::debug;

/// Places agents on concentric rings by breadth-first depth.
///
/// Only agents reachable from the frontman are emitted, and each gets exactly
/// one inbound edge from the parent that discovered it. Extra callers of an
/// agent (a second parent, a transitive shortcut) produce no edge.
#[derive(Debug, Clone, Default)]
pub struct RadialLayoutEngine {
    settings: LayoutSettings,
}

impl RadialLayoutEngine {
    pub fn new(settings: LayoutSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn layout(
        &self,
        entries: &[ConnectivityEntry],
        highlight: &HighlightState,
    ) -> Result<GraphLayout, LayoutError> {
        let graph = ConnectivityGraph::build(entries, self.settings.frontman_policy)?;
        Ok(self.layout_graph(&graph, highlight))
    }

    /// Lay out an already-built model
    pub fn layout_graph(&self, graph: &ConnectivityGraph, highlight: &HighlightState) -> GraphLayout {
        let depths = graph.compute_depths();
        let center = self.settings.center;

        let mut by_depth: IndexMap<usize, Vec<&str>> = IndexMap::new();
        for (node, depth) in &depths {
            by_depth.entry(*depth).or_default().push(node.as_str());
        }

        let mut positions: HashMap<&str, Point> = HashMap::with_capacity(depths.len());
        let mut layout = GraphLayout::default();

        for (depth, nodes) in &by_depth {
            let radius = self.settings.base_radius + *depth as f64 * self.settings.level_spacing;
            let angle_step = (2.0 * PI) / nodes.len() as f64;

            for (index, &node) in nodes.iter().enumerate() {
                let is_frontman = graph.is_frontman(node);
                let position = if is_frontman {
                    center
                } else {
                    let angle = index as f64 * angle_step;
                    Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
                };
                positions.insert(node, position);
                layout
                    .nodes
                    .push(highlight.node(node, *depth, position, is_frontman));
            }
        }

        for node in &layout.nodes {
            if node.is_frontman {
                continue;
            }
            let Some(parent) = graph.parent_of(&node.id) else {
                continue;
            };
            let Some(parent_position) = positions.get(parent) else {
                continue;
            };

            let (source_side, target_side) = if node.position.x < parent_position.x {
                (HandleSide::Left, HandleSide::Right)
            } else {
                (HandleSide::Right, HandleSide::Left)
            };

            layout.edges.push(highlight.edge(
                format!("{}-edge-{}", node.id, parent),
                parent,
                &node.id,
                source_side,
                target_side,
            ));
        }

        debug!(
            "Radial layout: {} nodes, {} edges across {} levels",
            layout.nodes.len(),
            layout.edges.len(),
            by_depth.len()
        );

        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BASE_RADIUS, DEFAULT_FRONTMAN_X_POS, DEFAULT_FRONTMAN_Y_POS, LEVEL_SPACING};
    use crate::testing::fixtures::{network, seven_agent_network};

    fn run(entries: &[ConnectivityEntry]) -> GraphLayout {
        RadialLayoutEngine::default()
            .layout(entries, &HighlightState::default())
            .unwrap()
    }

    #[test]
    fn test_seven_agent_tree() {
        let layout = run(&seven_agent_network());

        assert_eq!(layout.nodes.len(), 7);
        assert_eq!(layout.edges.len(), 6);
        for (source, target) in [
            ("agent1", "agent2"),
            ("agent1", "agent3"),
            ("agent1", "agent4"),
            ("agent2", "agent5"),
            ("agent3", "agent6"),
            ("agent4", "agent7"),
        ] {
            assert!(layout.has_edge(source, target), "missing {} -> {}", source, target);
        }

        let frontman = &layout.nodes[0];
        assert_eq!(frontman.id, "agent1");
        assert!(frontman.is_frontman);
        assert_eq!(frontman.position, Point::new(DEFAULT_FRONTMAN_X_POS, DEFAULT_FRONTMAN_Y_POS));

        let x = |id: &str| layout.node(id).unwrap().position.x;
        assert!(x("agent2") > DEFAULT_FRONTMAN_X_POS);
        assert!(x("agent5") > x("agent2"));
        assert!(x("agent3") < DEFAULT_FRONTMAN_X_POS);
        assert!(x("agent6") < x("agent3"));
        assert!(x("agent4") < DEFAULT_FRONTMAN_X_POS);
        assert!(x("agent7") < x("agent4"));
    }

    #[test]
    fn test_ring_geometry() {
        let layout = run(&seven_agent_network());
        let agent5 = layout.node("agent5").unwrap();

        // First node on the depth-2 ring sits at angle zero
        assert_eq!(agent5.depth, 2);
        assert!((agent5.position.x - (DEFAULT_FRONTMAN_X_POS + BASE_RADIUS + 2.0 * LEVEL_SPACING)).abs() < 1e-9);
        assert!((agent5.position.y - DEFAULT_FRONTMAN_Y_POS).abs() < 1e-9);
    }

    #[test]
    fn test_handles_follow_relative_position() {
        let layout = run(&seven_agent_network());

        let right = layout.edges.iter().find(|e| e.target == "agent2").unwrap();
        assert_eq!(right.id, "agent2-edge-agent1");
        assert_eq!(right.source_handle, "agent1-right-handle");
        assert_eq!(right.target_handle, "agent2-left-handle");

        let left = layout.edges.iter().find(|e| e.target == "agent3").unwrap();
        assert_eq!(left.source_handle, "agent1-left-handle");
        assert_eq!(left.target_handle, "agent3-right-handle");
    }

    #[test]
    fn test_cycles_are_not_drawn() {
        let layout = run(&network(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]));

        assert_eq!(layout.nodes.len(), 3);
        assert!(layout.has_edge("a", "b"));
        assert!(layout.has_edge("b", "c"));
        assert!(!layout.has_edge("c", "a"));
        assert_eq!(layout.edges.len(), 2);
    }

    #[test]
    fn test_back_edge_and_self_loop_skipped() {
        let layout = run(&network(&[
            ("agent1", &["agent2", "agent4"]),
            ("agent2", &["agent3"]),
            ("agent3", &["agent2"]),
            ("agent4", &["agent4"]),
        ]));

        assert_eq!(layout.nodes.len(), 4);
        assert_eq!(layout.edges.len(), 3);
        assert!(!layout.has_edge("agent3", "agent2"));
        assert!(!layout.has_edge("agent4", "agent4"));
    }

    #[test]
    fn test_transitive_edge_dropped() {
        let layout = run(&network(&[
            ("agent1", &["agent2", "agent3"]),
            ("agent2", &["agent3"]),
            ("agent3", &[]),
        ]));

        assert_eq!(layout.edges.len(), 2);
        assert!(layout.has_edge("agent1", "agent3"));
        assert!(!layout.has_edge("agent2", "agent3"));
    }

    #[test]
    fn test_degenerate_inputs() {
        let single = run(&network(&[("agent1", &[])]));
        assert_eq!(single.nodes.len(), 1);
        assert!(single.edges.is_empty());
        assert_eq!(single.nodes[0].id, "agent1");

        let empty = run(&[]);
        assert!(empty.nodes.is_empty());
        assert!(empty.edges.is_empty());

        let disconnected = run(&network(&[
            ("agent1", &["agent2"]),
            ("agent2", &[]),
            ("agent3", &["agent4"]),
            ("agent4", &[]),
        ]));
        assert_eq!(disconnected.nodes.len(), 2);
        assert_eq!(disconnected.edges.len(), 1);
    }

    #[test]
    fn test_idempotent() {
        let entries = seven_agent_network();
        assert_eq!(run(&entries), run(&entries));
    }
}
