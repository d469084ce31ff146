//! Linear layout: a left-to-right layered drawing whose coordinates come from
//! a layered-graph service. Display depth is derived from the returned x
//! coordinates rather than from the breadth-first depth map.

use super::{GraphLayout, HandleSide, HighlightState, LayoutError, LayoutSettings, Point};
use crate::graph::{AgentId, ConnectivityEntry, ConnectivityGraph};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Rank direction requested from the layered service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    LeftToRight,
    TopToBottom,
}

/// A node box handed to the layered service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeredNode {
    pub id: AgentId,
    pub width: f64,
    pub height: f64,
}

/// A directed edge handed to the layered service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayeredEdge {
    pub source: AgentId,
    pub target: AgentId,
}

/// Coordinate assignment for a layered drawing.
///
/// Returns the center point of every node box, keyed by node id.
#[cfg_attr(test, mockall::automock)]
pub trait LayeredLayoutService {
    fn layout(
        &self,
        nodes: &[LayeredNode],
        edges: &[LayeredEdge],
        orientation: Orientation,
    ) -> Result<HashMap<AgentId, Point>, LayoutError>;
}

/// Builds the same one-edge-per-agent set as the radial engine, resolving
/// each agent's parent independently, then asks a layered service for
/// coordinates.
pub struct LinearLayoutEngine<'a> {
    settings: LayoutSettings,
    service: &'a dyn LayeredLayoutService,
}

impl<'a> LinearLayoutEngine<'a> {
    pub fn new(settings: LayoutSettings, service: &'a dyn LayeredLayoutService) -> Self {
        Self { settings, service }
    }

    pub fn layout(
        &self,
        entries: &[ConnectivityEntry],
        highlight: &HighlightState,
    ) -> Result<GraphLayout, LayoutError> {
        let graph = ConnectivityGraph::build(entries, self.settings.frontman_policy)?;
        self.layout_graph(&graph, highlight)
    }

    pub fn layout_graph(
        &self,
        graph: &ConnectivityGraph,
        highlight: &HighlightState,
    ) -> Result<GraphLayout, LayoutError> {
        let mut layout = GraphLayout::default();
        let mut seen = HashSet::new();

        for entry in graph.entries() {
            let node = entry.origin.as_str();
            if !seen.insert(node) {
                continue;
            }
            let is_frontman = graph.is_frontman(node);
            layout
                .nodes
                .push(highlight.node(node, 0, Point::default(), is_frontman));

            if is_frontman {
                continue;
            }
            if let Some(parent) = graph.get_parent(node) {
                layout.edges.push(highlight.edge(
                    format!("{}-edge", node),
                    parent,
                    node,
                    HandleSide::Right,
                    HandleSide::Left,
                ));
            }
        }

        if layout.nodes.is_empty() {
            return Ok(layout);
        }

        let layered_nodes: Vec<LayeredNode> = layout
            .nodes
            .iter()
            .map(|node| LayeredNode {
                id: node.id.clone(),
                width: self.settings.node_width,
                height: self.settings.node_height,
            })
            .collect();
        let layered_edges: Vec<LayeredEdge> = layout
            .edges
            .iter()
            .map(|edge| LayeredEdge {
                source: edge.source.clone(),
                target: edge.target.clone(),
            })
            .collect();

        let centers = self
            .service
            .layout(&layered_nodes, &layered_edges, Orientation::LeftToRight)?;

        let mut columns: Vec<f64> = Vec::with_capacity(layout.nodes.len());
        for node in &layout.nodes {
            let center = centers
                .get(&node.id)
                .ok_or_else(|| LayoutError::MissingPosition(node.id.clone()))?;
            columns.push(center.x);
        }
        columns.sort_by(|a, b| a.total_cmp(b));
        columns.dedup();

        for node in &mut layout.nodes {
            // Presence was checked above
            let Some(center) = centers.get(&node.id) else {
                continue;
            };
            // Service coordinates are box centers; the renderer anchors at the top-left corner
            node.position = Point::new(
                center.x - self.settings.node_width / 2.0,
                center.y - self.settings.node_height / 2.0,
            );
            node.depth = columns
                .iter()
                .position(|x| *x == center.x)
                .unwrap_or_default();
        }

        debug!(
            "Linear layout: {} nodes, {} edges in {} columns",
            layout.nodes.len(),
            layout.edges.len(),
            columns.len()
        );

        Ok(layout)
    }
}
