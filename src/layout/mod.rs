//! Agent Network Layout
//!
//! Two alternative placements of the same node/edge set: concentric rings by
//! call depth ([`radial`]) and a left-to-right layered drawing ([`linear`]).
//! Both are pure functions of the connectivity list and the current highlight
//! state, so they are recomputed from scratch on every change.

pub mod layered;
pub mod linear;
pub mod radial;

use crate::error::AgentFlowResult;
use crate::graph::{display_name, AgentId, FrontmanPolicy, GraphError};
use crate::tracking::AgentCounters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

pub use layered::LongestPathLayering;
pub use linear::{LayeredEdge, LayeredLayoutService, LayeredNode, LinearLayoutEngine, Orientation};
pub use radial::RadialLayoutEngine;

/// Default x coordinate of the frontman
pub const DEFAULT_FRONTMAN_X_POS: f64 = 150.0;
/// Default y coordinate of the frontman
pub const DEFAULT_FRONTMAN_Y_POS: f64 = 450.0;
/// Minimum distance from the center
pub const BASE_RADIUS: f64 = 100.0;
/// Distance between depth levels
pub const LEVEL_SPACING: f64 = 150.0;
/// Node box used by the layered drawing
pub const NODE_WIDTH: f64 = 200.0;
pub const NODE_HEIGHT: f64 = 120.0;

/// 2D position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A positioned agent, ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: AgentId,
    pub display_name: String,
    pub depth: usize,
    pub position: Point,
    pub is_frontman: bool,
    pub is_active: bool,
    /// Heat-map counter for this agent
    pub invocations: u64,
}

/// A parent -> child call edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEdge {
    pub id: String,
    pub source: AgentId,
    pub target: AgentId,
    pub source_handle: String,
    pub target_handle: String,
    /// Both endpoints are currently engaged in a conversation
    pub animated: bool,
}

/// Output handed to the renderer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphLayout {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

impl GraphLayout {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.source == source && edge.target == target)
    }
}

/// Which side of a node an edge attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleSide {
    Left,
    Right,
}

impl HandleSide {
    pub fn handle_id(self, node: &str) -> String {
        match self {
            HandleSide::Left => format!("{}-left-handle", node),
            HandleSide::Right => format!("{}-right-handle", node),
        }
    }
}

/// Live state the layouts use for highlighting
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighlightState {
    /// Agents that belong to at least one active conversation
    pub active_agents: BTreeSet<AgentId>,
    /// Per-agent invocation counts for the current interaction
    pub counters: AgentCounters,
    /// A query is in flight
    pub awaiting_response: bool,
}

impl HighlightState {
    pub fn is_active(&self, agent: &str) -> bool {
        self.active_agents.contains(agent)
    }

    pub fn invocations(&self, agent: &str) -> u64 {
        self.counters.get(agent).copied().unwrap_or(0)
    }

    pub(crate) fn node(
        &self,
        id: &str,
        depth: usize,
        position: Point,
        is_frontman: bool,
    ) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            display_name: display_name(id),
            depth,
            position,
            is_frontman,
            is_active: self.is_active(id),
            invocations: self.invocations(id),
        }
    }

    pub(crate) fn edge(
        &self,
        id: String,
        source: &str,
        target: &str,
        source_side: HandleSide,
        target_side: HandleSide,
    ) -> LayoutEdge {
        LayoutEdge {
            id,
            source: source.to_string(),
            target: target.to_string(),
            source_handle: source_side.handle_id(source),
            target_handle: target_side.handle_id(target),
            animated: self.is_active(source) && self.is_active(target),
        }
    }
}

/// Geometry and input-handling settings shared by both engines
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSettings {
    pub center: Point,
    pub base_radius: f64,
    pub level_spacing: f64,
    pub node_width: f64,
    pub node_height: f64,
    pub rank_separation: f64,
    pub node_separation: f64,
    pub frontman_policy: FrontmanPolicy,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            center: Point::new(DEFAULT_FRONTMAN_X_POS, DEFAULT_FRONTMAN_Y_POS),
            base_radius: BASE_RADIUS,
            level_spacing: LEVEL_SPACING,
            node_width: NODE_WIDTH,
            node_height: NODE_HEIGHT,
            rank_separation: 50.0,
            node_separation: 50.0,
            frontman_policy: FrontmanPolicy::Degrade,
        }
    }
}

/// Layout selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Radial,
    Linear,
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutMode::Radial => write!(f, "radial"),
            LayoutMode::Linear => write!(f, "linear"),
        }
    }
}

impl std::str::FromStr for LayoutMode {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "radial" => Ok(LayoutMode::Radial),
            "linear" => Ok(LayoutMode::Linear),
            other => Err(LayoutError::UnknownMode(other.to_string())),
        }
    }
}

/// Errors raised while computing a layout
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Layered layout service failed: {0}")]
    Service(String),

    #[error("Layered layout service returned no position for node '{0}'")]
    MissingPosition(AgentId),

    #[error("Unknown layout mode: {0}")]
    UnknownMode(String),
}

/// Lay out a connectivity list with the selected engine.
///
/// The linear engine uses the built-in [`LongestPathLayering`] service.
pub fn layout_network(
    mode: LayoutMode,
    settings: &LayoutSettings,
    entries: &[crate::graph::ConnectivityEntry],
    highlight: &HighlightState,
) -> Result<GraphLayout, LayoutError> {
    match mode {
        LayoutMode::Radial => RadialLayoutEngine::new(settings.clone()).layout(entries, highlight),
        LayoutMode::Linear => {
            let service = LongestPathLayering::new(settings.rank_separation, settings.node_separation);
            LinearLayoutEngine::new(settings.clone(), &service).layout(entries, highlight)
        }
    }
}

/// Lay out a connectivity list and serialize the result for a renderer
pub fn render_network(
    mode: LayoutMode,
    settings: &LayoutSettings,
    entries: &[crate::graph::ConnectivityEntry],
    highlight: &HighlightState,
    pretty: bool,
) -> AgentFlowResult<String> {
    let layout = layout_network(mode, settings, entries, highlight)?;
    debug!(
        "{} layout: {} nodes, {} edges",
        mode,
        layout.nodes.len(),
        layout.edges.len()
    );

    let output = if pretty {
        serde_json::to_string_pretty(&layout)?
    } else {
        serde_json::to_string(&layout)?
    };
    Ok(output)
}
