//! Agent Connectivity Graph Model
//!
//! This module turns a raw connectivity list (one entry per agent, naming the
//! agents it may call) into the parent/child structure both layout engines
//! consume. The input is tolerated even when malformed: cycles, several
//! entry points and disconnected islands never cause a failure in the
//! default policy.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// Opaque agent identifier, unique within one connectivity list
pub type AgentId = String;

/// Depth of every agent reachable from the frontman, in discovery order
pub type DepthMap = IndexMap<AgentId, usize>;

/// One agent and the agents it may call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityEntry {
    pub origin: AgentId,
    #[serde(default)]
    pub tools: Vec<AgentId>,
}

impl ConnectivityEntry {
    pub fn new(origin: impl Into<String>, tools: &[&str]) -> Self {
        Self {
            origin: origin.into(),
            tools: tools.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// What to do when the connectivity list does not have exactly one entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontmanPolicy {
    /// Pick a substitute entry point, log a warning and carry on
    #[default]
    Degrade,
    /// Refuse to build the model
    Reject,
}

/// How the frontman was determined
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontmanResolution {
    /// Exactly one parent agent is nobody's tool
    Unique(AgentId),
    /// Several parent agents are nobody's tool; the first in list order was chosen
    Ambiguous {
        chosen: AgentId,
        candidates: Vec<AgentId>,
    },
    /// No parent agent is free of callers (a cycle runs through all of them, or
    /// no agent declares tools); the first parent entry, else the first entry, was chosen
    Cyclic { chosen: AgentId },
    /// The list was empty
    Empty,
}

impl FrontmanResolution {
    /// The agent used as entry point, if any
    pub fn frontman(&self) -> Option<&str> {
        match self {
            FrontmanResolution::Unique(id) => Some(id),
            FrontmanResolution::Ambiguous { chosen, .. } => Some(chosen),
            FrontmanResolution::Cyclic { chosen } => Some(chosen),
            FrontmanResolution::Empty => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, FrontmanResolution::Unique(_))
    }
}

/// Errors raised while building the graph model
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("No frontman found: every agent in the network is called by another agent")]
    NoFrontman,

    #[error("Multiple frontmen found: {0:?}")]
    AmbiguousFrontman(Vec<AgentId>),

    #[error("Failed to parse connectivity list: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parent/child structure derived from a connectivity list.
///
/// All partitions are computed once in [`ConnectivityGraph::build`]; lookups
/// afterwards are map accesses.
#[derive(Debug, Clone)]
pub struct ConnectivityGraph {
    entries: Vec<ConnectivityEntry>,
    /// Indices into `entries` of the parent agents, in list order
    parent_agents: Vec<usize>,
    child_agents: HashSet<AgentId>,
    /// Child id -> index of the first parent entry listing it
    first_parent: HashMap<AgentId, usize>,
    /// Parent id -> agents whose first parent it is, in list order
    children: HashMap<AgentId, Vec<AgentId>>,
    resolution: FrontmanResolution,
}

impl ConnectivityGraph {
    /// Build the model with the given policy for degenerate entry points
    pub fn build(entries: &[ConnectivityEntry], policy: FrontmanPolicy) -> Result<Self, GraphError> {
        let entries: Vec<ConnectivityEntry> = entries.to_vec();

        // A lone agent is its own parent set even without tools
        let parent_agents: Vec<usize> = if entries.len() == 1 {
            vec![0]
        } else {
            entries
                .iter()
                .enumerate()
                .filter(|(_, entry)| !entry.tools.is_empty())
                .map(|(index, _)| index)
                .collect()
        };

        let mut child_agents = HashSet::new();
        let mut first_parent = HashMap::new();
        for &index in &parent_agents {
            for tool in &entries[index].tools {
                child_agents.insert(tool.clone());
                first_parent.entry(tool.clone()).or_insert(index);
            }
        }

        let mut children: HashMap<AgentId, Vec<AgentId>> = HashMap::new();
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.origin.as_str()) {
                continue;
            }
            if let Some(&parent_index) = first_parent.get(&entry.origin) {
                children
                    .entry(entries[parent_index].origin.clone())
                    .or_default()
                    .push(entry.origin.clone());
            }
        }

        let resolution = Self::resolve_frontman(&entries, &parent_agents, &child_agents);

        match (&resolution, policy) {
            (FrontmanResolution::Unique(id), _) => debug!("Frontman resolved to {}", id),
            (FrontmanResolution::Empty, _) => debug!("Empty connectivity list"),
            (FrontmanResolution::Ambiguous { candidates, .. }, FrontmanPolicy::Reject) => {
                return Err(GraphError::AmbiguousFrontman(candidates.clone()));
            }
            (FrontmanResolution::Cyclic { .. }, FrontmanPolicy::Reject) => {
                return Err(GraphError::NoFrontman);
            }
            (FrontmanResolution::Ambiguous { chosen, candidates }, FrontmanPolicy::Degrade) => {
                warn!(
                    "Network has {} entry points {:?}; using {} as frontman",
                    candidates.len(),
                    candidates,
                    chosen
                );
            }
            (FrontmanResolution::Cyclic { chosen }, FrontmanPolicy::Degrade) => {
                warn!("Network has no entry point (cycle through all parents); using {} as frontman", chosen);
            }
        }

        Ok(Self {
            entries,
            parent_agents,
            child_agents,
            first_parent,
            children,
            resolution,
        })
    }

    /// Parse a JSON connectivity list and build the model.
    ///
    /// Accepts either a bare array of entries or a `{"connectivity_info": [...]}`
    /// response body.
    pub fn from_json(input: &str, policy: FrontmanPolicy) -> Result<Self, GraphError> {
        let entries = parse_connectivity(input)?;
        Self::build(&entries, policy)
    }

    fn resolve_frontman(
        entries: &[ConnectivityEntry],
        parent_agents: &[usize],
        child_agents: &HashSet<AgentId>,
    ) -> FrontmanResolution {
        if entries.is_empty() {
            return FrontmanResolution::Empty;
        }

        let candidates: Vec<AgentId> = parent_agents
            .iter()
            .map(|&index| &entries[index].origin)
            .filter(|origin| !child_agents.contains(*origin))
            .cloned()
            .collect();

        match candidates.len() {
            1 => FrontmanResolution::Unique(candidates[0].clone()),
            0 => {
                // No parent agents at all means a list of tool-less agents
                let chosen = parent_agents
                    .first()
                    .map(|&index| entries[index].origin.clone())
                    .unwrap_or_else(|| entries[0].origin.clone());
                FrontmanResolution::Cyclic { chosen }
            }
            _ => FrontmanResolution::Ambiguous {
                chosen: candidates[0].clone(),
                candidates,
            },
        }
    }

    pub fn entries(&self) -> &[ConnectivityEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Agents that declare at least one tool, in list order
    pub fn parent_agents(&self) -> impl Iterator<Item = &ConnectivityEntry> {
        self.parent_agents.iter().map(move |&index| &self.entries[index])
    }

    /// Agents declared as a tool by some parent agent
    pub fn child_agents(&self) -> &HashSet<AgentId> {
        &self.child_agents
    }

    pub fn frontman(&self) -> Option<&str> {
        self.resolution.frontman()
    }

    pub fn resolution(&self) -> &FrontmanResolution {
        &self.resolution
    }

    pub fn is_frontman(&self, node: &str) -> bool {
        self.frontman() == Some(node)
    }

    /// First parent agent (list order) that lists `node` as a tool
    pub fn parent_of(&self, node: &str) -> Option<&str> {
        self.first_parent
            .get(node)
            .map(|&index| self.entries[index].origin.as_str())
    }

    /// Parent used for edge construction: the structural parent when `node`
    /// is somebody's tool, otherwise the frontman
    pub fn get_parent(&self, node: &str) -> Option<&str> {
        if self.child_agents.contains(node) {
            self.parent_of(node)
        } else {
            self.frontman()
        }
    }

    /// Breadth-first depth of every agent reachable from the frontman.
    ///
    /// An agent is discovered only through its first parent and is never
    /// revisited, which makes cycles terminate and leaves any additional
    /// callers of an agent without an edge.
    pub fn compute_depths(&self) -> DepthMap {
        let mut depths = DepthMap::new();
        let Some(frontman) = self.frontman() else {
            return depths;
        };

        let mut queue = VecDeque::new();
        depths.insert(frontman.to_string(), 0);
        queue.push_back((frontman.to_string(), 0usize));

        while let Some((current, depth)) = queue.pop_front() {
            let Some(children) = self.children.get(&current) else {
                continue;
            };
            for child in children {
                if depths.contains_key(child) {
                    continue;
                }
                depths.insert(child.clone(), depth + 1);
                queue.push_back((child.clone(), depth + 1));
            }
        }

        depths
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConnectivityPayload {
    Wrapped { connectivity_info: Vec<ConnectivityEntry> },
    Bare(Vec<ConnectivityEntry>),
}

/// Parse a connectivity list from JSON
pub fn parse_connectivity(input: &str) -> Result<Vec<ConnectivityEntry>, GraphError> {
    let payload: ConnectivityPayload = serde_json::from_str(input)?;
    Ok(match payload {
        ConnectivityPayload::Wrapped { connectivity_info } => connectivity_info,
        ConnectivityPayload::Bare(entries) => entries,
    })
}

/// Human-friendly agent name: `FOO_BAR` becomes `Foo Bar`, `agent1` becomes `Agent 1`
pub fn display_name(agent: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut previous_digit: Option<bool> = None;

    for ch in agent.to_lowercase().chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_digit = None;
            continue;
        }
        let is_digit = ch.is_ascii_digit();
        if previous_digit.is_some_and(|prev| prev != is_digit) && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch);
        previous_digit = Some(is_digit);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::network;

    #[test]
    fn test_tree_partitions() {
        let entries = network(&[
            ("agent1", &["agent2", "agent3"]),
            ("agent2", &["agent4"]),
            ("agent3", &[]),
            ("agent4", &[]),
        ]);
        let graph = ConnectivityGraph::build(&entries, FrontmanPolicy::Reject).unwrap();

        let parents: Vec<&str> = graph.parent_agents().map(|e| e.origin.as_str()).collect();
        assert_eq!(parents, vec!["agent1", "agent2"]);
        assert_eq!(graph.child_agents().len(), 3);
        assert_eq!(graph.frontman(), Some("agent1"));
        assert_eq!(graph.resolution(), &FrontmanResolution::Unique("agent1".to_string()));
    }

    #[test]
    fn test_get_parent_first_match_and_frontman_fallback() {
        let entries = network(&[
            ("agent1", &["agent2", "agent3"]),
            ("agent2", &["agent3"]),
            ("agent3", &[]),
        ]);
        let graph = ConnectivityGraph::build(&entries, FrontmanPolicy::Degrade).unwrap();

        assert_eq!(graph.get_parent("agent3"), Some("agent1"));
        assert_eq!(graph.get_parent("agent2"), Some("agent1"));
        // Not a child: falls back to the frontman
        assert_eq!(graph.get_parent("agent1"), Some("agent1"));
        assert_eq!(graph.parent_of("agent1"), None);
    }

    #[test]
    fn test_depths_breadth_first() {
        let entries = network(&[
            ("agent1", &["agent2", "agent3"]),
            ("agent2", &["agent4"]),
            ("agent3", &[]),
            ("agent4", &[]),
        ]);
        let graph = ConnectivityGraph::build(&entries, FrontmanPolicy::Degrade).unwrap();
        let depths = graph.compute_depths();

        let order: Vec<(&str, usize)> = depths.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(
            order,
            vec![("agent1", 0), ("agent2", 1), ("agent3", 1), ("agent4", 2)]
        );
    }

    #[test]
    fn test_cycle_terminates() {
        let entries = network(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let graph = ConnectivityGraph::build(&entries, FrontmanPolicy::Degrade).unwrap();

        assert_eq!(graph.resolution(), &FrontmanResolution::Cyclic { chosen: "a".to_string() });
        let depths = graph.compute_depths();
        assert_eq!(depths.get("a"), Some(&0));
        assert_eq!(depths.get("b"), Some(&1));
        assert_eq!(depths.get("c"), Some(&2));
    }

    #[test]
    fn test_reject_policy() {
        let cyclic = network(&[("a", &["b"]), ("b", &["a"])]);
        assert!(matches!(
            ConnectivityGraph::build(&cyclic, FrontmanPolicy::Reject),
            Err(GraphError::NoFrontman)
        ));

        let disconnected = network(&[("a", &["b"]), ("b", &[]), ("c", &["d"]), ("d", &[])]);
        match ConnectivityGraph::build(&disconnected, FrontmanPolicy::Reject) {
            Err(GraphError::AmbiguousFrontman(candidates)) => {
                assert_eq!(candidates, vec!["a".to_string(), "c".to_string()]);
            }
            other => panic!("expected ambiguous frontman, got {:?}", other),
        }
    }

    #[test]
    fn test_disconnected_component_unreachable() {
        let entries = network(&[("a", &["b"]), ("b", &[]), ("c", &["d"]), ("d", &[])]);
        let graph = ConnectivityGraph::build(&entries, FrontmanPolicy::Degrade).unwrap();
        let depths = graph.compute_depths();

        assert_eq!(graph.frontman(), Some("a"));
        assert_eq!(depths.len(), 2);
        assert!(!depths.contains_key("c"));
        assert!(!depths.contains_key("d"));
    }

    #[test]
    fn test_single_and_empty() {
        let single = network(&[("solo", &[])]);
        let graph = ConnectivityGraph::build(&single, FrontmanPolicy::Reject).unwrap();
        assert_eq!(graph.frontman(), Some("solo"));
        assert_eq!(graph.compute_depths().len(), 1);

        let empty = ConnectivityGraph::build(&[], FrontmanPolicy::Reject).unwrap();
        assert_eq!(empty.frontman(), None);
        assert!(empty.compute_depths().is_empty());
    }

    #[test]
    fn test_parse_connectivity_shapes() {
        let bare = r#"[{"origin": "a", "tools": ["b"]}, {"origin": "b"}]"#;
        let wrapped = r#"{"connectivity_info": [{"origin": "a", "tools": ["b"]}, {"origin": "b", "tools": []}]}"#;

        let bare = parse_connectivity(bare).unwrap();
        let wrapped = parse_connectivity(wrapped).unwrap();
        assert_eq!(bare, wrapped);
        assert!(bare[1].tools.is_empty());
        assert!(parse_connectivity("not json").is_err());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("FOO_BAR"), "Foo Bar");
        assert_eq!(display_name("agent1"), "Agent 1");
        assert_eq!(display_name("airline-360_assistant"), "Airline 360 Assistant");
        assert_eq!(display_name(""), "");
    }
}
