//! Built-in layered-graph coordinate assignment.
//!
//! A small longest-path layering in the spirit of `dot`/`dagre`: break
//! cycles, rank every node by the longest path reaching it, then stack each
//! rank's nodes in input order, centered on the cross axis.

use super::linear::{LayeredEdge, LayeredLayoutService, LayeredNode, Orientation};
use super::{LayoutError, Point};
use crate::graph::AgentId;
use std::collections::{HashMap, VecDeque};

/// Longest-path layered layout
#[derive(Debug, Clone, PartialEq)]
pub struct LongestPathLayering {
    /// Gap between adjacent ranks
    pub rank_separation: f64,
    /// Gap between adjacent nodes within a rank
    pub node_separation: f64,
}

impl Default for LongestPathLayering {
    fn default() -> Self {
        Self {
            rank_separation: 50.0,
            node_separation: 50.0,
        }
    }
}

impl LongestPathLayering {
    pub fn new(rank_separation: f64, node_separation: f64) -> Self {
        Self {
            rank_separation,
            node_separation,
        }
    }

    /// Edges that survive cycle breaking, as index pairs.
    ///
    /// Self-loops, edges to unknown nodes and back edges found by a
    /// depth-first search in input order are dropped.
    fn acyclic_edges(index: &HashMap<&str, usize>, edges: &[LayeredEdge]) -> Vec<(usize, usize)> {
        let node_count = index.len();
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); node_count];
        for edge in edges {
            let (Some(&from), Some(&to)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
            else {
                continue;
            };
            if from != to {
                adjacency[from].push(to);
            }
        }

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnStack,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; node_count];
        let mut kept = Vec::new();

        for root in 0..node_count {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            // Iterative DFS: (node, next child position)
            let mut stack = vec![(root, 0usize)];
            marks[root] = Mark::OnStack;
            while let Some(frame) = stack.last_mut() {
                let (node, cursor) = *frame;
                if cursor < adjacency[node].len() {
                    frame.1 += 1;
                    let next = adjacency[node][cursor];
                    match marks[next] {
                        Mark::OnStack => {}
                        Mark::Done => kept.push((node, next)),
                        Mark::Unvisited => {
                            kept.push((node, next));
                            marks[next] = Mark::OnStack;
                            stack.push((next, 0));
                        }
                    }
                } else {
                    marks[node] = Mark::Done;
                    stack.pop();
                }
            }
        }

        kept
    }

    /// Longest-path rank of every node over an acyclic edge set
    fn ranks(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
        let mut in_degree = vec![0usize; node_count];
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); node_count];
        for &(from, to) in edges {
            in_degree[to] += 1;
            outgoing[from].push(to);
        }

        let mut ranks = vec![0usize; node_count];
        let mut queue: VecDeque<usize> = (0..node_count).filter(|&n| in_degree[n] == 0).collect();
        while let Some(node) = queue.pop_front() {
            for &next in &outgoing[node] {
                ranks[next] = ranks[next].max(ranks[node] + 1);
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }
        ranks
    }
}

impl LayeredLayoutService for LongestPathLayering {
    fn layout(
        &self,
        nodes: &[LayeredNode],
        edges: &[LayeredEdge],
        orientation: Orientation,
    ) -> Result<HashMap<AgentId, Point>, LayoutError> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for (position, node) in nodes.iter().enumerate() {
            if index.insert(node.id.as_str(), position).is_some() {
                return Err(LayoutError::Service(format!("duplicate node id '{}'", node.id)));
            }
        }

        let kept = Self::acyclic_edges(&index, edges);
        let ranks = Self::ranks(nodes.len(), &kept);

        // Rank extent along the main axis is the widest box in that rank
        let rank_count = ranks.iter().copied().max().map_or(0, |r| r + 1);
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
        for (node, &rank) in ranks.iter().enumerate() {
            members[rank].push(node);
        }

        let main_size = |node: &LayeredNode| match orientation {
            Orientation::LeftToRight => node.width,
            Orientation::TopToBottom => node.height,
        };
        let cross_size = |node: &LayeredNode| match orientation {
            Orientation::LeftToRight => node.height,
            Orientation::TopToBottom => node.width,
        };

        let mut rank_centers = Vec::with_capacity(rank_count);
        let mut offset = 0.0;
        for rank_members in &members {
            let extent = rank_members
                .iter()
                .map(|&n| main_size(&nodes[n]))
                .fold(0.0_f64, f64::max);
            rank_centers.push(offset + extent / 2.0);
            offset += extent + self.rank_separation;
        }

        let spans: Vec<f64> = members
            .iter()
            .map(|rank_members| {
                let boxes: f64 = rank_members.iter().map(|&n| cross_size(&nodes[n])).sum();
                boxes + self.node_separation * rank_members.len().saturating_sub(1) as f64
            })
            .collect();
        let widest = spans.iter().copied().fold(0.0_f64, f64::max);

        let mut centers = HashMap::with_capacity(nodes.len());
        for (rank, rank_members) in members.iter().enumerate() {
            let mut cursor = (widest - spans[rank]) / 2.0;
            for &n in rank_members {
                let size = cross_size(&nodes[n]);
                let main = rank_centers[rank];
                let cross = cursor + size / 2.0;
                cursor += size + self.node_separation;

                let point = match orientation {
                    Orientation::LeftToRight => Point::new(main, cross),
                    Orientation::TopToBottom => Point::new(cross, main),
                };
                centers.insert(nodes[n].id.clone(), point);
            }
        }

        Ok(centers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes(ids: &[&str]) -> Vec<LayeredNode> {
        ids.iter()
            .map(|id| LayeredNode {
                id: id.to_string(),
                width: 200.0,
                height: 100.0,
            })
            .collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<LayeredEdge> {
        pairs
            .iter()
            .map(|(s, t)| LayeredEdge {
                source: s.to_string(),
                target: t.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_ranks_left_to_right() {
        let service = LongestPathLayering::default();
        let centers = service
            .layout(
                &boxes(&["a", "b", "c", "d"]),
                &edges(&[("a", "b"), ("b", "c"), ("a", "d")]),
                Orientation::LeftToRight,
            )
            .unwrap();

        assert_eq!(centers["a"].x, 100.0);
        assert_eq!(centers["b"].x, 350.0);
        assert_eq!(centers["d"].x, 350.0);
        assert_eq!(centers["c"].x, 600.0);
        // b and d share a rank and are stacked
        assert!(centers["b"].y < centers["d"].y);
    }

    #[test]
    fn test_longest_path_wins() {
        let service = LongestPathLayering::default();
        let centers = service
            .layout(
                &boxes(&["a", "b", "c"]),
                &edges(&[("a", "b"), ("b", "c"), ("a", "c")]),
                Orientation::LeftToRight,
            )
            .unwrap();

        assert!(centers["c"].x > centers["b"].x);
    }

    #[test]
    fn test_cycles_and_self_loops_tolerated() {
        let service = LongestPathLayering::default();
        let centers = service
            .layout(
                &boxes(&["a", "b", "c"]),
                &edges(&[("a", "b"), ("b", "c"), ("c", "a"), ("c", "c")]),
                Orientation::LeftToRight,
            )
            .unwrap();

        assert_eq!(centers.len(), 3);
        assert!(centers["a"].x < centers["b"].x);
        assert!(centers["b"].x < centers["c"].x);
    }

    #[test]
    fn test_top_to_bottom() {
        let service = LongestPathLayering::default();
        let centers = service
            .layout(&boxes(&["a", "b"]), &edges(&[("a", "b")]), Orientation::TopToBottom)
            .unwrap();

        assert_eq!(centers["a"].x, centers["b"].x);
        assert!(centers["a"].y < centers["b"].y);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let service = LongestPathLayering::default();
        let result = service.layout(&boxes(&["a", "a"]), &[], Orientation::LeftToRight);
        assert!(matches!(result, Err(LayoutError::Service(_))));
    }
}
