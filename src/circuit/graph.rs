//! Connection graph structure.

use std::collections::HashMap;

use super::types::ComponentId;

/// Undirected adjacency between components.
///
/// Each node keeps its neighbours in insertion order, which fixes the child
/// order of every depth-first search over the graph. An edge is always stored
/// in both directions, and this is the only place connectivity is recorded.
#[derive(Debug, Clone, Default)]
pub struct ConnectionGraph {
    adjacency: HashMap<ComponentId, Vec<ComponentId>>,
    /// Edges in the order they were added, each as `(from, to)`
    edges: Vec<(ComponentId, ComponentId)>,
}

impl ConnectionGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect `a` and `b`.
    ///
    /// Returns `false` for self-loops and for edges that already exist.
    pub fn connect(&mut self, a: &ComponentId, b: &ComponentId) -> bool {
        if a == b || self.are_connected(a, b) {
            return false;
        }
        self.adjacency.entry(a.clone()).or_default().push(b.clone());
        self.adjacency.entry(b.clone()).or_default().push(a.clone());
        self.edges.push((a.clone(), b.clone()));
        true
    }

    /// Disconnect `a` and `b`. Returns `false` if they were not connected.
    pub fn disconnect(&mut self, a: &ComponentId, b: &ComponentId) -> bool {
        if !self.are_connected(a, b) {
            return false;
        }
        Self::unlink(&mut self.adjacency, a, b);
        Self::unlink(&mut self.adjacency, b, a);
        self.edges
            .retain(|(from, to)| !((from == a && to == b) || (from == b && to == a)));
        true
    }

    /// Remove every edge touching `id`. Returns the number of edges removed.
    pub fn isolate(&mut self, id: &ComponentId) -> usize {
        let Some(neighbors) = self.adjacency.remove(id) else {
            return 0;
        };
        for neighbor in &neighbors {
            Self::unlink(&mut self.adjacency, neighbor, id);
        }
        self.edges.retain(|(from, to)| from != id && to != id);
        neighbors.len()
    }

    /// Whether an edge between `a` and `b` exists.
    pub fn are_connected(&self, a: &ComponentId, b: &ComponentId) -> bool {
        self.adjacency
            .get(a)
            .map(|neighbors| neighbors.contains(b))
            .unwrap_or(false)
    }

    /// Neighbours of `id` in insertion order.
    pub fn neighbors(&self, id: &ComponentId) -> &[ComponentId] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[(ComponentId, ComponentId)] {
        &self.edges
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Ids that appear in at least one edge.
    pub fn connected_ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.adjacency
            .iter()
            .filter(|(_, neighbors)| !neighbors.is_empty())
            .map(|(id, _)| id)
    }

    fn unlink(
        adjacency: &mut HashMap<ComponentId, Vec<ComponentId>>,
        from: &ComponentId,
        to: &ComponentId,
    ) {
        if let Some(neighbors) = adjacency.get_mut(from) {
            neighbors.retain(|n| n != to);
            if neighbors.is_empty() {
                adjacency.remove(from);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ComponentId {
        ComponentId::from(s)
    }

    #[test]
    fn test_connect_is_symmetric() {
        let mut graph = ConnectionGraph::new();
        assert!(graph.connect(&id("A"), &id("B")));
        assert_eq!(graph.neighbors(&id("A")), &[id("B")]);
        assert_eq!(graph.neighbors(&id("B")), &[id("A")]);
        assert!(graph.are_connected(&id("B"), &id("A")));
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut graph = ConnectionGraph::new();
        assert!(graph.connect(&id("A"), &id("B")));
        assert!(!graph.connect(&id("A"), &id("B")));
        assert!(!graph.connect(&id("B"), &id("A")));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.neighbors(&id("A")).len(), 1);
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut graph = ConnectionGraph::new();
        assert!(!graph.connect(&id("A"), &id("A")));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_disconnect_removes_both_directions() {
        let mut graph = ConnectionGraph::new();
        graph.connect(&id("A"), &id("B"));
        graph.connect(&id("A"), &id("C"));
        assert!(graph.disconnect(&id("B"), &id("A")));
        assert!(!graph.are_connected(&id("A"), &id("B")));
        assert!(graph.neighbors(&id("B")).is_empty());
        assert_eq!(graph.neighbors(&id("A")), &[id("C")]);
        assert!(!graph.disconnect(&id("A"), &id("B")));
    }

    #[test]
    fn test_isolate_twice_is_noop() {
        let mut graph = ConnectionGraph::new();
        graph.connect(&id("A"), &id("B"));
        graph.connect(&id("C"), &id("B"));
        graph.connect(&id("A"), &id("C"));
        assert_eq!(graph.isolate(&id("B")), 2);
        assert_eq!(graph.isolate(&id("B")), 0);
        assert_eq!(graph.edges(), &[(id("A"), id("C"))]);
        assert_eq!(graph.neighbors(&id("A")), &[id("C")]);
    }

    #[test]
    fn test_neighbor_order_is_insertion_order() {
        let mut graph = ConnectionGraph::new();
        graph.connect(&id("S"), &id("Z"));
        graph.connect(&id("S"), &id("A"));
        graph.connect(&id("M"), &id("S"));
        assert_eq!(graph.neighbors(&id("S")), &[id("Z"), id("A"), id("M")]);
    }
}
