use derive_more::From;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Identifier of a vertex, unique within one snapshot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, From,
)]
pub struct VertexId(pub u64);

/// Display label attached to a vertex or edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, From)]
pub struct Label(pub String);

/// Rendering hint carried through the layout engine untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Style {
    #[default]
    Plain,
    Emphasis,
    Muted,
}

/// One vertex of a snapshot.
///
/// The layout engine mutates `x`/`y`/`stable` in place. A `pinned` vertex
/// keeps whatever coordinates the user gave it: it takes part in no
/// simulation and is never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub label: Label,
    pub style: Style,
    pub x: f64,
    pub y: f64,
    /// Set once the layout engine has settled this vertex.
    pub stable: bool,
    /// User-positioned: coordinates are authoritative.
    pub pinned: bool,
}

impl Vertex {
    pub fn new(id: VertexId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: Label(label.into()),
            style: Style::default(),
            x: 0.0,
            y: 0.0,
            stable: false,
            pinned: false,
        }
    }

    /// Pin the vertex at the given coordinates.
    pub fn pinned_at(id: VertexId, label: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            pinned: true,
            ..Self::new(id, label)
        }
    }
}

/// Connection between two vertices of the same graph. Non-owning: only the
/// endpoint ids are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: VertexId,
    pub to: VertexId,
    pub directed: bool,
    pub label: Option<Label>,
    pub style: Style,
}

impl Edge {
    pub fn new(from: VertexId, to: VertexId) -> Self {
        Self {
            from,
            to,
            directed: false,
            label: None,
            style: Style::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("edge references vertex {0:?} which is not part of the snapshot")]
    DanglingEdge(VertexId),
    #[error("vertex {0:?} already exists in the snapshot")]
    DuplicateVertex(VertexId),
}

/// One graph snapshot: an unordered set of vertices plus the edges that
/// connect them.
///
/// Invariant: every edge's endpoints are members of the vertex table;
/// [`Graph::insert_edge`] enforces it at construction time.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertices: BTreeMap<VertexId, Vertex>,
    edges: Vec<Edge>,
    seq: u64,
    description: String,
}

impl Graph {
    pub fn new(seq: u64, description: impl Into<String>) -> Self {
        Self {
            vertices: BTreeMap::new(),
            edges: Vec::new(),
            seq,
            description: description.into(),
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn insert_vertex(&mut self, vertex: Vertex) -> Result<(), ModelError> {
        if self.vertices.contains_key(&vertex.id) {
            return Err(ModelError::DuplicateVertex(vertex.id));
        }
        debug!("Adding vertex {:?} to graph {}", vertex.id, self.seq);
        self.vertices.insert(vertex.id, vertex);
        Ok(())
    }

    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), ModelError> {
        for endpoint in [edge.from, edge.to] {
            if !self.vertices.contains_key(&endpoint) {
                return Err(ModelError::DanglingEdge(endpoint));
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertices.get_mut(&id)
    }

    /// Vertices in ascending id order, so every traversal of the same
    /// snapshot is deterministic.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    pub fn vertices_mut(&mut self) -> impl Iterator<Item = &mut Vertex> {
        self.vertices.values_mut()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Re-check the edge-endpoint invariant, for snapshots assembled by an
    /// external collaborator rather than through [`Graph::insert_edge`].
    pub fn validate(&self) -> Result<(), ModelError> {
        for edge in &self.edges {
            for endpoint in [edge.from, edge.to] {
                if !self.vertices.contains_key(&endpoint) {
                    return Err(ModelError::DanglingEdge(endpoint));
                }
            }
        }
        Ok(())
    }
}

/// One tree snapshot: a vertex table plus parent→child links.
///
/// Links are kept in a `DiGraphMap` so that sibling order is the insertion
/// order of `attach` calls and root discovery is deterministic. A link may
/// name a child id that has no matching vertex; the layout engine
/// substitutes a sentinel leaf for it instead of failing.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    vertices: BTreeMap<VertexId, Vertex>,
    links: DiGraphMap<VertexId, ()>,
    seq: u64,
}

impl Tree {
    pub fn new(seq: u64) -> Self {
        Self {
            vertices: BTreeMap::new(),
            links: DiGraphMap::new(),
            seq,
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn insert_vertex(&mut self, vertex: Vertex) -> Result<(), ModelError> {
        if self.vertices.contains_key(&vertex.id) {
            return Err(ModelError::DuplicateVertex(vertex.id));
        }
        debug!("Adding vertex {:?} to tree {}", vertex.id, self.seq);
        self.links.add_node(vertex.id);
        self.vertices.insert(vertex.id, vertex);
        Ok(())
    }

    /// Declare `child` as the next child of `parent`. The child vertex does
    /// not have to exist (yet); see the sentinel rule above.
    pub fn attach(&mut self, parent: VertexId, child: VertexId) {
        self.links.add_edge(parent, child, ());
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertices.get_mut(&id)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    pub fn vertices_mut(&mut self) -> impl Iterator<Item = &mut Vertex> {
        self.vertices.values_mut()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Declared children of `id` in attachment order, including ids with no
    /// matching vertex.
    pub fn children(&self, id: VertexId) -> Vec<VertexId> {
        self.links
            .neighbors_directed(id, Direction::Outgoing)
            .collect()
    }

    pub fn parent(&self, id: VertexId) -> Option<VertexId> {
        self.links
            .neighbors_directed(id, Direction::Incoming)
            .next()
    }

    /// Vertices that exist and have no parent link, in insertion order.
    pub fn roots(&self) -> Vec<VertexId> {
        self.links
            .nodes()
            .filter(|id| {
                self.vertices.contains_key(id)
                    && self
                        .links
                        .neighbors_directed(*id, Direction::Incoming)
                        .next()
                        .is_none()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn edge_endpoints_must_exist() {
        let mut graph = Graph::new(1, "test");
        graph.insert_vertex(Vertex::new(VertexId(1), "a")).unwrap();

        let err = graph
            .insert_edge(Edge::new(VertexId(1), VertexId(2)))
            .unwrap_err();
        assert_eq!(err, ModelError::DanglingEdge(VertexId(2)));

        graph.insert_vertex(Vertex::new(VertexId(2), "b")).unwrap();
        graph
            .insert_edge(Edge::new(VertexId(1), VertexId(2)))
            .unwrap();
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn duplicate_vertices_are_rejected() {
        let mut graph = Graph::new(1, "test");
        graph.insert_vertex(Vertex::new(VertexId(1), "a")).unwrap();
        let err = graph
            .insert_vertex(Vertex::new(VertexId(1), "again"))
            .unwrap_err();
        assert_eq!(err, ModelError::DuplicateVertex(VertexId(1)));
    }

    #[test]
    fn sibling_order_is_attachment_order() {
        let mut tree = Tree::new(1);
        for id in [1, 2, 3, 4] {
            tree.insert_vertex(Vertex::new(VertexId(id), "v")).unwrap();
        }
        tree.attach(VertexId(1), VertexId(3));
        tree.attach(VertexId(1), VertexId(2));
        tree.attach(VertexId(1), VertexId(4));

        assert_eq!(
            tree.children(VertexId(1)),
            vec![VertexId(3), VertexId(2), VertexId(4)]
        );
        assert_eq!(tree.parent(VertexId(2)), Some(VertexId(1)));
        assert_eq!(tree.parent(VertexId(1)), None);
    }

    #[test]
    fn roots_skip_declared_but_missing_children() {
        let mut tree = Tree::new(1);
        tree.insert_vertex(Vertex::new(VertexId(1), "root")).unwrap();
        tree.insert_vertex(Vertex::new(VertexId(5), "stray")).unwrap();
        // Child 9 is declared but never inserted as a vertex.
        tree.attach(VertexId(1), VertexId(9));

        assert_eq!(tree.roots(), vec![VertexId(1), VertexId(5)]);
        assert_eq!(tree.children(VertexId(1)), vec![VertexId(9)]);
    }
}
