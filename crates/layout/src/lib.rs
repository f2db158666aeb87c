//! Layout engines for skein snapshots
//!
//! This crate computes 2D coordinates for the vertices of a [`skein_data`]
//! snapshot so a renderer can draw it legibly. Two engines are provided:
//!
//! - [`GraphLayouter`]: iterative force-directed layout for free-form
//!   graphs, driven by a periodic worker thread with a hard deadline guard
//!   and single-flight pass replacement.
//! - [`TreeLayout`]: deterministic two-pass Reingold-Tilford layout for
//!   trees, synchronous and thread-free.
//!
//! # Example
//!
//! ```
//! use skein_data::{Tree, Vertex, VertexId};
//! use skein_layout::TreeLayout;
//!
//! let mut tree = Tree::new(1);
//! tree.insert_vertex(Vertex::new(VertexId(1), "root")).unwrap();
//! tree.insert_vertex(Vertex::new(VertexId(2), "left")).unwrap();
//! tree.insert_vertex(Vertex::new(VertexId(3), "right")).unwrap();
//! tree.attach(VertexId(1), VertexId(2));
//! tree.attach(VertexId(1), VertexId(3));
//!
//! TreeLayout::default().layout(&mut tree).unwrap();
//!
//! let left = tree.vertex(VertexId(2)).unwrap();
//! let right = tree.vertex(VertexId(3)).unwrap();
//! assert!(left.x < right.x);
//! assert!(left.stable && right.stable);
//! ```

mod config;
mod error;
mod geometry;
mod monitor;

pub mod force;
pub mod tree;

pub use config::{ForceConfig, TreeConfig};
pub use error::LayoutError;
pub use force::{GraphLayouter, Placement, SharedGraph};
pub use geometry::Vec2;
pub use monitor::{LayoutMonitor, MonitorGuard};
pub use tree::TreeLayout;
