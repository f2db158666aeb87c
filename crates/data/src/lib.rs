//! Snapshot data model shared between the ingestion shell, the layout
//! engine and the renderer.
//!
//! A [`Graph`] or [`Tree`] is one immutable-in-structure snapshot of the
//! session: the set of vertices and their connections never changes once
//! the snapshot is built, only the vertex coordinates and stability flags
//! are mutated by the layout engine.

mod model;

pub use model::*;
