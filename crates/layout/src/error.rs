use skein_data::VertexId;
use thiserror::Error;

/// Errors that can occur while building or running a layout pass
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// An edge of the snapshot references a vertex that is not part of it
    #[error("edge references vertex {0:?} which is not part of the snapshot")]
    DanglingEdge(VertexId),

    /// The tree snapshot has no vertex without a parent link
    #[error("tree has no root vertex")]
    NoRoot,

    /// The child links of the tree loop back through the given vertex
    #[error("tree links contain a cycle through vertex {0:?}")]
    CyclicLink(VertexId),

    /// A scheduler was started while it was already running
    #[error("scheduler is already running")]
    AlreadyRunning,
}
