use thiserror::Error;

use crate::topology::EntityId;

/// Top-level error type for the georep model kernel.
#[derive(Debug, Error)]
pub enum GeoRepError {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors raised by the mesh kernel.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("vertex {index} is out of range (mesh has {count} vertices)")]
    VertexOutOfRange { index: usize, count: usize },

    #[error("edge {index} is out of range (mesh has {count} edges)")]
    EdgeOutOfRange { index: usize, count: usize },

    #[error("facet {index} is out of range (mesh has {count} facets)")]
    FacetOutOfRange { index: usize, count: usize },

    #[error("invalid facet: {0}")]
    InvalidFacet(String),
}

/// Errors related to the entity graph of a model.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {id}")]
    EntityNotFound { id: EntityId },

    #[error("invalid entity type: {0}")]
    InvalidEntityType(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// A bug in the editor itself, never the consequence of bad input.
    #[error("internal consistency failure: {0}")]
    Inconsistent(String),
}

/// Errors related to editing operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),

    #[error("ambiguous traversal: {0}")]
    AmbiguousTraversal(String),
}

/// Convenience type alias for results using [`GeoRepError`].
pub type Result<T> = std::result::Result<T, GeoRepError>;
