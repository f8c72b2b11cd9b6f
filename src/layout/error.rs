use thiserror::Error;

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Failures a solver run can report. Referential problems in the input are
/// repaired by the builder and never reach this type unless a graph is
/// handed to a solver without going through it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("edge '{edge}' references unknown entity '{id}'")]
    UnknownEndpoint { edge: String, id: String },

    #[error("duplicate entity id '{0}' in layout graph")]
    DuplicateId(String),

    #[error("layout solver failed: {0}")]
    Solver(String),

    #[error("layout solver panicked: {0}")]
    SolverPanicked(String),

    #[error("layout solver returned no entities")]
    EmptyResult,

    #[error("layout solver returned no position for '{0}'")]
    MissingPosition(String),
}
