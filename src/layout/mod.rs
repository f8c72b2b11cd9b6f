//! Layout pipeline: flat description → solver input → solver → render model.

mod builder;
mod error;
mod invoker;
mod normalize;
mod reconstruct;
pub(crate) mod routing;
mod solver;
pub(crate) mod types;

pub use builder::{BuiltGraph, GraphIndex, ROOT_ID, build_layout_graph, filter_links};
pub use error::{LayoutError, Result};
pub use invoker::{
    Applied, LayoutInvoker, LayoutRequest, LayoutResponse, Requested, build_render_model,
};
pub use normalize::normalize_edges;
pub use reconstruct::reconstruct_nodes;
pub use solver::{DagreSolver, LayoutSolver};
pub use types::*;
