#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod popup;
pub mod theme;
pub mod viewport;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use ir::{GraphDescription, GroupSpec, LinkSpec, NodeSpec};
pub use layout::{Applied, DagreSolver, LayoutError, LayoutInvoker, LayoutSolver, RenderModel};
pub use viewport::{Viewport, fit_view};
