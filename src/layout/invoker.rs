use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::config::Config;
use crate::ir::GraphDescription;
use crate::viewport::{Viewport, fit_view};

use super::builder::{BuiltGraph, build_layout_graph};
use super::error::{LayoutError, Result};
use super::normalize::normalize_edges;
use super::reconstruct::reconstruct_nodes;
use super::solver::LayoutSolver;
use super::types::{Bounds, LayoutResult, RenderModel};

/// A layout run that has been started but not yet awaited. Owns everything it
/// needs, so callers may drive it on any executor and drop it freely.
pub struct LayoutRequest<S> {
    solver: Arc<S>,
    built: BuiltGraph,
    config: Config,
    generation: u64,
}

impl<S: LayoutSolver> LayoutRequest<S> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn built(&self) -> &BuiltGraph {
        &self.built
    }

    /// Runs the solver. A panicking solver is reported as a failure instead
    /// of unwinding into the caller.
    pub async fn run(self) -> LayoutResponse {
        let LayoutRequest {
            solver,
            built,
            config,
            generation,
        } = self;
        let outcome = AssertUnwindSafe(solver.solve(&built.graph, &config.layout))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(LayoutError::SolverPanicked(panic_message(&*panic))))
            .and_then(|result| {
                if result.children.is_empty() && !built.graph.is_empty() {
                    Err(LayoutError::EmptyResult)
                } else {
                    Ok(result)
                }
            });
        LayoutResponse {
            generation,
            built,
            outcome,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = panic.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic".to_string()
}

/// Solver outcome tagged with the generation of the request that produced it.
pub struct LayoutResponse {
    generation: u64,
    built: BuiltGraph,
    outcome: Result<LayoutResult>,
}

impl LayoutResponse {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn outcome(&self) -> &Result<LayoutResult> {
        &self.outcome
    }
}

/// What `request` decided for a new description.
pub enum Requested<S> {
    /// Layout is needed; run the request and hand the response to `apply`.
    Layout(LayoutRequest<S>),
    /// No nodes: the current model was replaced by the empty state.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Applied,
    /// A newer request was issued after this one; the response was dropped.
    Stale,
    /// The solver failed; the previous model is kept.
    Failed(LayoutError),
    /// The description had no nodes; the model was cleared without layout.
    Empty,
}

/// Owns the current render model and decides which solver responses may
/// replace it. Only the most recently requested layout is ever applied.
pub struct LayoutInvoker<S> {
    solver: Arc<S>,
    config: Config,
    generation: u64,
    model: RenderModel,
    show_labels: bool,
}

impl<S: LayoutSolver> LayoutInvoker<S> {
    pub fn new(solver: S, config: Config) -> Self {
        Self {
            solver: Arc::new(solver),
            config,
            generation: 0,
            model: RenderModel::empty(),
            show_labels: true,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn model(&self) -> &RenderModel {
        &self.model
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn show_labels(&self) -> bool {
        self.show_labels
    }

    /// Starts a layout for `desc`. Every call supersedes all earlier requests,
    /// including ones whose responses have not arrived yet.
    pub fn request(&mut self, desc: Option<&GraphDescription>) -> Requested<S> {
        self.generation += 1;
        let built = desc.and_then(|desc| build_layout_graph(desc, &self.config.layout));
        match built {
            Some(built) => {
                debug!(
                    generation = self.generation,
                    entities = built.graph.walk().len(),
                    edges = built.graph.edges.len(),
                    "layout requested"
                );
                Requested::Layout(LayoutRequest {
                    solver: Arc::clone(&self.solver),
                    built,
                    config: self.config.clone(),
                    generation: self.generation,
                })
            }
            None => {
                debug!(generation = self.generation, "no nodes; clearing diagram");
                self.model = RenderModel::empty();
                Requested::Empty
            }
        }
    }

    pub fn apply(&mut self, response: LayoutResponse) -> Applied {
        if response.generation != self.generation {
            debug!(
                response = response.generation,
                current = self.generation,
                "dropping stale layout"
            );
            return Applied::Stale;
        }
        match response.outcome {
            Ok(result) => {
                self.model = build_render_model(&result, &response.built, &self.config, self.show_labels);
                Applied::Applied
            }
            Err(err) => {
                warn!(error = %err, generation = response.generation, "layout failed; keeping previous diagram");
                Applied::Failed(err)
            }
        }
    }

    /// Requests, runs and applies a layout in one go.
    pub async fn update(&mut self, desc: Option<&GraphDescription>) -> Applied {
        match self.request(desc) {
            Requested::Layout(request) => {
                let response = request.run().await;
                self.apply(response)
            }
            Requested::Empty => Applied::Empty,
        }
    }

    /// Toggles label visibility on every current edge and on later layouts.
    pub fn set_show_labels(&mut self, show: bool) {
        self.show_labels = show;
        for edge in &mut self.model.edges {
            edge.show_label = show;
        }
    }

    /// Viewport fitting the newly applied diagram, returned once per layout.
    pub fn take_fit(&mut self, canvas_width: f32, canvas_height: f32) -> Option<Viewport> {
        if !self.model.fit_pending {
            return None;
        }
        let bounds = self.model.bounds?;
        self.model.fit_pending = false;
        Some(fit_view(&bounds, canvas_width, canvas_height, &self.config.view))
    }
}

/// Turns a solver result into the render model: nodes, world-space edges and
/// the overall world bounds.
pub fn build_render_model(
    result: &LayoutResult,
    built: &BuiltGraph,
    config: &Config,
    show_labels: bool,
) -> RenderModel {
    let nodes = reconstruct_nodes(result, &built.index, config);
    let edges = normalize_edges(result, built, &config.theme, show_labels);

    let mut model = RenderModel {
        nodes,
        edges,
        bounds: None,
        fit_pending: false,
    };
    let mut bounds: Option<Bounds> = None;
    for node in &model.nodes {
        if let Some(node_bounds) = model.absolute_bounds(&node.id) {
            bounds = Some(match bounds {
                Some(acc) => acc.union(node_bounds),
                None => node_bounds,
            });
        }
    }
    for edge in &model.edges {
        if let Some(edge_bounds) = Bounds::from_points(edge.route_points()) {
            bounds = Some(match bounds {
                Some(acc) => acc.union(edge_bounds),
                None => edge_bounds,
            });
        }
    }
    model.bounds = bounds;
    model.fit_pending = bounds.is_some();
    model
}
