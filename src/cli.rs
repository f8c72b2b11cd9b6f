use crate::config::load_config;
use crate::ir::GraphDescription;
use crate::layout::{Applied, DagreSolver, LayoutInvoker};
use crate::layout_dump::write_layout_dump;
use anyhow::Result;
use clap::Parser;
use futures::executor::block_on;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "groupflow",
    version,
    about = "Lay out a grouped node-link description and dump the render model"
)]
pub struct Args {
    /// Input description (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the render-model dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Canvas width used for the fitted viewport
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Canvas height used for the fitted viewport
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Hide edge labels in the dump
    #[arg(long = "hide-labels")]
    pub hide_labels: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.view.canvas_width = width;
    }
    if let Some(height) = args.height {
        config.view.canvas_height = height;
    }
    let (canvas_width, canvas_height) = (config.view.canvas_width, config.view.canvas_height);

    let input = read_input(args.input.as_deref())?;
    let desc = GraphDescription::from_json(&input)
        .map_err(|err| anyhow::anyhow!("invalid graph description: {err}"))?;

    let mut invoker = LayoutInvoker::new(DagreSolver, config);
    invoker.set_show_labels(!args.hide_labels);
    match block_on(invoker.update(Some(&desc))) {
        Applied::Failed(err) => return Err(err.into()),
        Applied::Applied | Applied::Empty | Applied::Stale => {}
    }

    let viewport = invoker.take_fit(canvas_width, canvas_height);
    write_layout_dump(args.output.as_deref(), invoker.model(), viewport)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
