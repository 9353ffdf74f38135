//! Reading and writing graph files. `.json` files are JSON, anything else TOML.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use calc_core::Graph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GraphFormat {
    Toml,
    Json,
}

impl GraphFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Load the graph at `path`, or the demo graph when no path is given.
pub fn load_graph(path: Option<&Path>) -> Result<Graph> {
    let Some(path) = path else {
        return Ok(Graph::sample());
    };
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let graph = match GraphFormat::for_path(path) {
        GraphFormat::Json => Graph::from_json_str(&content),
        GraphFormat::Toml => Graph::from_toml_str(&content),
    }
    .with_context(|| format!("loading graph {}", path.display()))?;
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "loaded graph from {}",
        path.display()
    );
    Ok(graph)
}

pub fn render_graph(graph: &Graph, format: GraphFormat) -> Result<String> {
    let text = match format {
        GraphFormat::Json => graph.to_json_string()?,
        GraphFormat::Toml => graph.to_toml_string()?,
    };
    Ok(text)
}
