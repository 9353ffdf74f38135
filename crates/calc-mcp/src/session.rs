use calc_core::Graph;

/// Per-process state shared by every tool call of one server run.
#[derive(Debug, Clone)]
pub struct Session {
    pub graph: Graph,
    /// Digits after the decimal point for probabilities and matrices.
    pub precision: usize,
}

impl Session {
    pub fn new(graph: Graph, precision: usize) -> Self {
        Self { graph, precision }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Graph::sample(), 4)
    }
}
