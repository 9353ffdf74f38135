pub mod arithmetic;
pub mod combinatorics;
pub mod equations;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod probability;

pub use equations::{QuadraticRoots, QuadraticSolution};
pub use error::{CalcError, CalcResult};
pub use graph::{Edge, Graph, GraphFile, Neighbor, ShortestPath, Step, StepAction};
pub use matrix::Matrix;
pub use probability::Tail;
