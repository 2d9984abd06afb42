//! Grammar-guided genetic programming over node-scoring programs.

pub mod checkpoint;
pub mod context;
pub mod grammar;
pub mod model;
pub mod population;
pub mod pretty;
pub mod program;
pub mod searcher;
pub mod seeds;
pub mod solution;
pub mod symbol;
pub mod tree;

pub use self::checkpoint::{Checkpoint, CheckpointStore};
pub use self::context::EvaluationContext;
pub use self::model::Model;
pub use self::population::{Admission, Population, MIN_CAPACITY};
pub use self::pretty::PrettyString;
pub use self::searcher::{CheckpointCallback, SearchConfiguration, Searcher};
pub use self::solution::Solution;
pub use self::symbol::Symbol;
pub use self::tree::{DerivationChild, DerivationNode};
