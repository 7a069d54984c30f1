//! Program dependence graph, bounded symbolic execution, and taint
//! analysis over a single function's UIR (C6).

pub mod cfg;
pub mod dominators;
pub mod error;
pub mod pdg;
pub mod slice;
pub mod solver;
pub mod symbolic;
pub mod taint;

pub use error::PdgError;
pub use pdg::{Pdg, PdgEdge, PdgEdgeKind};
pub use slice::{backward_slice, forward_slice};
pub use solver::{CachingSolver, IntervalSolver, SatResult, Solver};
pub use symbolic::{symbolic_execute, SymbolicFinding, SymbolicResult, ValueSummary};
pub use taint::{FunctionSummary, TaintConfig, TaintEngine, TaintFinding};
