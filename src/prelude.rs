//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types from the sakuzu crate.
//! Import this module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use sakuzu::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let spec_json = std::fs::read_to_string("path/to/chart.json")?;
//! let artifacts = Compiler::from_json(&spec_json)?.compile()?;
//!
//! for dataset in &artifacts.data {
//!     println!("{} ({} transforms)", dataset.name, dataset.transform.len());
//! }
//! # Ok(())
//! # }
//! ```

// Compilation
pub use crate::compiler::{CompilationArtifacts, Compiler, CompilerBuilder};
pub use crate::config::Config;

// Input specification
pub use crate::channel::Channel;
pub use crate::field::{AggregateOp, FieldDef, FieldType};
pub use crate::spec::{ChartSpec, Mark};
pub use crate::timeunit::TimeUnit;

// Intermediate representations
pub use crate::dataflow::{DataFlow, DataFlowOptimizer, TransformNode};
pub use crate::model::{ModelTree, UnitModel};

// Output types
pub use crate::vega::{VgData, VgSignal, VgTransform};

// Error types
pub use crate::error::{CompileError, TimeUnitError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
