//! # Sakuzu - Chart Specification Compiler
//!
//! **Sakuzu** compiles declarative chart specifications (views with data,
//! transforms, encodings and interactive selections) into a reactive
//! visualization grammar: named datasets with transform pipelines, scales,
//! signals and marks. Compilation is a pure function of the chart specification and a
//! read-only [`Config`](config::Config).
//!
//! ## Core Workflow
//!
//! 1.  **Parse**: The input JSON deserializes into a [`ChartSpec`](spec::ChartSpec), a unit, layer or concat view.
//! 2.  **Normalize**: [`compiler::parsing`] turns the chart specification into a [`ModelTree`](model::ModelTree). Field definitions get explicit types, bins get parameters, every scale channel gets an initialized scale and every selection is parsed against its config defaults.
//! 3.  **Build the data flow**: Each view contributes a chain of transform nodes (source, formulas, filters, bins, time units, aggregates, output) to a [`DataFlow`](dataflow::DataFlow) graph.
//! 4.  **Optimize**: The [`DataFlowOptimizer`](dataflow::DataFlowOptimizer) merges, hoists and prunes nodes until the graph stops changing.
//! 5.  **Assemble**: The graph is cut into datasets, selections contribute stores, signals and marks, and everything is returned as [`CompilationArtifacts`](compiler::CompilationArtifacts).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sakuzu::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let spec = r#"{
//!         "data": {"values": [{"a": 1, "b": 2}, {"a": 3, "b": 4}]},
//!         "mark": "point",
//!         "selection": {"brush": {"type": "interval"}},
//!         "encoding": {
//!             "x": {"field": "a", "type": "quantitative"},
//!             "y": {"field": "b", "type": "quantitative"}
//!         },
//!         "config": {"view": {"width": 400}}
//!     }"#;
//!
//!     let compiler = Compiler::from_json(spec)?;
//!     let artifacts = compiler.compile()?;
//!
//!     println!("{}", serde_json::to_string_pretty(&artifacts.to_json())?);
//!     Ok(())
//! }
//! ```
//!
//! Specs built in code go through the builder instead:
//!
//! ```rust,no_run
//! # use sakuzu::prelude::*;
//! # fn run(spec: ChartSpec) -> Result<()> {
//! let config = Config::default();
//! let artifacts = Compiler::builder(spec).with_config(config).build().compile()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Soft incompatibilities (a scale property the scale type does not support,
//! a projection over an unencoded channel, ...) are dropped with a
//! `tracing` warning rather than failing the compilation. Optimizer decisions
//! are logged at debug level. The crate installs no subscriber.

pub mod channel;
pub mod compiler;
pub mod config;
pub mod dataflow;
pub mod error;
pub mod field;
pub mod model;
pub mod prelude;
pub mod scale;
pub mod selection;
pub mod spec;
pub mod timeunit;
pub mod util;
pub mod vega;
