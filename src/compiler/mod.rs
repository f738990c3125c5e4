use crate::config::Config;
use crate::dataflow::{self, DataFlow, DataFlowOptimizer};
use crate::error::CompileError;
use crate::model::ModelTree;
use crate::scale::ScaleComponent;
use crate::selection::{SelectionContext, assemble_unit_data};
use crate::spec::ChartSpec;
use crate::vega::{VgData, VgSignal};
use serde_json::{Value, json};
use tracing::debug;

mod assemble;
mod builder;
pub mod parsing;

use builder::DataFlowBuilder;
use parsing::parse_spec;

/// Everything a compilation produces, in output order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationArtifacts {
    pub data: Vec<VgData>,
    pub scales: Vec<ScaleComponent>,
    pub signals: Vec<VgSignal>,
    pub marks: Vec<Value>,
}

impl CompilationArtifacts {
    /// The assembled output document. Empty sections are left out.
    pub fn to_json(&self) -> Value {
        let mut doc = json!({});
        if !self.data.is_empty() {
            doc["data"] = json!(self.data);
        }
        if !self.scales.is_empty() {
            doc["scales"] = json!(self.scales);
        }
        if !self.signals.is_empty() {
            doc["signals"] = json!(self.signals);
        }
        if !self.marks.is_empty() {
            doc["marks"] = Value::Array(self.marks.clone());
        }
        doc
    }
}

pub struct Compiler {
    spec: ChartSpec,
    config: Config,
}

pub struct CompilerBuilder {
    spec: ChartSpec,
    config: Config,
}

impl CompilerBuilder {
    pub fn new(spec: ChartSpec) -> Self {
        Self {
            spec,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            spec: self.spec,
            config: self.config,
        }
    }
}

impl Compiler {
    pub fn builder(spec: ChartSpec) -> CompilerBuilder {
        CompilerBuilder::new(spec)
    }

    /// Reads a chart document, taking its configuration from the `config` key.
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        let parse_error = |e: serde_json::Error| CompileError::JsonParseError(e.to_string());
        let mut document: Value = serde_json::from_str(json).map_err(parse_error)?;
        let config = match document.as_object_mut().and_then(|doc| doc.remove("config")) {
            Some(config) => serde_json::from_value(config).map_err(parse_error)?,
            None => Config::default(),
        };
        let spec: ChartSpec = serde_json::from_value(document).map_err(parse_error)?;
        Ok(Self::builder(spec).with_config(config).build())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The normalized view tree, with scales and selections parsed.
    pub fn model_tree(&self) -> Result<ModelTree, CompileError> {
        parse_spec(&self.spec, &self.config)
    }

    /// The validated data-flow graph, before optimization.
    pub fn data_flow(&self, tree: &ModelTree) -> Result<DataFlow, CompileError> {
        let flow = DataFlowBuilder::new(tree, &self.config).build()?;
        flow.validate()?;
        Ok(flow)
    }

    pub fn compile(&self) -> Result<CompilationArtifacts, CompileError> {
        // 1. Normalize the chart into a view tree
        let tree = self.model_tree()?;

        // 2. Build, check and optimize the data flow
        let mut flow = self.data_flow(&tree)?;
        let mut optimizer = DataFlowOptimizer::new();
        optimizer.optimize(&mut flow);

        // 3. Datasets, then selection stores
        let mut data = dataflow::assemble(&flow);
        for id in tree.units_under(ModelTree::ROOT) {
            if let Some(ctx) = SelectionContext::new(&tree, id) {
                data.extend(assemble_unit_data(&ctx));
            }
        }

        // 4. Scales shared through layers appear once
        let mut scales: Vec<ScaleComponent> = Vec::new();
        for id in tree.units_under(ModelTree::ROOT) {
            let Some(unit) = tree.unit(id) else {
                continue;
            };
            for scale in unit.scales.values() {
                match scales.iter_mut().find(|s| s.name == scale.name) {
                    // A layer binding the shared scale may not be the first to declare it.
                    Some(shared) => {
                        if shared.domain_raw.is_none() {
                            shared.domain_raw = scale.domain_raw.clone();
                        }
                    }
                    None => scales.push(scale.clone()),
                }
            }
        }

        // 5. Signals and marks
        let signals = assemble::top_level_signals(&tree, &self.config)?;
        let marks = assemble::view_marks(&tree, ModelTree::ROOT)?;

        debug!(
            datasets = data.len(),
            scales = scales.len(),
            signals = signals.len(),
            marks = marks.len(),
            "compiled chart"
        );
        Ok(CompilationArtifacts {
            data,
            scales,
            signals,
            marks,
        })
    }
}
