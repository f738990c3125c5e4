use crate::config::{Config, SELECTION_ID};
use crate::dataflow::{
    AggregateNode, BinNode, DataFlow, FieldSet, FilterNode, FormulaNode, NodeId, OutputNode,
    SourceNode, TimeUnitNode, TransformNode,
};
use crate::error::CompileError;
use crate::field::{BinSuffix, bin_requires_range, vg_field, vg_field_with};
use crate::model::{Model, ModelId, ModelTree};
use crate::spec::{DataSource, Transform};
use ahash::AHashMap;

/// Builds the initial, unoptimized data-flow graph of a view tree.
pub(super) struct DataFlowBuilder<'a> {
    tree: &'a ModelTree,
    config: &'a Config,
    flow: DataFlow,
    /// Last node of each view's chain; children continue from here.
    tails: AHashMap<ModelId, NodeId>,
    sources: usize,
}

impl<'a> DataFlowBuilder<'a> {
    pub(super) fn new(tree: &'a ModelTree, config: &'a Config) -> Self {
        Self {
            tree,
            config,
            flow: DataFlow::new(),
            tails: AHashMap::new(),
            sources: 0,
        }
    }

    pub(super) fn build(mut self) -> Result<DataFlow, CompileError> {
        for id in self.tree.preorder(ModelTree::ROOT) {
            self.build_model(id)?;
        }
        Ok(self.flow)
    }

    fn build_model(&mut self, id: ModelId) -> Result<(), CompileError> {
        let model = self.tree.get(id);
        let mut tail = match &model.data {
            Some(data) => Some(self.add_source(id, data)),
            None => model.parent.and_then(|parent| self.tails.get(&parent).copied()),
        };

        let is_unit = model.as_unit().is_some();
        if tail.is_none() && (is_unit || !model.transforms.is_empty()) {
            return Err(CompileError::MissingDataSource {
                view: model.name.clone(),
            });
        }

        for transform in &model.transforms {
            let node = self.transform_node(model, transform)?;
            tail = self.push(tail, node);
        }

        if is_unit {
            if let Some(bin) = BinNode::make_from_encoding(model, self.config) {
                tail = self.push(tail, TransformNode::Bin(bin));
            }
            if let Some(time_unit) = TimeUnitNode::make_from_encoding(model) {
                tail = self.push(tail, TransformNode::TimeUnit(time_unit));
            }
            if let Some(aggregate) = AggregateNode::make_from_encoding(model) {
                tail = self.push(tail, TransformNode::Aggregate(aggregate));
            }
            let output = OutputNode::new(model.get_name("main"), required_fields(model))
                .with_selected(selected_fields(model));
            tail = self.push(tail, TransformNode::Output(output));
        }

        if let Some(tail) = tail {
            self.tails.insert(id, tail);
        }
        Ok(())
    }

    fn push(&mut self, tail: Option<NodeId>, node: TransformNode) -> Option<NodeId> {
        Some(match tail {
            Some(parent) => self.flow.add_child(parent, node),
            None => self.flow.add_root(node),
        })
    }

    fn add_source(&mut self, id: ModelId, data: &DataSource) -> NodeId {
        let name = data.name.clone().unwrap_or_else(|| {
            let name = format!("source_{}", self.sources);
            self.sources += 1;
            name
        });
        // Point selections key their tuples on a generated row id.
        let identifier = self.tree.units_under(id).into_iter().any(|unit| {
            self.tree.unit(unit).is_some_and(|unit| {
                unit.selections
                    .values()
                    .any(|s| s.projected_fields().any(|f| f == SELECTION_ID))
            })
        });
        let source = SourceNode::new(name, data.clone()).with_identifier(identifier);
        self.flow.add_root(TransformNode::Source(source))
    }

    fn transform_node(&self, model: &Model, transform: &Transform) -> Result<TransformNode, CompileError> {
        Ok(match transform {
            Transform::Calculate(t) => TransformNode::Formula(FormulaNode::new(&t.calculate, &t.as_field)),
            Transform::Filter(t) => TransformNode::Filter(FilterNode::from_predicate(self.tree, &t.filter)?),
            Transform::Bin(t) => TransformNode::Bin(BinNode::make_from_transform(model, t)),
            Transform::TimeUnit(t) => TransformNode::TimeUnit(TimeUnitNode::make_from_transform(t)),
            Transform::Aggregate(t) => TransformNode::Aggregate(AggregateNode::make_from_transform(t)),
        })
    }
}

/// Fields the selections of a unit project, read by their tuples.
fn selected_fields(model: &Model) -> FieldSet {
    model
        .as_unit()
        .into_iter()
        .flat_map(|unit| unit.selections.values())
        .flat_map(|selection| selection.projected_fields())
        .map(str::to_string)
        .collect()
}

/// Fields the marks of a unit read from its main dataset.
fn required_fields(model: &Model) -> FieldSet {
    let mut fields = FieldSet::default();
    let Some(unit) = model.as_unit() else {
        return fields;
    };
    for (channel, fd) in unit.channel_field_defs().chain(unit.condition_field_defs()) {
        if fd.bin.is_some() && fd.aggregate.is_none() {
            fields.insert(vg_field_with(fd, None));
            fields.insert(vg_field_with(fd, Some(BinSuffix::End)));
            if bin_requires_range(fd, channel) {
                fields.insert(vg_field_with(fd, Some(BinSuffix::Range)));
            }
        } else {
            fields.insert(vg_field(fd));
        }
    }
    fields
}
