use super::{AggregateNode, BinNode, FieldSet, FilterNode, FormulaNode, TimeUnitNode};
use crate::config::SELECTION_ID;
use crate::spec::DataSource;
use crate::vega::{VgData, VgTransform};
use serde_json::Value;

/// One step of a data-flow graph.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformNode {
    Source(SourceNode),
    Formula(FormulaNode),
    Filter(FilterNode),
    Bin(BinNode),
    TimeUnit(TimeUnitNode),
    Aggregate(AggregateNode),
    Output(OutputNode),
}

impl TransformNode {
    /// Node kind, for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            TransformNode::Source(_) => "source",
            TransformNode::Formula(_) => "formula",
            TransformNode::Filter(_) => "filter",
            TransformNode::Bin(_) => "bin",
            TransformNode::TimeUnit(_) => "timeUnit",
            TransformNode::Aggregate(_) => "aggregate",
            TransformNode::Output(_) => "output",
        }
    }

    /// Fields this node adds to each row.
    pub fn produced_fields(&self) -> FieldSet {
        match self {
            TransformNode::Source(node) => node.produced_fields(),
            TransformNode::Formula(node) => node.produced_fields(),
            TransformNode::Bin(node) => node.produced_fields(),
            TransformNode::TimeUnit(node) => node.produced_fields(),
            TransformNode::Aggregate(node) => node.produced_fields(),
            TransformNode::Filter(_) | TransformNode::Output(_) => FieldSet::default(),
        }
    }

    /// Fields this node reads.
    pub fn dependent_fields(&self) -> FieldSet {
        match self {
            TransformNode::Formula(node) => node.dependent_fields(),
            TransformNode::Filter(node) => node.dependent_fields(),
            TransformNode::Bin(node) => node.dependent_fields(),
            TransformNode::TimeUnit(node) => node.dependent_fields(),
            TransformNode::Aggregate(node) => node.dependent_fields(),
            TransformNode::Output(node) => node.dependent_fields(),
            TransformNode::Source(_) => FieldSet::default(),
        }
    }

    /// Output transforms, in execution order.
    pub fn assemble(&self) -> Vec<VgTransform> {
        match self {
            TransformNode::Source(node) => node.assemble(),
            TransformNode::Formula(node) => vec![node.assemble()],
            TransformNode::Filter(node) => vec![node.assemble()],
            TransformNode::Bin(node) => node.assemble(),
            TransformNode::TimeUnit(node) => node.assemble(),
            TransformNode::Aggregate(node) => vec![node.assemble()],
            TransformNode::Output(_) => Vec::new(),
        }
    }

    pub fn can_merge(&self, other: &TransformNode) -> bool {
        matches!(
            (self, other),
            (TransformNode::Bin(_), TransformNode::Bin(_))
                | (TransformNode::TimeUnit(_), TransformNode::TimeUnit(_))
        )
    }

    /// Folds another node of the same kind into this one. Other kinds are
    /// left as they are; check [`can_merge`](Self::can_merge) first.
    pub fn merge(&mut self, other: TransformNode) {
        match (self, other) {
            (TransformNode::Bin(node), TransformNode::Bin(other)) => node.merge(other),
            (TransformNode::TimeUnit(node), TransformNode::TimeUnit(other)) => node.merge(other),
            _ => {}
        }
    }
}

/// The root of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceNode {
    pub name: String,
    pub data: DataSource,
    /// Field names of inline rows; `None` when the fields are not known up front.
    pub schema: Option<FieldSet>,
    /// Tag each row with a unique id for point selections.
    pub identifier: bool,
}

impl SourceNode {
    pub fn new(name: impl Into<String>, data: DataSource) -> Self {
        let schema = data.values.as_ref().map(|rows| {
            rows.iter()
                .filter_map(Value::as_object)
                .flat_map(|row| row.keys().cloned())
                .collect()
        });
        Self {
            name: name.into(),
            data,
            schema,
            identifier: false,
        }
    }

    pub fn with_identifier(mut self, identifier: bool) -> Self {
        self.identifier = identifier;
        self
    }

    pub fn produced_fields(&self) -> FieldSet {
        let mut fields = FieldSet::default();
        if self.identifier {
            fields.insert(SELECTION_ID.to_string());
        }
        fields
    }

    pub fn assemble(&self) -> Vec<VgTransform> {
        if self.identifier {
            vec![VgTransform::Identifier {
                as_field: SELECTION_ID.to_string(),
            }]
        } else {
            Vec::new()
        }
    }

    /// The dataset this source opens, before any transforms.
    pub fn dataset(&self) -> VgData {
        VgData {
            name: self.name.clone(),
            values: self.data.values.clone().map(Value::Array),
            url: self.data.url.clone(),
            format: self.data.format.clone(),
            ..Default::default()
        }
    }
}

/// A named dataset boundary that marks, scales and selections read.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputNode {
    pub name: String,
    /// Fields readers of this dataset need.
    pub required: FieldSet,
    /// Fields selection tuples read. These keep their producers alive but
    /// are not validated: an aggregate may legitimately drop them.
    pub selected: FieldSet,
}

impl OutputNode {
    pub fn new(name: impl Into<String>, required: FieldSet) -> Self {
        Self {
            name: name.into(),
            required,
            selected: FieldSet::default(),
        }
    }

    pub fn with_selected(mut self, selected: FieldSet) -> Self {
        self.selected = selected;
        self
    }

    pub fn dependent_fields(&self) -> FieldSet {
        self.required.union(&self.selected).cloned().collect()
    }
}
