//! Input chart specification types.
//!
//! These mirror the declarative JSON a user writes. They are deserialized
//! as-is and normalized into a [`ModelTree`](crate::model::ModelTree) by
//! [`compiler::parsing`](crate::compiler::parsing).

use crate::channel::Channel;
use crate::field::{AggregateOp, Bin, FieldType};
use crate::scale::ScaleType;
use crate::timeunit::TimeUnit;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Any view: a single-mark unit, a layer, or a concatenation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChartSpec {
    Layer(LayerSpec),
    HConcat(HConcatSpec),
    VConcat(VConcatSpec),
    Unit(UnitSpec),
}

impl ChartSpec {
    pub fn name(&self) -> Option<&str> {
        match self {
            ChartSpec::Layer(s) => s.name.as_deref(),
            ChartSpec::HConcat(s) => s.name.as_deref(),
            ChartSpec::VConcat(s) => s.name.as_deref(),
            ChartSpec::Unit(s) => s.name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnitSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Option<DataSource>,
    #[serde(default)]
    pub transform: Vec<Transform>,
    pub mark: MarkDef,
    #[serde(default)]
    pub encoding: Encoding,
    #[serde(default)]
    pub selection: IndexMap<String, SelectionDef>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayerSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Option<DataSource>,
    #[serde(default)]
    pub transform: Vec<Transform>,
    pub layer: Vec<ChartSpec>,
    /// Encoding shared by every layer; a layer's own channels take precedence.
    #[serde(default)]
    pub encoding: Encoding,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HConcatSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Option<DataSource>,
    #[serde(default)]
    pub transform: Vec<Transform>,
    pub hconcat: Vec<ChartSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VConcatSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Option<DataSource>,
    #[serde(default)]
    pub transform: Vec<Transform>,
    pub vconcat: Vec<ChartSpec>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Area,
    Bar,
    Line,
    Trail,
    Point,
    Text,
    Tick,
    Rect,
    Rule,
    Circle,
    Square,
    Geoshape,
}

impl Mark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mark::Area => "area",
            Mark::Bar => "bar",
            Mark::Line => "line",
            Mark::Trail => "trail",
            Mark::Point => "point",
            Mark::Text => "text",
            Mark::Tick => "tick",
            Mark::Rect => "rect",
            Mark::Rule => "rule",
            Mark::Circle => "circle",
            Mark::Square => "square",
            Mark::Geoshape => "geoshape",
        }
    }

    /// The target grammar's mark type that renders this mark.
    pub fn vg_mark_type(&self) -> &'static str {
        match self {
            Mark::Point | Mark::Circle | Mark::Square => "symbol",
            Mark::Bar | Mark::Tick | Mark::Rect => "rect",
            Mark::Geoshape => "shape",
            Mark::Area => "area",
            Mark::Line => "line",
            Mark::Trail => "trail",
            Mark::Text => "text",
            Mark::Rule => "rule",
        }
    }

    /// Marks drawn as one continuous path over all data points.
    pub fn is_path_mark(&self) -> bool {
        matches!(self, Mark::Line | Mark::Area | Mark::Trail)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MarkDef {
    Type(Mark),
    Def(MarkProps),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarkProps {
    #[serde(rename = "type")]
    pub mark_type: Mark,
    #[serde(default)]
    pub clip: Option<bool>,
}

impl MarkDef {
    pub fn mark(&self) -> Mark {
        match self {
            MarkDef::Type(mark) => *mark,
            MarkDef::Def(props) => props.mark_type,
        }
    }
}

pub type Encoding = BTreeMap<Channel, ChannelDef>;

/// A channel takes one definition, or several for `detail`/`tooltip`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChannelDef {
    Many(Vec<FieldDefSpec>),
    One(Box<FieldDefSpec>),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefSpec {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub aggregate: Option<AggregateOp>,
    #[serde(default)]
    pub bin: Option<Bin>,
    #[serde(default)]
    pub time_unit: Option<TimeUnit>,
    #[serde(default)]
    pub scale: Option<ScaleSpec>,
    #[serde(default)]
    pub axis: Option<GuideSpec>,
    #[serde(default)]
    pub legend: Option<GuideSpec>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub condition: Option<Box<ConditionDef>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConditionDef {
    #[serde(default)]
    pub selection: Option<SelectionPredicate>,
    #[serde(default)]
    pub test: Option<String>,
    #[serde(flatten)]
    pub def: FieldDefSpec,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GuideSpec {
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSpec {
    #[serde(default, rename = "type")]
    pub scale_type: Option<ScaleType>,
    #[serde(default)]
    pub domain: Option<DomainSpec>,
    #[serde(default)]
    pub range: Option<Value>,
    #[serde(default, deserialize_with = "double_option")]
    pub range_step: Option<Option<f64>>,
    #[serde(default)]
    pub scheme: Option<Value>,
    #[serde(default)]
    pub round: Option<bool>,
    #[serde(default)]
    pub clamp: Option<bool>,
    #[serde(default)]
    pub nice: Option<Value>,
    #[serde(default)]
    pub exponent: Option<f64>,
    #[serde(default)]
    pub zero: Option<bool>,
    #[serde(default)]
    pub padding: Option<f64>,
    #[serde(default)]
    pub padding_inner: Option<f64>,
    #[serde(default)]
    pub padding_outer: Option<f64>,
    #[serde(default)]
    pub interpolate: Option<String>,
    #[serde(default)]
    pub reverse: Option<bool>,
    #[serde(default)]
    pub base: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DomainSpec {
    Keyword(DomainKeyword),
    Values(Vec<Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainKeyword {
    Unaggregated,
}

/// One entry of a view's `transform` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Transform {
    Calculate(CalculateTransform),
    Filter(FilterTransform),
    Bin(BinTransform),
    TimeUnit(TimeUnitTransform),
    Aggregate(AggregateTransform),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalculateTransform {
    pub calculate: String,
    #[serde(rename = "as")]
    pub as_field: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterTransform {
    pub filter: FilterPredicate,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BinTransform {
    pub bin: Bin,
    pub field: String,
    /// Start field name; the end field is `<as>_end`. Derived when absent.
    #[serde(default, rename = "as")]
    pub as_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeUnitTransform {
    pub time_unit: TimeUnit,
    pub field: String,
    #[serde(rename = "as")]
    pub as_field: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AggregateTransform {
    pub aggregate: Vec<AggregatedFieldDef>,
    #[serde(default)]
    pub groupby: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AggregatedFieldDef {
    pub op: AggregateOp,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(rename = "as")]
    pub as_field: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FilterPredicate {
    Expr(String),
    Selection(SelectionFilter),
    Field(FieldPredicate),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectionFilter {
    pub selection: SelectionPredicate,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPredicate {
    pub field: String,
    #[serde(default)]
    pub time_unit: Option<TimeUnit>,
    #[serde(default)]
    pub equal: Option<Value>,
    /// `[min, max]`; either side may be `null` for an open range.
    #[serde(default)]
    pub range: Option<Vec<Value>>,
    #[serde(default)]
    pub one_of: Option<Vec<Value>>,
    #[serde(default)]
    pub lt: Option<Value>,
    #[serde(default)]
    pub lte: Option<Value>,
    #[serde(default)]
    pub gt: Option<Value>,
    #[serde(default)]
    pub gte: Option<Value>,
}

/// A selection name, or a logical composition of selection names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SelectionPredicate {
    Name(String),
    Not { not: Box<SelectionPredicate> },
    And { and: Vec<SelectionPredicate> },
    Or { or: Vec<SelectionPredicate> },
}

impl SelectionPredicate {
    /// Every selection name referenced, in order of appearance.
    pub fn names(&self) -> Vec<&str> {
        match self {
            SelectionPredicate::Name(name) => vec![name.as_str()],
            SelectionPredicate::Not { not } => not.names(),
            SelectionPredicate::And { and: operands } | SelectionPredicate::Or { or: operands } => {
                operands.iter().flat_map(|p| p.names()).collect()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionType {
    Single,
    Multi,
    Interval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionResolution {
    Global,
    Union,
    Intersect,
}

impl SelectionResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionResolution::Global => "global",
            SelectionResolution::Union => "union",
            SelectionResolution::Intersect => "intersect",
        }
    }
}

/// Whether an empty selection contains all data values or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Empty {
    All,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoolOrString {
    Bool(bool),
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bind {
    Scales(ScalesKeyword),
    /// An input element definition, or a map from projected field/channel
    /// to input element definitions.
    Input(Map<String, Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalesKeyword {
    Scales,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrushConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_dash: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_dash_offset: Option<f64>,
}

impl BrushConfig {
    /// Fills every property left unset from `defaults`.
    pub fn or(self, defaults: &BrushConfig) -> BrushConfig {
        BrushConfig {
            fill: self.fill.or_else(|| defaults.fill.clone()),
            fill_opacity: self.fill_opacity.or(defaults.fill_opacity),
            stroke: self.stroke.or_else(|| defaults.stroke.clone()),
            stroke_opacity: self.stroke_opacity.or(defaults.stroke_opacity),
            stroke_width: self.stroke_width.or(defaults.stroke_width),
            stroke_dash: self.stroke_dash.or_else(|| defaults.stroke_dash.clone()),
            stroke_dash_offset: self.stroke_dash_offset.or(defaults.stroke_dash_offset),
        }
    }
}

/// Selection properties shared by definitions and per-type config defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionProps {
    /// Event selector that triggers the selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve: Option<SelectionResolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encodings: Option<Vec<Channel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty: Option<Empty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear: Option<BoolOrString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<Bind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearest: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle: Option<BoolOrString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate: Option<BoolOrString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<BoolOrString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark: Option<BrushConfig>,
    /// Initial value(s): a mapping from projected field or channel to value,
    /// or an array of such mappings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectionDef {
    #[serde(rename = "type")]
    pub selection_type: SelectionType,
    #[serde(flatten)]
    pub props: SelectionProps,
}
