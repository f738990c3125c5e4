//! Normalizes a [`ChartSpec`] into a [`ModelTree`].
//!
//! Field definitions get explicit types and normalized bin parameters,
//! layers hand their shared encoding down to their children, every scale
//! channel gets an initialized scale, and selections are parsed against
//! those scales.

use crate::channel::Channel;
use crate::config::Config;
use crate::error::CompileError;
use crate::field::{FieldDef, FieldType, normalize_bin};
use crate::model::{ChannelEncoding, Model, ModelId, ModelKind, ModelTree, UnitModel};
use crate::scale::ScaleComponent;
use crate::scale::init::{ScaleInput, init_scale};
use crate::selection::parse_unit_selections;
use crate::spec::{ChannelDef, ChartSpec, DataSource, Encoding, FieldDefSpec, MarkDef, Transform, UnitSpec};
use crate::util::var_name;
use std::collections::BTreeMap;
use tracing::debug;

/// Builds the view tree for `spec`. The root view is unnamed unless the
/// spec names it.
pub fn parse_spec(spec: &ChartSpec, config: &Config) -> Result<ModelTree, CompileError> {
    let mut tree = ModelTree::new();
    let name = spec.name().map(var_name).unwrap_or_default();
    add_view(&mut tree, spec, None, name, &Encoding::new(), config)?;
    debug!(views = tree.len(), "parsed view tree");
    Ok(tree)
}

fn add_view(
    tree: &mut ModelTree,
    spec: &ChartSpec,
    parent: Option<ModelId>,
    name: String,
    shared: &Encoding,
    config: &Config,
) -> Result<ModelId, CompileError> {
    match spec {
        ChartSpec::Unit(unit) => add_unit(tree, unit, parent, name, shared, config),
        ChartSpec::Layer(layer) => {
            let mut model = Model::new(name, ModelKind::Layer);
            model.parent = parent;
            model.data = layer.data.clone();
            model.transforms = layer.transform.clone();
            model.width = layer.width;
            model.height = layer.height;
            let id = tree.push(model);

            let mut encoding = shared.clone();
            encoding.extend(layer.encoding.clone());
            for (i, child) in layer.layer.iter().enumerate() {
                let child_name = child_name(tree, id, child, "layer", i);
                add_view(tree, child, Some(id), child_name, &encoding, config)?;
            }
            Ok(id)
        }
        ChartSpec::HConcat(s) => add_concat(tree, &s.data, &s.transform, &s.hconcat, parent, name, config),
        ChartSpec::VConcat(s) => add_concat(tree, &s.data, &s.transform, &s.vconcat, parent, name, config),
    }
}

fn add_concat(
    tree: &mut ModelTree,
    data: &Option<DataSource>,
    transforms: &[Transform],
    children: &[ChartSpec],
    parent: Option<ModelId>,
    name: String,
    config: &Config,
) -> Result<ModelId, CompileError> {
    let mut model = Model::new(name, ModelKind::Concat);
    model.parent = parent;
    model.data = data.clone();
    model.transforms = transforms.to_vec();
    let id = tree.push(model);

    // Concatenated views never share encodings.
    for (i, child) in children.iter().enumerate() {
        let child_name = child_name(tree, id, child, "concat", i);
        add_view(tree, child, Some(id), child_name, &Encoding::new(), config)?;
    }
    Ok(id)
}

/// The child's own name, else `<parent>_<prefix>_<index>`.
fn child_name(tree: &ModelTree, parent: ModelId, child: &ChartSpec, prefix: &str, index: usize) -> String {
    match child.name() {
        Some(name) => var_name(name),
        None => tree.get(parent).get_name(&format!("{}_{}", prefix, index)),
    }
}

fn add_unit(
    tree: &mut ModelTree,
    spec: &UnitSpec,
    parent: Option<ModelId>,
    name: String,
    shared: &Encoding,
    config: &Config,
) -> Result<ModelId, CompileError> {
    let mark = spec.mark.mark();
    let mut unit = UnitModel::new(mark);
    if let MarkDef::Def(props) = &spec.mark {
        unit.clip = props.clip;
    }

    let mut encoding = shared.clone();
    encoding.extend(spec.encoding.clone());
    for (channel, def) in &encoding {
        unit.encoding.insert(*channel, normalize_channel(*channel, def));
    }

    let mut model = Model::new(name, ModelKind::Unit(Box::new(unit)));
    model.parent = parent;
    model.data = spec.data.clone();
    model.transforms = spec.transform.clone();
    model.width = spec.width;
    model.height = spec.height;
    let id = tree.push(model);

    let scales = parse_scales(tree, id, config);
    let model = tree.get_mut(id);
    if let Some(unit) = model.as_unit_mut() {
        unit.scales = scales;
        parse_unit_selections(unit, &spec.selection, config)?;
    }
    Ok(id)
}

fn parse_scales(tree: &ModelTree, id: ModelId, config: &Config) -> BTreeMap<Channel, ScaleComponent> {
    let mut scales = BTreeMap::new();
    let Some(unit) = tree.unit(id) else {
        return scales;
    };
    let data = tree.get(id).get_name("main");
    for (channel, encoding) in &unit.encoding {
        let channel = *channel;
        let Some(fd) = encoding.field_defs.first() else {
            continue;
        };
        if !channel.is_scale_channel() {
            continue;
        }
        let specified = encoding.scale.clone().unwrap_or_default();
        let input = ScaleInput {
            name: tree.scale_name(id, channel),
            data: &data,
            channel,
            field_def: fd,
            specified: &specified,
            mark: unit.mark,
            top_level_size: tree.top_level_size(id, channel),
            size_signal: tree.size_signal(id, channel),
        };
        scales.insert(channel, init_scale(&input, config));
    }
    scales
}

fn normalize_channel(channel: Channel, def: &ChannelDef) -> ChannelEncoding {
    let specs: Vec<&FieldDefSpec> = match def {
        ChannelDef::One(spec) => vec![spec.as_ref()],
        ChannelDef::Many(specs) => specs.iter().collect(),
    };

    let mut encoding = ChannelEncoding::default();
    for spec in &specs {
        if let Some(fd) = normalize_field_def(channel, spec) {
            encoding.field_defs.push(fd);
        }
    }
    if let Some(first) = specs.first() {
        encoding.value = first.value.clone();
        encoding.scale = first.scale.clone();
        encoding.axis_format = first.axis.as_ref().and_then(|g| g.format.clone());
        encoding.legend_format = first.legend.as_ref().and_then(|g| g.format.clone());
        encoding.condition = first
            .condition
            .as_ref()
            .and_then(|condition| normalize_field_def(channel, &condition.def));
    }
    encoding
}

/// A field definition with its type filled in and bin parameters resolved.
/// `None` for value-only definitions.
pub fn normalize_field_def(channel: Channel, spec: &FieldDefSpec) -> Option<FieldDef> {
    if spec.field.is_none() && spec.aggregate.is_none() {
        return None;
    }
    let bin = spec.bin.as_ref().and_then(|bin| normalize_bin(bin, Some(channel)));
    let field_type = spec.field_type.unwrap_or(if spec.aggregate.is_some() || bin.is_some() {
        FieldType::Quantitative
    } else if spec.time_unit.is_some() {
        FieldType::Temporal
    } else {
        FieldType::Nominal
    });
    Some(FieldDef {
        field: spec.field.clone(),
        field_type,
        aggregate: spec.aggregate,
        bin,
        time_unit: spec.time_unit.clone(),
    })
}
