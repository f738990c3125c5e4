use crate::channel::Channel;
use crate::config::Config;
use crate::error::CompileError;
use crate::model::{ModelId, ModelKind, ModelTree};
use crate::selection::{
    SelectionContext, assemble_layer_marks, assemble_top_level_signals, assemble_unit_marks,
    assemble_unit_signals,
};
use crate::util::number_to_string;
use crate::vega::VgSignal;
use serde_json::{Value, json};

/// Width and height signals of every scale-owning view, then the views'
/// selection signals and the chart-wide selection signals.
pub(super) fn top_level_signals(tree: &ModelTree, config: &Config) -> Result<Vec<VgSignal>, CompileError> {
    let mut signals = Vec::new();
    for owner in tree.scale_owners() {
        for channel in [Channel::X, Channel::Y] {
            let Some(name) = channel.size_name() else {
                continue;
            };
            let update = tree
                .top_level_size(owner, channel)
                .map(number_to_string)
                .unwrap_or_else(|| config.view.size_expr(channel));
            signals.push(VgSignal::named(tree.get(owner).get_name(name)).with_update(update));
        }
    }
    signals.extend(view_signals(tree, ModelTree::ROOT)?);
    Ok(assemble_top_level_signals(tree, signals))
}

/// Selection signals scoped to a view. Concatenated children carry their
/// own inside their group marks.
fn view_signals(tree: &ModelTree, id: ModelId) -> Result<Vec<VgSignal>, CompileError> {
    if tree.get(id).is_concat() {
        return Ok(Vec::new());
    }
    let mut signals = Vec::new();
    for unit in tree.units_under(id) {
        if let Some(ctx) = SelectionContext::new(tree, unit) {
            signals.extend(assemble_unit_signals(&ctx)?);
        }
    }
    Ok(signals)
}

pub(super) fn view_marks(tree: &ModelTree, id: ModelId) -> Result<Vec<Value>, CompileError> {
    let model = tree.get(id);
    match &model.kind {
        ModelKind::Unit(_) => {
            let marks = vec![unit_mark(tree, id)];
            Ok(match SelectionContext::new(tree, id) {
                Some(ctx) => assemble_unit_marks(&ctx, marks),
                None => marks,
            })
        }
        ModelKind::Layer => {
            let marks = tree
                .units_under(id)
                .into_iter()
                .map(|unit| unit_mark(tree, unit))
                .collect();
            Ok(assemble_layer_marks(tree, id, marks))
        }
        ModelKind::Concat => model
            .children
            .iter()
            .map(|child| group_mark(tree, *child))
            .collect(),
    }
}

/// A concatenated child wrapped in a group with its own signals.
fn group_mark(tree: &ModelTree, id: ModelId) -> Result<Value, CompileError> {
    let model = tree.get(id);
    let mut group = json!({
        "type": "group",
        "name": model.get_name("group"),
    });
    if !model.is_concat() {
        let owner = tree.get(tree.scale_owner(id));
        group["encode"] = json!({
            "update": {
                "width": {"signal": owner.get_name("width")},
                "height": {"signal": owner.get_name("height")},
            }
        });
    }
    let signals = view_signals(tree, id)?;
    if !signals.is_empty() {
        group["signals"] = json!(signals);
    }
    group["marks"] = Value::Array(view_marks(tree, id)?);
    Ok(group)
}

/// The minimal mark a unit draws: its type, style and main dataset.
fn unit_mark(tree: &ModelTree, id: ModelId) -> Value {
    let model = tree.get(id);
    let Some(unit) = model.as_unit() else {
        return Value::Null;
    };
    let mut mark = json!({
        "name": model.get_name("marks"),
        "type": unit.mark.vg_mark_type(),
        "style": [unit.mark.as_str()],
        "from": {"data": model.get_name("main")},
    });

    // Scale-bound selections pan the plot beyond its bounds.
    let binds_scales = tree.units_under(tree.scale_owner(id)).into_iter().any(|other| {
        tree.unit(other)
            .is_some_and(|u| u.selections.values().any(|s| s.binds_scales()))
    });
    if unit.clip.unwrap_or(binds_scales) {
        mark["clip"] = Value::Bool(true);
    }
    mark
}
