//! Assembly of parsed selections into output signals, datasets and marks.

use super::transforms::{self, find_signal};
use super::{
    MODIFY, SelectionComponent, SelectionContext, VL_SELECTION_RESOLVE, strategy,
};
use crate::error::CompileError;
use crate::model::{ModelId, ModelTree};
use crate::spec::{SelectionResolution, SelectionType};
use crate::util::string_value;
use crate::vega::{VgData, VgEvents, VgOnEvent, VgSignal};
use serde_json::{Map, Value, json};
use tracing::debug;

/// Signals a unit view needs for each of its selections: the strategy's
/// signals decorated by every applicable transform, then `<name>_modify`.
pub fn assemble_unit_signals(ctx: &SelectionContext<'_>) -> Result<Vec<VgSignal>, CompileError> {
    let mut signals = Vec::new();
    for selection in ctx.unit.selections.values() {
        let strategy = strategy(selection.selection_type);
        let mut unit_signals = (strategy.signals)(ctx, selection)?;
        let mut expr = (strategy.modify_expr)(ctx, selection);
        for transform in transforms::applicable(selection) {
            debug!(selection = %selection.name, transform = transform.name(), "applying selection transform");
            unit_signals = transform.signals(ctx, selection, unit_signals)?;
            expr = transform.modify_expr(ctx, selection, expr);
        }

        unit_signals.push(
            VgSignal::named(format!("{}{}", selection.name, MODIFY)).with_on(vec![VgOnEvent::new(
                VgEvents::signal(selection.tuple_name()),
                format!(
                    "modify({}, {})",
                    string_value(&selection.store_name()),
                    expr
                ),
            )]),
        );
        signals.extend(unit_signals);
    }
    Ok(signals)
}

/// Signals shared by the whole chart: one resolved query per selection,
/// widget bindings, and the `unit` signal tracking the hovered view.
pub fn assemble_top_level_signals(tree: &ModelTree, mut signals: Vec<VgSignal>) -> Vec<VgSignal> {
    let mut has_selections = false;
    for id in tree.units_under(ModelTree::ROOT) {
        let Some(ctx) = SelectionContext::new(tree, id) else {
            continue;
        };
        for selection in ctx.unit.selections.values() {
            has_selections = true;
            if find_signal(&signals, &selection.name).is_none() {
                signals.push(
                    VgSignal::named(selection.name.clone()).with_update(resolve_expr(selection)),
                );
            }
            for transform in transforms::applicable(selection) {
                signals = transform.top_level_signals(&ctx, selection, signals);
            }
        }
    }

    if has_selections && find_signal(&signals, "unit").is_none() {
        signals.insert(
            0,
            VgSignal::named("unit").with_value(json!({})).with_on(vec![VgOnEvent::new(
                VgEvents::Selector("mousemove".to_string()),
                "isTuple(group()) ? group() : unit",
            )]),
        );
    }
    signals
}

fn resolve_expr(selection: &SelectionComponent) -> String {
    let store = string_value(&selection.store_name());
    match selection.resolve {
        SelectionResolution::Global => format!("{}({})", VL_SELECTION_RESOLVE, store),
        other => format!(
            "{}({}, {})",
            VL_SELECTION_RESOLVE,
            store,
            string_value(other.as_str())
        ),
    }
}

/// One `<name>_store` dataset per selection, seeded from `init`.
pub fn assemble_unit_data(ctx: &SelectionContext<'_>) -> Vec<VgData> {
    ctx.unit
        .selections
        .values()
        .map(|selection| {
            let values = selection.init.as_ref().map(|init| {
                let rows: Vec<Value> = match init {
                    Value::Array(items) => items
                        .iter()
                        .map(|item| init_tuple(ctx, selection, item))
                        .collect(),
                    item => vec![init_tuple(ctx, selection, item)],
                };
                Value::Array(rows)
            });
            VgData {
                name: selection.store_name(),
                values,
                ..Default::default()
            }
        })
        .collect()
}

/// An initial value keyed by projected field (or channel) as a store tuple.
fn init_tuple(ctx: &SelectionContext<'_>, selection: &SelectionComponent, init: &Value) -> Value {
    let lookup = |field: &str, channel: Option<&str>| {
        init.get(field)
            .or_else(|| channel.and_then(|c| init.get(c)))
            .cloned()
            .unwrap_or(Value::Null)
    };
    let unit = Value::String(ctx.model().name.clone());

    if selection.selection_type == SelectionType::Interval {
        let intervals: Vec<Value> = selection
            .project
            .iter()
            .map(|p| {
                let encoding = p.channel.map(|c| c.as_str());
                json!({
                    "encoding": encoding,
                    "field": p.field,
                    "extent": lookup(&p.field, encoding)
                })
            })
            .collect();
        return json!({"unit": unit, "intervals": intervals});
    }

    let mut tuple = Map::new();
    tuple.insert("unit".into(), unit);
    tuple.insert(
        "encodings".into(),
        selection
            .project
            .iter()
            .filter_map(|p| p.channel.map(|c| Value::String(c.as_str().to_string())))
            .collect(),
    );
    tuple.insert(
        "fields".into(),
        selection
            .projected_fields()
            .map(|f| Value::String(f.to_string()))
            .collect(),
    );
    tuple.insert(
        "values".into(),
        selection
            .project
            .iter()
            .map(|p| lookup(&p.field, p.channel.map(|c| c.as_str())))
            .collect(),
    );
    Value::Object(tuple)
}

/// Wraps a unit's marks with whatever its selections draw around them.
pub fn assemble_unit_marks(ctx: &SelectionContext<'_>, mut marks: Vec<Value>) -> Vec<Value> {
    for selection in ctx.unit.selections.values() {
        if let Some(strategy_marks) = strategy(selection.selection_type).marks {
            marks = strategy_marks(ctx, selection, marks);
        }
        for transform in transforms::applicable(selection) {
            marks = transform.marks(ctx, selection, marks);
        }
    }
    marks
}

/// Selection marks of every unit in a layer, applied in layer order.
pub fn assemble_layer_marks(tree: &ModelTree, layer: ModelId, marks: Vec<Value>) -> Vec<Value> {
    tree.units_under(layer)
        .into_iter()
        .filter_map(|id| SelectionContext::new(tree, id))
        .fold(marks, |marks, ctx| assemble_unit_marks(&ctx, marks))
}
