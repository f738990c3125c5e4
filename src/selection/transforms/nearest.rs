use super::TransformCompiler;
use crate::channel::Channel;
use crate::selection::{SelectionComponent, SelectionContext};
use crate::spec::SelectionType;
use serde_json::{Value, json};
use tracing::warn;

const VORONOI: &str = "voronoi";

/// Selects the mark nearest to the pointer by overlaying invisible voronoi
/// cells around the unit's marks.
pub struct Nearest;

impl TransformCompiler for Nearest {
    fn name(&self) -> &'static str {
        "nearest"
    }

    fn applies(&self, selection: &SelectionComponent) -> bool {
        selection.selection_type != SelectionType::Interval && selection.nearest
    }

    fn marks(
        &self,
        ctx: &SelectionContext<'_>,
        selection: &SelectionComponent,
        mut marks: Vec<Value>,
    ) -> Vec<Value> {
        let mark = ctx.unit.mark;
        if mark.is_path_mark() {
            warn!(
                "The \"nearest\" transform is not supported for {} marks.",
                mark.as_str()
            );
            return marks;
        }

        let (x, y) = selection.positional_projections();
        let neither = x.is_none() && y.is_none();
        let coord = |projected: bool, channel: Channel| {
            if projected || neither {
                format!("datum.datum.{} || 0", channel)
            } else {
                "0".to_string()
            }
        };
        let cell = json!({
            "name": ctx.get_name(VORONOI),
            "type": "path",
            "from": {"data": ctx.get_name("marks")},
            "encode": {
                "enter": {
                    "fill": {"value": "transparent"},
                    "strokeWidth": {"value": 0.35},
                    "stroke": {"value": "transparent"},
                    "isVoronoi": {"value": true}
                }
            },
            "transform": [{
                "type": "voronoi",
                "x": {"expr": coord(x.is_some(), Channel::X)},
                "y": {"expr": coord(y.is_some(), Channel::Y)},
                "size": [
                    {"signal": ctx.size_signal(Channel::X)},
                    {"signal": ctx.size_signal(Channel::Y)}
                ]
            }]
        });

        let unit_mark = ctx.get_name("marks");
        let mut index = 0;
        let mut exists = false;
        for (i, mark) in marks.iter().enumerate() {
            let name = mark.get("name").and_then(Value::as_str).unwrap_or_default();
            if name == unit_mark {
                index = i;
            } else if name.contains(VORONOI) {
                exists = true;
            }
        }
        if !exists {
            marks.insert((index + 1).min(marks.len()), cell);
        }
        marks
    }
}
