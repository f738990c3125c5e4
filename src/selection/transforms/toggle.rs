use super::TransformCompiler;
use crate::error::CompileError;
use crate::selection::{SelectionComponent, SelectionContext};
use crate::spec::SelectionType;
use crate::vega::{VgEvents, VgOnEvent, VgSignal};
use serde_json::json;

pub const TOGGLE: &str = "_toggle";

/// Lets a multi selection add or remove individual tuples while a modifier
/// expression (by default, shift held down) is true.
pub struct Toggle;

impl TransformCompiler for Toggle {
    fn name(&self) -> &'static str {
        "toggle"
    }

    fn applies(&self, selection: &SelectionComponent) -> bool {
        selection.selection_type == SelectionType::Multi && selection.toggle.is_some()
    }

    fn signals(
        &self,
        _ctx: &SelectionContext<'_>,
        selection: &SelectionComponent,
        mut signals: Vec<VgSignal>,
    ) -> Result<Vec<VgSignal>, CompileError> {
        let update = selection.toggle.clone().unwrap_or_default();
        signals.push(
            VgSignal::named(format!("{}{}", selection.name, TOGGLE))
                .with_value(json!(false))
                .with_on(vec![VgOnEvent::new(
                    VgEvents::from_streams(selection.events.clone()),
                    update,
                )]),
        );
        Ok(signals)
    }

    fn modify_expr(
        &self,
        ctx: &SelectionContext<'_>,
        selection: &SelectionComponent,
        _expr: String,
    ) -> String {
        let tuple = selection.tuple_name();
        let signal = format!("{}{}", selection.name, TOGGLE);
        format!(
            "{signal} ? null : {tuple}, {signal} ? null : {stamp}, {signal} ? {tuple} : null",
            signal = signal,
            tuple = tuple,
            stamp = ctx.unit_stamp(selection, "true"),
        )
    }
}
