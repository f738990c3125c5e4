use super::{TransformCompiler, find_signal};
use crate::error::CompileError;
use crate::selection::{SelectionComponent, SelectionContext};
use crate::spec::{Bind, SelectionResolution, SelectionType};
use crate::util::{access_path, string_value, var_name};
use crate::vega::{VgEvents, VgOnEvent, VgSignal};
use serde_json::{Value, json};

/// Binds a single selection's projected fields to input widgets. Each
/// field gets a top-level signal the widget reads and writes, and the tuple
/// is rebuilt from those signals.
pub struct Inputs;

/// `<name>_<field>` signal backing one widget.
fn input_signal_name(selection: &SelectionComponent, field: &str) -> String {
    var_name(&format!("{}_{}", selection.name, field))
}

impl TransformCompiler for Inputs {
    fn name(&self) -> &'static str {
        "inputs"
    }

    fn applies(&self, selection: &SelectionComponent) -> bool {
        selection.selection_type == SelectionType::Single
            && selection.resolve == SelectionResolution::Global
            && matches!(selection.bind, Some(Bind::Input(_)))
    }

    fn top_level_signals(
        &self,
        ctx: &SelectionContext<'_>,
        selection: &SelectionComponent,
        mut signals: Vec<VgSignal>,
    ) -> Vec<VgSignal> {
        let Some(Bind::Input(bind)) = &selection.bind else {
            return signals;
        };
        let datum = ctx.datum(selection);
        for projection in &selection.project {
            let name = input_signal_name(selection, &projection.field);
            if find_signal(&signals, &name).is_some() {
                continue;
            }
            // A per-field or per-channel binding wins over the shared one.
            let binding = bind
                .get(&projection.field)
                .or_else(|| projection.channel.and_then(|c| bind.get(c.as_str())))
                .cloned()
                .unwrap_or_else(|| Value::Object(bind.clone()));
            let update = format!(
                "datum && item().mark.marktype !== 'group' ? {}{} : null",
                datum,
                access_path(&projection.field)
            );
            let mut signal = VgSignal::named(name)
                .with_value(json!(""))
                .with_on(vec![VgOnEvent::new(
                    VgEvents::from_streams(selection.events.clone()),
                    update,
                )]);
            signal.bind = Some(binding);
            signals.insert(0, signal);
        }
        signals
    }

    fn signals(
        &self,
        _ctx: &SelectionContext<'_>,
        selection: &SelectionComponent,
        mut signals: Vec<VgSignal>,
    ) -> Result<Vec<VgSignal>, CompileError> {
        let Some(index) = find_signal(&signals, &selection.tuple_name()) else {
            return Ok(signals);
        };
        let fields: Vec<String> = selection.projected_fields().map(string_value).collect();
        let values: Vec<String> = selection
            .projected_fields()
            .map(|field| input_signal_name(selection, field))
            .collect();

        let tuple = &mut signals[index];
        tuple.update = Some(format!(
            "{} ? {{fields: [{}], values: [{}]}} : null",
            values.join(" && "),
            fields.join(", "),
            values.join(", ")
        ));
        tuple.value = None;
        tuple.on = None;
        Ok(signals)
    }
}
