use super::inputs::Inputs;
use super::toggle::TOGGLE;
use super::{TransformCompiler, find_signal};
use crate::error::CompileError;
use crate::selection::{SelectionComponent, SelectionContext, SignalRange};
use crate::spec::SelectionType;
use crate::util::var_name;
use crate::vega::{VgEvents, VgOnEvent, VgSignal};

/// Empties the selection when its clear events fire.
pub struct Clear;

fn add_clear(signals: &mut [VgSignal], index: Option<usize>, selection: &SelectionComponent, update: &str) {
    let Some(index) = index else {
        return;
    };
    let Some(clear) = &selection.clear else {
        return;
    };
    // Signals without handlers (e.g. input-driven tuples) are left alone.
    if let Some(on) = &mut signals[index].on {
        on.push(VgOnEvent::new(VgEvents::from_streams(clear.clone()), update));
    }
}

impl TransformCompiler for Clear {
    fn name(&self) -> &'static str {
        "clear"
    }

    fn applies(&self, selection: &SelectionComponent) -> bool {
        selection.clear.is_some()
    }

    fn top_level_signals(
        &self,
        _ctx: &SelectionContext<'_>,
        selection: &SelectionComponent,
        mut signals: Vec<VgSignal>,
    ) -> Vec<VgSignal> {
        if Inputs.applies(selection) {
            for field in selection.projected_fields() {
                let index = find_signal(&signals, &var_name(&format!("{}_{}", selection.name, field)));
                add_clear(&mut signals, index, selection, "null");
            }
        }
        signals
    }

    fn signals(
        &self,
        _ctx: &SelectionContext<'_>,
        selection: &SelectionComponent,
        mut signals: Vec<VgSignal>,
    ) -> Result<Vec<VgSignal>, CompileError> {
        if selection.selection_type == SelectionType::Interval {
            for channel in selection.project.iter().filter_map(|p| p.channel) {
                let visual = find_signal(
                    &signals,
                    &selection.channel_signal_name(channel, SignalRange::Visual),
                );
                if visual.is_some() {
                    add_clear(&mut signals, visual, selection, "[0, 0]");
                } else {
                    let data = find_signal(
                        &signals,
                        &selection.channel_signal_name(channel, SignalRange::Data),
                    );
                    add_clear(&mut signals, data, selection, "null");
                }
            }
        } else {
            let tuple = find_signal(&signals, &selection.tuple_name());
            add_clear(&mut signals, tuple, selection, "null");
            let toggle = find_signal(&signals, &format!("{}{}", selection.name, TOGGLE));
            add_clear(&mut signals, toggle, selection, "false");
        }
        Ok(signals)
    }
}
