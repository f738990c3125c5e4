use super::{TransformCompiler, find_signal};
use crate::channel::Channel;
use crate::error::CompileError;
use crate::model::UnitModel;
use crate::selection::{SelectionComponent, SelectionContext, SignalRange};
use crate::spec::{SelectionProps, SelectionResolution, SelectionType};
use crate::util::string_value;
use crate::vega::{SignalRef, VgSignal};
use tracing::warn;

/// Binds an interval selection to the scale domains of its projected
/// channels, so dragging and zooming pan the view instead of drawing a brush.
pub struct Scales;

impl TransformCompiler for Scales {
    fn name(&self) -> &'static str {
        "scales"
    }

    fn applies(&self, selection: &SelectionComponent) -> bool {
        selection.selection_type == SelectionType::Interval
            && selection.resolve == SelectionResolution::Global
            && selection.binds_scales()
    }

    fn parse(&self, unit: &mut UnitModel, _def: &SelectionProps, selection: &mut SelectionComponent) {
        let mut bound = Vec::new();
        for projection in &selection.project {
            let Some(channel) = projection.channel else {
                continue;
            };
            match unit.scales.get_mut(&channel) {
                Some(scale) if scale.is_interactive() => {
                    scale.domain_raw = Some(SignalRef::new(
                        selection.channel_signal_name(channel, SignalRange::Data),
                    ));
                    bound.push(channel);
                }
                _ => warn!("Scale bindings are currently only supported for scales with unbinned, continuous domains."),
            }
        }
        selection.scales = bound;
    }

    /// Nested views declare the bound domain signals at the top level.
    fn top_level_signals(
        &self,
        ctx: &SelectionContext<'_>,
        selection: &SelectionComponent,
        mut signals: Vec<VgSignal>,
    ) -> Vec<VgSignal> {
        if !ctx.has_parent() {
            return signals;
        }
        for channel in &selection.scales {
            let name = selection.channel_signal_name(*channel, SignalRange::Data);
            if find_signal(&signals, &name).is_none() {
                signals.push(VgSignal::named(name));
            }
        }
        signals
    }

    /// ...and push their updates out to those declarations.
    fn signals(
        &self,
        ctx: &SelectionContext<'_>,
        selection: &SelectionComponent,
        mut signals: Vec<VgSignal>,
    ) -> Result<Vec<VgSignal>, CompileError> {
        if ctx.has_parent() {
            for channel in &selection.scales {
                let name = selection.channel_signal_name(*channel, SignalRange::Data);
                if let Some(index) = find_signal(&signals, &name) {
                    let signal = &mut signals[index];
                    signal.push = Some("outer".to_string());
                    signal.value = None;
                    signal.update = None;
                }
            }
        }
        Ok(signals)
    }
}

/// `domain("<scale>")` of a unit's scale.
pub fn domain(ctx: &SelectionContext<'_>, channel: Channel) -> String {
    format!("domain({})", string_value(&ctx.scale_name(channel)))
}
