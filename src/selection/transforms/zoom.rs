use super::scales::{Scales, domain};
use super::{TransformCompiler, find_signal};
use crate::channel::Channel;
use crate::error::CompileError;
use crate::scale::ScaleType;
use crate::selection::events;
use crate::selection::{BRUSH, SelectionComponent, SelectionContext, SignalRange};
use crate::spec::SelectionType;
use crate::util::{number_to_string, string_value};
use crate::vega::{VgEvents, VgOnEvent, VgSignal};

pub const ANCHOR: &str = "_zoom_anchor";
pub const DELTA: &str = "_zoom_delta";

/// Wheel events resize the interval around the pointer, or zoom the bound
/// scales.
pub struct Zoom;

impl TransformCompiler for Zoom {
    fn name(&self) -> &'static str {
        "zoom"
    }

    fn applies(&self, selection: &SelectionComponent) -> bool {
        selection.selection_type == SelectionType::Interval && selection.zoom.is_some()
    }

    fn signals(
        &self,
        ctx: &SelectionContext<'_>,
        selection: &SelectionComponent,
        mut signals: Vec<VgSignal>,
    ) -> Result<Vec<VgSignal>, CompileError> {
        let name = &selection.name;
        let has_scales = Scales.applies(selection);
        let delta = format!("{}{}", name, DELTA);
        let (x, y) = selection.positional_projections();

        let mut streams = events::parse(selection.zoom.as_deref().unwrap_or_default(), "scope")?;
        if !has_scales {
            for stream in &mut streams {
                stream.markname = Some(format!("{}{}", name, BRUSH));
            }
        }

        let anchor_update = if has_scales {
            let mut coords = Vec::new();
            if ctx.scale(Channel::X).is_some() {
                coords.push(format!(
                    "x: invert({}, x(unit))",
                    string_value(&ctx.scale_name(Channel::X))
                ));
            }
            if ctx.scale(Channel::Y).is_some() {
                coords.push(format!(
                    "y: invert({}, y(unit))",
                    string_value(&ctx.scale_name(Channel::Y))
                ));
            }
            format!("{{{}}}", coords.join(", "))
        } else {
            "{x: x(unit), y: y(unit)}".to_string()
        };

        signals.push(
            VgSignal::named(format!("{}{}", name, ANCHOR)).with_on(vec![VgOnEvent::new(
                VgEvents::from_streams(streams.clone()),
                anchor_update,
            )]),
        );
        signals.push(VgSignal::named(delta).with_on(vec![
            VgOnEvent::new(
                VgEvents::from_streams(streams),
                "pow(1.001, event.deltaY * pow(16, event.deltaMode))",
            )
            .forced(),
        ]));

        if x.is_some() {
            on_delta(ctx, selection, Channel::X, &mut signals);
        }
        if y.is_some() {
            on_delta(ctx, selection, Channel::Y, &mut signals);
        }
        Ok(signals)
    }
}

fn on_delta(
    ctx: &SelectionContext<'_>,
    selection: &SelectionComponent,
    channel: Channel,
    signals: &mut [VgSignal],
) {
    let has_scales = Scales.applies(selection);
    let range = if has_scales {
        SignalRange::Data
    } else {
        SignalRange::Visual
    };
    let Some(index) = find_signal(signals, &selection.channel_signal_name(channel, range)) else {
        return;
    };

    let size = ctx.size_signal(channel);
    let scale = ctx.scale(channel);
    let scale_type = scale.map(|s| s.scale_type);
    let base = if has_scales {
        domain(ctx, channel)
    } else {
        signals[index].name.clone()
    };
    let delta = format!("{}{}", selection.name, DELTA);
    let anchor = format!("{}{}.{}", selection.name, ANCHOR, channel);
    let zoom = match scale_type {
        Some(ScaleType::Log) if has_scales => "zoomLog",
        Some(ScaleType::Pow) if has_scales => "zoomPow",
        _ => "zoomLinear",
    };
    let exponent = match scale_type {
        Some(ScaleType::Pow) if has_scales => format!(
            ", {}",
            number_to_string(scale.and_then(|s| s.exponent).unwrap_or(1.0))
        ),
        _ => String::new(),
    };
    let update = format!("{}({}, {}, {}{})", zoom, base, anchor, delta, exponent);

    signals[index].push_on(VgOnEvent::new(
        VgEvents::signal(delta),
        if has_scales {
            update
        } else {
            format!("clampRange({}, 0, {})", update, size)
        },
    ));
}
