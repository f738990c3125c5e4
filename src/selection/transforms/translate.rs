use super::scales::{Scales, domain};
use super::{TransformCompiler, find_signal};
use crate::channel::Channel;
use crate::error::CompileError;
use crate::scale::ScaleType;
use crate::selection::events::{self, EventStream};
use crate::selection::{BRUSH, SelectionComponent, SelectionContext, SignalRange};
use crate::spec::SelectionType;
use crate::util::number_to_string;
use crate::vega::{VgEvents, VgOnEvent, VgSignal};
use serde_json::json;

pub const ANCHOR: &str = "_translate_anchor";
pub const DELTA: &str = "_translate_delta";

/// Dragging an interval moves the brush, or pans the bound scales.
pub struct Translate;

impl TransformCompiler for Translate {
    fn name(&self) -> &'static str {
        "translate"
    }

    fn applies(&self, selection: &SelectionComponent) -> bool {
        selection.selection_type == SelectionType::Interval && selection.translate.is_some()
    }

    fn signals(
        &self,
        ctx: &SelectionContext<'_>,
        selection: &SelectionComponent,
        mut signals: Vec<VgSignal>,
    ) -> Result<Vec<VgSignal>, CompileError> {
        let name = &selection.name;
        let has_scales = Scales.applies(selection);
        let anchor = format!("{}{}", name, ANCHOR);
        let delta = format!("{}{}", name, DELTA);
        let (x, y) = selection.positional_projections();

        let mut streams = events::parse(selection.translate.as_deref().unwrap_or_default(), "scope")?;
        let mut starts: Vec<EventStream> = Vec::with_capacity(streams.len());
        for stream in &mut streams {
            let Some(start) = stream.between.first_mut() else {
                return Err(CompileError::IntervalWithoutBetween {
                    selection: name.clone(),
                });
            };
            // Only drags that begin on the brush move it.
            if !has_scales {
                start.markname = Some(format!("{}{}", name, BRUSH));
            }
            starts.push(start.clone());
        }

        let extent = |channel: Channel| {
            if has_scales {
                domain(ctx, channel)
            } else {
                format!(
                    "slice({})",
                    selection.channel_signal_name(channel, SignalRange::Visual)
                )
            }
        };
        let mut anchor_update = String::from("{x: x(unit), y: y(unit)");
        if x.is_some() {
            anchor_update.push_str(&format!(", extent_x: {}", extent(Channel::X)));
        }
        if y.is_some() {
            anchor_update.push_str(&format!(", extent_y: {}", extent(Channel::Y)));
        }
        anchor_update.push('}');

        signals.push(
            VgSignal::named(anchor.clone())
                .with_value(json!({}))
                .with_on(vec![VgOnEvent::new(VgEvents::from_streams(starts), anchor_update)]),
        );
        signals.push(
            VgSignal::named(delta.clone())
                .with_value(json!({}))
                .with_on(vec![VgOnEvent::new(
                    VgEvents::from_streams(streams),
                    format!("{{x: {a}.x - x(unit), y: {a}.y - y(unit)}}", a = anchor),
                )]),
        );

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

    let anchor = format!("{}{}", selection.name, ANCHOR);
    let delta = format!("{}{}", selection.name, DELTA);
    let size = ctx.size_signal(channel);
    let scale = ctx.scale(channel);
    let scale_type = scale.map(|s| s.scale_type);

    // Panning an x scale moves its domain against the drag direction.
    let sign = if has_scales && channel == Channel::X { "-" } else { "" };
    let extent = format!("{}.extent_{}", anchor, channel);
    let offset = format!(
        "{}{}.{} / {}",
        sign,
        delta,
        channel,
        if has_scales {
            size.clone()
        } else {
            format!("span({})", extent)
        }
    );
    let pan = match scale_type {
        Some(ScaleType::Log) if has_scales => "panLog",
        Some(ScaleType::Pow) if has_scales => "panPow",
        _ => "panLinear",
    };
    let exponent = match scale_type {
        Some(ScaleType::Pow) if has_scales => format!(
            ", {}",
            number_to_string(scale.and_then(|s| s.exponent).unwrap_or(1.0))
        ),
        _ => String::new(),
    };
    let update = format!("{}({}, {}{})", pan, extent, offset, exponent);

    signals[index].push_on(VgOnEvent::new(
        VgEvents::signal(delta),
        if has_scales {
            update
        } else {
            format!("clampRange({}, 0, {})", update, size)
        },
    ));
}
