//! Interval selections: a brushed range on the x and/or y channels.
//!
//! Each projected positional channel gets a pixel-space signal
//! (`<name>_<channel>`) driven by drag events and a data-space signal
//! (`<name>_<field>`) obtained by inverting the scale. The tuple collects the
//! data extents once all of them are set.

use super::events::EventStream;
use super::transforms::TransformCompiler;
use super::transforms::scales::Scales;
use super::{
    BRUSH, SCALE_TRIGGER, SelectionComponent, SelectionContext, SignalRange, Strategy,
};
use crate::channel::Channel;
use crate::error::CompileError;
use crate::spec::SelectionResolution;
use crate::util::string_value;
use crate::vega::{SignalRef, VgEvents, VgOnEvent, VgSignal};
use serde_json::{Map, Value, json};
use tracing::warn;

pub static INTERVAL: Strategy = Strategy {
    signals,
    modify_expr,
    marks: Some(marks),
};

/// Streams with a start/end range; anything else cannot drive a brush.
fn ranged_streams(selection: &SelectionComponent) -> Result<&[EventStream], CompileError> {
    if selection.events.iter().any(|e| e.between.is_empty()) {
        return Err(CompileError::IntervalWithoutBetween {
            selection: selection.name.clone(),
        });
    }
    Ok(&selection.events)
}

fn signals(
    ctx: &SelectionContext<'_>,
    selection: &SelectionComponent,
) -> Result<Vec<VgSignal>, CompileError> {
    let name = &selection.name;
    let has_scales = Scales.applies(selection);
    let mut events = ranged_streams(selection)?.to_vec();

    // Drags that start on the brush translate it rather than drawing anew.
    if selection.translate.is_some() && !has_scales {
        let filter = format!(
            "!event.item || event.item.mark.name !== {}",
            string_value(&format!("{}{}", name, BRUSH))
        );
        for stream in &mut events {
            if let Some(start) = stream.between.first_mut() {
                start.add_filter(&filter);
            }
        }
    }

    let mut signals = Vec::new();
    let mut tuple_triggers = Vec::new();
    let mut intervals = Vec::new();
    let mut scale_triggers = Vec::new();

    for projection in &selection.project {
        let channel = match projection.channel {
            Some(channel @ (Channel::X | Channel::Y)) => channel,
            _ => {
                warn!("Interval selections only support x and y encoding channels.");
                continue;
            }
        };
        let dname = selection.channel_signal_name(channel, SignalRange::Data);
        let vname = selection.channel_signal_name(channel, SignalRange::Visual);
        let scale = string_value(&ctx.scale_name(channel));
        let continuous = ctx
            .scale(channel)
            .is_some_and(|s| s.scale_type.has_continuous_domain());
        let to_num = if continuous { "+" } else { "" };

        signals.extend(channel_signals(ctx, selection, channel, &events));
        intervals.push(format!(
            "{{encoding: {}, field: {}, extent: {}}}",
            string_value(channel.as_str()),
            string_value(&projection.field),
            dname
        ));
        scale_triggers.push(format!(
            "(!isArray({d}) || ({n}invert({s}, {v})[0] === {n}{d}[0] && {n}invert({s}, {v})[1] === {n}{d}[1]))",
            d = dname,
            v = vname,
            s = scale,
            n = to_num
        ));
        tuple_triggers.push(dname);
    }
    if intervals.is_empty() {
        return Err(CompileError::IntervalWithoutPosition {
            selection: name.clone(),
        });
    }

    // Proxy scale changes so a filter touching the scale cannot loop back
    // into the brush.
    if !has_scales {
        let trigger = format!("{}{}", name, SCALE_TRIGGER);
        signals.push(VgSignal::named(trigger.clone()).with_update(format!(
            "{} ? {} : {{}}",
            scale_triggers.join(" && "),
            trigger
        )));
    }

    // Data extents are null while the pixel extent is empty, so a tuple is
    // only produced for a real interval.
    signals.push(
        VgSignal::named(selection.tuple_name()).with_on(vec![VgOnEvent::new(
            VgEvents::Signals(
                tuple_triggers
                    .iter()
                    .map(|t| SignalRef::new(t.clone()))
                    .collect(),
            ),
            format!(
                "{} ? {{unit: {}, intervals: [{}]}} : null",
                tuple_triggers.join(" && "),
                ctx.unit_name(),
                intervals.join(", ")
            ),
        )]),
    );
    Ok(signals)
}

/// Pixel and data extent signals for one positional channel.
fn channel_signals(
    ctx: &SelectionContext<'_>,
    selection: &SelectionComponent,
    channel: Channel,
    events: &[EventStream],
) -> Vec<VgSignal> {
    let vname = selection.channel_signal_name(channel, SignalRange::Visual);
    let dname = selection.channel_signal_name(channel, SignalRange::Data);
    if Scales.applies(selection) {
        return vec![VgSignal::named(dname).with_on(Vec::new())];
    }

    let scale = string_value(&ctx.scale_name(channel));
    let size = ctx.size_signal(channel);
    let coord = format!("{}(unit)", channel);

    let mut on = Vec::with_capacity(events.len() * 2 + 1);
    for stream in events {
        if let Some(start) = stream.between.first() {
            on.push(VgOnEvent::new(
                VgEvents::Stream(start.clone()),
                format!("[{c}, {c}]", c = coord),
            ));
        }
        on.push(VgOnEvent::new(
            VgEvents::Stream(stream.clone()),
            format!("[{}[0], clamp({}, 0, {})]", vname, coord, size),
        ));
    }

    // Only continuous, unbinned scales can be panned or zoomed; any other
    // domain change clears the brush.
    let interactive = ctx.scale(channel).is_some_and(|s| s.is_interactive());
    on.push(VgOnEvent::new(
        VgEvents::signal(format!("{}{}", selection.name, SCALE_TRIGGER)),
        if interactive {
            format!(
                "[scale({s}, {d}[0]), scale({s}, {d}[1])]",
                s = scale,
                d = dname
            )
        } else {
            "[0, 0]".to_string()
        },
    ));

    vec![
        VgSignal::named(vname.clone())
            .with_value(json!([]))
            .with_on(on),
        VgSignal::named(dname).with_on(vec![VgOnEvent::new(
            VgEvents::signal(vname.clone()),
            format!(
                "{v}[0] === {v}[1] ? null : invert({s}, {v})",
                v = vname,
                s = scale
            ),
        )]),
    ]
}

fn modify_expr(ctx: &SelectionContext<'_>, selection: &SelectionComponent) -> String {
    format!("{}, {}", selection.tuple_name(), ctx.unit_stamp(selection, "true"))
}

/// Two brush rects: a filled background under the unit's marks and a
/// transparent, stroked foreground above them that receives pointer events.
fn marks(ctx: &SelectionContext<'_>, selection: &SelectionComponent, marks: Vec<Value>) -> Vec<Value> {
    if Scales.applies(selection) {
        return marks;
    }
    let name = &selection.name;
    let (x, y) = selection.positional_projections();

    let position = |projected: bool, channel: &str, index: usize, fallback: Value| {
        if projected {
            json!({"signal": format!("{}_{}[{}]", name, channel, index)})
        } else {
            fallback
        }
    };
    let mut update = Map::new();
    update.insert("x".into(), position(x.is_some(), "x", 0, json!({"value": 0})));
    update.insert("y".into(), position(y.is_some(), "y", 0, json!({"value": 0})));
    update.insert(
        "x2".into(),
        position(x.is_some(), "x", 1, json!({"field": {"group": "width"}})),
    );
    update.insert(
        "y2".into(),
        position(y.is_some(), "y", 1, json!({"field": {"group": "height"}})),
    );

    // A global store holds one interval; hide the brush in every other unit.
    if selection.resolve == SelectionResolution::Global {
        let store = format!("data({})", string_value(&selection.store_name()));
        let test = format!(
            "{s}.length && {s}[0].unit === {u}",
            s = store,
            u = ctx.unit_name()
        );
        for value in update.values_mut() {
            let mut rule = Map::new();
            rule.insert("test".into(), Value::String(test.clone()));
            if let Value::Object(props) = value.take() {
                rule.extend(props);
            }
            *value = json!([Value::Object(rule), {"value": 0}]);
        }
    }
    let update = Value::Object(update);

    let brush = &selection.mark;
    let mut stroke = Map::new();
    if let Some(v) = &brush.stroke {
        stroke.insert("stroke".into(), json!({"value": v}));
    }
    if let Some(v) = brush.stroke_width {
        stroke.insert("strokeWidth".into(), json!({"value": v}));
    }
    if let Some(v) = &brush.stroke_dash {
        stroke.insert("strokeDash".into(), json!({"value": v}));
    }
    if let Some(v) = brush.stroke_dash_offset {
        stroke.insert("strokeDashOffset".into(), json!({"value": v}));
    }
    if let Some(v) = brush.stroke_opacity {
        stroke.insert("strokeOpacity".into(), json!({"value": v}));
    }
    let mut fg_enter = Map::new();
    fg_enter.insert("fill".into(), json!({"value": "transparent"}));
    fg_enter.extend(stroke);

    let background = json!({
        "name": format!("{}{}_bg", name, BRUSH),
        "type": "rect",
        "clip": true,
        "encode": {
            "enter": {
                "fill": {"value": brush.fill},
                "fillOpacity": {"value": brush.fill_opacity}
            },
            "update": update.clone()
        }
    });
    let foreground = json!({
        "name": format!("{}{}", name, BRUSH),
        "type": "rect",
        "clip": true,
        "encode": {
            "enter": Value::Object(fg_enter),
            "update": update
        }
    });

    let mut out = Vec::with_capacity(marks.len() + 2);
    out.push(background);
    out.extend(marks);
    out.push(foreground);
    out
}
