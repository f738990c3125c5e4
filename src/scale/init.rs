//! Scale initialization: choose a scale type, then fill every property the
//! type supports from the user's value or a rule-based default.
//!
//! Unsupported or incompatible user values are dropped with a warning,
//! never rejected.

use crate::channel::Channel;
use crate::config::Config;
use crate::field::{AggregateOp, BinSuffix, FieldDef, FieldType, bin_requires_range, vg_field, vg_field_with};
use crate::scale::{ScaleComponent, ScaleType, channel_property_incompatibility, rules};
use crate::spec::{DomainKeyword, DomainSpec, Mark, ScaleSpec};
use serde_json::{Value, json};
use tracing::warn;

/// Everything scale initialization needs to know about one encoded channel.
pub struct ScaleInput<'a> {
    pub name: String,
    /// Dataset the default domain reads from.
    pub data: &'a str,
    pub channel: Channel,
    pub field_def: &'a FieldDef,
    pub specified: &'a ScaleSpec,
    pub mark: Mark,
    /// Explicit width (x) or height (y) of the view, which disables range steps.
    pub top_level_size: Option<f64>,
    /// Signal holding the width (x) or height (y) of the scale's view.
    pub size_signal: Option<String>,
}

pub fn init_scale(input: &ScaleInput<'_>, config: &Config) -> ScaleComponent {
    let channel = input.channel;
    let fd = input.field_def;
    let specified = input.specified;
    let scale_config = &config.scale;

    let scale_type = scale_type(specified.scale_type, fd, channel, input.mark);
    let mut scale = ScaleComponent::new(input.name.clone(), scale_type);

    let specified_values = match &specified.domain {
        Some(DomainSpec::Values(values)) => Some(Value::Array(values.clone())),
        _ => None,
    };
    scale.domain = resolve(specified_values, "domain", scale_type, channel, || {
        Some(default_domain(input, scale_type))
    });
    scale.round = resolve(specified.round, "round", scale_type, channel, || {
        rules::round(channel, scale_config)
    });
    scale.clamp = resolve(specified.clamp, "clamp", scale_type, channel, || {
        scale_config.clamp
    });
    scale.nice = resolve(specified.nice.clone(), "nice", scale_type, channel, || {
        rules::nice(scale_type, channel, fd)
    });
    scale.exponent = resolve(specified.exponent, "exponent", scale_type, channel, || None);
    scale.zero = resolve(specified.zero, "zero", scale_type, channel, || {
        Some(rules::zero(specified.domain.as_ref(), channel, fd))
    });
    scale.padding = resolve(specified.padding, "padding", scale_type, channel, || {
        rules::padding(channel, scale_type, scale_config)
    });
    let padding = scale.padding;
    scale.padding_inner = resolve(specified.padding_inner, "paddingInner", scale_type, channel, || {
        rules::padding_inner(padding, channel, scale_config)
    });
    let padding_inner = scale.padding_inner;
    scale.padding_outer = resolve(specified.padding_outer, "paddingOuter", scale_type, channel, || {
        rules::padding_outer(padding, channel, scale_type, padding_inner, scale_config)
    });
    scale.interpolate = resolve(
        specified.interpolate.clone(),
        "interpolate",
        scale_type,
        channel,
        || None,
    );
    scale.reverse = resolve(specified.reverse, "reverse", scale_type, channel, || None);
    scale.base = resolve(specified.base, "base", scale_type, channel, || None);

    let (range, scheme) = range_mixin(input, scale_type, config);
    scale.range = range;
    scale.scheme = scheme;
    scale
}

/// Picks the user's value if the scale type and channel accept it, else the
/// default when the property applies at all.
fn resolve<T>(
    specified: Option<T>,
    property: &str,
    scale_type: ScaleType,
    channel: Channel,
    default: impl FnOnce() -> Option<T>,
) -> Option<T> {
    let supported = scale_type.supports_property(property);
    let incompatibility = channel_property_incompatibility(channel, property);
    match specified {
        Some(_) if !supported => {
            warn!(
                "Scale type \"{}\" does not work with scale property \"{}\" on channel \"{}\".",
                scale_type, property, channel
            );
            None
        }
        Some(_) if incompatibility.is_some() => {
            if let Some(reason) = incompatibility {
                warn!("{}", reason);
            }
            None
        }
        Some(value) => Some(value),
        None if supported && incompatibility.is_none() => default(),
        None => None,
    }
}

/// The scale type for a channel: the user's choice when it suits both the
/// channel and the field, otherwise the default for the field type.
pub fn scale_type(
    specified: Option<ScaleType>,
    fd: &FieldDef,
    channel: Channel,
    mark: Mark,
) -> ScaleType {
    let default = default_type(fd, channel, mark);
    let Some(specified) = specified else {
        return default;
    };
    if !specified.supports_channel(channel) {
        warn!(
            "Channel \"{}\" does not work with \"{}\" scale. We are using \"{}\" scale instead.",
            channel, specified, default
        );
        return default;
    }
    if !field_matches_scale_type(specified, fd) {
        warn!(
            "Field \"{}\" of type \"{:?}\" does not work with \"{}\" scale. We are using \"{}\" scale instead.",
            fd.field_or_star(),
            fd.field_type,
            specified,
            default
        );
        return default;
    }
    specified
}

fn default_type(fd: &FieldDef, channel: Channel, mark: Mark) -> ScaleType {
    if matches!(channel, Channel::Row | Channel::Column) {
        return ScaleType::Band;
    }
    let discrete_range = channel.has_discrete_range();
    match fd.field_type {
        FieldType::Nominal => {
            if channel == Channel::Color || discrete_range {
                ScaleType::Ordinal
            } else {
                discrete_to_continuous_type(channel, mark)
            }
        }
        FieldType::Ordinal => {
            if channel == Channel::Color {
                ScaleType::Ordinal
            } else if discrete_range {
                if channel != Channel::Shape {
                    warn_discrete_channel(channel, "ordinal");
                }
                ScaleType::Ordinal
            } else {
                discrete_to_continuous_type(channel, mark)
            }
        }
        FieldType::Temporal => {
            if channel == Channel::Color {
                ScaleType::Sequential
            } else if discrete_range {
                warn_discrete_channel(channel, "temporal");
                ScaleType::Ordinal
            } else {
                ScaleType::Time
            }
        }
        FieldType::Quantitative => {
            if channel == Channel::Color {
                if fd.bin.is_some() {
                    ScaleType::BinOrdinal
                } else {
                    ScaleType::Sequential
                }
            } else if discrete_range {
                warn_discrete_channel(channel, "quantitative");
                ScaleType::Ordinal
            } else if fd.bin.is_some() && !channel.is_positional() {
                ScaleType::BinLinear
            } else {
                ScaleType::Linear
            }
        }
    }
}

fn warn_discrete_channel(channel: Channel, field_type: &str) {
    warn!(
        "Using discrete channel \"{}\" to encode \"{}\" field can be misleading as it does not encode order.",
        channel, field_type
    );
}

fn discrete_to_continuous_type(channel: Channel, mark: Mark) -> ScaleType {
    if channel.is_positional() && matches!(mark, Mark::Bar | Mark::Rect) {
        ScaleType::Band
    } else {
        ScaleType::Point
    }
}

fn field_matches_scale_type(specified: ScaleType, fd: &FieldDef) -> bool {
    match fd.field_type {
        FieldType::Nominal | FieldType::Ordinal => specified.has_discrete_domain(),
        FieldType::Temporal => matches!(
            specified,
            ScaleType::Time | ScaleType::Utc | ScaleType::Sequential
        ),
        FieldType::Quantitative if fd.bin.is_some() => matches!(
            specified,
            ScaleType::BinLinear | ScaleType::BinOrdinal | ScaleType::Linear
        ),
        FieldType::Quantitative => matches!(
            specified,
            ScaleType::Log
                | ScaleType::Pow
                | ScaleType::Sqrt
                | ScaleType::Linear
                | ScaleType::Sequential
        ),
    }
}

/// Data domain read from the unit's main dataset.
fn default_domain(input: &ScaleInput<'_>, scale_type: ScaleType) -> Value {
    let fd = input.field_def;
    let data = input.data;
    let unaggregated = matches!(
        input.specified.domain,
        Some(DomainSpec::Keyword(DomainKeyword::Unaggregated))
    );

    if unaggregated && fd.aggregate.is_some() && scale_type.has_continuous_domain() {
        let with_op = |op: AggregateOp| {
            vg_field(&FieldDef {
                aggregate: Some(op),
                ..fd.clone()
            })
        };
        return json!({
            "data": data,
            "fields": [with_op(AggregateOp::Min), with_op(AggregateOp::Max)],
        });
    }
    if fd.bin.is_some() {
        if bin_requires_range(fd, input.channel) {
            return json!({
                "data": data,
                "field": vg_field_with(fd, Some(BinSuffix::Range)),
                "sort": {"field": vg_field(fd), "op": "min"},
            });
        }
        if scale_type.has_continuous_domain() {
            return json!({
                "data": data,
                "fields": [vg_field(fd), vg_field_with(fd, Some(BinSuffix::End))],
            });
        }
    }
    json!({"data": data, "field": vg_field(fd)})
}

/// `range` and `scheme`, of which at most one is set.
fn range_mixin(
    input: &ScaleInput<'_>,
    scale_type: ScaleType,
    config: &Config,
) -> (Option<Value>, Option<Value>) {
    let channel = input.channel;
    let specified = input.specified;

    if let Some(range) = &specified.range {
        if range_property_allowed("range", scale_type, channel) {
            return (Some(range.clone()), None);
        }
    }
    if let Some(Some(step)) = specified.range_step {
        if range_property_allowed("rangeStep", scale_type, channel) {
            if input.top_level_size.is_none() {
                return (Some(json!({"step": step})), None);
            }
            warn!(
                "Range step for \"{}\" is dropped as top-level {} is provided.",
                channel,
                channel.size_name().unwrap_or("size")
            );
        }
    }
    if let Some(scheme) = &specified.scheme {
        if range_property_allowed("scheme", scale_type, channel) {
            return (None, Some(scheme.clone()));
        }
    }

    let range = match channel {
        Channel::X | Channel::Y => {
            let can_have_range_step = input.top_level_size.is_none()
                && specified.range_step != Some(None)
                && config.scale.range_step.is_some();
            let step = if channel == Channel::X && input.mark == Mark::Text {
                Some(config.scale.text_x_range_step)
            } else {
                config.scale.range_step
            };
            match step {
                Some(step)
                    if can_have_range_step
                        && matches!(scale_type, ScaleType::Point | ScaleType::Band) =>
                {
                    json!({"step": step})
                }
                _ => {
                    let size = input
                        .size_signal
                        .clone()
                        .unwrap_or_else(|| channel.size_name().unwrap_or("width").to_string());
                    if channel == Channel::X {
                        json!([0, {"signal": size}])
                    } else {
                        json!([{"signal": size}, 0])
                    }
                }
            }
        }
        Channel::Size => json!([9, 361]),
        Channel::Shape => json!("symbol"),
        Channel::Opacity => json!([0.3, 0.8]),
        Channel::Color => {
            if scale_type.has_discrete_domain() && scale_type != ScaleType::BinOrdinal {
                json!("category")
            } else {
                json!("ramp")
            }
        }
        _ => return (None, None),
    };
    (Some(range), None)
}

fn range_property_allowed(property: &str, scale_type: ScaleType, channel: Channel) -> bool {
    if !scale_type.supports_property(property) {
        warn!(
            "Scale type \"{}\" does not work with scale property \"{}\" on channel \"{}\".",
            scale_type, property, channel
        );
        return false;
    }
    if let Some(reason) = channel_property_incompatibility(channel, property) {
        warn!("{}", reason);
        return false;
    }
    true
}
