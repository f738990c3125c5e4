//! Default values for scale properties the user leaves unset.

use crate::channel::Channel;
use crate::config::ScaleConfig;
use crate::field::{FieldDef, FieldType};
use crate::scale::ScaleType;
use crate::spec::DomainSpec;
use crate::timeunit::smallest_unit;
use serde_json::Value;

pub fn nice(scale_type: ScaleType, channel: Channel, fd: &FieldDef) -> Option<Value> {
    if matches!(scale_type, ScaleType::Time | ScaleType::Utc) {
        return smallest_unit(fd.time_unit.as_ref()).map(Value::from);
    }
    if fd.bin.is_some() {
        return None;
    }
    Some(Value::Bool(channel.is_positional()))
}

pub fn padding(channel: Channel, scale_type: ScaleType, config: &ScaleConfig) -> Option<f64> {
    if channel.is_positional() && scale_type == ScaleType::Point {
        Some(config.point_padding)
    } else {
        None
    }
}

pub fn padding_inner(padding: Option<f64>, channel: Channel, config: &ScaleConfig) -> Option<f64> {
    if padding.is_none() && channel.is_positional() {
        Some(config.band_padding_inner)
    } else {
        None
    }
}

pub fn padding_outer(
    padding: Option<f64>,
    channel: Channel,
    scale_type: ScaleType,
    padding_inner: Option<f64>,
    config: &ScaleConfig,
) -> Option<f64> {
    if padding.is_some() || !channel.is_positional() || scale_type != ScaleType::Band {
        return None;
    }
    // Outer padding defaults to half the inner padding so bands look centered.
    config
        .band_padding_outer
        .or_else(|| padding_inner.map(|inner| inner / 2.0))
}

pub fn round(channel: Channel, config: &ScaleConfig) -> Option<bool> {
    if matches!(channel, Channel::X | Channel::Y | Channel::Row | Channel::Column) {
        config.round
    } else {
        None
    }
}

/// `zero` is on for quantitative size, and for non-binned x/y without a
/// custom domain.
pub fn zero(specified_domain: Option<&DomainSpec>, channel: Channel, fd: &FieldDef) -> bool {
    if channel == Channel::Size && fd.field_type == FieldType::Quantitative {
        return true;
    }
    let has_custom_domain = matches!(specified_domain, Some(DomainSpec::Values(_)));
    !has_custom_domain && fd.bin.is_none() && channel.is_positional()
}
