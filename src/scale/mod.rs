//! Scales: types, which properties each type supports, and the parsed
//! per-channel component.

pub mod init;
pub mod rules;

use crate::channel::Channel;
use crate::vega::SignalRef;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaleType {
    Linear,
    BinLinear,
    Log,
    Pow,
    Sqrt,
    Time,
    Utc,
    Sequential,
    Ordinal,
    BinOrdinal,
    Point,
    Band,
}

impl ScaleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleType::Linear => "linear",
            ScaleType::BinLinear => "bin-linear",
            ScaleType::Log => "log",
            ScaleType::Pow => "pow",
            ScaleType::Sqrt => "sqrt",
            ScaleType::Time => "time",
            ScaleType::Utc => "utc",
            ScaleType::Sequential => "sequential",
            ScaleType::Ordinal => "ordinal",
            ScaleType::BinOrdinal => "bin-ordinal",
            ScaleType::Point => "point",
            ScaleType::Band => "band",
        }
    }

    /// Continuous domain mapped onto a continuous range.
    pub fn is_continuous_to_continuous(&self) -> bool {
        matches!(
            self,
            ScaleType::Linear
                | ScaleType::BinLinear
                | ScaleType::Log
                | ScaleType::Pow
                | ScaleType::Sqrt
                | ScaleType::Time
                | ScaleType::Utc
        )
    }

    pub fn has_continuous_domain(&self) -> bool {
        self.is_continuous_to_continuous() || *self == ScaleType::Sequential
    }

    pub fn has_discrete_domain(&self) -> bool {
        matches!(
            self,
            ScaleType::Ordinal | ScaleType::BinOrdinal | ScaleType::Point | ScaleType::Band
        )
    }

    pub fn is_bin_scale(&self) -> bool {
        matches!(self, ScaleType::BinLinear | ScaleType::BinOrdinal)
    }

    /// Whether the scale type accepts the named scale property.
    pub fn supports_property(&self, property: &str) -> bool {
        match property {
            "type" | "domain" | "reverse" | "range" => true,
            "scheme" => matches!(
                self,
                ScaleType::Sequential | ScaleType::Ordinal | ScaleType::BinOrdinal
            ),
            "interpolate" => self.is_continuous_to_continuous(),
            "round" | "padding" => {
                self.is_continuous_to_continuous()
                    || matches!(self, ScaleType::Band | ScaleType::Point)
            }
            "paddingOuter" | "rangeStep" => matches!(self, ScaleType::Point | ScaleType::Band),
            "paddingInner" => *self == ScaleType::Band,
            "clamp" | "nice" => self.has_continuous_domain(),
            "exponent" => *self == ScaleType::Pow,
            "base" => *self == ScaleType::Log,
            "zero" => {
                self.has_continuous_domain()
                    && !matches!(
                        self,
                        ScaleType::Log | ScaleType::Time | ScaleType::Utc | ScaleType::BinLinear
                    )
            }
            _ => false,
        }
    }

    /// Whether a channel can be encoded with this scale type at all.
    pub fn supports_channel(&self, channel: Channel) -> bool {
        match channel {
            Channel::Shape => *self == ScaleType::Ordinal,
            Channel::Color => !matches!(self, ScaleType::Band | ScaleType::Point),
            Channel::X | Channel::Y | Channel::Size | Channel::Opacity => !matches!(
                self,
                ScaleType::Ordinal | ScaleType::BinOrdinal | ScaleType::Sequential
            ),
            _ => false,
        }
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason a property cannot be customized on a channel, if any.
pub fn channel_property_incompatibility(channel: Channel, property: &str) -> Option<String> {
    match property {
        "range" if channel.is_positional() => Some(
            "Cannot use a custom range with x or y; use width, height or rangeStep instead"
                .to_string(),
        ),
        "interpolate" | "scheme" if channel != Channel::Color => Some(format!(
            "Cannot use the scale property \"{}\" with non-color channel \"{}\"",
            property, channel
        )),
        _ => None,
    }
}

/// A fully initialized scale for one channel of a unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleComponent {
    pub name: String,
    #[serde(rename = "type")]
    pub scale_type: ScaleType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Value>,
    /// Set when an interval selection drives this scale's domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_raw: Option<SignalRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clamp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nice: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exponent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zero: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_inner: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_outer: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpolate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Value>,
}

impl ScaleComponent {
    pub fn new(name: impl Into<String>, scale_type: ScaleType) -> Self {
        Self {
            name: name.into(),
            scale_type,
            domain: None,
            domain_raw: None,
            round: None,
            clamp: None,
            nice: None,
            exponent: None,
            zero: None,
            padding: None,
            padding_inner: None,
            padding_outer: None,
            interpolate: None,
            reverse: None,
            base: None,
            range: None,
            scheme: None,
        }
    }

    /// Continuous, non-binned scales can be panned and zoomed.
    pub fn is_interactive(&self) -> bool {
        self.scale_type.has_continuous_domain() && !self.scale_type.is_bin_scale()
    }
}
