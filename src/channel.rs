use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoding channels, declared in canonical order. `Ord` follows this order,
/// so a `BTreeMap<Channel, _>` iterates channels the way the compiler expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    X,
    Y,
    X2,
    Y2,
    Row,
    Column,
    Color,
    Opacity,
    Size,
    Shape,
    Text,
    Tooltip,
    Detail,
    Order,
}

impl Channel {
    pub const ALL: [Channel; 14] = [
        Channel::X,
        Channel::Y,
        Channel::X2,
        Channel::Y2,
        Channel::Row,
        Channel::Column,
        Channel::Color,
        Channel::Opacity,
        Channel::Size,
        Channel::Shape,
        Channel::Text,
        Channel::Tooltip,
        Channel::Detail,
        Channel::Order,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::X2 => "x2",
            Channel::Y2 => "y2",
            Channel::Row => "row",
            Channel::Column => "column",
            Channel::Color => "color",
            Channel::Opacity => "opacity",
            Channel::Size => "size",
            Channel::Shape => "shape",
            Channel::Text => "text",
            Channel::Tooltip => "tooltip",
            Channel::Detail => "detail",
            Channel::Order => "order",
        }
    }

    /// Channels that own a scale.
    pub fn is_scale_channel(&self) -> bool {
        matches!(
            self,
            Channel::X
                | Channel::Y
                | Channel::Color
                | Channel::Opacity
                | Channel::Size
                | Channel::Shape
        )
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, Channel::X | Channel::Y)
    }

    /// Channels whose output range is a set of discrete values.
    pub fn has_discrete_range(&self) -> bool {
        matches!(self, Channel::Shape | Channel::Row | Channel::Column)
    }

    /// The size signal a positional channel spans.
    pub fn size_name(&self) -> Option<&'static str> {
        match self {
            Channel::X => Some("width"),
            Channel::Y => Some("height"),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
