use crate::channel::Channel;
use crate::field::{BinSuffix, FieldDef, vg_field_with};
use crate::scale::ScaleComponent;
use crate::selection::SelectionComponent;
use crate::spec::{Mark, ScaleSpec};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeMap;

/// What one channel of a unit encodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelEncoding {
    /// Usually one entry; `detail` and `tooltip` may carry several.
    pub field_defs: Vec<FieldDef>,
    pub condition: Option<FieldDef>,
    pub value: Option<Value>,
    pub scale: Option<ScaleSpec>,
    pub axis_format: Option<String>,
    pub legend_format: Option<String>,
}

impl ChannelEncoding {
    pub fn field(fd: FieldDef) -> Self {
        Self {
            field_defs: vec![fd],
            ..Default::default()
        }
    }
}

/// A single-mark view.
#[derive(Debug, Clone)]
pub struct UnitModel {
    pub mark: Mark,
    pub clip: Option<bool>,
    pub encoding: BTreeMap<Channel, ChannelEncoding>,
    pub scales: BTreeMap<Channel, ScaleComponent>,
    pub selections: IndexMap<String, SelectionComponent>,
}

impl UnitModel {
    pub fn new(mark: Mark) -> Self {
        Self {
            mark,
            clip: None,
            encoding: BTreeMap::new(),
            scales: BTreeMap::new(),
            selections: IndexMap::new(),
        }
    }

    pub fn field_def(&self, channel: Channel) -> Option<&FieldDef> {
        self.encoding
            .get(&channel)
            .and_then(|enc| enc.field_defs.first())
    }

    /// Every `(channel, field def)` pair, in canonical channel order.
    pub fn channel_field_defs(&self) -> impl Iterator<Item = (Channel, &FieldDef)> {
        self.encoding
            .iter()
            .flat_map(|(channel, enc)| enc.field_defs.iter().map(move |fd| (*channel, fd)))
    }

    /// Field defs nested in conditional encodings.
    pub fn condition_field_defs(&self) -> impl Iterator<Item = (Channel, &FieldDef)> {
        self.encoding
            .iter()
            .filter_map(|(channel, enc)| enc.condition.as_ref().map(|fd| (*channel, fd)))
    }

    pub fn axis_format(&self, channel: Channel) -> Option<&str> {
        self.encoding.get(&channel)?.axis_format.as_deref()
    }

    pub fn legend_format(&self, channel: Channel) -> Option<&str> {
        self.encoding.get(&channel)?.legend_format.as_deref()
    }

    /// Axis format, else legend format.
    pub fn guide_format(&self, channel: Channel) -> Option<&str> {
        self.axis_format(channel).or_else(|| self.legend_format(channel))
    }

    pub fn scale(&self, channel: Channel) -> Option<&ScaleComponent> {
        self.scales.get(&channel)
    }

    pub fn vg_field(&self, channel: Channel, suffix: Option<BinSuffix>) -> Option<String> {
        self.field_def(channel).map(|fd| vg_field_with(fd, suffix))
    }
}
