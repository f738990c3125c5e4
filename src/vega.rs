//! Output wire types of the target visualization grammar.
//!
//! Every optional field is skipped when unset so the serialized JSON matches
//! what the grammar's runtime expects field for field. Marks are kept as
//! plain `serde_json::Value`s since only their names and a handful of
//! encode properties are produced here.

use crate::field::BinParams;
use crate::selection::events::EventStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRef {
    pub signal: String,
}

impl SignalRef {
    pub fn new(signal: impl Into<String>) -> Self {
        Self {
            signal: signal.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VgTransform {
    Extent {
        field: String,
        signal: String,
    },
    Bin(VgBinTransform),
    Formula {
        expr: String,
        #[serde(rename = "as")]
        as_field: String,
    },
    Filter {
        expr: String,
    },
    Aggregate {
        groupby: Vec<String>,
        ops: Vec<String>,
        fields: Vec<String>,
        #[serde(rename = "as")]
        as_fields: Vec<String>,
    },
    Identifier {
        #[serde(rename = "as")]
        as_field: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VgBinTransform {
    pub field: String,
    #[serde(rename = "as")]
    pub as_fields: [String; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    /// Parameters other than `extent`, which is emitted separately.
    #[serde(flatten)]
    pub params: BinParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<VgBinExtent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VgBinExtent {
    Values([f64; 2]),
    Signal(SignalRef),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VgData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transform: Vec<VgTransform>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VgSignal {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<Vec<VgOnEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push: Option<String>,
}

impl VgSignal {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_update(mut self, update: impl Into<String>) -> Self {
        self.update = Some(update.into());
        self
    }

    pub fn with_on(mut self, on: Vec<VgOnEvent>) -> Self {
        self.on = Some(on);
        self
    }

    /// Appends an event handler, creating the `on` list if needed.
    pub fn push_on(&mut self, handler: VgOnEvent) {
        self.on.get_or_insert_with(Vec::new).push(handler);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VgOnEvent {
    pub events: VgEvents,
    pub update: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

impl VgOnEvent {
    pub fn new(events: VgEvents, update: impl Into<String>) -> Self {
        Self {
            events,
            update: update.into(),
            force: None,
        }
    }

    pub fn forced(mut self) -> Self {
        self.force = Some(true);
        self
    }
}

/// What an event handler listens to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VgEvents {
    Stream(EventStream),
    Streams(Vec<EventStream>),
    Signal(SignalRef),
    Signals(Vec<SignalRef>),
    Selector(String),
}

impl VgEvents {
    /// A single stream serializes as an object, several as an array.
    pub fn from_streams(mut streams: Vec<EventStream>) -> Self {
        if streams.len() == 1 {
            VgEvents::Stream(streams.remove(0))
        } else {
            VgEvents::Streams(streams)
        }
    }

    pub fn signal(name: impl Into<String>) -> Self {
        VgEvents::Signal(SignalRef::new(name))
    }
}
