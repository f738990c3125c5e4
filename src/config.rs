//! Compilation configuration.
//!
//! A [`Config`] is read once (usually from the `config` key of a chart
//! specification) and then shared by reference with every compilation
//! step. Nothing in the compiler mutates it.

use crate::channel::Channel;
use crate::spec::{BoolOrString, BrushConfig, Empty, SelectionProps, SelectionResolution};
use crate::util::number_to_string;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// d3 number format used for bin range labels when no guide format is set.
    pub number_format: String,
    pub view: ViewConfig,
    pub scale: ScaleConfig,
    pub selection: SelectionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            number_format: "s".to_string(),
            view: ViewConfig::default(),
            scale: ScaleConfig::default(),
            selection: SelectionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 200.0,
        }
    }
}

impl ViewConfig {
    /// Default size for a positional channel's size signal, as an expression.
    pub fn size_expr(&self, channel: Channel) -> String {
        match channel {
            Channel::Y => number_to_string(self.height),
            _ => number_to_string(self.width),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScaleConfig {
    pub round: Option<bool>,
    /// Default step for band/point scales. `null` turns range steps off.
    pub range_step: Option<f64>,
    pub text_x_range_step: f64,
    pub point_padding: f64,
    pub band_padding_inner: f64,
    pub band_padding_outer: Option<f64>,
    pub clamp: Option<bool>,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            round: Some(true),
            range_step: Some(21.0),
            text_x_range_step: 90.0,
            point_padding: 0.5,
            band_padding_inner: 0.1,
            band_padding_outer: None,
            clamp: None,
        }
    }
}

/// Per-type selection defaults. A selection definition inherits every
/// property it leaves unset (or sets to `true`) from here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub single: SelectionProps,
    pub multi: SelectionProps,
    pub interval: SelectionProps,
}

pub const SELECTION_ID: &str = "_vgsid_";

const INTERVAL_DRAG: &str = "[mousedown, window:mouseup] > window:mousemove!";

impl Default for SelectionConfig {
    fn default() -> Self {
        let single = SelectionProps {
            on: Some("click".to_string()),
            fields: Some(vec![SELECTION_ID.to_string()]),
            resolve: Some(SelectionResolution::Global),
            empty: Some(Empty::All),
            clear: Some(BoolOrString::Str("dblclick".to_string())),
            ..Default::default()
        };
        let multi = SelectionProps {
            toggle: Some(BoolOrString::Str("event.shiftKey".to_string())),
            ..single.clone()
        };
        let interval = SelectionProps {
            on: Some(INTERVAL_DRAG.to_string()),
            encodings: Some(vec![Channel::X, Channel::Y]),
            translate: Some(BoolOrString::Str(INTERVAL_DRAG.to_string())),
            zoom: Some(BoolOrString::Str("wheel!".to_string())),
            mark: Some(BrushConfig {
                fill: Some("#333".to_string()),
                fill_opacity: Some(0.125),
                stroke: Some("white".to_string()),
                ..Default::default()
            }),
            resolve: Some(SelectionResolution::Global),
            clear: Some(BoolOrString::Str("dblclick".to_string())),
            ..Default::default()
        };
        Self {
            single,
            multi,
            interval,
        }
    }
}
