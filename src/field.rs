//! Field definitions and the naming rules that derive output field names
//! from them.

use crate::channel::Channel;
use crate::config::Config;
use crate::timeunit::TimeUnit;
use crate::util::{number_to_string, string_value, var_name};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Quantitative,
    Ordinal,
    Nominal,
    Temporal,
}

impl FieldType {
    pub fn is_discrete(&self) -> bool {
        matches!(self, FieldType::Ordinal | FieldType::Nominal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Count,
    Valid,
    Missing,
    Distinct,
    Sum,
    Mean,
    Average,
    Variance,
    Variancep,
    Stdev,
    Stdevp,
    Median,
    Q1,
    Q3,
    Ci0,
    Ci1,
    Min,
    Max,
    Argmin,
    Argmax,
}

impl AggregateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateOp::Count => "count",
            AggregateOp::Valid => "valid",
            AggregateOp::Missing => "missing",
            AggregateOp::Distinct => "distinct",
            AggregateOp::Sum => "sum",
            AggregateOp::Mean => "mean",
            AggregateOp::Average => "average",
            AggregateOp::Variance => "variance",
            AggregateOp::Variancep => "variancep",
            AggregateOp::Stdev => "stdev",
            AggregateOp::Stdevp => "stdevp",
            AggregateOp::Median => "median",
            AggregateOp::Q1 => "q1",
            AggregateOp::Q3 => "q3",
            AggregateOp::Ci0 => "ci0",
            AggregateOp::Ci1 => "ci1",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Argmin => "argmin",
            AggregateOp::Argmax => "argmax",
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binning parameters. Serialized in the canonical parameter order, which is
/// also the order `bin_to_string` walks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxbins: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minstep: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divide: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nice: Option<bool>,
}

impl BinParams {
    pub fn with_maxbins(maxbins: u32) -> Self {
        Self {
            maxbins: Some(maxbins),
            ..Default::default()
        }
    }

    /// `(name, value)` pairs of the set parameters, in canonical order.
    fn entries(&self) -> Vec<(&'static str, String)> {
        let join = |values: &[f64]| {
            values
                .iter()
                .map(|v| number_to_string(*v))
                .collect::<Vec<_>>()
                .join(",")
        };
        let mut out = Vec::new();
        if let Some(v) = self.maxbins {
            out.push(("maxbins", v.to_string()));
        }
        if let Some(v) = self.step {
            out.push(("step", number_to_string(v)));
        }
        if let Some(v) = &self.steps {
            out.push(("steps", join(v)));
        }
        if let Some(v) = self.minstep {
            out.push(("minstep", number_to_string(v)));
        }
        if let Some(v) = &self.divide {
            out.push(("divide", join(v)));
        }
        if let Some(v) = &self.extent {
            out.push(("extent", join(v)));
        }
        if let Some(v) = self.base {
            out.push(("base", number_to_string(v)));
        }
        if let Some(v) = self.nice {
            out.push(("nice", v.to_string()));
        }
        out
    }
}

/// A bin request as written in a specification: `true`/`false` or explicit
/// parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bin {
    Flag(bool),
    Params(BinParams),
}

/// Stable string form of a bin request, used in field names and node keys.
pub fn bin_to_string(bin: &Bin) -> String {
    match bin {
        Bin::Flag(_) => "bin".to_string(),
        Bin::Params(params) => {
            let mut out = String::from("bin");
            for (name, value) in params.entries() {
                out.push_str(&var_name(&format!("_{}_{}", name, value)));
            }
            out
        }
    }
}

/// Default maximum bin count for a channel.
pub fn auto_max_bins(channel: Option<Channel>) -> u32 {
    match channel {
        Some(
            Channel::Row
            | Channel::Column
            | Channel::Size
            | Channel::Color
            | Channel::Opacity
            | Channel::Shape,
        ) => 6,
        _ => 10,
    }
}

/// Resolves a bin request to explicit parameters, or `None` when binning is off.
pub fn normalize_bin(bin: &Bin, channel: Option<Channel>) -> Option<BinParams> {
    match bin {
        Bin::Flag(true) => Some(BinParams::with_maxbins(auto_max_bins(channel))),
        Bin::Flag(false) => None,
        Bin::Params(params) => Some(params.clone()),
    }
}

/// A normalized field definition on an encoding channel.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub field: Option<String>,
    pub field_type: FieldType,
    pub aggregate: Option<AggregateOp>,
    pub bin: Option<BinParams>,
    pub time_unit: Option<TimeUnit>,
}

impl FieldDef {
    pub fn new(field: &str, field_type: FieldType) -> Self {
        Self {
            field: Some(field.to_string()),
            field_type,
            aggregate: None,
            bin: None,
            time_unit: None,
        }
    }

    pub fn is_count(&self) -> bool {
        self.aggregate == Some(AggregateOp::Count)
    }

    /// The source field, `*` for a field-less count.
    pub fn field_or_star(&self) -> &str {
        self.field.as_deref().unwrap_or("*")
    }
}

/// Suffix appended to binned field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinSuffix {
    End,
    Range,
}

impl BinSuffix {
    fn as_str(&self) -> &'static str {
        match self {
            BinSuffix::End => "end",
            BinSuffix::Range => "range",
        }
    }
}

/// Output field name for a field definition.
pub fn vg_field(fd: &FieldDef) -> String {
    vg_field_with(fd, None)
}

pub fn vg_field_with(fd: &FieldDef, bin_suffix: Option<BinSuffix>) -> String {
    if fd.is_count() {
        return "count_*".to_string();
    }
    let mut suffix = None;
    let prefix = if let Some(bin) = &fd.bin {
        suffix = bin_suffix;
        Some(bin_to_string(&Bin::Params(bin.clone())))
    } else if let Some(op) = fd.aggregate {
        Some(op.as_str().to_string())
    } else {
        fd.time_unit.as_ref().map(|unit| unit.as_str().to_string())
    };

    let mut name = match (prefix, &fd.field) {
        (Some(prefix), Some(field)) => format!("{}_{}", prefix, field),
        (Some(prefix), None) => prefix,
        (None, Some(field)) => field.clone(),
        (None, None) => String::new(),
    };
    if let Some(suffix) = suffix {
        name = format!("{}_{}", name, suffix.as_str());
    }
    name
}

/// `datum["<vg_field>"]` form of the output field name.
pub fn vg_field_expr(fd: &FieldDef, bin_suffix: Option<BinSuffix>) -> String {
    format!("datum[{}]", string_value(&vg_field_with(fd, bin_suffix)))
}

/// Whether a binned field needs a formatted `start - end` label field.
///
/// That is the case when a binned field is forced onto a discrete scale, so
/// guides show the range instead of the raw bin edges.
pub fn bin_requires_range(fd: &FieldDef, channel: Channel) -> bool {
    fd.bin.is_some() && channel.is_scale_channel() && fd.field_type.is_discrete()
}

/// `format(start, fmt) + " - " + format(end, fmt)`.
pub fn bin_format_expression(
    start_field: &str,
    end_field: &str,
    format: Option<&str>,
    config: &Config,
) -> String {
    let format = string_value(format.unwrap_or(&config.number_format));
    format!(
        "format({}, {}) + \" - \" + format({}, {})",
        start_field, format, end_field, format
    )
}
