//! Binning of quantitative fields.
//!
//! A bin node holds one component per `(bin parameters, field)` key. The
//! key is also the start field's name, so encodings and explicit bin
//! transforms over the same field and parameters land on the same key and
//! collapse into one component when their nodes merge.

use super::FieldSet;
use crate::config::Config;
use crate::field::{
    Bin, BinParams, BinSuffix, FieldDef, FieldType, bin_format_expression, bin_requires_range,
    bin_to_string, normalize_bin, vg_field_expr, vg_field_with,
};
use crate::model::Model;
use crate::spec::BinTransform;
use crate::vega::{SignalRef, VgBinExtent, VgBinTransform, VgTransform};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub struct BinComponent {
    pub bin: BinParams,
    pub field: String,
    /// Start and end output fields.
    pub as_fields: [String; 2],
    /// Signal the bin transform publishes its bin boundaries on.
    pub signal: Option<String>,
    /// Signal holding the field's extent when no explicit extent is given.
    pub extent_signal: Option<String>,
    /// `"start - end"` label expression, for binned fields on discrete scales.
    pub formula: Option<String>,
    pub formula_as: Option<String>,
}

impl BinComponent {
    /// Fills whatever `self` lacks from `other`; set values are kept.
    fn fill_from(&mut self, other: BinComponent) {
        if self.signal.is_none() {
            self.signal = other.signal;
        }
        if self.extent_signal.is_none() {
            self.extent_signal = other.extent_signal;
        }
        if self.formula.is_none() {
            self.formula = other.formula;
            self.formula_as = other.formula_as;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BinNode {
    pub bins: IndexMap<String, BinComponent, ahash::RandomState>,
}

pub fn bin_key(bin: &BinParams, field: &str) -> String {
    format!("{}_{}", bin_to_string(&Bin::Params(bin.clone())), field)
}

fn component(
    model: &Model,
    bin: BinParams,
    field: &str,
    as_fields: [String; 2],
) -> (String, BinComponent) {
    let key = bin_key(&bin, field);
    let component = BinComponent {
        bin,
        field: field.to_string(),
        as_fields,
        signal: Some(model.get_name(&format!("{}_bins", key))),
        extent_signal: Some(model.get_name(&format!("{}_extent", key))),
        formula: None,
        formula_as: None,
    };
    (key, component)
}

impl BinNode {
    /// One component per distinct binned field of a unit's encoding.
    pub fn make_from_encoding(model: &Model, config: &Config) -> Option<Self> {
        let unit = model.as_unit()?;
        let mut bins: IndexMap<String, BinComponent, ahash::RandomState> = IndexMap::default();

        let field_defs = unit.channel_field_defs().chain(unit.condition_field_defs());
        for (channel, fd) in field_defs {
            let (Some(bin), Some(field)) = (&fd.bin, &fd.field) else {
                continue;
            };
            let as_fields = [vg_field_with(fd, None), vg_field_with(fd, Some(BinSuffix::End))];
            let (key, mut created) = component(model, bin.clone(), field, as_fields);

            if bin_requires_range(fd, channel) {
                created.formula = Some(bin_format_expression(
                    &vg_field_expr(fd, None),
                    &vg_field_expr(fd, Some(BinSuffix::End)),
                    unit.guide_format(channel),
                    config,
                ));
                created.formula_as = Some(vg_field_with(fd, Some(BinSuffix::Range)));
            }

            match bins.get_mut(&key) {
                Some(existing) => existing.fill_from(created),
                None => {
                    bins.insert(key, created);
                }
            }
        }

        if bins.is_empty() {
            None
        } else {
            Some(Self { bins })
        }
    }

    /// A single component from an explicit bin transform. Without `as`, the
    /// output fields are named as an encoding would name them.
    pub fn make_from_transform(model: &Model, transform: &BinTransform) -> Self {
        let bin = normalize_bin(&transform.bin, None).unwrap_or_default();
        let as_fields = match &transform.as_field {
            Some(start) => [start.clone(), format!("{}_end", start)],
            None => {
                let fd = FieldDef {
                    bin: Some(bin.clone()),
                    ..FieldDef::new(&transform.field, FieldType::Quantitative)
                };
                [vg_field_with(&fd, None), vg_field_with(&fd, Some(BinSuffix::End))]
            }
        };
        let (key, component) = component(model, bin, &transform.field, as_fields);
        let mut bins = IndexMap::default();
        bins.insert(key, component);
        Self { bins }
    }

    /// Takes over `other`'s components. On a shared key the components
    /// describe the same binning, so this node's values are kept and only
    /// its missing signals or label formula are filled in.
    pub fn merge(&mut self, other: BinNode) {
        for (key, component) in other.bins {
            match self.bins.get_mut(&key) {
                Some(existing) => existing.fill_from(component),
                None => {
                    self.bins.insert(key, component);
                }
            }
        }
    }

    pub fn produced_fields(&self) -> FieldSet {
        let mut fields = FieldSet::default();
        for component in self.bins.values() {
            fields.extend(component.as_fields.iter().cloned());
            fields.extend(component.formula_as.iter().cloned());
        }
        fields
    }

    pub fn dependent_fields(&self) -> FieldSet {
        self.bins.values().map(|c| c.field.clone()).collect()
    }

    /// Per component: an `extent` transform (when the extent is computed), the
    /// `bin` transform, then the range label `formula`.
    pub fn assemble(&self) -> Vec<VgTransform> {
        let mut transforms = Vec::new();
        for component in self.bins.values() {
            let extent = match (component.bin.extent, &component.extent_signal) {
                (Some(extent), _) => Some(VgBinExtent::Values(extent)),
                (None, Some(signal)) => {
                    transforms.push(VgTransform::Extent {
                        field: component.field.clone(),
                        signal: signal.clone(),
                    });
                    Some(VgBinExtent::Signal(SignalRef::new(signal.clone())))
                }
                (None, None) => None,
            };
            let params = BinParams {
                extent: None,
                ..component.bin.clone()
            };
            transforms.push(VgTransform::Bin(VgBinTransform {
                field: component.field.clone(),
                as_fields: component.as_fields.clone(),
                signal: component.signal.clone(),
                params,
                extent,
            }));
            if let (Some(expr), Some(as_field)) = (&component.formula, &component.formula_as) {
                transforms.push(VgTransform::Formula {
                    expr: expr.clone(),
                    as_field: as_field.clone(),
                });
            }
        }
        transforms
    }
}
