use super::FieldSet;
use crate::field::{FieldDef, vg_field};
use crate::model::Model;
use crate::spec::TimeUnitTransform;
use crate::timeunit::TimeUnit;
use crate::vega::VgTransform;
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TimeUnitComponent {
    pub as_field: String,
    pub time_unit: TimeUnit,
    pub field: String,
}

/// Truncates date fields to time units, one formula per output field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeUnitNode {
    pub formula: IndexMap<String, TimeUnitComponent, ahash::RandomState>,
}

impl TimeUnitNode {
    pub fn make_from_encoding(model: &Model) -> Option<Self> {
        let unit = model.as_unit()?;
        let mut formula: IndexMap<String, TimeUnitComponent, ahash::RandomState> =
            IndexMap::default();
        for (_, fd) in unit.channel_field_defs().chain(unit.condition_field_defs()) {
            let (Some(time_unit), Some(field)) = (&fd.time_unit, &fd.field) else {
                continue;
            };
            let as_field = vg_field(&FieldDef {
                aggregate: None,
                bin: None,
                ..fd.clone()
            });
            formula.entry(as_field.clone()).or_insert(TimeUnitComponent {
                as_field,
                time_unit: time_unit.clone(),
                field: field.clone(),
            });
        }
        if formula.is_empty() {
            None
        } else {
            Some(Self { formula })
        }
    }

    pub fn make_from_transform(transform: &TimeUnitTransform) -> Self {
        let mut formula = IndexMap::default();
        formula.insert(
            transform.as_field.clone(),
            TimeUnitComponent {
                as_field: transform.as_field.clone(),
                time_unit: transform.time_unit.clone(),
                field: transform.field.clone(),
            },
        );
        Self { formula }
    }

    /// Adds `other`'s components; an output field already computed here keeps
    /// its existing definition.
    pub fn merge(&mut self, other: TimeUnitNode) {
        for (key, component) in other.formula {
            self.formula.entry(key).or_insert(component);
        }
    }

    pub fn produced_fields(&self) -> FieldSet {
        self.formula.keys().cloned().collect()
    }

    pub fn dependent_fields(&self) -> FieldSet {
        self.formula.values().map(|c| c.field.clone()).collect()
    }

    pub fn assemble(&self) -> Vec<VgTransform> {
        self.formula
            .values()
            .map(|c| VgTransform::Formula {
                expr: c.time_unit.field_expr(&c.field),
                as_field: c.as_field.clone(),
            })
            .collect()
    }
}
