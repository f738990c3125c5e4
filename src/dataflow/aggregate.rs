//! Grouping and summarizing rows.

use super::FieldSet;
use crate::channel::Channel;
use crate::field::{AggregateOp, BinSuffix, FieldDef, bin_requires_range, vg_field, vg_field_with};
use crate::model::Model;
use crate::spec::{AggregateTransform, DomainKeyword, DomainSpec};
use crate::vega::VgTransform;
use indexmap::IndexMap;

type OpAliases = IndexMap<AggregateOp, FieldSet, ahash::RandomState>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateNode {
    /// Group-by fields.
    pub dimensions: FieldSet,
    /// Source field → operation → output names. Field-less counts use `*`.
    pub measures: IndexMap<String, OpAliases, ahash::RandomState>,
}

/// Group-by fields for a non-aggregated encoding: binned fields group by
/// both bin edges (and the range label when there is one).
fn add_dimension(dimensions: &mut FieldSet, channel: Channel, fd: &FieldDef) {
    if fd.bin.is_some() {
        dimensions.insert(vg_field_with(fd, None));
        dimensions.insert(vg_field_with(fd, Some(BinSuffix::End)));
        if bin_requires_range(fd, channel) {
            dimensions.insert(vg_field_with(fd, Some(BinSuffix::Range)));
        }
    } else {
        dimensions.insert(vg_field(fd));
    }
}

impl AggregateNode {
    pub fn new(dimensions: FieldSet) -> Self {
        Self {
            dimensions,
            measures: IndexMap::default(),
        }
    }

    fn add_measure(&mut self, field: &str, op: AggregateOp, alias: String) {
        self.measures
            .entry(field.to_string())
            .or_default()
            .entry(op)
            .or_default()
            .insert(alias);
    }

    /// Groups by every non-aggregated field of a unit. `None` when no channel
    /// aggregates.
    pub fn make_from_encoding(model: &Model) -> Option<Self> {
        let unit = model.as_unit()?;
        let field_defs: Vec<(Channel, &FieldDef)> = unit
            .channel_field_defs()
            .chain(unit.condition_field_defs())
            .collect();
        if !field_defs.iter().any(|(_, fd)| fd.aggregate.is_some()) {
            return None;
        }

        let mut node = Self::default();
        for (channel, fd) in field_defs {
            match (fd.aggregate, &fd.field) {
                (Some(AggregateOp::Count), _) => {
                    node.add_measure("*", AggregateOp::Count, vg_field(fd));
                }
                (Some(op), Some(field)) => {
                    node.add_measure(field, op, vg_field(fd));
                    // Unaggregated domains span the raw values.
                    let unaggregated = unit
                        .encoding
                        .get(&channel)
                        .and_then(|enc| enc.scale.as_ref())
                        .and_then(|scale| scale.domain.as_ref())
                        .is_some_and(|domain| {
                            matches!(domain, DomainSpec::Keyword(DomainKeyword::Unaggregated))
                        });
                    if unaggregated && channel.is_scale_channel() {
                        for extreme in [AggregateOp::Min, AggregateOp::Max] {
                            node.add_measure(field, extreme, format!("{}_{}", extreme, field));
                        }
                    }
                }
                (Some(_), None) => {}
                (None, _) => add_dimension(&mut node.dimensions, channel, fd),
            }
        }
        Some(node)
    }

    /// Operations and group-by fields exactly as a transform lists them.
    pub fn make_from_transform(transform: &AggregateTransform) -> Self {
        let mut node = Self::default();
        for entry in &transform.aggregate {
            let field = match (entry.op, &entry.field) {
                (AggregateOp::Count, _) | (_, None) => "*",
                (_, Some(field)) => field.as_str(),
            };
            node.add_measure(field, entry.op, entry.as_field.clone());
        }
        node.add_dimensions(transform.groupby.iter().cloned());
        node
    }

    /// Adds group-by fields; existing ones keep their position.
    pub fn add_dimensions(&mut self, fields: impl IntoIterator<Item = String>) {
        self.dimensions.extend(fields);
    }

    pub fn produced_fields(&self) -> FieldSet {
        self.measures
            .values()
            .flat_map(|ops| ops.values())
            .flat_map(|aliases| aliases.iter().cloned())
            .collect()
    }

    pub fn dependent_fields(&self) -> FieldSet {
        let mut fields = self.dimensions.clone();
        fields.extend(self.measures.keys().filter(|f| *f != "*").cloned());
        fields
    }

    pub fn assemble(&self) -> VgTransform {
        let mut ops = Vec::new();
        let mut fields = Vec::new();
        let mut as_fields = Vec::new();
        for (field, op_aliases) in &self.measures {
            for (op, aliases) in op_aliases {
                for alias in aliases {
                    ops.push(op.as_str().to_string());
                    fields.push(field.clone());
                    as_fields.push(alias.clone());
                }
            }
        }
        VgTransform::Aggregate {
            groupby: self.dimensions.iter().cloned().collect(),
            ops,
            fields,
            as_fields,
        }
    }
}
