use super::TransformCompiler;
use crate::field::vg_field;
use crate::model::UnitModel;
use crate::selection::{ProjectionComponent, SelectionComponent};
use crate::spec::SelectionProps;
use indexmap::IndexMap;
use tracing::warn;

/// Resolves `fields` and `encodings` into the projected fields. A field
/// projected more than once keeps its first position and its last channel.
pub struct Project;

impl TransformCompiler for Project {
    fn name(&self) -> &'static str {
        "project"
    }

    fn applies(&self, _selection: &SelectionComponent) -> bool {
        true
    }

    fn parse(&self, unit: &mut UnitModel, def: &SelectionProps, selection: &mut SelectionComponent) {
        let mut channels = IndexMap::new();
        for field in def.fields.iter().flatten() {
            channels.insert(field.clone(), None);
        }
        for channel in def.encodings.iter().flatten() {
            match unit.field_def(*channel) {
                Some(fd) if fd.field.is_some() => {
                    // Time units project onto the truncated field the marks read.
                    let field = if fd.time_unit.is_some() {
                        vg_field(fd)
                    } else {
                        fd.field_or_star().to_string()
                    };
                    channels.insert(field, Some(*channel));
                }
                _ => warn!(
                    "Cannot project a selection on encoding channel \"{}\", which has no field.",
                    channel
                ),
            }
        }
        selection.project = channels
            .into_iter()
            .map(|(field, channel)| ProjectionComponent { field, channel })
            .collect();
    }
}
