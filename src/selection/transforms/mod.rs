//! Selection transforms: optional behaviours layered over a strategy's
//! signals. Each transform decides from the parsed component whether it
//! applies, and every hook defaults to passing its input through.

pub mod clear;
pub mod inputs;
pub mod nearest;
pub mod project;
pub mod scales;
pub mod toggle;
pub mod translate;
pub mod zoom;

use super::{SelectionComponent, SelectionContext};
use crate::error::CompileError;
use crate::model::UnitModel;
use crate::spec::SelectionProps;
use crate::vega::VgSignal;
use serde_json::Value;

pub trait TransformCompiler: Sync {
    /// Transform name, for logs.
    fn name(&self) -> &'static str;

    fn applies(&self, selection: &SelectionComponent) -> bool;

    fn parse(&self, _unit: &mut UnitModel, _def: &SelectionProps, _selection: &mut SelectionComponent) {}

    fn signals(
        &self,
        _ctx: &SelectionContext<'_>,
        _selection: &SelectionComponent,
        signals: Vec<VgSignal>,
    ) -> Result<Vec<VgSignal>, CompileError> {
        Ok(signals)
    }

    fn top_level_signals(
        &self,
        _ctx: &SelectionContext<'_>,
        _selection: &SelectionComponent,
        signals: Vec<VgSignal>,
    ) -> Vec<VgSignal> {
        signals
    }

    fn modify_expr(
        &self,
        _ctx: &SelectionContext<'_>,
        _selection: &SelectionComponent,
        expr: String,
    ) -> String {
        expr
    }

    fn marks(
        &self,
        _ctx: &SelectionContext<'_>,
        _selection: &SelectionComponent,
        marks: Vec<Value>,
    ) -> Vec<Value> {
        marks
    }
}

static REGISTRY: [&dyn TransformCompiler; 8] = [
    &project::Project,
    &toggle::Toggle,
    &scales::Scales,
    &translate::Translate,
    &zoom::Zoom,
    &inputs::Inputs,
    &nearest::Nearest,
    &clear::Clear,
];

/// All transforms, in application order. Scale binding runs before
/// translate and zoom, which read the bound channels.
pub fn registry() -> &'static [&'static dyn TransformCompiler] {
    &REGISTRY
}

/// Transforms that apply to `selection`, in application order.
pub fn applicable(
    selection: &SelectionComponent,
) -> impl Iterator<Item = &'static dyn TransformCompiler> + '_ {
    registry()
        .iter()
        .copied()
        .filter(move |transform| transform.applies(selection))
}

/// Index of the signal called `name`.
pub(crate) fn find_signal(signals: &[VgSignal], name: &str) -> Option<usize> {
    signals.iter().position(|s| s.name == name)
}
