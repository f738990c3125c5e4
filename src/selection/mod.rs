//! Interactive selections.
//!
//! A selection definition is parsed into a [`SelectionComponent`] on the unit
//! that declares it. Compiling a selection produces:
//!
//! * per-unit signals that listen to input events and build a *tuple*
//!   describing what is selected, plus a `<name>_modify` signal that writes
//!   the tuple into the selection's store dataset,
//! * top-level signals that resolve the store into a query (and carry input
//!   widget bindings),
//! * a `<name>_store` dataset,
//! * extra marks (interval brushes, voronoi cells for `nearest`).
//!
//! The per-type strategy (`single`, `multi`, `interval`) produces the base
//! signals; the transforms in [`transforms`] then decorate them in a fixed
//! order.

pub mod assemble;
pub mod events;
pub mod interval;
pub mod multi;
pub mod predicate;
pub mod single;
pub mod transforms;

pub use assemble::{
    assemble_layer_marks, assemble_top_level_signals, assemble_unit_data, assemble_unit_marks,
    assemble_unit_signals,
};
pub use predicate::{predicate, selection_predicate};

use crate::channel::Channel;
use crate::config::Config;
use crate::error::CompileError;
use crate::model::{Model, ModelId, ModelTree, UnitModel};
use crate::scale::ScaleComponent;
use crate::spec::{
    Bind, BoolOrString, BrushConfig, Empty, SelectionDef, SelectionProps, SelectionResolution,
    SelectionType,
};
use crate::util::var_name;
use crate::vega::VgSignal;
use events::EventStream;
use indexmap::IndexMap;
use serde_json::Value;
use transforms::TransformCompiler;

pub const STORE: &str = "_store";
pub const TUPLE: &str = "_tuple";
pub const MODIFY: &str = "_modify";
pub const BRUSH: &str = "_brush";
pub const SCALE_TRIGGER: &str = "_scale_trigger";
pub const VL_SELECTION_RESOLVE: &str = "vlSelectionResolve";
pub const VL_SELECTION_TEST: &str = "vlSelectionTest";

/// A projected field, and the channel it was projected through (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionComponent {
    pub field: String,
    pub channel: Option<Channel>,
}

/// Whether a per-channel signal holds pixel or data coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalRange {
    Visual,
    Data,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionComponent {
    pub name: String,
    pub selection_type: SelectionType,
    pub events: Vec<EventStream>,
    pub resolve: SelectionResolution,
    pub empty: Empty,
    pub project: Vec<ProjectionComponent>,
    pub bind: Option<Bind>,
    pub nearest: bool,
    pub toggle: Option<String>,
    pub translate: Option<String>,
    pub zoom: Option<String>,
    pub clear: Option<Vec<EventStream>>,
    pub mark: BrushConfig,
    pub init: Option<Value>,
    /// Channels whose scale domains this selection drives.
    pub scales: Vec<Channel>,
}

impl SelectionComponent {
    pub fn store_name(&self) -> String {
        format!("{}{}", self.name, STORE)
    }

    pub fn tuple_name(&self) -> String {
        format!("{}{}", self.name, TUPLE)
    }

    pub fn projection(&self, channel: Channel) -> Option<&ProjectionComponent> {
        self.project.iter().find(|p| p.channel == Some(channel))
    }

    /// Index of the x and y projections.
    pub fn positional_projections(&self) -> (Option<usize>, Option<usize>) {
        let index = |channel| self.project.iter().position(|p| p.channel == Some(channel));
        (index(Channel::X), index(Channel::Y))
    }

    /// `<name>_<channel>` for pixel extents, `<name>_<field>` for data extents.
    pub fn channel_signal_name(&self, channel: Channel, range: SignalRange) -> String {
        match range {
            SignalRange::Visual => var_name(&format!("{}_{}", self.name, channel)),
            SignalRange::Data => {
                let field = self
                    .projection(channel)
                    .map(|p| p.field.as_str())
                    .unwrap_or(channel.as_str());
                var_name(&format!("{}_{}", self.name, field))
            }
        }
    }

    pub fn binds_scales(&self) -> bool {
        matches!(self.bind, Some(Bind::Scales(_)))
    }

    pub fn projected_fields(&self) -> impl Iterator<Item = &str> {
        self.project.iter().map(|p| p.field.as_str())
    }
}

/// The unit a selection is compiled for, with its place in the view tree.
pub struct SelectionContext<'a> {
    pub tree: &'a ModelTree,
    pub id: ModelId,
    pub unit: &'a UnitModel,
}

impl<'a> SelectionContext<'a> {
    /// `None` when `id` is not a unit view.
    pub fn new(tree: &'a ModelTree, id: ModelId) -> Option<Self> {
        tree.unit(id).map(|unit| Self { tree, id, unit })
    }

    pub fn model(&self) -> &Model {
        self.tree.get(self.id)
    }

    pub fn get_name(&self, suffix: &str) -> String {
        self.model().get_name(suffix)
    }

    pub fn unit_name(&self) -> String {
        self.model().unit_name()
    }

    pub fn scale_name(&self, channel: Channel) -> String {
        self.tree.scale_name(self.id, channel)
    }

    pub fn scale(&self, channel: Channel) -> Option<&ScaleComponent> {
        self.unit.scale(channel)
    }

    pub fn size_signal(&self, channel: Channel) -> String {
        self.tree
            .size_signal(self.id, channel)
            .unwrap_or_else(|| channel.size_name().unwrap_or("width").to_string())
    }

    pub fn has_parent(&self) -> bool {
        self.model().parent.is_some()
    }

    /// `true`-style stamp for globally resolved single views, otherwise the
    /// unit the tuple came from.
    pub fn unit_stamp(&self, selection: &SelectionComponent, global: &str) -> String {
        if selection.resolve == SelectionResolution::Global && !self.tree.in_concat(self.id) {
            global.to_string()
        } else {
            format!("{{unit: {}}}", self.unit_name())
        }
    }

    /// Tuple field access, reading through voronoi cells when `nearest` is on.
    pub fn datum(&self, selection: &SelectionComponent) -> &'static str {
        if transforms::nearest::Nearest.applies(selection) {
            "(item().isVoronoi ? datum.datum : datum)"
        } else {
            "datum"
        }
    }
}

/// Per-type signal generation.
pub struct Strategy {
    pub signals:
        fn(&SelectionContext<'_>, &SelectionComponent) -> Result<Vec<VgSignal>, CompileError>,
    pub modify_expr: fn(&SelectionContext<'_>, &SelectionComponent) -> String,
    pub marks: Option<fn(&SelectionContext<'_>, &SelectionComponent, Vec<Value>) -> Vec<Value>>,
}

pub fn strategy(selection_type: SelectionType) -> &'static Strategy {
    match selection_type {
        SelectionType::Single => &single::SINGLE,
        SelectionType::Multi => &multi::MULTI,
        SelectionType::Interval => &interval::INTERVAL,
    }
}

/// Fills unset properties (and properties set to `true`) from `defaults`.
/// `encodings` and `fields` are exclusive: a definition naming one does not
/// inherit the other.
pub fn with_defaults(def: &SelectionProps, defaults: &SelectionProps) -> SelectionProps {
    fn pick<T: Clone>(value: &Option<T>, default: &Option<T>) -> Option<T> {
        value.clone().or_else(|| default.clone())
    }
    fn pick_flag(value: &Option<BoolOrString>, default: &Option<BoolOrString>) -> Option<BoolOrString> {
        match value {
            None | Some(BoolOrString::Bool(true)) => default.clone().or_else(|| value.clone()),
            Some(other) => Some(other.clone()),
        }
    }

    SelectionProps {
        on: pick(&def.on, &defaults.on),
        resolve: pick(&def.resolve, &defaults.resolve),
        encodings: if def.fields.is_some() {
            def.encodings.clone()
        } else {
            pick(&def.encodings, &defaults.encodings)
        },
        fields: if def.encodings.is_some() {
            def.fields.clone()
        } else {
            pick(&def.fields, &defaults.fields)
        },
        empty: pick(&def.empty, &defaults.empty),
        clear: pick_flag(&def.clear, &defaults.clear),
        bind: pick(&def.bind, &defaults.bind),
        nearest: match def.nearest {
            None | Some(true) => defaults.nearest.or(def.nearest),
            other => other,
        },
        toggle: pick_flag(&def.toggle, &defaults.toggle),
        translate: pick_flag(&def.translate, &defaults.translate),
        zoom: pick_flag(&def.zoom, &defaults.zoom),
        mark: match (&def.mark, &defaults.mark) {
            (Some(mark), Some(default)) => Some(mark.clone().or(default)),
            (mark, default) => pick(mark, default),
        },
        init: def.init.clone(),
    }
}

fn enabled(flag: Option<BoolOrString>) -> Option<String> {
    match flag {
        Some(BoolOrString::Str(s)) => Some(s),
        _ => None,
    }
}

/// Parses a unit's selection definitions in declaration order.
pub fn parse_unit_selections(
    unit: &mut UnitModel,
    defs: &IndexMap<String, SelectionDef>,
    config: &Config,
) -> Result<(), CompileError> {
    for (name, def) in defs {
        let defaults = match def.selection_type {
            SelectionType::Single => &config.selection.single,
            SelectionType::Multi => &config.selection.multi,
            SelectionType::Interval => &config.selection.interval,
        };
        let props = with_defaults(&def.props, defaults);
        let name = var_name(name);

        let events = events::parse(props.on.as_deref().unwrap_or_default(), "scope")?;
        let clear = enabled(props.clear.clone())
            .map(|selector| events::parse(&selector, "scope"))
            .transpose()?;

        let mut selection = SelectionComponent {
            name: name.clone(),
            selection_type: def.selection_type,
            events,
            resolve: props.resolve.unwrap_or(SelectionResolution::Global),
            empty: props.empty.unwrap_or(Empty::All),
            project: Vec::new(),
            bind: props.bind.clone(),
            nearest: props.nearest.unwrap_or(false),
            toggle: enabled(props.toggle.clone()),
            translate: enabled(props.translate.clone()),
            zoom: enabled(props.zoom.clone()),
            clear,
            mark: props.mark.clone().unwrap_or_default(),
            init: props.init.clone(),
            scales: Vec::new(),
        };

        for transform in transforms::registry() {
            if transform.applies(&selection) {
                transform.parse(unit, &props, &mut selection);
            }
        }
        unit.selections.insert(name, selection);
    }
    Ok(())
}
