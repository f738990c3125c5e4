//! The normalized view tree every compilation phase works on.
//!
//! Views live in an arena ([`ModelTree`]) and refer to each other by
//! [`ModelId`]. Index 0 is always the root. Layer and concat views only group
//! their children; all encoding, scale and selection state sits on the
//! [`UnitModel`]s at the leaves.

pub mod unit;

pub use unit::{ChannelEncoding, UnitModel};

use crate::channel::Channel;
use crate::selection::SelectionComponent;
use crate::spec::{DataSource, Transform};
use crate::util::{string_value, var_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub usize);

#[derive(Debug, Clone)]
pub enum ModelKind {
    Unit(Box<UnitModel>),
    Layer,
    Concat,
}

#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub parent: Option<ModelId>,
    pub children: Vec<ModelId>,
    pub data: Option<DataSource>,
    pub transforms: Vec<Transform>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub kind: ModelKind,
}

impl Model {
    pub fn new(name: impl Into<String>, kind: ModelKind) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            data: None,
            transforms: Vec::new(),
            width: None,
            height: None,
            kind,
        }
    }

    /// Prefixes `suffix` with this view's name, e.g. `concat_0_marks`.
    pub fn get_name(&self, suffix: &str) -> String {
        if self.name.is_empty() {
            var_name(suffix)
        } else {
            var_name(&format!("{}_{}", self.name, suffix))
        }
    }

    /// The view name as a quoted expression literal.
    pub fn unit_name(&self) -> String {
        string_value(&self.name)
    }

    pub fn as_unit(&self) -> Option<&UnitModel> {
        match &self.kind {
            ModelKind::Unit(unit) => Some(unit.as_ref()),
            _ => None,
        }
    }

    pub fn as_unit_mut(&mut self) -> Option<&mut UnitModel> {
        match &mut self.kind {
            ModelKind::Unit(unit) => Some(unit.as_mut()),
            _ => None,
        }
    }

    pub fn is_layer(&self) -> bool {
        matches!(self.kind, ModelKind::Layer)
    }

    pub fn is_concat(&self) -> bool {
        matches!(self.kind, ModelKind::Concat)
    }

    fn size(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::X => self.width,
            Channel::Y => self.height,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelTree {
    models: Vec<Model>,
}

impl ModelTree {
    pub const ROOT: ModelId = ModelId(0);

    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a view, linking it into its parent's children when it has one.
    pub fn push(&mut self, model: Model) -> ModelId {
        let id = ModelId(self.models.len());
        if let Some(parent) = model.parent {
            self.models[parent.0].children.push(id);
        }
        self.models.push(model);
        id
    }

    pub fn get(&self, id: ModelId) -> &Model {
        &self.models[id.0]
    }

    pub fn get_mut(&mut self, id: ModelId) -> &mut Model {
        &mut self.models[id.0]
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn unit(&self, id: ModelId) -> Option<&UnitModel> {
        self.get(id).as_unit()
    }

    /// `id` and every view below it, parents before children.
    pub fn preorder(&self, id: ModelId) -> Vec<ModelId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.get(current).children.iter().rev().copied());
        }
        out
    }

    /// Unit views at or below `id`, in document order.
    pub fn units_under(&self, id: ModelId) -> Vec<ModelId> {
        self.preorder(id)
            .into_iter()
            .filter(|m| self.unit(*m).is_some())
            .collect()
    }

    /// Layers share scales and size with their children, so the owner is
    /// the outermost view reachable through layer parents.
    pub fn scale_owner(&self, id: ModelId) -> ModelId {
        let mut owner = id;
        while let Some(parent) = self.get(owner).parent {
            if !self.get(parent).is_layer() {
                break;
            }
            owner = parent;
        }
        owner
    }

    pub fn scale_name(&self, id: ModelId, channel: Channel) -> String {
        self.get(self.scale_owner(id)).get_name(channel.as_str())
    }

    /// Width (x) or height (y) signal of the view that owns the scales.
    pub fn size_signal(&self, id: ModelId, channel: Channel) -> Option<String> {
        let size = channel.size_name()?;
        Some(self.get(self.scale_owner(id)).get_name(size))
    }

    /// Explicit width/height of the scale owner, falling back to the view itself.
    pub fn top_level_size(&self, id: ModelId, channel: Channel) -> Option<f64> {
        self.get(self.scale_owner(id))
            .size(channel)
            .or_else(|| self.get(id).size(channel))
    }

    /// Whether some ancestor concatenates views side by side.
    pub fn in_concat(&self, id: ModelId) -> bool {
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            if self.get(parent).is_concat() {
                return true;
            }
            current = self.get(parent).parent;
        }
        false
    }

    /// Looks a selection up across every unit, by its sanitized name.
    pub fn find_selection(&self, name: &str) -> Option<(ModelId, &SelectionComponent)> {
        let name = var_name(name);
        self.units_under(Self::ROOT).into_iter().find_map(|id| {
            self.unit(id)
                .and_then(|unit| unit.selections.get(&name))
                .map(|selection| (id, selection))
        })
    }

    /// Scale-owning views, in document order. Each gets width/height signals.
    pub fn scale_owners(&self) -> Vec<ModelId> {
        let mut owners: Vec<ModelId> = Vec::new();
        for unit in self.units_under(Self::ROOT) {
            let owner = self.scale_owner(unit);
            if !owners.contains(&owner) {
                owners.push(owner);
            }
        }
        owners
    }
}
