//! Filter expressions testing data against a selection's store.

use super::VL_SELECTION_TEST;
use crate::error::CompileError;
use crate::model::ModelTree;
use crate::spec::{Empty, SelectionPredicate, SelectionResolution};
use crate::util::string_value;

/// Membership test for one named selection.
///
/// An empty store selects everything when `empty` is `all` and nothing when
/// it is `none`.
pub fn predicate(tree: &ModelTree, name: &str) -> Result<String, CompileError> {
    let (_, selection) = tree
        .find_selection(name)
        .ok_or_else(|| CompileError::SelectionNotFound(name.to_string()))?;

    let store = string_value(&selection.store_name());
    let test = match selection.resolve {
        SelectionResolution::Global => format!("{}({}, datum)", VL_SELECTION_TEST, store),
        other => format!(
            "{}({}, datum, {})",
            VL_SELECTION_TEST,
            store,
            string_value(other.as_str())
        ),
    };
    Ok(match selection.empty {
        Empty::All => format!("!(length(data({}))) || ({})", store, test),
        Empty::None => format!("length(data({})) && ({})", store, test),
    })
}

/// Composes [`predicate`] through `not`, `and` and `or`.
pub fn selection_predicate(
    tree: &ModelTree,
    composition: &SelectionPredicate,
) -> Result<String, CompileError> {
    let join = |operands: &[SelectionPredicate], op: &str| -> Result<String, CompileError> {
        let parts = operands
            .iter()
            .map(|p| selection_predicate(tree, p).map(|expr| format!("({})", expr)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(op))
    };
    match composition {
        SelectionPredicate::Name(name) => predicate(tree, name),
        SelectionPredicate::Not { not } => Ok(format!("!({})", selection_predicate(tree, not)?)),
        SelectionPredicate::And { and } => join(and, " && "),
        SelectionPredicate::Or { or } => join(or, " || "),
    }
}
