//! Single selections: one tuple at a time, replacing whatever the store held.

use super::multi::tuple_signals;
use super::{SelectionComponent, SelectionContext, Strategy};

pub static SINGLE: Strategy = Strategy {
    signals: tuple_signals,
    modify_expr,
    marks: None,
};

fn modify_expr(ctx: &SelectionContext<'_>, selection: &SelectionComponent) -> String {
    format!("{}, {}", selection.tuple_name(), ctx.unit_stamp(selection, "true"))
}
