//! Multi selections: the tuple under the pointer is captured on each event,
//! and the store may hold several tuples at once.

use super::{SelectionComponent, SelectionContext, Strategy};
use crate::error::CompileError;
use crate::field::BinSuffix;
use crate::util::{access_path, string_value};
use crate::vega::{VgEvents, VgOnEvent, VgSignal};
use itertools::Itertools;
use serde_json::json;

pub static MULTI: Strategy = Strategy {
    signals: tuple_signals,
    modify_expr,
    marks: None,
};

/// The `<name>_tuple` signal shared by single and multi selections.
///
/// Binned projections capture the bin's start and end so the tuple can be
/// range-tested against the raw field.
pub fn tuple_signals(
    ctx: &SelectionContext<'_>,
    selection: &SelectionComponent,
) -> Result<Vec<VgSignal>, CompileError> {
    let datum = ctx.datum(selection);
    let mut bins = Vec::new();

    let encodings = selection
        .project
        .iter()
        .filter_map(|p| p.channel.map(|c| string_value(c.as_str())))
        .join(", ");
    let fields = selection.projected_fields().map(string_value).join(", ");
    let values = selection
        .project
        .iter()
        .map(|p| {
            let binned = p
                .channel
                .and_then(|c| ctx.unit.field_def(c).map(|fd| (c, fd)))
                .filter(|(_, fd)| fd.bin.is_some());
            match binned {
                Some((channel, _)) => {
                    bins.push(p.field.clone());
                    let start = ctx.unit.vg_field(channel, None).unwrap_or_default();
                    let end = ctx
                        .unit
                        .vg_field(channel, Some(BinSuffix::End))
                        .unwrap_or_default();
                    format!(
                        "[{d}{}, {d}{}]",
                        access_path(&start),
                        access_path(&end),
                        d = datum
                    )
                }
                None => format!("{}{}", datum, access_path(&p.field)),
            }
        })
        .join(", ");

    let bins_expr = if bins.is_empty() {
        String::new()
    } else {
        let entries = bins
            .iter()
            .map(|field| format!("{}:1", string_value(field)))
            .join(",");
        format!(", bins: {{{}}}", entries)
    };

    let update = format!(
        "datum && item().mark.marktype !== 'group' ? {{unit: {}, encodings: [{}], fields: [{}], values: [{}]{}}} : null",
        ctx.unit_name(),
        encodings,
        fields,
        values,
        bins_expr
    );

    Ok(vec![
        VgSignal::named(selection.tuple_name())
            .with_value(json!({}))
            .with_on(vec![
                VgOnEvent::new(VgEvents::from_streams(selection.events.clone()), update).forced(),
            ]),
    ])
}

fn modify_expr(ctx: &SelectionContext<'_>, selection: &SelectionComponent) -> String {
    format!("{}, {}", selection.tuple_name(), ctx.unit_stamp(selection, "null"))
}
