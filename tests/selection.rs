//! Tests for selection parsing, signals, marks, stores and predicates.
mod common;
use common::*;
use sakuzu::prelude::*;
use sakuzu::scale::ScaleComponent;
use sakuzu::selection::interval::INTERVAL;
use sakuzu::selection::multi::MULTI;
use sakuzu::selection::single::SINGLE;
use sakuzu::selection::{
    SelectionComponent, SelectionContext, assemble_top_level_signals, assemble_unit_data,
    assemble_unit_marks, assemble_unit_signals, predicate, selection_predicate, with_defaults,
};
use sakuzu::spec::{
    BoolOrString, BrushConfig, SelectionPredicate, SelectionProps, SelectionResolution,
};
use sakuzu::vega::SignalRef;
use serde_json::{Value, json};

fn interval_tree() -> ModelTree {
    scatter_with_selections(json!({
        "one": {
            "type": "interval",
            "encodings": ["x"],
            "translate": false,
            "zoom": false
        },
        "two": {
            "type": "interval",
            "encodings": ["y"],
            "bind": "scales",
            "translate": false,
            "zoom": false
        },
        "thr-ee": {
            "type": "interval",
            "on": "[mousedown, mouseup] > mousemove, [keydown, keyup] > keypress",
            "translate": false,
            "zoom": false,
            "resolve": "intersect",
            "mark": {
                "fill": "red",
                "fillOpacity": 0.75,
                "stroke": "black",
                "strokeWidth": 4,
                "strokeDash": [10, 5],
                "strokeDashOffset": 3,
                "strokeOpacity": 0.25
            }
        }
    }))
}

fn context(tree: &ModelTree) -> SelectionContext<'_> {
    SelectionContext::new(tree, ModelTree::ROOT).expect("Expected a unit view")
}

fn selection<'a>(ctx: &'a SelectionContext<'_>, name: &str) -> &'a SelectionComponent {
    ctx.unit
        .selections
        .get(name)
        .unwrap_or_else(|| panic!("No selection named '{}'", name))
}

fn brush_test(unit: &str) -> String {
    format!(
        "data(\"one_store\").length && data(\"one_store\")[0].unit === \"{}\"",
        unit
    )
}

#[test]
fn test_interval_pixel_and_data_signals() {
    let tree = interval_tree();
    let ctx = context(&tree);
    let signals = to_json(&(INTERVAL.signals)(&ctx, selection(&ctx, "one")).expect("Signals failed"));

    assert_includes(
        &signals,
        &[
            json!({
                "name": "one_x",
                "value": [],
                "on": [
                    {
                        "events": {"source": "scope", "type": "mousedown"},
                        "update": "[x(unit), x(unit)]"
                    },
                    {
                        "events": {
                            "source": "window",
                            "type": "mousemove",
                            "consume": true,
                            "between": [
                                {"source": "scope", "type": "mousedown"},
                                {"source": "window", "type": "mouseup"}
                            ]
                        },
                        "update": "[one_x[0], clamp(x(unit), 0, width)]"
                    },
                    {
                        "events": {"signal": "one_scale_trigger"},
                        "update": "[scale(\"x\", one_Horsepower[0]), scale(\"x\", one_Horsepower[1])]"
                    }
                ]
            }),
            json!({
                "name": "one_Horsepower",
                "on": [{
                    "events": {"signal": "one_x"},
                    "update": "one_x[0] === one_x[1] ? null : invert(\"x\", one_x)"
                }]
            }),
            json!({
                "name": "one_scale_trigger",
                "update": "(!isArray(one_Horsepower) || (+invert(\"x\", one_x)[0] === +one_Horsepower[0] && +invert(\"x\", one_x)[1] === +one_Horsepower[1])) ? one_scale_trigger : {}"
            }),
            json!({
                "name": "one_tuple",
                "on": [{
                    "events": [{"signal": "one_Horsepower"}],
                    "update": "one_Horsepower ? {unit: \"\", intervals: [{encoding: \"x\", field: \"Horsepower\", extent: one_Horsepower}]} : null"
                }]
            }),
        ],
    );
}

#[test]
fn test_interval_bound_to_scales() {
    let tree = interval_tree();
    let ctx = context(&tree);
    let signals = to_json(&(INTERVAL.signals)(&ctx, selection(&ctx, "two")).expect("Signals failed"));

    assert_eq!(
        signals,
        json!([
            {"name": "two_Miles_per_Gallon", "on": []},
            {
                "name": "two_tuple",
                "on": [{
                    "events": [{"signal": "two_Miles_per_Gallon"}],
                    "update": "two_Miles_per_Gallon ? {unit: \"\", intervals: [{encoding: \"y\", field: \"Miles-per-Gallon\", extent: two_Miles_per_Gallon}]} : null"
                }]
            }
        ])
    );

    let y: &ScaleComponent = &ctx.unit.scales[&Channel::Y];
    assert_eq!(y.domain_raw, Some(SignalRef::new("two_Miles_per_Gallon")));
    assert_eq!(selection(&ctx, "two").scales, vec![Channel::Y]);
    assert_eq!(ctx.unit.scales[&Channel::X].domain_raw, None);
}

#[test]
fn test_interval_tuple_over_both_channels() {
    let tree = interval_tree();
    let ctx = context(&tree);
    let signals =
        to_json(&(INTERVAL.signals)(&ctx, selection(&ctx, "thr_ee")).expect("Signals failed"));

    assert_includes(
        &signals,
        &[json!({
            "name": "thr_ee_tuple",
            "on": [{
                "events": [
                    {"signal": "thr_ee_Horsepower"},
                    {"signal": "thr_ee_Miles_per_Gallon"}
                ],
                "update": "thr_ee_Horsepower && thr_ee_Miles_per_Gallon ? {unit: \"\", intervals: [{encoding: \"x\", field: \"Horsepower\", extent: thr_ee_Horsepower}, {encoding: \"y\", field: \"Miles-per-Gallon\", extent: thr_ee_Miles_per_Gallon}]} : null"
            }]
        })],
    );

    // Two drag streams, each with a start handler, plus the scale trigger.
    let thr_ee_x = find_named(&signals, "thr_ee_x");
    assert_eq!(thr_ee_x["on"].as_array().map(Vec::len), Some(5));
    assert_eq!(
        thr_ee_x["on"][2]["events"],
        json!({"source": "scope", "type": "keydown"})
    );
}

#[test]
fn test_interval_modify_expressions() {
    let tree = interval_tree();
    let ctx = context(&tree);

    assert_eq!((INTERVAL.modify_expr)(&ctx, selection(&ctx, "one")), "one_tuple, true");
    assert_eq!((INTERVAL.modify_expr)(&ctx, selection(&ctx, "two")), "two_tuple, true");
    assert_eq!(
        (INTERVAL.modify_expr)(&ctx, selection(&ctx, "thr_ee")),
        "thr_ee_tuple, {unit: \"\"}"
    );

    let signals = to_json(&assemble_unit_signals(&ctx).expect("Signals failed"));
    assert_includes(
        &signals,
        &[
            json!({
                "name": "one_modify",
                "on": [{
                    "events": {"signal": "one_tuple"},
                    "update": "modify(\"one_store\", one_tuple, true)"
                }]
            }),
            json!({
                "name": "thr_ee_modify",
                "on": [{
                    "events": {"signal": "thr_ee_tuple"},
                    "update": "modify(\"thr_ee_store\", thr_ee_tuple, {unit: \"\"})"
                }]
            }),
        ],
    );
}

#[test]
fn test_interval_clear_resets_pixel_extent() {
    let tree = scatter_with_selections(json!({"brush": {"type": "interval", "encodings": ["x"]}}));
    let ctx = context(&tree);
    let signals = to_json(&assemble_unit_signals(&ctx).expect("Signals failed"));

    let on = find_named(&signals, "brush_x")["on"]
        .as_array()
        .cloned()
        .expect("Expected handlers");
    assert_eq!(
        on.last(),
        Some(&json!({
            "events": {"source": "scope", "type": "dblclick"},
            "update": "[0, 0]"
        }))
    );
}

#[test]
fn test_interval_brush_marks_with_global_resolve() {
    let tree = interval_tree();
    let ctx = context(&tree);
    let marks = (INTERVAL.marks.expect("Interval selections draw marks"))(
        &ctx,
        selection(&ctx, "one"),
        vec![json!({"hello": "world"})],
    );

    let test = brush_test("");
    let update = json!({
        "x": [{"test": test, "signal": "one_x[0]"}, {"value": 0}],
        "y": [{"test": test, "value": 0}, {"value": 0}],
        "x2": [{"test": test, "signal": "one_x[1]"}, {"value": 0}],
        "y2": [{"test": test, "field": {"group": "height"}}, {"value": 0}]
    });
    assert_eq!(
        Value::Array(marks),
        json!([
            {
                "name": "one_brush_bg",
                "type": "rect",
                "clip": true,
                "encode": {
                    "enter": {"fill": {"value": "#333"}, "fillOpacity": {"value": 0.125}},
                    "update": update
                }
            },
            {"hello": "world"},
            {
                "name": "one_brush",
                "type": "rect",
                "clip": true,
                "encode": {
                    "enter": {"fill": {"value": "transparent"}, "stroke": {"value": "white"}},
                    "update": update
                }
            }
        ])
    );
}

#[test]
fn test_interval_bound_to_scales_draws_no_brush() {
    let tree = interval_tree();
    let ctx = context(&tree);
    let marks = (INTERVAL.marks.expect("Interval selections draw marks"))(
        &ctx,
        selection(&ctx, "two"),
        vec![json!({"hello": "world"})],
    );
    assert_eq!(marks, vec![json!({"hello": "world"})]);
}

#[test]
fn test_interval_brush_marks_with_custom_style() {
    let tree = interval_tree();
    let ctx = context(&tree);
    let marks = (INTERVAL.marks.expect("Interval selections draw marks"))(
        &ctx,
        selection(&ctx, "thr_ee"),
        vec![json!({"hello": "world"})],
    );

    let update = json!({
        "x": {"signal": "thr_ee_x[0]"},
        "y": {"signal": "thr_ee_y[0]"},
        "x2": {"signal": "thr_ee_x[1]"},
        "y2": {"signal": "thr_ee_y[1]"}
    });
    assert_eq!(marks.len(), 3);
    assert_eq!(
        marks[0]["encode"],
        json!({
            "enter": {"fill": {"value": "red"}, "fillOpacity": {"value": 0.75}},
            "update": update
        })
    );
    assert_eq!(
        marks[2]["encode"],
        json!({
            "enter": {
                "fill": {"value": "transparent"},
                "stroke": {"value": "black"},
                "strokeWidth": {"value": 4.0},
                "strokeDash": {"value": [10.0, 5.0]},
                "strokeDashOffset": {"value": 3.0},
                "strokeOpacity": {"value": 0.25}
            },
            "update": update
        })
    );
}

#[test]
fn test_interval_scale_trigger_checks_every_channel() {
    let tree = interval_tree();
    let ctx = context(&tree);
    let signals = to_json(&(INTERVAL.signals)(&ctx, selection(&ctx, "thr_ee")).expect("Signals failed"));

    assert_eq!(
        find_named(&signals, "thr_ee_scale_trigger"),
        &json!({
            "name": "thr_ee_scale_trigger",
            "update": "(!isArray(thr_ee_Horsepower) || (+invert(\"x\", thr_ee_x)[0] === +thr_ee_Horsepower[0] && +invert(\"x\", thr_ee_x)[1] === +thr_ee_Horsepower[1])) && (!isArray(thr_ee_Miles_per_Gallon) || (+invert(\"y\", thr_ee_y)[0] === +thr_ee_Miles_per_Gallon[0] && +invert(\"y\", thr_ee_y)[1] === +thr_ee_Miles_per_Gallon[1])) ? thr_ee_scale_trigger : {}"
        })
    );
}

#[test]
fn test_interval_without_positional_channel_is_rejected() {
    let tree = scatter_with_selections(json!({
        "by_color": {"type": "interval", "encodings": ["color"]},
        "by_field": {"type": "interval", "fields": ["Origin"]}
    }));
    let ctx = context(&tree);
    for name in ["by_color", "by_field"] {
        assert_eq!(
            (INTERVAL.signals)(&ctx, selection(&ctx, name)),
            Err(CompileError::IntervalWithoutPosition {
                selection: name.to_string()
            })
        );
    }
}

#[test]
fn test_interval_without_between_is_rejected() {
    let tree = scatter_with_selections(json!({"brush": {"type": "interval", "on": "click"}}));
    let ctx = context(&tree);
    let result = (INTERVAL.signals)(&ctx, selection(&ctx, "brush"));
    assert_eq!(
        result,
        Err(CompileError::IntervalWithoutBetween {
            selection: "brush".to_string()
        })
    );
}

#[test]
fn test_multi_tuple_toggle_and_clear() {
    let tree = scatter_with_selections(json!({"paint": {"type": "multi"}}));
    let ctx = context(&tree);
    let signals = to_json(&assemble_unit_signals(&ctx).expect("Signals failed"));

    assert_eq!(
        signals,
        json!([
            {
                "name": "paint_tuple",
                "value": {},
                "on": [
                    {
                        "events": {"source": "scope", "type": "click"},
                        "update": "datum && item().mark.marktype !== 'group' ? {unit: \"\", encodings: [], fields: [\"_vgsid_\"], values: [datum[\"_vgsid_\"]]} : null",
                        "force": true
                    },
                    {"events": {"source": "scope", "type": "dblclick"}, "update": "null"}
                ]
            },
            {
                "name": "paint_toggle",
                "value": false,
                "on": [
                    {"events": {"source": "scope", "type": "click"}, "update": "event.shiftKey"},
                    {"events": {"source": "scope", "type": "dblclick"}, "update": "false"}
                ]
            },
            {
                "name": "paint_modify",
                "on": [{
                    "events": {"signal": "paint_tuple"},
                    "update": "modify(\"paint_store\", paint_toggle ? null : paint_tuple, paint_toggle ? null : true, paint_toggle ? paint_tuple : null)"
                }]
            }
        ])
    );

    assert_eq!((MULTI.modify_expr)(&ctx, selection(&ctx, "paint")), "paint_tuple, null");
}

#[test]
fn test_single_tuple_over_binned_encoding() {
    let tree = parse_tree(json!({
        "mark": "bar",
        "encoding": {
            "x": {"field": "Horsepower", "type": "quantitative", "bin": true},
            "y": {"aggregate": "count", "type": "quantitative"}
        },
        "selection": {"pick": {"type": "single", "encodings": ["x"], "clear": false}}
    }));
    let ctx = context(&tree);
    let signals = to_json(&(SINGLE.signals)(&ctx, selection(&ctx, "pick")).expect("Signals failed"));

    assert_eq!(
        signals[0]["on"][0]["update"],
        json!(
            "datum && item().mark.marktype !== 'group' ? {unit: \"\", encodings: [\"x\"], fields: [\"Horsepower\"], values: [[datum[\"bin_maxbins_10_Horsepower\"], datum[\"bin_maxbins_10_Horsepower_end\"]]], bins: {\"Horsepower\":1}} : null"
        )
    );
    assert_eq!((SINGLE.modify_expr)(&ctx, selection(&ctx, "pick")), "pick_tuple, true");
    assert_eq!(selection(&ctx, "pick").clear, None);
}

#[test]
fn test_nearest_reads_through_voronoi_cells() {
    let tree = scatter_with_selections(json!({
        "hover": {"type": "single", "on": "mouseover", "nearest": true, "encodings": ["x"]}
    }));
    let ctx = context(&tree);
    let signals = to_json(&assemble_unit_signals(&ctx).expect("Signals failed"));
    assert_eq!(
        find_named(&signals, "hover_tuple")["on"][0]["update"],
        json!(
            "datum && item().mark.marktype !== 'group' ? {unit: \"\", encodings: [\"x\"], fields: [\"Horsepower\"], values: [(item().isVoronoi ? datum.datum : datum)[\"Horsepower\"]]} : null"
        )
    );

    let marks = assemble_unit_marks(&ctx, vec![json!({"name": "marks", "type": "symbol"})]);
    assert_eq!(marks.len(), 2);
    assert_eq!(marks[1]["name"], "voronoi");
    assert_eq!(marks[1]["from"], json!({"data": "marks"}));
    assert_eq!(
        marks[1]["transform"][0]["x"],
        json!({"expr": "datum.datum.x || 0"})
    );
    assert_eq!(marks[1]["transform"][0]["y"], json!({"expr": "0"}));

    // A second pass does not add another voronoi layer.
    let again = assemble_unit_marks(&ctx, marks.clone());
    assert_eq!(again, marks);
}

#[test]
fn test_input_bindings_drive_the_tuple() {
    let tree = scatter_with_selections(json!({
        "sel": {
            "type": "single",
            "fields": ["Horsepower"],
            "bind": {"input": "range", "min": 0}
        }
    }));
    let ctx = context(&tree);

    let unit_signals = to_json(&assemble_unit_signals(&ctx).expect("Signals failed"));
    assert_eq!(
        find_named(&unit_signals, "sel_tuple"),
        &json!({
            "name": "sel_tuple",
            "update": "sel_Horsepower ? {fields: [\"Horsepower\"], values: [sel_Horsepower]} : null"
        })
    );

    let top_level = to_json(&assemble_top_level_signals(&tree, Vec::new()));
    assert_eq!(
        top_level,
        json!([
            {
                "name": "unit",
                "value": {},
                "on": [{"events": "mousemove", "update": "isTuple(group()) ? group() : unit"}]
            },
            {
                "name": "sel_Horsepower",
                "value": "",
                "on": [
                    {
                        "events": {"source": "scope", "type": "click"},
                        "update": "datum && item().mark.marktype !== 'group' ? datum[\"Horsepower\"] : null"
                    },
                    {"events": {"source": "scope", "type": "dblclick"}, "update": "null"}
                ],
                "bind": {"input": "range", "min": 0}
            },
            {"name": "sel", "update": "vlSelectionResolve(\"sel_store\")"}
        ])
    );
}

#[test]
fn test_top_level_resolve_signals() {
    let tree = scatter_with_selections(json!({
        "brush": {"type": "interval"},
        "paint": {"type": "multi", "resolve": "union"}
    }));
    let signals = to_json(&assemble_top_level_signals(&tree, Vec::new()));

    assert_includes(
        &signals,
        &[
            json!({"name": "brush", "update": "vlSelectionResolve(\"brush_store\")"}),
            json!({"name": "paint", "update": "vlSelectionResolve(\"paint_store\", \"union\")"}),
        ],
    );
    assert_eq!(signals[0]["name"], "unit");
}

#[test]
fn test_no_top_level_signals_without_selections() {
    let tree = parse_unit(json!({"x": {"field": "a", "type": "quantitative"}}));
    assert!(assemble_top_level_signals(&tree, Vec::new()).is_empty());
}

#[test]
fn test_store_data_seeded_from_init() {
    let tree = scatter_with_selections(json!({
        "pick": {"type": "single", "fields": ["Origin"], "init": {"Origin": "Japan"}},
        "brush": {"type": "interval", "encodings": ["x"], "init": {"x": [50, 100]}},
        "paint": {"type": "multi"}
    }));
    let ctx = context(&tree);
    let data = to_json(&assemble_unit_data(&ctx));

    assert_eq!(
        data,
        json!([
            {
                "name": "pick_store",
                "values": [{"unit": "", "encodings": [], "fields": ["Origin"], "values": ["Japan"]}]
            },
            {
                "name": "brush_store",
                "values": [{
                    "unit": "",
                    "intervals": [{"encoding": "x", "field": "Horsepower", "extent": [50, 100]}]
                }]
            },
            {"name": "paint_store"}
        ])
    );
}

#[test]
fn test_predicates_follow_empty_and_resolve() {
    let tree = scatter_with_selections(json!({
        "brush": {"type": "interval"},
        "paint": {"type": "multi", "empty": "none", "resolve": "union"}
    }));

    let brush = "!(length(data(\"brush_store\"))) || (vlSelectionTest(\"brush_store\", datum))";
    let paint = "length(data(\"paint_store\")) && (vlSelectionTest(\"paint_store\", datum, \"union\"))";
    assert_eq!(predicate(&tree, "brush").expect("Predicate failed"), brush);
    assert_eq!(predicate(&tree, "paint").expect("Predicate failed"), paint);

    let composed: SelectionPredicate =
        serde_json::from_value(json!({"and": ["brush", {"not": "paint"}]}))
            .expect("Invalid selection predicate");
    assert_eq!(
        selection_predicate(&tree, &composed).expect("Predicate failed"),
        format!("({}) && (!({}))", brush, paint)
    );

    let either: SelectionPredicate =
        serde_json::from_value(json!({"or": ["brush", "paint"]})).expect("Invalid selection predicate");
    assert_eq!(
        selection_predicate(&tree, &either).expect("Predicate failed"),
        format!("({}) || ({})", brush, paint)
    );
}

#[test]
fn test_predicate_on_unknown_selection() {
    let tree = scatter_with_selections(json!({"brush": {"type": "interval"}}));
    assert_eq!(
        predicate(&tree, "missing"),
        Err(CompileError::SelectionNotFound("missing".to_string()))
    );
}

#[test]
fn test_with_defaults_fills_unset_properties() {
    let config = Config::default();
    let defaults = &config.selection.interval;

    let def = SelectionProps {
        mark: Some(BrushConfig {
            fill: Some("red".to_string()),
            ..Default::default()
        }),
        fields: Some(vec!["a".to_string()]),
        clear: Some(BoolOrString::Bool(false)),
        zoom: Some(BoolOrString::Bool(true)),
        ..Default::default()
    };
    let props = with_defaults(&def, defaults);

    assert_eq!(
        props.mark,
        Some(BrushConfig {
            fill: Some("red".to_string()),
            fill_opacity: Some(0.125),
            stroke: Some("white".to_string()),
            ..Default::default()
        })
    );
    assert_eq!(props.fields, Some(vec!["a".to_string()]));
    assert_eq!(props.encodings, None);
    assert_eq!(props.clear, Some(BoolOrString::Bool(false)));
    assert_eq!(props.zoom, Some(BoolOrString::Str("wheel!".to_string())));
    assert_eq!(props.resolve, Some(SelectionResolution::Global));
}

#[test]
fn test_toggle_true_uses_default_modifier() {
    let config = Config::default();
    let def = SelectionProps {
        toggle: Some(BoolOrString::Bool(true)),
        ..Default::default()
    };
    let props = with_defaults(&def, &config.selection.multi);
    assert_eq!(props.toggle, Some(BoolOrString::Str("event.shiftKey".to_string())));
    assert_eq!(props.on.as_deref(), Some("click"));
}
