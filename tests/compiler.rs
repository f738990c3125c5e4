//! Tests for the compiler entry points and the assembled output document.
mod common;
use common::*;
use sakuzu::prelude::*;
use serde_json::json;

fn scatter_spec() -> serde_json::Value {
    json!({
        "data": {"values": [{"a": 1, "b": 2}, {"a": 3, "b": 4}]},
        "mark": "point",
        "encoding": {
            "x": {"field": "a", "type": "quantitative"},
            "y": {"field": "b", "type": "quantitative"}
        }
    })
}

fn compile(spec: serde_json::Value) -> std::result::Result<CompilationArtifacts, CompileError> {
    let spec: ChartSpec = serde_json::from_value(spec).expect("Invalid chart specification");
    Compiler::builder(spec).build().compile()
}

#[test]
fn test_compile_scatter_plot() {
    let artifacts = compile(scatter_spec()).expect("Compilation failed");

    assert_eq!(
        artifacts.to_json(),
        json!({
            "data": [
                {"name": "source_0", "values": [{"a": 1, "b": 2}, {"a": 3, "b": 4}]},
                {"name": "main", "source": "source_0"}
            ],
            "scales": [
                {
                    "name": "x",
                    "type": "linear",
                    "domain": {"data": "main", "field": "a"},
                    "round": true,
                    "nice": true,
                    "zero": true,
                    "range": [0, {"signal": "width"}]
                },
                {
                    "name": "y",
                    "type": "linear",
                    "domain": {"data": "main", "field": "b"},
                    "round": true,
                    "nice": true,
                    "zero": true,
                    "range": [{"signal": "height"}, 0]
                }
            ],
            "signals": [
                {"name": "width", "update": "200"},
                {"name": "height", "update": "200"}
            ],
            "marks": [{
                "name": "marks",
                "type": "symbol",
                "style": ["point"],
                "from": {"data": "main"}
            }]
        })
    );
}

#[test]
fn test_from_json_reads_config_key() {
    let compiler = Compiler::from_json(
        r#"{
            "data": {"values": [{"a": 1}]},
            "mark": "tick",
            "encoding": {"x": {"field": "a", "type": "quantitative"}},
            "config": {"view": {"width": 400}, "scale": {"rangeStep": null}}
        }"#,
    )
    .expect("Failed to read chart document");

    assert_eq!(compiler.config().view.width, 400.0);
    assert_eq!(compiler.config().view.height, 200.0);
    assert_eq!(compiler.config().scale.range_step, None);

    let artifacts = compiler.compile().expect("Compilation failed");
    assert_eq!(
        to_json(&artifacts.signals),
        json!([
            {"name": "width", "update": "400"},
            {"name": "height", "update": "200"}
        ])
    );
    assert_eq!(artifacts.marks[0]["type"], json!("rect"));
    assert_eq!(artifacts.marks[0]["style"], json!(["tick"]));
}

#[test]
fn test_from_json_rejects_malformed_documents() {
    assert!(matches!(
        Compiler::from_json("{\"mark\": "),
        Err(CompileError::JsonParseError(_))
    ));
    assert!(matches!(
        Compiler::from_json(r#"{"mark": "point", "config": {"view": {"width": "wide"}}}"#),
        Err(CompileError::JsonParseError(_))
    ));
}

#[test]
fn test_builder_uses_given_config() {
    let spec: ChartSpec = serde_json::from_value(scatter_spec()).expect("Invalid chart specification");
    let mut config = Config::default();
    config.view.height = 120.0;

    let compiler = Compiler::builder(spec).with_config(config).build();
    let artifacts = compiler.compile().expect("Compilation failed");
    assert_eq!(
        to_json(&artifacts.signals[1]),
        json!({"name": "height", "update": "120"})
    );
}

#[test]
fn test_explicit_size_wins_over_config() {
    let mut spec = scatter_spec();
    spec["width"] = json!(320);
    let artifacts = compile(spec).expect("Compilation failed");
    assert_eq!(
        to_json(&artifacts.signals[0]),
        json!({"name": "width", "update": "320"})
    );
}

#[test]
fn test_intermediate_stages_are_exposed() {
    let spec: ChartSpec = serde_json::from_value(scatter_spec()).expect("Invalid chart specification");
    let compiler = Compiler::builder(spec).build();

    let tree = compiler.model_tree().expect("Failed to parse");
    assert_eq!(tree.len(), 1);
    let flow = compiler.data_flow(&tree).expect("Failed to build data flow");
    assert_eq!(flow.len(), 2);
}

#[test]
fn test_unit_without_data_is_rejected() {
    let result = compile(json!({
        "mark": "point",
        "encoding": {"x": {"field": "a", "type": "quantitative"}}
    }));
    assert!(matches!(result, Err(CompileError::MissingDataSource { .. })));
}

#[test]
fn test_layer_transforms_without_data_are_rejected() {
    let result = compile(json!({
        "transform": [{"calculate": "datum.a * 2", "as": "b"}],
        "layer": [{
            "data": {"values": [{"a": 1}]},
            "mark": "point",
            "encoding": {"x": {"field": "b", "type": "quantitative"}}
        }]
    }));
    assert!(matches!(result, Err(CompileError::MissingDataSource { .. })));
}

#[test]
fn test_missing_field_aborts_compilation() {
    let result = compile(json!({
        "data": {"values": [{"a": 1}]},
        "transform": [{"calculate": "datum.nope * 2", "as": "b"}],
        "mark": "point",
        "encoding": {"x": {"field": "b", "type": "quantitative"}}
    }));
    assert!(matches!(result, Err(CompileError::MissingField { .. })));
}

#[test]
fn test_filter_on_unknown_selection_is_rejected() {
    let result = compile(json!({
        "data": {"values": [{"a": 1}]},
        "transform": [{"filter": {"selection": "brush"}}],
        "mark": "point",
        "encoding": {"x": {"field": "a", "type": "quantitative"}}
    }));
    assert_eq!(
        result,
        Err(CompileError::SelectionNotFound("brush".to_string()))
    );
}

#[test]
fn test_interval_on_plain_event_is_rejected() {
    let result = compile(json!({
        "data": {"values": [{"a": 1, "b": 2}]},
        "mark": "point",
        "selection": {"brush": {"type": "interval", "on": "click"}},
        "encoding": {
            "x": {"field": "a", "type": "quantitative"},
            "y": {"field": "b", "type": "quantitative"}
        }
    }));
    assert_eq!(
        result,
        Err(CompileError::IntervalWithoutBetween {
            selection: "brush".to_string()
        })
    );
}

#[test]
fn test_invalid_event_selector_is_rejected() {
    let result = compile(json!({
        "data": {"values": [{"a": 1}]},
        "mark": "point",
        "selection": {"pick": {"type": "single", "on": "[click] > mousemove"}},
        "encoding": {"x": {"field": "a", "type": "quantitative"}}
    }));
    assert!(matches!(result, Err(CompileError::InvalidEventSelector { .. })));
}

#[test]
fn test_to_json_leaves_out_empty_sections() {
    let artifacts = compile(json!({
        "data": {"values": [{"a": 1}]},
        "mark": "point"
    }))
    .expect("Compilation failed");

    let doc = artifacts.to_json();
    assert_eq!(doc.get("scales"), None);
    assert!(doc.get("data").is_some());
    assert!(doc.get("signals").is_some());
    assert!(doc.get("marks").is_some());
}
