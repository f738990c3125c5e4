//! Common test utilities for building chart specifications and view trees.
use sakuzu::compiler::parsing::parse_spec;
use sakuzu::prelude::*;
use serde_json::{Value, json};

/// Parses a chart specification written as JSON into a view tree, using
/// the default configuration.
#[allow(dead_code)]
pub fn parse_tree(spec: Value) -> ModelTree {
    parse_tree_with(spec, &Config::default())
}

#[allow(dead_code)]
pub fn parse_tree_with(spec: Value, config: &Config) -> ModelTree {
    let spec: ChartSpec = serde_json::from_value(spec).expect("Invalid chart specification");
    parse_spec(&spec, config).expect("Failed to parse chart specification")
}

/// A point mark over `encoding`, without data.
#[allow(dead_code)]
pub fn parse_unit(encoding: Value) -> ModelTree {
    parse_tree(json!({
        "mark": "point",
        "encoding": encoding
    }))
}

/// The classic cars rows, trimmed to the fields the tests use.
#[allow(dead_code)]
pub fn cars() -> Value {
    json!([
        {"Name": "chevrolet chevelle malibu", "Horsepower": 130, "Miles_per_Gallon": 18, "Displacement": 307, "Acceleration": 12, "Origin": "USA", "Year": "1970-01-01"},
        {"Name": "buick skylark 320", "Horsepower": 165, "Miles_per_Gallon": 15, "Displacement": 350, "Acceleration": 11.5, "Origin": "USA", "Year": "1970-01-01"},
        {"Name": "toyota corona mark ii", "Horsepower": 95, "Miles_per_Gallon": 24, "Displacement": 113, "Acceleration": 15, "Origin": "Japan", "Year": "1970-01-01"},
        {"Name": "peugeot 504", "Horsepower": 87, "Miles_per_Gallon": 19, "Displacement": 110, "Acceleration": 17.5, "Origin": "Europe", "Year": "1971-01-01"}
    ])
}

/// The scatter plot most selection tests run against: Horsepower on x,
/// Miles-per-Gallon on y and Origin on color, plus the given selections.
#[allow(dead_code)]
pub fn scatter_with_selections(selection: Value) -> ModelTree {
    parse_tree(json!({
        "mark": "circle",
        "encoding": {
            "x": {"field": "Horsepower", "type": "quantitative"},
            "y": {"field": "Miles-per-Gallon", "type": "quantitative"},
            "color": {"field": "Origin", "type": "nominal"}
        },
        "selection": selection
    }))
}

/// Serializes anything the compiler outputs for comparison with `json!` literals.
#[allow(dead_code)]
pub fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).expect("Failed to serialize")
}

/// Asserts that every expected entry appears somewhere in `actual`.
#[allow(dead_code)]
pub fn assert_includes(actual: &Value, expected: &[Value]) {
    let items = actual.as_array().expect("Expected a JSON array");
    for entry in expected {
        assert!(
            items.contains(entry),
            "Missing entry:\n{}\nin:\n{}",
            serde_json::to_string_pretty(entry).unwrap_or_default(),
            serde_json::to_string_pretty(actual).unwrap_or_default()
        );
    }
}

/// The entry of a JSON array whose `name` is `name`.
#[allow(dead_code)]
pub fn find_named<'a>(items: &'a Value, name: &str) -> &'a Value {
    items
        .as_array()
        .and_then(|items| items.iter().find(|item| item["name"] == name))
        .unwrap_or_else(|| panic!("No entry named '{}' in {}", name, items))
}
