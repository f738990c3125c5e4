//! End-to-end compilation of multi-view charts with interactive selections.
mod common;
use common::*;
use sakuzu::prelude::*;
use serde_json::{Value, json};

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn compile(spec: Value) -> Value {
        let spec: ChartSpec = serde_json::from_value(spec).expect("Invalid chart specification");
        Compiler::builder(spec)
            .build()
            .compile()
            .expect("Compilation failed")
            .to_json()
    }

    fn names(items: &Value) -> Vec<&str> {
        items
            .as_array()
            .expect("Expected a JSON array")
            .iter()
            .filter_map(|item| item["name"].as_str())
            .collect()
    }

    #[test]
    fn test_layered_brush_wraps_every_layer() {
        let doc = compile(json!({
            "data": {"values": cars()},
            "width": 300,
            "encoding": {
                "x": {"field": "Horsepower", "type": "quantitative"},
                "y": {"field": "Miles_per_Gallon", "type": "quantitative"}
            },
            "layer": [
                {"mark": "point", "selection": {"brush": {"type": "interval"}}},
                {"mark": "line", "selection": {"grid": {"type": "interval", "bind": "scales"}}}
            ]
        }));

        let test = "data(\"brush_store\").length && data(\"brush_store\")[0].unit === \"layer_0\"";
        let marks = doc["marks"].as_array().expect("Expected marks");
        assert_eq!(marks.len(), 4);
        assert_eq!(marks[0]["name"], json!("brush_brush_bg"));
        assert_eq!(
            marks[0]["encode"]["update"]["x"],
            json!([{"test": test, "signal": "brush_x[0]"}, {"value": 0}])
        );
        assert_eq!(
            marks[1],
            json!({
                "name": "layer_0_marks",
                "type": "symbol",
                "style": ["point"],
                "from": {"data": "layer_0_main"},
                "clip": true
            })
        );
        assert_eq!(
            marks[2],
            json!({
                "name": "layer_1_marks",
                "type": "line",
                "style": ["line"],
                "from": {"data": "layer_1_main"},
                "clip": true
            })
        );
        assert_eq!(marks[3]["name"], json!("brush_brush"));

        // Layers share one set of scales and one size.
        assert_eq!(names(&doc["scales"]), vec!["x", "y"]);
        assert_eq!(
            doc["scales"][0]["domainRaw"],
            json!({"signal": "grid_Horsepower"})
        );
        let signals = &doc["signals"];
        assert_eq!(signals[0]["name"], json!("unit"));
        assert_eq!(find_named(signals, "width"), &json!({"name": "width", "update": "300"}));
        assert_eq!(
            find_named(signals, "brush"),
            &json!({"name": "brush", "update": "vlSelectionResolve(\"brush_store\")"})
        );

        assert_eq!(
            names(&doc["data"]),
            vec!["source_0", "layer_0_main", "layer_1_main", "brush_store", "grid_store"]
        );
    }

    #[test]
    fn test_selection_filter_across_layers() {
        let doc = compile(json!({
            "data": {"values": cars()},
            "encoding": {
                "x": {"field": "Horsepower", "type": "quantitative"},
                "y": {"field": "Miles_per_Gallon", "type": "quantitative"}
            },
            "layer": [
                {
                    "mark": "point",
                    "selection": {"brush": {"type": "interval", "encodings": ["x"]}}
                },
                {
                    "mark": "point",
                    "transform": [{"filter": {"selection": "brush"}}]
                }
            ]
        }));

        assert_eq!(
            find_named(&doc["data"], "layer_1_main"),
            &json!({
                "name": "layer_1_main",
                "source": "source_0",
                "transform": [{
                    "type": "filter",
                    "expr": "!(length(data(\"brush_store\"))) || (vlSelectionTest(\"brush_store\", datum))"
                }]
            })
        );
        assert_eq!(
            find_named(&doc["data"], "layer_0_main"),
            &json!({"name": "layer_0_main", "source": "source_0"})
        );
    }

    #[test]
    fn test_concat_children_get_group_marks() {
        let doc = compile(json!({
            "data": {"values": cars()},
            "hconcat": [
                {
                    "mark": "point",
                    "encoding": {"x": {"field": "Horsepower", "type": "quantitative"}}
                },
                {
                    "mark": "bar",
                    "selection": {"pick": {"type": "single"}},
                    "encoding": {"x": {"field": "Origin", "type": "nominal"}}
                }
            ]
        }));

        assert_eq!(
            names(&doc["data"]),
            vec!["source_0", "concat_0_main", "concat_1_main", "pick_store"]
        );
        assert_eq!(
            doc["data"][0]["transform"],
            json!([{"type": "identifier", "as": "_vgsid_"}])
        );
        assert_eq!(names(&doc["scales"]), vec!["concat_0_x", "concat_1_x"]);
        assert_eq!(
            names(&doc["signals"]),
            vec![
                "unit",
                "concat_0_width",
                "concat_0_height",
                "concat_1_width",
                "concat_1_height",
                "pick"
            ]
        );

        let marks = doc["marks"].as_array().expect("Expected marks");
        assert_eq!(
            marks[0],
            json!({
                "type": "group",
                "name": "concat_0_group",
                "encode": {
                    "update": {
                        "width": {"signal": "concat_0_width"},
                        "height": {"signal": "concat_0_height"}
                    }
                },
                "marks": [{
                    "name": "concat_0_marks",
                    "type": "symbol",
                    "style": ["point"],
                    "from": {"data": "concat_0_main"}
                }]
            })
        );

        // Selection signals live inside the group of the view declaring them.
        let group = &marks[1];
        assert_eq!(names(&group["signals"]), vec!["pick_tuple", "pick_modify"]);
        assert_eq!(
            find_named(&group["signals"], "pick_modify")["on"][0]["update"],
            json!("modify(\"pick_store\", pick_tuple, {unit: \"concat_1\"})")
        );
        assert_eq!(
            group["marks"],
            json!([{
                "name": "concat_1_marks",
                "type": "rect",
                "style": ["bar"],
                "from": {"data": "concat_1_main"}
            }])
        );
    }

    #[test]
    fn test_interval_in_concat_stamps_its_unit() {
        let doc = compile(json!({
            "data": {"values": cars()},
            "vconcat": [
                {
                    "mark": "point",
                    "encoding": {"x": {"field": "Horsepower", "type": "quantitative"}}
                },
                {
                    "mark": "point",
                    "selection": {"brush": {"type": "interval"}},
                    "encoding": {
                        "x": {"field": "Horsepower", "type": "quantitative"},
                        "y": {"field": "Miles_per_Gallon", "type": "quantitative"}
                    }
                }
            ]
        }));

        let group = &doc["marks"][1];
        assert_eq!(
            find_named(&group["signals"], "brush_modify")["on"][0]["update"],
            json!("modify(\"brush_store\", brush_tuple, {unit: \"concat_1\"})")
        );
        assert!(names(&group["marks"]).contains(&"brush_brush"));
    }

    #[test]
    fn test_histogram_bins_then_aggregates() {
        let doc = compile(json!({
            "data": {"values": cars()},
            "mark": "bar",
            "encoding": {
                "x": {"field": "Horsepower", "type": "quantitative", "bin": true},
                "y": {"aggregate": "count", "type": "quantitative"}
            }
        }));

        let transforms: Vec<&str> = doc["data"][0]["transform"]
            .as_array()
            .expect("Expected transforms")
            .iter()
            .filter_map(|t| t["type"].as_str())
            .collect();
        assert_eq!(transforms, vec!["extent", "bin", "aggregate"]);

        let aggregate = &doc["data"][0]["transform"][2];
        assert_eq!(aggregate["ops"], json!(["count"]));
        assert_eq!(aggregate["as"], json!(["count_*"]));
        assert_eq!(
            find_named(&doc["scales"], "x")["domain"],
            json!({
                "data": "main",
                "fields": ["bin_maxbins_10_Horsepower", "bin_maxbins_10_Horsepower_end"]
            })
        );
        assert_eq!(
            find_named(&doc["scales"], "y")["domain"],
            json!({"data": "main", "field": "count_*"})
        );
    }

    #[test]
    fn test_unused_calculation_is_pruned() {
        let doc = compile(json!({
            "data": {"values": cars()},
            "transform": [
                {"calculate": "datum.Horsepower * 2", "as": "double"},
                {"calculate": "datum.Acceleration / 2", "as": "half"}
            ],
            "mark": "point",
            "encoding": {"x": {"field": "double", "type": "quantitative"}}
        }));

        assert_eq!(
            doc["data"][0]["transform"],
            json!([{"type": "formula", "expr": "datum.Horsepower * 2", "as": "double"}])
        );
    }

    #[test]
    fn test_selection_store_is_seeded() {
        let doc = compile(json!({
            "data": {"values": cars()},
            "mark": "point",
            "selection": {
                "brush": {"type": "interval", "encodings": ["x"], "init": {"x": [80, 120]}}
            },
            "encoding": {
                "x": {"field": "Horsepower", "type": "quantitative"},
                "y": {"field": "Miles_per_Gallon", "type": "quantitative"}
            }
        }));

        assert_eq!(
            find_named(&doc["data"], "brush_store"),
            &json!({
                "name": "brush_store",
                "values": [{
                    "unit": "",
                    "intervals": [{"encoding": "x", "field": "Horsepower", "extent": [80, 120]}]
                }]
            })
        );
    }
}
