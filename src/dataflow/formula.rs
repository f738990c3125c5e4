use super::FieldSet;
use crate::vega::VgTransform;
use regex::Regex;
use std::sync::LazyLock;

/// `datum.name`, `datum["name"]` and `datum['name']`.
static DATUM_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"datum(?:\.([A-Za-z_$][\w$]*)|\["([^"]*)"\]|\['([^']*)'\])"#)
        .unwrap_or_else(|err| panic!("invalid datum field pattern: {}", err))
});

/// Fields an expression reads from `datum`, in order of first use.
pub fn expression_fields(expr: &str) -> FieldSet {
    DATUM_FIELD
        .captures_iter(expr)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// A computed field, from a `calculate` transform.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaNode {
    pub expr: String,
    pub as_field: String,
}

impl FormulaNode {
    pub fn new(expr: impl Into<String>, as_field: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            as_field: as_field.into(),
        }
    }

    pub fn produced_fields(&self) -> FieldSet {
        std::iter::once(self.as_field.clone()).collect()
    }

    pub fn dependent_fields(&self) -> FieldSet {
        expression_fields(&self.expr)
    }

    pub fn assemble(&self) -> VgTransform {
        VgTransform::Formula {
            expr: self.expr.clone(),
            as_field: self.as_field.clone(),
        }
    }
}
