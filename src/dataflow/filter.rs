use super::FieldSet;
use super::formula::expression_fields;
use crate::error::CompileError;
use crate::model::ModelTree;
use crate::selection::selection_predicate;
use crate::spec::{FieldPredicate, FilterPredicate};
use crate::util::{datum_ref, value_to_expr};
use crate::vega::VgTransform;
use serde_json::Value;

/// Keeps the rows an expression accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterNode {
    pub expr: String,
    fields: FieldSet,
}

impl FilterNode {
    /// A filter from a raw expression; its fields are read off `datum` references.
    pub fn from_expr(expr: impl Into<String>) -> Self {
        let expr = expr.into();
        let fields = expression_fields(&expr);
        Self { expr, fields }
    }

    pub fn from_predicate(tree: &ModelTree, predicate: &FilterPredicate) -> Result<Self, CompileError> {
        match predicate {
            FilterPredicate::Expr(expr) => Ok(Self::from_expr(expr.clone())),
            FilterPredicate::Field(field) => Ok(Self {
                expr: field_predicate_expr(field),
                fields: std::iter::once(field.field.clone()).collect(),
            }),
            FilterPredicate::Selection(filter) => {
                let expr = selection_predicate(tree, &filter.selection)?;
                let mut fields = FieldSet::default();
                for name in filter.selection.names() {
                    if let Some((_, selection)) = tree.find_selection(name) {
                        fields.extend(selection.projected_fields().map(str::to_string));
                    }
                }
                Ok(Self { expr, fields })
            }
        }
    }

    pub fn dependent_fields(&self) -> FieldSet {
        self.fields.clone()
    }

    pub fn assemble(&self) -> VgTransform {
        VgTransform::Filter {
            expr: self.expr.clone(),
        }
    }
}

/// Expression for a field predicate. With a time unit, the field is
/// truncated first and compared as a timestamp.
pub fn field_predicate_expr(predicate: &FieldPredicate) -> String {
    let field = match &predicate.time_unit {
        Some(unit) => format!("time({})", unit.field_expr(&predicate.field)),
        None => datum_ref(&predicate.field),
    };

    if let Some(value) = &predicate.equal {
        return format!("{}==={}", field, value_to_expr(value));
    }
    if let Some(values) = &predicate.one_of {
        let values: Vec<String> = values.iter().map(value_to_expr).collect();
        return format!("indexof([{}], {}) !== -1", values.join(","), field);
    }
    if let Some(range) = &predicate.range {
        let bound = |i: usize| range.get(i).filter(|v| !v.is_null());
        return match (bound(0), bound(1)) {
            (Some(lower), Some(upper)) => format!(
                "inrange({}, [{}, {}])",
                field,
                value_to_expr(lower),
                value_to_expr(upper)
            ),
            (Some(lower), None) => format!("{} >= {}", field, value_to_expr(lower)),
            (None, Some(upper)) => format!("{} <= {}", field, value_to_expr(upper)),
            (None, None) => "true".to_string(),
        };
    }

    let comparisons: [(&Option<Value>, &str); 4] = [
        (&predicate.lt, "<"),
        (&predicate.lte, "<="),
        (&predicate.gt, ">"),
        (&predicate.gte, ">="),
    ];
    let parts: Vec<String> = comparisons
        .iter()
        .filter_map(|(value, op)| {
            value
                .as_ref()
                .map(|v| format!("{}{}{}", field, op, value_to_expr(v)))
        })
        .collect();
    if parts.is_empty() {
        "true".to_string()
    } else {
        parts.join(" && ")
    }
}
