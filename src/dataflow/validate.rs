use super::{DataFlow, FieldSet, NodeId, TransformNode};
use crate::error::CompileError;

impl DataFlow {
    /// Checks that every node reads only fields available at its position.
    ///
    /// Fields are known below a source with inline rows; below a source
    /// loaded from elsewhere nothing is checked. An aggregate leaves only its
    /// group-by and output fields.
    pub fn validate(&self) -> Result<(), CompileError> {
        for root in self.roots() {
            self.validate_from(*root, None)?;
        }
        Ok(())
    }

    fn validate_from(&self, id: NodeId, available: Option<&FieldSet>) -> Result<(), CompileError> {
        let node = self.node(id);
        let mut fields = match node {
            TransformNode::Source(source) => source.schema.clone(),
            _ => available.cloned(),
        };

        if let Some(fields) = &fields {
            let checked = match node {
                TransformNode::Output(output) => output.required.clone(),
                _ => node.dependent_fields(),
            };
            if let Some(missing) = checked
                .into_iter()
                .find(|field| !fields.contains(field))
            {
                return Err(CompileError::MissingField {
                    field: missing,
                    node: node.kind().to_string(),
                });
            }
        }

        if let Some(current) = &mut fields {
            if let TransformNode::Aggregate(aggregate) = node {
                *current = aggregate.dimensions.clone();
            }
            current.extend(node.produced_fields());
        }

        for child in self.children(id) {
            self.validate_from(*child, fields.as_ref())?;
        }
        Ok(())
    }
}
