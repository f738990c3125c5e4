use super::{DataFlow, NodeId, TransformNode};
use crate::vega::VgData;

/// Walks the graph depth-first and cuts it into datasets.
///
/// Each root opens a dataset named after its source. Transforms accumulate
/// into the open dataset; an output names it (or, when it already has a
/// name, starts a new dataset reading from it); a fork closes it and every
/// branch opens a dataset sourced from it.
pub fn assemble(flow: &DataFlow) -> Vec<VgData> {
    let mut assembler = Assembler {
        flow,
        datasets: Vec::new(),
        anonymous: 0,
    };
    for root in flow.roots() {
        let dataset = match flow.node(*root) {
            TransformNode::Source(source) => source.dataset(),
            _ => VgData::default(),
        };
        assembler.walk(*root, dataset);
    }
    assembler.datasets
}

struct Assembler<'a> {
    flow: &'a DataFlow,
    datasets: Vec<VgData>,
    anonymous: usize,
}

impl Assembler<'_> {
    fn close(&mut self, mut dataset: VgData) -> String {
        if dataset.name.is_empty() {
            dataset.name = format!("data_{}", self.anonymous);
            self.anonymous += 1;
        }
        let name = dataset.name.clone();
        self.datasets.push(dataset);
        name
    }

    fn walk(&mut self, id: NodeId, mut dataset: VgData) {
        let flow = self.flow;
        let node = flow.node(id);
        if let TransformNode::Output(output) = node {
            if dataset.name.is_empty() {
                dataset.name = output.name.clone();
            } else {
                let source = self.close(dataset);
                dataset = VgData {
                    name: output.name.clone(),
                    source: Some(source),
                    ..Default::default()
                };
            }
        } else {
            dataset.transform.extend(node.assemble());
        }

        match flow.children(id) {
            [] => {
                self.close(dataset);
            }
            [child] => self.walk(*child, dataset),
            children => {
                let source = self.close(dataset);
                for child in children {
                    self.walk(
                        *child,
                        VgData {
                            source: Some(source.clone()),
                            ..Default::default()
                        },
                    );
                }
            }
        }
    }
}
