//! Resolve values to the tensors known at compile time.
//!
//! Only two origins count as statically known: a graph input bound to a
//! parameter, and the literal of a `Constant` node. Anything computed at
//! runtime resolves to nothing.

use jasper_core::{AttributeValue, Graph, NodeId, Result, TensorValue, ValueId, ValueParamMap, kinds};

/// Where a statically known tensor comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TensorSource<'a> {
    /// A graph input bound to the named parameter.
    Bound(&'a str),

    /// The `value` attribute of a `Constant` node.
    Literal(&'a TensorValue),
}

/// Classify the origin of `value`.
///
/// A `Param` output that is not in the binding table is untracked and yields
/// `None`, as does any other producer kind.
pub fn source_of<'a>(
    graph: &'a Graph,
    value: ValueId,
    table: &'a ValueParamMap,
) -> Option<TensorSource<'a>> {
    let producer = graph.producer(value).ok()?;
    match producer.kind() {
        kinds::PARAM => table.name_of(value).map(TensorSource::Bound),
        kinds::CONSTANT => match producer.attributes.get("value") {
            Some(AttributeValue::Tensor(tensor)) => Some(TensorSource::Literal(tensor)),
            _ => None,
        },
        _ => None,
    }
}

/// An independent copy of the tensor behind `value`, if it is statically known.
pub fn resolve(graph: &Graph, value: ValueId, table: &ValueParamMap) -> Option<TensorValue> {
    match source_of(graph, value, table)? {
        TensorSource::Bound(_) => table.get(value).cloned(),
        TensorSource::Literal(tensor) => Some(tensor.clone()),
    }
}

/// Resolve every input of `node` in order, skipping the ones that are not
/// statically known.
pub fn resolve_inputs(graph: &Graph, node: NodeId, table: &ValueParamMap) -> Result<Vec<TensorValue>> {
    Ok(graph
        .node(node)?
        .inputs()
        .iter()
        .filter_map(|&input| resolve(graph, input, table))
        .collect())
}
