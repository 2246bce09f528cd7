//! Binding between graph inputs and named parameter tensors.
//!
//! The export pipeline hands passes a [`ParamMap`] (parameter name to
//! tensor). Passes work on a [`ValueParamMap`], which keys the same tensors by
//! the graph input they are bound to, so a pass can look up the tensor behind
//! a value and register new parameters as it introduces new graph inputs.

use crate::Result;
use crate::ir::{BlockId, Graph, ValueId};
use crate::tensor::TensorValue;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Parameter dictionary: name -> tensor.
pub type ParamMap = HashMap<String, TensorValue>;

/// Binding table: graph input -> (parameter name, tensor).
#[derive(Debug, Clone, Default)]
pub struct ValueParamMap {
    entries: BTreeMap<ValueId, (String, TensorValue)>,

    /// Names present in the source dictionary, bound or not.
    reserved: HashSet<String>,
}

impl ValueParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every graph input whose debug name names a parameter in `params`.
    pub fn from_params(graph: &Graph, params: &ParamMap) -> Self {
        let mut table = Self {
            reserved: params.keys().cloned().collect(),
            ..Self::default()
        };
        table.bind_named(graph, graph.inputs(), params);
        table
    }

    /// Like [`ValueParamMap::from_params`], additionally binding the inputs
    /// of `block` by name.
    pub fn for_block(graph: &Graph, block: BlockId, params: &ParamMap) -> Result<Self> {
        let mut table = Self::from_params(graph, params);
        if block != graph.root() {
            table.bind_named(graph, graph.block_inputs(block)?, params);
        }
        Ok(table)
    }

    fn bind_named(&mut self, graph: &Graph, inputs: &[ValueId], params: &ParamMap) {
        for &input in inputs {
            let Ok(value) = graph.value(input) else {
                continue;
            };
            if let Some(tensor) = params.get(value.name()) {
                self.insert(input, value.name().to_string(), tensor.clone());
            }
        }
    }

    /// Copy every binding into `params` under its name.
    ///
    /// Entries already in `params` are kept; a binding with the same name
    /// overwrites the stored tensor.
    pub fn write_back(&self, params: &mut ParamMap) {
        for (name, tensor) in self.entries.values() {
            params.insert(name.clone(), tensor.clone());
        }
    }

    pub fn insert(&mut self, value: ValueId, name: String, tensor: TensorValue) {
        self.entries.insert(value, (name, tensor));
    }

    /// Tensor bound to `value`, if any.
    pub fn get(&self, value: ValueId) -> Option<&TensorValue> {
        self.entries.get(&value).map(|(_, tensor)| tensor)
    }

    /// Parameter name bound to `value`, if any.
    pub fn name_of(&self, value: ValueId) -> Option<&str> {
        self.entries.get(&value).map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, value: ValueId) -> bool {
        self.entries.contains_key(&value)
    }

    /// Whether `name` is bound or was present in the source dictionary.
    pub fn contains_name(&self, name: &str) -> bool {
        self.reserved.contains(name) || self.entries.values().any(|(bound, _)| bound == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_params_binds_named_inputs() {
        let mut graph = Graph::new();
        let x = graph.add_input();
        let w = graph.add_input();
        graph.set_debug_name(x, "input").unwrap();
        graph.set_debug_name(w, "conv.weight").unwrap();

        let mut params = ParamMap::new();
        params.insert(
            "conv.weight".to_string(),
            TensorValue::from_f32(vec![1.0, 2.0], vec![2]),
        );
        params.insert(
            "unused".to_string(),
            TensorValue::from_f32(vec![0.0], vec![1]),
        );

        let table = ValueParamMap::from_params(&graph, &params);
        assert_eq!(table.len(), 1);
        assert!(!table.contains(x));
        assert_eq!(table.name_of(w), Some("conv.weight"));
        assert_eq!(table.get(w), params.get("conv.weight"));
        assert!(table.contains_name("conv.weight"));
        assert!(table.contains_name("unused"));
        assert!(!table.contains_name("input"));
    }

    #[test]
    fn test_for_block_binds_block_inputs() {
        let mut graph = Graph::new();
        let root = graph.root();
        let w = graph.add_input();
        graph.set_debug_name(w, "w").unwrap();
        let loop_node = graph.append(root, "Loop", &[w], 0).unwrap();
        let body = graph.add_block(loop_node).unwrap();
        let carried = graph.add_block_input(body).unwrap();
        graph.set_debug_name(carried, "body.scale").unwrap();

        let mut params = ParamMap::new();
        params.insert("w".to_string(), TensorValue::from_f32(vec![1.0], vec![1]));
        params.insert(
            "body.scale".to_string(),
            TensorValue::from_f32(vec![2.0], vec![1]),
        );

        let root_only = ValueParamMap::from_params(&graph, &params);
        assert!(root_only.contains(w));
        assert!(!root_only.contains(carried));

        let table = ValueParamMap::for_block(&graph, body, &params).unwrap();
        assert!(table.contains(w));
        assert_eq!(table.name_of(carried), Some("body.scale"));
        assert_eq!(table.get(carried), params.get("body.scale"));

        let at_root = ValueParamMap::for_block(&graph, root, &params).unwrap();
        assert_eq!(at_root.len(), 1);
    }

    #[test]
    fn test_write_back_keeps_existing_entries() {
        let mut graph = Graph::new();
        let w = graph.add_input();

        let mut params = ParamMap::new();
        params.insert("kept".to_string(), TensorValue::from_f32(vec![1.0], vec![1]));

        let mut table = ValueParamMap::new();
        table.insert(w, "fused".to_string(), TensorValue::from_f32(vec![2.0], vec![1]));
        table.write_back(&mut params);

        assert_eq!(params.len(), 2);
        assert!(params.contains_key("kept"));
        assert_eq!(params["fused"].as_f32(), Some(&[2.0][..]));
    }
}
