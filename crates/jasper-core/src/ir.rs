//! Block-structured intermediate representation with explicit use-lists.
//!
//! The IR is an SSA graph where:
//! - **Nodes** (`Node`) are operators (e.g., Conv, BatchNormalization, If)
//! - **Values** (`Value`) are produced by exactly one node output and record
//!   every input slot that consumes them
//! - **Blocks** (`Block`) are ordered node sequences; control-flow nodes own
//!   nested blocks, and the graph owns the root block
//!
//! Block inputs are the outputs of the block's `Param` node and block outputs
//! are the inputs of its `Return` node, so graph inputs and outputs take part
//! in the same use-list bookkeeping as every other value.
//!
//! Nodes live in a petgraph `StableGraph` so their ids survive removal of
//! other nodes. petgraph edges mirror the def-use relation (producer to
//! consumer, one edge per use) and exist for cycle detection only.

use crate::tensor::TensorValue;
use crate::types::{AttributeValue, TensorType};
use crate::{Error, Result};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Node identifier (backed by petgraph `NodeIndex`).
pub type NodeId = NodeIndex;

/// Value identifier: an index into the graph's value arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueId(pub usize);

/// Block identifier: an index into the graph's block arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub usize);

/// Well-known node kinds.
pub mod kinds {
    pub const PARAM: &str = "Param";
    pub const RETURN: &str = "Return";
    pub const CONSTANT: &str = "Constant";
    pub const CONV: &str = "Conv";
    pub const BATCH_NORMALIZATION: &str = "BatchNormalization";
}

/// One consuming input slot of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Use {
    /// The consuming node.
    pub user: NodeId,

    /// Input position within the consuming node.
    pub offset: usize,
}

/// Definition site of a value: an output slot of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueDef {
    pub node: NodeId,
    pub offset: usize,
}

// ──────────────────────────────── Value ─────────────────────────────────

/// An SSA value.
#[derive(Debug, Clone)]
pub struct Value {
    name: String,
    ty: Option<TensorType>,
    def: ValueDef,
    uses: Vec<Use>,
}

impl Value {
    /// Debug name, unique within the graph.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type metadata, if known.
    pub fn ty(&self) -> Option<&TensorType> {
        self.ty.as_ref()
    }

    /// The node output that defines this value.
    pub fn def(&self) -> ValueDef {
        self.def
    }

    /// Every input slot that consumes this value.
    pub fn uses(&self) -> &[Use] {
        &self.uses
    }

    pub fn has_uses(&self) -> bool {
        !self.uses.is_empty()
    }
}

// ──────────────────────────────── Node ──────────────────────────────────

/// An operator node.
#[derive(Debug, Clone)]
pub struct Node {
    /// Operator kind (e.g., "Conv", "BatchNormalization").
    pub kind: String,

    /// Node name (may be empty).
    pub name: String,

    /// Operator attributes (e.g., strides, epsilon).
    pub attributes: BTreeMap<String, AttributeValue>,

    inputs: Vec<ValueId>,
    outputs: Vec<ValueId>,
    blocks: Vec<BlockId>,
    owning_block: Option<BlockId>,
}

impl Node {
    fn new(kind: impl Into<String>, owning_block: Option<BlockId>) -> Self {
        Self {
            kind: kind.into(),
            name: String::new(),
            attributes: BTreeMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            blocks: Vec::new(),
            owning_block,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn inputs(&self) -> &[ValueId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ValueId] {
        &self.outputs
    }

    /// Nested blocks (for control-flow operators).
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// The block this node is placed in, if it has been placed.
    pub fn owning_block(&self) -> Option<BlockId> {
        self.owning_block
    }

    /// Get a typed attribute value.
    pub fn attr<T>(&self, name: &str) -> Result<T>
    where
        T: TryFrom<AttributeValue>,
        T::Error: std::fmt::Display,
    {
        let value = self
            .attributes
            .get(name)
            .ok_or_else(|| Error::Attribute(format!("Missing attribute '{name}' on {}", self.kind)))?;

        T::try_from(value.clone()).map_err(|e| {
            Error::Attribute(format!("Attribute '{name}' on {}: {e}", self.kind))
        })
    }

    /// Check if an attribute exists.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(key.into(), value);
    }
}

// ──────────────────────────────── Block ─────────────────────────────────

/// An ordered sequence of nodes with its own inputs and outputs.
#[derive(Debug, Clone)]
pub struct Block {
    param_node: NodeId,
    return_node: NodeId,
    nodes: Vec<NodeId>,
    owner: Option<NodeId>,
}

impl Block {
    /// Nodes in execution order (excludes the `Param` and `Return` nodes).
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The `Param` node whose outputs are this block's inputs.
    pub fn param_node(&self) -> NodeId {
        self.param_node
    }

    /// The `Return` node whose inputs are this block's outputs.
    pub fn return_node(&self) -> NodeId {
        self.return_node
    }

    /// The node owning this block, or `None` for the root block.
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }
}

// ──────────────────────────────── Graph ─────────────────────────────────

/// A computation graph: a root block plus the arenas backing all nodes,
/// values, and nested blocks.
#[derive(Debug, Clone)]
pub struct Graph {
    /// Node arena. Edges mirror def-use for cycle detection.
    graph: StableGraph<Node, ()>,

    /// Value arena; `None` marks a destroyed value.
    values: Vec<Option<Value>>,

    /// Block arena; `None` marks a destroyed block.
    blocks: Vec<Option<Block>>,

    /// Lookup table: debug name -> value.
    value_by_name: HashMap<String, ValueId>,

    root: BlockId,

    /// `Param` node of the root block (graph inputs).
    root_param: NodeId,

    /// Counter for generated debug names.
    next_unique: usize,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        let mut graph = Self {
            graph: StableGraph::new(),
            values: Vec::new(),
            blocks: Vec::new(),
            value_by_name: HashMap::new(),
            root: BlockId(0),
            root_param: NodeId::default(),
            next_unique: 0,
        };
        graph.root = graph.create_block(None);
        if let Ok(root) = graph.block(graph.root) {
            graph.root_param = root.param_node;
        }
        graph
    }

    fn create_block(&mut self, owner: Option<NodeId>) -> BlockId {
        let id = BlockId(self.blocks.len());
        let param_node = self.graph.add_node(Node::new(kinds::PARAM, Some(id)));
        let return_node = self.graph.add_node(Node::new(kinds::RETURN, Some(id)));
        self.blocks.push(Some(Block {
            param_node,
            return_node,
            nodes: Vec::new(),
            owner,
        }));
        id
    }

    // ── Access ──

    /// The root block.
    pub fn root(&self) -> BlockId {
        self.root
    }

    pub fn block(&self, id: BlockId) -> Result<&Block> {
        self.blocks
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::InvalidGraph(format!("Block {:?} not found", id)))
    }

    fn block_mut(&mut self, id: BlockId) -> Result<&mut Block> {
        self.blocks
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::InvalidGraph(format!("Block {:?} not found", id)))
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.graph
            .node_weight(id)
            .ok_or_else(|| Error::InvalidGraph(format!("Node {:?} not found", id)))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.graph
            .node_weight_mut(id)
            .ok_or_else(|| Error::InvalidGraph(format!("Node {:?} not found", id)))
    }

    pub fn value(&self, id: ValueId) -> Result<&Value> {
        self.values
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::InvalidGraph(format!("Value {:?} not found", id)))
    }

    fn value_mut(&mut self, id: ValueId) -> Result<&mut Value> {
        self.values
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::InvalidGraph(format!("Value {:?} not found", id)))
    }

    /// Check whether a node still exists.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.graph.contains_node(id)
    }

    /// Look up a value by debug name.
    pub fn value_by_name(&self, name: &str) -> Option<ValueId> {
        self.value_by_name.get(name).copied()
    }

    /// The node defining a value.
    pub fn producer(&self, value: ValueId) -> Result<&Node> {
        self.node(self.value(value)?.def.node)
    }

    /// Inputs of a block (outputs of its `Param` node).
    pub fn block_inputs(&self, block: BlockId) -> Result<&[ValueId]> {
        Ok(self.node(self.block(block)?.param_node)?.outputs())
    }

    /// Outputs of a block (inputs of its `Return` node).
    pub fn block_outputs(&self, block: BlockId) -> Result<&[ValueId]> {
        Ok(self.node(self.block(block)?.return_node)?.inputs())
    }

    /// Graph-level inputs.
    pub fn inputs(&self) -> &[ValueId] {
        self.block_inputs(self.root).unwrap_or(&[])
    }

    /// Graph-level outputs.
    pub fn outputs(&self) -> &[ValueId] {
        self.block_outputs(self.root).unwrap_or(&[])
    }

    /// All nodes of `kind` in every live block, in pre-order.
    pub fn nodes_of_kind(&self, kind: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_nodes(self.root, kind, &mut found);
        found
    }

    fn collect_nodes(&self, block: BlockId, kind: &str, found: &mut Vec<NodeId>) {
        let Ok(block) = self.block(block) else {
            return;
        };
        for &id in &block.nodes {
            let Ok(node) = self.node(id) else { continue };
            if node.kind == kind {
                found.push(id);
            }
            for &child in &node.blocks {
                self.collect_nodes(child, kind, found);
            }
        }
    }

    // ── Names ──

    /// A name based on `base` that no value holds and `reserved` rejects.
    pub fn fresh_name(&self, base: &str, reserved: impl Fn(&str) -> bool) -> String {
        let taken = |name: &str| self.value_by_name.contains_key(name) || reserved(name);
        if !taken(base) {
            return base.to_string();
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{base}.{suffix}");
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    fn unique_name(&mut self) -> String {
        loop {
            let candidate = self.next_unique.to_string();
            self.next_unique += 1;
            if !self.value_by_name.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Set a value's debug name.
    ///
    /// If another value already holds `name`, that value is renamed to a
    /// fresh `name.N` variant first.
    pub fn set_debug_name(&mut self, value: ValueId, name: &str) -> Result<()> {
        match self.value_by_name.get(name).copied() {
            Some(holder) if holder == value => return Ok(()),
            Some(holder) => {
                let displaced = self.fresh_name(name, |_| false);
                tracing::trace!(name, displaced = %displaced, "renaming previous holder of debug name");
                self.rename(holder, displaced)?;
            }
            None => {}
        }
        self.rename(value, name.to_string())
    }

    fn rename(&mut self, value: ValueId, name: String) -> Result<()> {
        let old = std::mem::replace(&mut self.value_mut(value)?.name, name.clone());
        if self.value_by_name.get(&old) == Some(&value) {
            self.value_by_name.remove(&old);
        }
        self.value_by_name.insert(name, value);
        Ok(())
    }

    // ── Construction ──

    /// Create a node with `num_outputs` fresh output values.
    ///
    /// The node is not placed in any block until `append_node` or
    /// `insert_before` is called.
    pub fn create_node(&mut self, kind: &str, num_outputs: usize) -> NodeId {
        let node = self.graph.add_node(Node::new(kind, None));
        for _ in 0..num_outputs {
            self.push_output(node);
        }
        node
    }

    fn push_output(&mut self, node: NodeId) -> ValueId {
        let id = ValueId(self.values.len());
        let name = self.unique_name();
        let offset = match self.graph.node_weight_mut(node) {
            Some(n) => {
                n.outputs.push(id);
                n.outputs.len() - 1
            }
            None => 0,
        };
        self.value_by_name.insert(name.clone(), id);
        self.values.push(Some(Value {
            name,
            ty: None,
            def: ValueDef { node, offset },
            uses: Vec::new(),
        }));
        id
    }

    fn ensure_unplaced(&self, node: NodeId) -> Result<()> {
        match self.node(node)?.owning_block {
            Some(block) => Err(Error::InvalidGraph(format!(
                "Node {:?} is already placed in block {:?}",
                node, block
            ))),
            None => Ok(()),
        }
    }

    /// Append an unplaced node to the end of a block.
    pub fn append_node(&mut self, block: BlockId, node: NodeId) -> Result<()> {
        self.ensure_unplaced(node)?;
        self.block_mut(block)?.nodes.push(node);
        self.node_mut(node)?.owning_block = Some(block);
        Ok(())
    }

    /// Place an unplaced node immediately before `anchor` in anchor's block.
    pub fn insert_before(&mut self, node: NodeId, anchor: NodeId) -> Result<()> {
        self.ensure_unplaced(node)?;
        let block = self.node(anchor)?.owning_block.ok_or_else(|| {
            Error::InvalidGraph(format!("Anchor node {:?} is not placed", anchor))
        })?;
        let nodes = &mut self.block_mut(block)?.nodes;
        let position = nodes.iter().position(|&n| n == anchor).ok_or_else(|| {
            Error::InvalidGraph(format!(
                "Anchor node {:?} is not in the node order of block {:?}",
                anchor, block
            ))
        })?;
        nodes.insert(position, node);
        self.node_mut(node)?.owning_block = Some(block);
        Ok(())
    }

    /// Create a node, wire its inputs, and append it to `block`.
    pub fn append(
        &mut self,
        block: BlockId,
        kind: &str,
        inputs: &[ValueId],
        num_outputs: usize,
    ) -> Result<NodeId> {
        let node = self.create_node(kind, num_outputs);
        for &input in inputs {
            self.add_node_input(node, input)?;
        }
        self.append_node(block, node)?;
        Ok(node)
    }

    /// Append a `Constant` node carrying `tensor` and return its output.
    pub fn append_constant(&mut self, block: BlockId, tensor: TensorValue) -> Result<ValueId> {
        let node = self.append(block, kinds::CONSTANT, &[], 1)?;
        let output = self.node(node)?.outputs[0];
        self.infer_type_from(output, &tensor)?;
        self.node_mut(node)?
            .set_attribute("value", AttributeValue::Tensor(tensor));
        Ok(output)
    }

    /// Add a nested block to a node.
    pub fn add_block(&mut self, owner: NodeId) -> Result<BlockId> {
        self.node(owner)?;
        let block = self.create_block(Some(owner));
        self.node_mut(owner)?.blocks.push(block);
        Ok(block)
    }

    /// Declare a new graph-level input.
    pub fn add_input(&mut self) -> ValueId {
        self.push_output(self.root_param)
    }

    /// Declare a new input on a block.
    pub fn add_block_input(&mut self, block: BlockId) -> Result<ValueId> {
        let param = self.block(block)?.param_node;
        Ok(self.push_output(param))
    }

    /// Register `value` as an output of `block`.
    pub fn register_output(&mut self, block: BlockId, value: ValueId) -> Result<usize> {
        let ret = self.block(block)?.return_node;
        self.add_node_input(ret, value)
    }

    /// Append `value` to a node's inputs, recording the use.
    pub fn add_node_input(&mut self, node: NodeId, value: ValueId) -> Result<usize> {
        let producer = self.value(value)?.def.node;
        let n = self.node_mut(node)?;
        let offset = n.inputs.len();
        n.inputs.push(value);
        self.value_mut(value)?.uses.push(Use { user: node, offset });
        self.graph.add_edge(producer, node, ());
        Ok(offset)
    }

    // ── Metadata ──

    pub fn set_type(&mut self, value: ValueId, ty: Option<TensorType>) -> Result<()> {
        self.value_mut(value)?.ty = ty;
        Ok(())
    }

    /// Set a value's type from a concrete tensor's dtype and shape.
    pub fn infer_type_from(&mut self, value: ValueId, tensor: &TensorValue) -> Result<()> {
        self.set_type(value, Some(TensorType::of(tensor)))
    }

    /// Copy type and debug name from `from` onto `to`.
    ///
    /// The name moves to `to`; `from` is renamed to a fresh variant.
    pub fn copy_metadata(&mut self, from: ValueId, to: ValueId) -> Result<()> {
        let source = self.value(from)?;
        let ty = source.ty.clone();
        let name = source.name.clone();
        self.set_type(to, ty)?;
        self.set_debug_name(to, &name)
    }

    /// Replace all attributes of `to` with a copy of `from`'s attributes.
    pub fn copy_attributes(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let attributes = self.node(from)?.attributes.clone();
        self.node_mut(to)?.attributes = attributes;
        Ok(())
    }

    // ── Mutation ──

    fn drop_use(&mut self, value: ValueId, user: NodeId, offset: usize) -> Result<()> {
        let v = self.value_mut(value)?;
        let position = v
            .uses
            .iter()
            .position(|u| u.user == user && u.offset == offset)
            .ok_or_else(|| {
                Error::InvalidGraph(format!(
                    "Value {:?} has no recorded use at {:?}:{}",
                    value, user, offset
                ))
            })?;
        v.uses.remove(position);
        let producer = v.def.node;
        if let Some(edge) = self.graph.find_edge(producer, user) {
            self.graph.remove_edge(edge);
        }
        Ok(())
    }

    /// Point input `offset` of `node` at `value`.
    pub fn replace_input(&mut self, node: NodeId, offset: usize, value: ValueId) -> Result<()> {
        let old = *self.node(node)?.inputs.get(offset).ok_or_else(|| {
            Error::InvalidGraph(format!("Node {:?} has no input {}", node, offset))
        })?;
        let producer = self.value(value)?.def.node;
        self.drop_use(old, node, offset)?;
        self.node_mut(node)?.inputs[offset] = value;
        self.value_mut(value)?.uses.push(Use { user: node, offset });
        self.graph.add_edge(producer, node, ());
        Ok(())
    }

    /// Redirect every use of `old` to `new`. Afterwards `old` has no uses.
    pub fn replace_all_uses_with(&mut self, old: ValueId, new: ValueId) -> Result<()> {
        if old == new {
            return Ok(());
        }
        let new_producer = self.value(new)?.def.node;
        let old_producer = self.value(old)?.def.node;
        let uses = std::mem::take(&mut self.value_mut(old)?.uses);

        for u in uses {
            let slot = self
                .node_mut(u.user)?
                .inputs
                .get_mut(u.offset)
                .ok_or_else(|| {
                    Error::InvalidGraph(format!("Stale use of {:?} at {:?}:{}", old, u.user, u.offset))
                })?;
            *slot = new;
            if let Some(edge) = self.graph.find_edge(old_producer, u.user) {
                self.graph.remove_edge(edge);
            }
            self.graph.add_edge(new_producer, u.user, ());
            self.value_mut(new)?.uses.push(u);
        }
        Ok(())
    }

    /// Destroy a node together with its nested blocks.
    ///
    /// Fails if any output of the node still has uses.
    pub fn destroy_node(&mut self, node: NodeId) -> Result<()> {
        let n = self.node(node)?;
        for &output in &n.outputs {
            if self.value(output)?.has_uses() {
                return Err(Error::InvalidGraph(format!(
                    "Cannot destroy {} node {:?}: output '{}' still has uses",
                    n.kind,
                    node,
                    self.value(output)?.name
                )));
            }
        }

        tracing::trace!(kind = %n.kind, node = ?node, "destroying node");
        let nested = n.blocks.clone();
        for block in nested.into_iter().rev() {
            self.destroy_block(block)?;
        }

        let n = self.node(node)?;
        let inputs = n.inputs.clone();
        let outputs = n.outputs.clone();
        let owning_block = n.owning_block;

        for (offset, input) in inputs.into_iter().enumerate() {
            self.drop_use(input, node, offset)?;
        }
        for output in outputs {
            if let Some(value) = self.values.get_mut(output.0).and_then(Option::take) {
                if self.value_by_name.get(&value.name) == Some(&output) {
                    self.value_by_name.remove(&value.name);
                }
            }
        }
        if let Some(Some(b)) = owning_block.and_then(|block| self.blocks.get_mut(block.0)) {
            b.nodes.retain(|&id| id != node);
        }
        self.graph.remove_node(node);
        Ok(())
    }

    fn destroy_block(&mut self, block: BlockId) -> Result<()> {
        let b = self.block(block)?.clone();
        self.destroy_node(b.return_node)?;
        for &node in b.nodes.iter().rev() {
            self.destroy_node(node)?;
        }
        self.destroy_node(b.param_node)?;
        self.blocks[block.0] = None;
        Ok(())
    }

    // ── Validation ──

    /// Check the structural invariants of the graph.
    ///
    /// - every value's use-list matches exactly the input slots referencing it
    /// - every value is an output of its recorded defining node
    /// - every node input is defined earlier in its block or an enclosing one
    /// - the def-use relation is acyclic
    pub fn validate(&self) -> Result<()> {
        let mut expected: HashMap<ValueId, Vec<Use>> = HashMap::new();
        for id in self.graph.node_indices() {
            let node = self.node(id)?;
            for (offset, &input) in node.inputs.iter().enumerate() {
                self.value(input)?;
                expected.entry(input).or_default().push(Use { user: id, offset });
            }
        }

        for (index, slot) in self.values.iter().enumerate() {
            let Some(value) = slot else { continue };
            let id = ValueId(index);

            let mut actual = value.uses.clone();
            actual.sort();
            let mut wanted = expected.remove(&id).unwrap_or_default();
            wanted.sort();
            if actual != wanted {
                return Err(Error::InvalidGraph(format!(
                    "Use-list of '{}' is {:?}, expected {:?}",
                    value.name, actual, wanted
                )));
            }

            if self.node(value.def.node)?.outputs.get(value.def.offset) != Some(&id) {
                return Err(Error::InvalidGraph(format!(
                    "Value '{}' is not output {} of its defining node",
                    value.name, value.def.offset
                )));
            }
        }

        self.validate_block(self.root, &HashSet::new())?;

        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(Error::InvalidGraph("Def-use relation has a cycle".to_string()));
        }
        Ok(())
    }

    fn validate_block(&self, block: BlockId, outer: &HashSet<ValueId>) -> Result<()> {
        let mut scope = outer.clone();
        scope.extend(self.block_inputs(block)?.iter().copied());

        for &id in &self.block(block)?.nodes {
            let node = self.node(id)?;
            if node.owning_block != Some(block) {
                return Err(Error::InvalidGraph(format!(
                    "{} node {:?} is listed in block {:?} but owned by {:?}",
                    node.kind, id, block, node.owning_block
                )));
            }
            for input in &node.inputs {
                if !scope.contains(input) {
                    return Err(Error::InvalidGraph(format!(
                        "{} node {:?} uses '{}' before its definition",
                        node.kind,
                        id,
                        self.value(*input)?.name
                    )));
                }
            }
            for &child in &node.blocks {
                self.validate_block(child, &scope)?;
            }
            scope.extend(node.outputs.iter().copied());
        }

        for output in self.block_outputs(block)? {
            if !scope.contains(output) {
                return Err(Error::InvalidGraph(format!(
                    "Block {:?} returns undefined value '{}'",
                    block,
                    self.value(*output)?.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
