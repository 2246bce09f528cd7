//! Evaluation-mode peephole optimization.
//!
//! Rewrites that are only valid once a model is frozen for inference. Today
//! that is Conv+BatchNormalization fusion (see [`crate::conv_bn`]).

use crate::conv_bn::fuse_conv_batch_norm;
use jasper_core::{BlockId, Graph, ParamMap, Pass, Result, ValueParamMap};

/// Run the evaluation-mode peephole optimizations on the whole graph.
///
/// `params` holds the tensors bound to graph inputs by name. Fusion replaces
/// parameters with new graph inputs, so it only runs when
/// `allow_input_mutation` is set. New parameters are added to `params`;
/// existing entries are never removed.
///
/// Returns whether the graph changed.
#[tracing::instrument(skip_all, fields(num_inputs = graph.inputs().len(), num_params = params.len()))]
pub fn eval_peephole(
    graph: &mut Graph,
    params: &mut ParamMap,
    allow_input_mutation: bool,
) -> Result<bool> {
    let root = graph.root();
    let changed = eval_peephole_block(graph, root, params, allow_input_mutation)?;
    tracing::debug!("After eval_peephole:\n{graph}");
    Ok(changed)
}

/// Same as [`eval_peephole`], restricted to `block` and the blocks nested in it.
///
/// Besides the graph inputs, the inputs of `block` itself are bound to
/// `params` by debug name.
pub fn eval_peephole_block(
    graph: &mut Graph,
    block: BlockId,
    params: &mut ParamMap,
    allow_input_mutation: bool,
) -> Result<bool> {
    if !allow_input_mutation {
        tracing::debug!("input mutation not allowed, skipping Conv+BatchNormalization fusion");
        return Ok(false);
    }

    let mut table = ValueParamMap::for_block(graph, block, params)?;
    let fused = fuse_conv_batch_norm(graph, block, &mut table)?;
    table.write_back(params);

    if fused > 0 {
        tracing::info!(fused, "fused Conv+BatchNormalization pairs");
    }
    Ok(fused > 0)
}

/// [`eval_peephole`] as a [`Pass`].
#[derive(Debug, Clone, Copy)]
pub struct EvalPeepholePass {
    allow_input_mutation: bool,
}

impl EvalPeepholePass {
    /// Create the pass. Without `allow_input_mutation` it never changes the graph.
    pub fn new(allow_input_mutation: bool) -> Self {
        Self {
            allow_input_mutation,
        }
    }

    pub fn allow_input_mutation(&self) -> bool {
        self.allow_input_mutation
    }
}

impl Default for EvalPeepholePass {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Pass for EvalPeepholePass {
    fn name(&self) -> &str {
        "eval_peephole"
    }

    fn run(&self, graph: &mut Graph, params: &mut ParamMap) -> Result<bool> {
        eval_peephole(graph, params, self.allow_input_mutation)
    }
}
