//! Fold an inference-mode BatchNormalization into the Conv feeding it.
//!
//! For a Conv whose only consumer is a BatchNormalization with static
//! parameters, the pair computes
//!
//! ```text
//! y = (conv(x, W) + b - mean) * scale / sqrt(var + eps) + shift
//! ```
//!
//! which is a single Conv with per-output-channel rescaled weights and a new
//! bias:
//!
//! ```text
//! f  = scale / sqrt(var + eps)
//! W' = W * f           (broadcast over all but the output-channel axis)
//! b' = (b - mean) * f + shift      with a conv bias
//! b' = shift - mean * f            without one
//! ```
//!
//! The fused weight and bias become new graph inputs bound in the parameter
//! table. Candidates that do not satisfy every precondition are left alone.

use crate::accessor::{resolve, resolve_inputs};
use jasper_core::{
    BlockId, DataType, Graph, NodeId, Result, TensorValue, ValueId, ValueParamMap, kinds,
};

/// ONNX default for the BatchNormalization `epsilon` attribute.
pub const DEFAULT_EPSILON: f32 = 1e-5;

/// A Conv -> BatchNormalization pair whose parameters are all known.
#[derive(Debug, Clone)]
pub struct ConvBnMatch {
    pub conv: NodeId,
    pub bn: NodeId,

    /// Conv weight, `[C, C_in / groups, k...]`.
    pub weight: TensorValue,

    /// Optional conv bias, `[C]`.
    pub bias: Option<TensorValue>,

    /// BatchNormalization scale (gamma), `[C]`.
    pub scale: TensorValue,

    /// BatchNormalization bias (beta), `[C]`.
    pub shift: TensorValue,

    /// Running mean, `[C]`.
    pub mean: TensorValue,

    /// Running variance, `[C]`.
    pub var: TensorValue,

    pub epsilon: f32,
}

/// Fused parameters for the replacement Conv.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldedParams {
    pub weight: TensorValue,
    pub bias: TensorValue,
}

macro_rules! reject {
    ($conv:expr, $($reason:tt)+) => {{
        tracing::trace!(conv = ?$conv, "skipping Conv+BatchNormalization fusion: {}", format!($($reason)+));
        return Ok(None);
    }};
}

/// Check whether `conv` and its consumer can be fused.
///
/// Returns `Ok(None)` for every candidate that fails a precondition; errors
/// are reserved for lookups into a malformed graph.
pub fn match_conv_bn(
    graph: &Graph,
    conv: NodeId,
    table: &ValueParamMap,
) -> Result<Option<ConvBnMatch>> {
    let conv_node = graph.node(conv)?;
    let Some(&conv_out) = conv_node.outputs().first() else {
        reject!(conv, "Conv has no outputs");
    };

    let uses = graph.value(conv_out)?.uses();
    if uses.len() != 1 {
        reject!(conv, "Conv output has {} uses", uses.len());
    }
    let bn = uses[0].user;
    let bn_node = graph.node(bn)?;
    if bn_node.kind() != kinds::BATCH_NORMALIZATION {
        reject!(conv, "consumer is {}", bn_node.kind());
    }

    // Training-mode BatchNormalization also exposes running statistics.
    if bn_node.outputs().len() != conv_node.outputs().len() {
        reject!(
            conv,
            "BatchNormalization has {} outputs, Conv has {}",
            bn_node.outputs().len(),
            conv_node.outputs().len()
        );
    }

    let epsilon = if bn_node.has_attr("epsilon") {
        match bn_node.attr::<f32>("epsilon") {
            Ok(epsilon) => epsilon,
            Err(e) => reject!(conv, "{e}"),
        }
    } else {
        DEFAULT_EPSILON
    };

    // Conv inputs: X, W, optional B.
    let conv_inputs = conv_node.inputs();
    let known = resolve_inputs(graph, conv, table)?;
    if known.is_empty() || (conv_inputs.len() == 3 && known.len() != 2) {
        reject!(conv, "{} of {} Conv inputs are static", known.len(), conv_inputs.len());
    }
    let Some(weight) = conv_inputs.get(1).and_then(|&w| resolve(graph, w, table)) else {
        reject!(conv, "Conv weight is not static");
    };
    let bias = match conv_inputs.get(2) {
        Some(&b) => match resolve(graph, b, table) {
            Some(bias) => Some(bias),
            None => reject!(conv, "Conv bias is not static"),
        },
        None => None,
    };

    // BatchNormalization inputs: X, scale, B, mean, var.
    let bn_params: Vec<TensorValue> = bn_node
        .inputs()
        .iter()
        .skip(1)
        .filter_map(|&input| resolve(graph, input, table))
        .collect();
    let [scale, shift, mean, var]: [TensorValue; 4] = match bn_params.try_into() {
        Ok(params) => params,
        Err(params) => reject!(
            conv,
            "{} of {} BatchNormalization parameters are static",
            params.len(),
            bn_node.inputs().len().saturating_sub(1)
        ),
    };

    if ![&weight, &scale, &shift, &mean, &var]
        .iter()
        .all(|t| t.is_floating_point())
    {
        reject!(conv, "non floating-point parameters");
    }
    if [&scale, &shift, &mean, &var].iter().any(|t| t.rank() != 1) {
        reject!(conv, "BatchNormalization parameters are not 1-D");
    }
    let channels = scale.shape[0];
    if [&shift, &mean, &var].iter().any(|t| t.shape[0] != channels) {
        reject!(conv, "BatchNormalization parameter lengths differ");
    }
    if weight.rank() <= 2 {
        reject!(conv, "Conv weight has rank {}", weight.rank());
    }
    if weight.shape[0] != channels {
        reject!(
            conv,
            "Conv has {} output channels, BatchNormalization has {}",
            weight.shape[0],
            channels
        );
    }
    if let Some(bias) = &bias {
        if !bias.is_floating_point() || bias.shape != [channels] {
            reject!(conv, "Conv bias {}{:?} does not match {} channels", bias.dtype, bias.shape, channels);
        }
    }

    Ok(Some(ConvBnMatch {
        conv,
        bn,
        weight,
        bias,
        scale,
        shift,
        mean,
        var,
        epsilon,
    }))
}

/// Compute the fused weight and bias.
///
/// Works on copies; the tensors in `matched` are left as they are. Results
/// take the element type of the conv weight.
pub fn fold(matched: &ConvBnMatch) -> Result<FoldedParams> {
    let inv_std = matched
        .var
        .add_scalar(matched.epsilon as f64)?
        .sqrt()?
        .recip()?;
    let factor = matched.scale.mul(&inv_std)?;

    let weight = matched.weight.mul_per_channel(&factor)?;
    let bias = match &matched.bias {
        Some(bias) => bias.sub(&matched.mean)?.mul(&factor)?.add(&matched.shift)?,
        None => matched.shift.sub(&matched.mean.mul(&factor)?)?,
    };

    let dtype: DataType = matched.weight.dtype;
    Ok(FoldedParams {
        weight: weight.to_float_dtype(dtype)?,
        bias: bias.to_float_dtype(dtype)?,
    })
}

/// Declare a graph input bound to `tensor` under a name derived from `base`.
fn add_parameter(
    graph: &mut Graph,
    table: &mut ValueParamMap,
    base: &str,
    tensor: TensorValue,
) -> Result<ValueId> {
    let name = graph.fresh_name(base, |candidate| table.contains_name(candidate));
    let input = graph.add_input();
    graph.set_debug_name(input, &name)?;
    graph.infer_type_from(input, &tensor)?;
    table.insert(input, name, tensor);
    Ok(input)
}

/// Replace the matched pair with a single Conv and return the new node.
pub fn rewrite(
    graph: &mut Graph,
    matched: &ConvBnMatch,
    folded: FoldedParams,
    table: &mut ValueParamMap,
) -> Result<NodeId> {
    let conv_node = graph.node(matched.conv)?;
    let data = conv_node.inputs()[0];
    let conv_name = conv_node.name.clone();
    let bn_out = graph.node(matched.bn)?.outputs()[0];

    let fused = graph.create_node(kinds::CONV, 1);
    let fused_out = graph.node(fused)?.outputs()[0];
    graph.copy_attributes(matched.conv, fused)?;
    graph.node_mut(fused)?.name = conv_name;
    graph.copy_metadata(bn_out, fused_out)?;
    graph.insert_before(fused, matched.bn)?;

    let base = graph.value(fused_out)?.name().to_string();
    graph.add_node_input(fused, data)?;
    let weight = add_parameter(graph, table, &format!("{base}.fused_weight"), folded.weight)?;
    graph.add_node_input(fused, weight)?;
    let bias = add_parameter(graph, table, &format!("{base}.fused_bias"), folded.bias)?;
    graph.add_node_input(fused, bias)?;

    graph.replace_all_uses_with(bn_out, fused_out)?;
    graph.destroy_node(matched.bn)?;
    graph.destroy_node(matched.conv)?;

    Ok(fused)
}

/// Fuse every Conv -> BatchNormalization pair in `block` and its nested
/// blocks. Returns the number of fused pairs.
///
/// Nested blocks of a node are processed before the node itself. Removing the
/// current Conv shifts its next sibling into the cursor position, so the walk
/// continues without revisiting or skipping anything.
pub fn fuse_conv_batch_norm(
    graph: &mut Graph,
    block: BlockId,
    table: &mut ValueParamMap,
) -> Result<usize> {
    let mut fused = 0;
    let mut cursor = 0;

    loop {
        let Some(&node) = graph.block(block)?.nodes().get(cursor) else {
            break;
        };
        let children = graph.node(node)?.blocks().to_vec();
        for child in children {
            fused += fuse_conv_batch_norm(graph, child, table)?;
        }

        if graph.node(node)?.kind() == kinds::CONV {
            if let Some(matched) = match_conv_bn(graph, node, table)? {
                let folded = fold(&matched)?;
                let replacement = rewrite(graph, &matched, folded, table)?;
                tracing::debug!(
                    conv = ?matched.conv,
                    bn = ?matched.bn,
                    replacement = ?replacement,
                    channels = matched.scale.shape[0],
                    "fused Conv+BatchNormalization"
                );
                fused += 1;
                continue;
            }
        }
        cursor += 1;
    }

    Ok(fused)
}
