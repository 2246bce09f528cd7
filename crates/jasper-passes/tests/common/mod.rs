//! Common test utilities for fusion tests.
//!
//! Graph builders for Conv -> BatchNormalization chains and a small reference
//! interpreter (naive NCHW convolution and batch normalization) used to check
//! that fused graphs compute the same thing as the originals.

#![allow(dead_code)]

use jasper_core::{AttributeValue, BlockId, Graph, NodeId, ParamMap, TensorValue, ValueId, kinds};
use std::collections::HashMap;

pub use jasper_passes::{EvalPeepholePass, PassPipeline, eval_peephole, eval_peephole_block};

/// Install a test subscriber. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// Deterministic values in [-1, 1].
pub fn pattern(len: usize, seed: f32) -> Vec<f32> {
    (0..len).map(|i| (i as f32 * 0.731 + seed).sin()).collect()
}

/// Deterministic values in [lo, lo + 1].
pub fn positive(len: usize, seed: f32, lo: f32) -> Vec<f32> {
    pattern(len, seed).into_iter().map(|v| lo + v * v).collect()
}

/// Declare a graph input named `name` and bind `tensor` to it in `params`.
pub fn add_param(graph: &mut Graph, params: &mut ParamMap, name: &str, tensor: TensorValue) -> ValueId {
    let input = graph.add_input();
    graph.set_debug_name(input, name).unwrap();
    graph.infer_type_from(input, &tensor).unwrap();
    params.insert(name.to_string(), tensor);
    input
}

/// Append `Conv(input, {prefix}.weight[, {prefix}.bias])` with a
/// `[out_channels, in_channels, kernel, kernel]` weight.
pub fn append_conv(
    graph: &mut Graph,
    block: BlockId,
    params: &mut ParamMap,
    input: ValueId,
    prefix: &str,
    shape: [usize; 4],
    with_bias: bool,
) -> NodeId {
    let len = shape.iter().product();
    let weight = add_param(
        graph,
        params,
        &format!("{prefix}.weight"),
        TensorValue::from_f32(pattern(len, 0.1), shape.to_vec()),
    );
    let mut inputs = vec![input, weight];
    if with_bias {
        let bias = add_param(
            graph,
            params,
            &format!("{prefix}.bias"),
            TensorValue::from_f32(pattern(shape[0], 0.7), vec![shape[0]]),
        );
        inputs.push(bias);
    }

    let conv = graph.append(block, kinds::CONV, &inputs, 1).unwrap();
    let node = graph.node_mut(conv).unwrap();
    node.name = format!("{prefix}.conv");
    node.set_attribute("strides", AttributeValue::Ints(vec![1, 1]));
    node.set_attribute("kernel_shape", AttributeValue::Ints(vec![shape[2] as i64, shape[3] as i64]));
    let out = graph.node(conv).unwrap().outputs()[0];
    graph.set_debug_name(out, &format!("{prefix}.conv_out")).unwrap();
    conv
}

/// Append an inference-mode BatchNormalization over `input` whose parameters
/// are bound as `{prefix}.bn.{scale,shift,mean,var}`.
pub fn append_bn(
    graph: &mut Graph,
    block: BlockId,
    params: &mut ParamMap,
    input: ValueId,
    prefix: &str,
    channels: usize,
    epsilon: Option<f32>,
    num_outputs: usize,
) -> NodeId {
    let mut param = |graph: &mut Graph, suffix: &str, values: Vec<f32>| {
        add_param(
            graph,
            params,
            &format!("{prefix}.bn.{suffix}"),
            TensorValue::from_f32(values, vec![channels]),
        )
    };
    let scale = param(graph, "scale", positive(channels, 1.3, 0.5));
    let shift = param(graph, "shift", pattern(channels, 2.9));
    let mean = param(graph, "mean", pattern(channels, 4.1));
    let var = param(graph, "var", positive(channels, 5.3, 0.25));

    let bn = graph
        .append(
            block,
            kinds::BATCH_NORMALIZATION,
            &[input, scale, shift, mean, var],
            num_outputs,
        )
        .unwrap();
    if let Some(epsilon) = epsilon {
        graph
            .node_mut(bn)
            .unwrap()
            .set_attribute("epsilon", AttributeValue::Float(epsilon));
    }
    let out = graph.node(bn).unwrap().outputs()[0];
    graph.set_debug_name(out, &format!("{prefix}.out")).unwrap();
    bn
}

/// A graph `x -> Conv -> BatchNormalization -> output` and its parameters.
pub struct ConvBnModel {
    pub graph: Graph,
    pub params: ParamMap,
    pub x: ValueId,
    pub conv: NodeId,
    pub bn: NodeId,
}

impl ConvBnModel {
    /// `weight` is `[C, C_in, k, k]`; the input is named `x`.
    pub fn new(weight: [usize; 4], with_bias: bool) -> Self {
        Self::with_options(weight, with_bias, Some(1e-5), 1)
    }

    pub fn with_options(
        weight: [usize; 4],
        with_bias: bool,
        epsilon: Option<f32>,
        bn_outputs: usize,
    ) -> Self {
        let mut graph = Graph::new();
        let mut params = ParamMap::new();
        let root = graph.root();

        let x = graph.add_input();
        graph.set_debug_name(x, "x").unwrap();

        let conv = append_conv(&mut graph, root, &mut params, x, "layer", weight, with_bias);
        let conv_out = graph.node(conv).unwrap().outputs()[0];
        let bn = append_bn(
            &mut graph,
            root,
            &mut params,
            conv_out,
            "layer",
            weight[0],
            epsilon,
            bn_outputs,
        );
        let y = graph.node(bn).unwrap().outputs()[0];
        graph.register_output(root, y).unwrap();

        Self {
            graph,
            params,
            x,
            conv,
            bn,
        }
    }
}

/// NCHW input of the given shape.
pub fn input(shape: [usize; 4]) -> TensorValue {
    TensorValue::from_f32(pattern(shape.iter().product(), 0.3), shape.to_vec())
}

/// Naive stride-1, unpadded 2-D convolution.
pub fn conv2d(x: &TensorValue, w: &TensorValue, b: Option<&TensorValue>) -> TensorValue {
    let (n, c_in, h, wd) = (x.shape[0], x.shape[1], x.shape[2], x.shape[3]);
    let (c_out, kh, kw) = (w.shape[0], w.shape[2], w.shape[3]);
    assert_eq!(w.shape[1], c_in, "Conv input channels");
    let (oh, ow) = (h - kh + 1, wd - kw + 1);

    let xs = x.to_f64_vec().unwrap();
    let ws = w.to_f64_vec().unwrap();
    let bs = b.map(|b| b.to_f64_vec().unwrap());

    let mut out = vec![0.0f32; n * c_out * oh * ow];
    for batch in 0..n {
        for oc in 0..c_out {
            for oy in 0..oh {
                for ox in 0..ow {
                    let mut acc = bs.as_ref().map_or(0.0, |b| b[oc]);
                    for ic in 0..c_in {
                        for ky in 0..kh {
                            for kx in 0..kw {
                                let xi = ((batch * c_in + ic) * h + oy + ky) * wd + ox + kx;
                                let wi = ((oc * c_in + ic) * kh + ky) * kw + kx;
                                acc += xs[xi] * ws[wi];
                            }
                        }
                    }
                    out[((batch * c_out + oc) * oh + oy) * ow + ox] = acc as f32;
                }
            }
        }
    }
    TensorValue::from_f32(out, vec![n, c_out, oh, ow])
}

/// Inference-mode batch normalization over axis 1.
pub fn batch_norm(
    x: &TensorValue,
    scale: &TensorValue,
    shift: &TensorValue,
    mean: &TensorValue,
    var: &TensorValue,
    epsilon: f64,
) -> TensorValue {
    let channels = x.shape[1];
    let spatial: usize = x.shape[2..].iter().product();
    let xs = x.to_f64_vec().unwrap();
    let [scale, shift, mean, var] = [scale, shift, mean, var].map(|t| t.to_f64_vec().unwrap());

    let out = xs
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let c = (i / spatial) % channels;
            ((v - mean[c]) / (var[c] + epsilon).sqrt() * scale[c] + shift[c]) as f32
        })
        .collect();
    TensorValue::from_f32(out, x.shape.clone())
}

/// Evaluate the root block of `graph` on `x`.
///
/// The first graph input receives `x`; every other input is looked up in
/// `params` by debug name. Supports Constant, Conv, BatchNormalization and
/// Relu; returns the first graph output.
pub fn evaluate(graph: &Graph, params: &ParamMap, x: &TensorValue) -> TensorValue {
    let mut env: HashMap<ValueId, TensorValue> = HashMap::new();
    let inputs = graph.inputs();
    env.insert(inputs[0], x.clone());
    for &input in &inputs[1..] {
        if let Some(tensor) = params.get(graph.value(input).unwrap().name()) {
            env.insert(input, tensor.clone());
        }
    }

    for &id in graph.block(graph.root()).unwrap().nodes() {
        let node = graph.node(id).unwrap();
        let args: Vec<&TensorValue> = node
            .inputs()
            .iter()
            .map(|v| env.get(v).unwrap_or_else(|| panic!("unbound input {v:?}")))
            .collect();
        let out = match node.kind() {
            kinds::CONSTANT => node.attr::<TensorValue>("value").unwrap(),
            kinds::CONV => conv2d(args[0], args[1], args.get(2).copied()),
            kinds::BATCH_NORMALIZATION => {
                let epsilon = node.attr::<f32>("epsilon").unwrap_or(1e-5) as f64;
                batch_norm(args[0], args[1], args[2], args[3], args[4], epsilon)
            }
            "Relu" => {
                let vs = args[0].as_f32().unwrap().iter().map(|v| v.max(0.0)).collect();
                TensorValue::from_f32(vs, args[0].shape.clone())
            }
            other => panic!("unsupported node kind {other}"),
        };
        env.insert(node.outputs()[0], out);
    }

    env.remove(&graph.outputs()[0]).expect("graph output was not computed")
}

/// Assert two tensors have the same shape and nearly equal elements.
pub fn assert_close(actual: &TensorValue, expected: &TensorValue, tolerance: f64) {
    assert_eq!(actual.shape, expected.shape, "shape mismatch");
    let a = actual.to_f64_vec().unwrap();
    let e = expected.to_f64_vec().unwrap();
    for (i, (a, e)) in a.iter().zip(&e).enumerate() {
        assert!(
            (a - e).abs() <= tolerance * (1.0 + e.abs()),
            "Element {i}: {a} vs {e}"
        );
    }
}
