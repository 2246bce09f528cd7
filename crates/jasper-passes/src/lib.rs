//! Graph optimization passes for Jasper.
//!
//! The main entry point is [`eval_peephole`], which folds every inference-mode
//! BatchNormalization into the convolution feeding it and binds the fused
//! weights as new graph inputs.
//!
//! # Example
//!
//! ```no_run
//! use jasper_core::{Graph, ParamMap};
//! use jasper_passes::eval_peephole;
//!
//! # fn main() -> jasper_core::Result<()> {
//! # let mut graph = Graph::new();
//! let mut params = ParamMap::new();
//! let changed = eval_peephole(&mut graph, &mut params, true)?;
//! println!("graph changed: {changed}");
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod conv_bn;
pub mod eval_peephole;
pub mod pipeline;

pub use accessor::{TensorSource, resolve, resolve_inputs, source_of};
pub use conv_bn::{ConvBnMatch, FoldedParams, fold, fuse_conv_batch_norm, match_conv_bn, rewrite};
pub use eval_peephole::{EvalPeepholePass, eval_peephole, eval_peephole_block};
pub use pipeline::PassPipeline;
