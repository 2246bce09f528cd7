//! Ordered sequence of graph passes.

use crate::eval_peephole::EvalPeepholePass;
use jasper_core::{Graph, ParamMap, Pass, Result};

/// Pipeline with pluggable passes.
///
/// Passes run in registration order. Each runs inside a `pass` tracing span
/// carrying its name.
#[derive(Default)]
pub struct PassPipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl PassPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline with the built-in passes:
    /// - `EvalPeepholePass`
    pub fn with_defaults(allow_input_mutation: bool) -> Self {
        let mut pipeline = Self::new();
        pipeline.add_pass(EvalPeepholePass::new(allow_input_mutation));
        pipeline
    }

    /// Add a pass to the end of the pipeline.
    ///
    /// # Returns
    ///
    /// Returns a mutable reference to self for method chaining.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Names of the registered passes, in order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Run every pass in order.
    ///
    /// Returns whether any pass changed the graph. Stops at the first pass
    /// that fails.
    #[tracing::instrument(skip_all, fields(num_passes = self.passes.len()))]
    pub fn run(&self, graph: &mut Graph, params: &mut ParamMap) -> Result<bool> {
        let mut changed = false;
        for pass in &self.passes {
            let _span = tracing::debug_span!("pass", name = pass.name()).entered();
            changed |= pass.run(graph, params)?;
        }
        Ok(changed)
    }
}
