//! Graph transformation pass trait.

use crate::Result;
use crate::ir::Graph;
use crate::params::ParamMap;

/// Trait for implementing graph passes.
///
/// A pass rewrites a graph in place and may add parameters to the parameter
/// dictionary when it introduces new graph inputs. Passes never remove
/// parameters.
///
/// # Return Value
///
/// `run()` returns `Ok(true)` if the pass changed the graph and `Ok(false)`
/// otherwise. A pattern that does not match is not an error.
///
/// # Example
///
/// ```ignore
/// struct NoOpPass;
///
/// impl Pass for NoOpPass {
///     fn name(&self) -> &str {
///         "noop"
///     }
///
///     fn run(&self, graph: &mut Graph, params: &mut ParamMap) -> Result<bool> {
///         Ok(false)
///     }
/// }
/// ```
pub trait Pass: Send + Sync {
    /// Get the pass name (used for logging and debugging).
    fn name(&self) -> &str;

    /// Run the pass on the given graph.
    ///
    /// # Arguments
    ///
    /// * `graph` - The graph to transform (mutable).
    /// * `params` - The parameter dictionary bound to the graph inputs.
    fn run(&self, graph: &mut Graph, params: &mut ParamMap) -> Result<bool>;
}
