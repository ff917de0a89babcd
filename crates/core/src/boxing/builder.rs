//! Common contract for boxing strategies.

use super::error::Result;
use super::graph::{GraphContext, NodeId};
use super::planner::ReconcileRequest;
use crate::layout::Layout;

/// One reconciliation strategy: a predicate over layout pairs plus the
/// graph construction for pairs it covers.
///
/// Strategies are stateless and held by the planner in a fixed priority
/// list; `applicable` must be cheap and side-effect free. `build` is only
/// called when `applicable` held, and any error it returns is a hard
/// failure, never a cue to try the next strategy.
pub trait SubGraphBuilder: Send + Sync {
    /// Strategy name reported in plans and diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this strategy covers the (source, destination) layout pair.
    fn applicable(&self, src: &Layout, dst: &Layout) -> bool;

    /// Mutate `ctx` to reconcile the layouts and return the destination
    /// node sequence, indexed by destination parallel id. The sequence must
    /// cover every destination shard.
    fn build(&self, ctx: &mut GraphContext, req: &ReconcileRequest<'_>) -> Result<Vec<NodeId>>;
}

/// Successful reconciliation: one task node per destination parallel id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxingPlan {
    /// Destination nodes, indexed by destination parallel id.
    pub dst_nodes: Vec<NodeId>,
    /// Name of the strategy that produced the plan.
    pub strategy: &'static str,
}
