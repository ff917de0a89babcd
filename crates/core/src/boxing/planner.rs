//! Strategy selection for layout reconciliation.

use tracing::debug;

use super::builder::{BoxingPlan, SubGraphBuilder};
use super::error::{BoxingError, Result};
use super::fan_in::{ConcatFanInBuilder, PartialSumReduceBuilder};
use super::fan_out::{BroadcastBuilder, SplitFanOutBuilder};
use super::graph::{GraphContext, NodeId};
use super::passthrough::{IdentityBuilder, OneToOneBuilder};
use super::zero_fill::BroadcastToPartialSumBuilder;
use crate::layout::{Layout, LogicalValueId, ValueShape};

/// One reconciliation request: a logical value realized as `src_nodes`
/// under `src`, to be rebuilt under `dst`.
///
/// `src_nodes` is indexed by source parallel id and must match the source
/// placement's parallel_num.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileRequest<'a> {
    pub value: &'a LogicalValueId,
    pub shape: &'a ValueShape,
    pub src_nodes: &'a [NodeId],
    pub src: &'a Layout,
    pub dst: &'a Layout,
}

/// Tries each strategy against the layout pair in priority order and runs
/// the first that applies.
///
/// More specific strategies come first: a pair the identity strategy covers
/// must never reach a fan-out builder. A strategy that claims applicability
/// but fails internally is a hard error, not a cue to continue down the
/// list.
pub struct BoxingPlanner {
    builders: Vec<Box<dyn SubGraphBuilder>>,
}

impl BoxingPlanner {
    /// Planner with the standard strategy table.
    pub fn new() -> Self {
        Self {
            builders: vec![
                Box::new(IdentityBuilder),
                Box::new(OneToOneBuilder),
                Box::new(BroadcastToPartialSumBuilder),
                Box::new(BroadcastBuilder),
                Box::new(SplitFanOutBuilder),
                Box::new(ConcatFanInBuilder),
                Box::new(PartialSumReduceBuilder),
            ],
        }
    }

    /// Reconcile one logical value from its source layout to `req.dst`.
    ///
    /// On success the returned plan holds exactly one node per destination
    /// parallel id. See [`BoxingError`] for the failure taxonomy.
    pub fn reconcile(
        &self,
        ctx: &mut GraphContext,
        req: &ReconcileRequest<'_>,
    ) -> Result<BoxingPlan> {
        let src_num = req.src.parallel_num();
        if req.src_nodes.len() != src_num {
            return Err(BoxingError::StructuralMismatch {
                expected: src_num,
                actual: req.src_nodes.len(),
            });
        }

        let dst_num = req.dst.parallel_num();
        for builder in &self.builders {
            if !builder.applicable(req.src, req.dst) {
                continue;
            }
            debug!(
                strategy = builder.name(),
                value = %req.value,
                src = %req.src,
                dst = %req.dst,
                "selected boxing strategy"
            );
            let dst_nodes = builder.build(ctx, req)?;
            if dst_nodes.len() != dst_num {
                return Err(BoxingError::IncompletePlan {
                    strategy: builder.name(),
                    expected: dst_num,
                    actual: dst_nodes.len(),
                });
            }
            return Ok(BoxingPlan {
                dst_nodes,
                strategy: builder.name(),
            });
        }

        Err(BoxingError::LayoutNotReconcilable {
            value: req.value.clone(),
            src: req.src.clone(),
            dst: req.dst.clone(),
        })
    }
}

impl Default for BoxingPlanner {
    fn default() -> Self {
        Self::new()
    }
}
