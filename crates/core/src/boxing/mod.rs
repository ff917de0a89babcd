//! Boxing: reconciliation of distributed tensor layouts.
//!
//! When an operator requires its input under a different layout than the
//! producer emits (different placement, different distribution, or both),
//! the boxing planner synthesizes the transfer/compute subgraph that
//! transforms one into the other without changing the mathematical value.
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────────┐
//!   Reconcile ---> │  BoxingPlanner   │  fixed priority list of strategies
//!                  └────────┬─────────┘
//!                           │ first applicable
//!                  ┌────────v─────────┐
//!                  │ SubGraphBuilder  │  Identity / OneToOne / zero-fill /
//!                  └────────┬─────────┘  fan-out / fan-in
//!                           │ mutates
//!                  ┌────────v─────────┐
//!                  │   GraphContext   │  task graph + proxy cache
//!                  └──────────────────┘
//! ```
//!
//! # Key concepts
//!
//! - **Proxy node**: a transfer node copying a value into a new memory zone,
//!   cached per (source node, source zone, destination machine, destination
//!   zone) so redundant transfers collapse onto one node.
//! - **Zero-producer**: a synthetic node emitting a zero tensor, used to
//!   complete a partial-sum layout so the downstream sum reproduces the
//!   original value exactly once.
//! - **Anchor**: the destination shard chosen to carry the real value in a
//!   broadcast-to-partial-sum reconciliation.
//!
//! Planning is synchronous and deterministic: node ids are allocated
//! sequentially and no step iterates a hash map, so identical requests
//! against fresh contexts produce isomorphic graphs.

mod builder;
mod distance;
mod error;
mod fan_in;
mod fan_out;
mod graph;
mod passthrough;
mod planner;
mod zero_fill;

pub use builder::{BoxingPlan, SubGraphBuilder};
pub use distance::{distance, nearest_parallel_id, CROSS_MACHINE, SAME_MACHINE, SAME_ZONE};
pub use error::{BoxingError, Result};
pub use fan_in::{ConcatFanInBuilder, PartialSumReduceBuilder};
pub use fan_out::{BroadcastBuilder, SplitFanOutBuilder};
pub use graph::{
    Edge, EdgeKind, GraphContext, NodeId, TaskGraph, TaskNode, TaskNodeKind, TransferKind,
};
pub use passthrough::{IdentityBuilder, OneToOneBuilder};
pub use planner::{BoxingPlanner, ReconcileRequest};
pub use zero_fill::BroadcastToPartialSumBuilder;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DType, Distribution, Layout, LogicalValueId, ValueShape};
    use crate::placement::{Location, Placement};

    #[test]
    fn planner_smoke() {
        let planner = BoxingPlanner::new();
        let mut ctx = GraphContext::new();

        let src_layout = Layout::new(
            Placement::new(vec![Location::accelerator(0, 0)]),
            Distribution::Replicate,
        );
        let dst_layout = Layout::new(
            Placement::new(vec![Location::accelerator(0, 0)]),
            Distribution::Replicate,
        );
        let src = ctx.add_source(Location::accelerator(0, 0));

        let value = LogicalValueId::new("producer", "out");
        let shape = ValueShape::new(vec![2, 2], DType::F32);
        let plan = planner
            .reconcile(
                &mut ctx,
                &ReconcileRequest {
                    value: &value,
                    shape: &shape,
                    src_nodes: &[src],
                    src: &src_layout,
                    dst: &dst_layout,
                },
            )
            .unwrap();

        assert_eq!(plan.strategy, "Identity");
        assert_eq!(plan.dst_nodes, vec![src]);
    }
}
