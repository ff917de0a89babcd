//! Broadcast to partial-sum reconciliation.
//!
//! A partial-sum destination defines the full value as the sum of its
//! shards. Reconciling a broadcast value into that form therefore requires
//! exactly one destination shard to carry the real value and every other
//! shard to carry zero; any other split would change the result. The shard
//! carrying the real value (the *anchor*) is the one cheapest to reach from
//! the source placement, ties resolved to the lowest destination parallel
//! id so repeated planning picks the same anchor.

use super::builder::SubGraphBuilder;
use super::distance::{distance, nearest_parallel_id};
use super::error::Result;
use super::graph::{EdgeKind, GraphContext, NodeId, TaskNodeKind};
use super::planner::ReconcileRequest;
use crate::layout::Layout;

pub struct BroadcastToPartialSumBuilder;

impl SubGraphBuilder for BroadcastToPartialSumBuilder {
    fn name(&self) -> &'static str {
        "BroadcastToPartialSum"
    }

    fn applicable(&self, src: &Layout, dst: &Layout) -> bool {
        (src.parallel_num() == 1 || src.distribution.is_replicate())
            && dst.parallel_num() > 1
            && dst.distribution.is_partial_sum()
    }

    fn build(&self, ctx: &mut GraphContext, req: &ReconcileRequest<'_>) -> Result<Vec<NodeId>> {
        let src_placement = &req.src.placement;
        let dst_placement = &req.dst.placement;

        // Nearest source shard for every destination shard, and the anchor:
        // the destination with the globally minimal source distance. Strict
        // less keeps the lowest destination id on ties.
        let mut nearest_src = Vec::with_capacity(dst_placement.parallel_num());
        let mut anchor = 0;
        let mut anchor_distance = u64::MAX;
        for (out_id, &dst_loc) in dst_placement.locations().iter().enumerate() {
            let src_id = nearest_parallel_id(src_placement, dst_loc);
            let d = distance(src_placement.location(src_id), dst_loc);
            nearest_src.push(src_id);
            if d < anchor_distance {
                anchor = out_id;
                anchor_distance = d;
            }
        }

        let mut dst_nodes = Vec::with_capacity(dst_placement.parallel_num());
        for (out_id, &dst_loc) in dst_placement.locations().iter().enumerate() {
            let src_node = req.src_nodes[nearest_src[out_id]];
            if out_id == anchor {
                dst_nodes.push(ctx.get_or_create_proxy(src_node, dst_loc));
            } else {
                let zeros = ctx.new_node(TaskNodeKind::Zeros(req.shape.clone()), dst_loc);
                // Order the zero-producer after the real producer so the
                // scheduler cannot reorder the two halves of the plan.
                ctx.connect(src_node, zeros, EdgeKind::Control);
                dst_nodes.push(zeros);
            }
        }
        Ok(dst_nodes)
    }
}
