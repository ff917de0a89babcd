//! One-to-many strategies: a broadcast source fanned out to a wider layout.
//!
//! Both builders accept any source that behaves like a broadcast (a single
//! shard, or Replicate over several); each destination shard pulls from the
//! source shard nearest to it.

use super::builder::SubGraphBuilder;
use super::distance::nearest_parallel_id;
use super::error::Result;
use super::graph::{EdgeKind, GraphContext, NodeId, TaskNodeKind};
use super::planner::ReconcileRequest;
use crate::layout::Layout;

fn broadcast_like(src: &Layout) -> bool {
    src.parallel_num() == 1 || src.distribution.is_replicate()
}

/// Broadcast source to a destination wanting full copies on every shard:
/// one proxy per destination shard. A single-shard destination qualifies
/// whatever its distribution tag, since its one shard is the whole value.
pub struct BroadcastBuilder;

impl SubGraphBuilder for BroadcastBuilder {
    fn name(&self) -> &'static str {
        "Broadcast"
    }

    fn applicable(&self, src: &Layout, dst: &Layout) -> bool {
        broadcast_like(src) && (dst.parallel_num() == 1 || dst.distribution.is_replicate())
    }

    fn build(&self, ctx: &mut GraphContext, req: &ReconcileRequest<'_>) -> Result<Vec<NodeId>> {
        let dst_nodes = req
            .dst
            .placement
            .locations()
            .iter()
            .map(|&dst_loc| {
                let src_id = nearest_parallel_id(&req.src.placement, dst_loc);
                ctx.get_or_create_proxy(req.src_nodes[src_id], dst_loc)
            })
            .collect();
        Ok(dst_nodes)
    }
}

/// Broadcast source to a Split destination: each destination shard proxies
/// the nearest full copy, then slices out its own piece locally.
pub struct SplitFanOutBuilder;

impl SubGraphBuilder for SplitFanOutBuilder {
    fn name(&self) -> &'static str {
        "SplitFanOut"
    }

    fn applicable(&self, src: &Layout, dst: &Layout) -> bool {
        broadcast_like(src) && dst.distribution.is_split()
    }

    fn build(&self, ctx: &mut GraphContext, req: &ReconcileRequest<'_>) -> Result<Vec<NodeId>> {
        let Some(axis) = req.dst.distribution.split_axis() else {
            unreachable!("applicable() admits only split destinations");
        };
        let pieces = req.dst.parallel_num();

        let mut dst_nodes = Vec::with_capacity(pieces);
        for (out_id, &dst_loc) in req.dst.placement.locations().iter().enumerate() {
            let src_id = nearest_parallel_id(&req.src.placement, dst_loc);
            let full_copy = ctx.get_or_create_proxy(req.src_nodes[src_id], dst_loc);
            let slice = ctx.new_node(
                TaskNodeKind::Slice {
                    axis,
                    piece: out_id,
                    of: pieces,
                },
                dst_loc,
            );
            ctx.connect(full_copy, slice, EdgeKind::Data);
            dst_nodes.push(slice);
        }
        Ok(dst_nodes)
    }
}
