//! Many-to-one strategies: recombining shards into full copies.
//!
//! Split shards are concatenated along their axis; partial-sum shards are
//! summed. Either way every source shard is routed to each destination
//! location first, with the proxy cache collapsing duplicate transfers when
//! several destinations share a zone.

use super::builder::SubGraphBuilder;
use super::error::Result;
use super::graph::{EdgeKind, GraphContext, NodeId, TaskNodeKind};
use super::planner::ReconcileRequest;
use crate::layout::Layout;

/// Destinations that want the full value on every shard.
fn wants_full_copies(dst: &Layout) -> bool {
    dst.parallel_num() == 1 || dst.distribution.is_replicate()
}

fn gather_into(
    ctx: &mut GraphContext,
    req: &ReconcileRequest<'_>,
    kind: TaskNodeKind,
) -> Vec<NodeId> {
    let mut dst_nodes = Vec::with_capacity(req.dst.parallel_num());
    for &dst_loc in req.dst.placement.locations() {
        let gather = ctx.new_node(kind.clone(), dst_loc);
        // Source order is parallel-id order; concat semantics rely on it.
        for &src_node in req.src_nodes {
            let local = ctx.get_or_create_proxy(src_node, dst_loc);
            ctx.connect(local, gather, EdgeKind::Data);
        }
        dst_nodes.push(gather);
    }
    dst_nodes
}

/// Split source recombined into full copies by concatenation.
pub struct ConcatFanInBuilder;

impl SubGraphBuilder for ConcatFanInBuilder {
    fn name(&self) -> &'static str {
        "ConcatFanIn"
    }

    fn applicable(&self, src: &Layout, dst: &Layout) -> bool {
        src.parallel_num() > 1 && src.distribution.is_split() && wants_full_copies(dst)
    }

    fn build(&self, ctx: &mut GraphContext, req: &ReconcileRequest<'_>) -> Result<Vec<NodeId>> {
        let Some(axis) = req.src.distribution.split_axis() else {
            unreachable!("applicable() admits only split sources");
        };
        Ok(gather_into(ctx, req, TaskNodeKind::Concat { axis }))
    }
}

/// Partial-sum source recombined into full copies by summation.
pub struct PartialSumReduceBuilder;

impl SubGraphBuilder for PartialSumReduceBuilder {
    fn name(&self) -> &'static str {
        "PartialSumReduce"
    }

    fn applicable(&self, src: &Layout, dst: &Layout) -> bool {
        src.parallel_num() > 1 && src.distribution.is_partial_sum() && wants_full_copies(dst)
    }

    fn build(&self, ctx: &mut GraphContext, req: &ReconcileRequest<'_>) -> Result<Vec<NodeId>> {
        Ok(gather_into(ctx, req, TaskNodeKind::ReduceSum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DType, Distribution, LogicalValueId, ValueShape};
    use crate::placement::{Location, Placement};

    fn run(
        builder: &dyn SubGraphBuilder,
        src_locs: Vec<Location>,
        src_dist: Distribution,
        dst_locs: Vec<Location>,
        dst_dist: Distribution,
    ) -> (GraphContext, Vec<NodeId>, Vec<NodeId>) {
        let mut ctx = GraphContext::new();
        let src_nodes: Vec<_> = src_locs.iter().map(|&l| ctx.add_source(l)).collect();
        let src = Layout::new(Placement::new(src_locs), src_dist);
        let dst = Layout::new(Placement::new(dst_locs), dst_dist);
        assert!(builder.applicable(&src, &dst));

        let value = LogicalValueId::new("op", "out");
        let shape = ValueShape::new(vec![16], DType::F32);
        let out = builder
            .build(
                &mut ctx,
                &ReconcileRequest {
                    value: &value,
                    shape: &shape,
                    src_nodes: &src_nodes,
                    src: &src,
                    dst: &dst,
                },
            )
            .unwrap();
        (ctx, src_nodes, out)
    }

    #[test]
    fn concat_gathers_shards_in_parallel_id_order() {
        let (ctx, src_nodes, out) = run(
            &ConcatFanInBuilder,
            vec![Location::host(0), Location::host(0)],
            Distribution::Split { axis: 0 },
            vec![Location::host(0)],
            Distribution::Replicate,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(ctx.graph().node(out[0]).kind, TaskNodeKind::Concat { axis: 0 });
        // Same-zone shards feed the concat directly, in shard order.
        assert_eq!(ctx.graph().data_inputs(out[0]), src_nodes);
    }

    #[test]
    fn concat_routes_remote_shards_first() {
        let (ctx, src_nodes, out) = run(
            &ConcatFanInBuilder,
            vec![Location::accelerator(0, 0), Location::accelerator(1, 0)],
            Distribution::Split { axis: 1 },
            vec![Location::accelerator(0, 0)],
            Distribution::Replicate,
        );
        let inputs = ctx.graph().data_inputs(out[0]);
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0], src_nodes[0]); // already local
        assert_ne!(inputs[1], src_nodes[1]); // proxied across machines
        assert_eq!(
            ctx.graph().node(inputs[1]).location,
            Location::accelerator(0, 0)
        );
    }

    #[test]
    fn reduce_sums_every_shard_at_every_destination() {
        let (ctx, _, out) = run(
            &PartialSumReduceBuilder,
            vec![Location::accelerator(0, 0), Location::accelerator(0, 1)],
            Distribution::PartialSum,
            vec![Location::accelerator(0, 0), Location::accelerator(0, 1)],
            Distribution::Replicate,
        );
        assert_eq!(out.len(), 2);
        for &node in &out {
            assert_eq!(ctx.graph().node(node).kind, TaskNodeKind::ReduceSum);
            assert_eq!(ctx.graph().data_inputs(node).len(), 2);
        }
    }

    #[test]
    fn reduce_to_host_shares_staged_transfers() {
        // Both shards must reach m1; the staged hops for each shard are
        // cached, so building a second destination in the same zone adds
        // only the reduce node.
        let (mut ctx, src_nodes, out) = run(
            &PartialSumReduceBuilder,
            vec![Location::accelerator(0, 0), Location::accelerator(0, 1)],
            Distribution::PartialSum,
            vec![Location::host(1)],
            Distribution::Replicate,
        );
        assert_eq!(out.len(), 1);
        let before = ctx.graph().node_count();
        let again = ctx.get_or_create_proxy(src_nodes[0], Location::host(1));
        assert_eq!(ctx.graph().node_count(), before);
        assert_eq!(ctx.graph().data_inputs(out[0])[0], again);
    }

    #[test]
    fn fan_in_rejects_wide_non_replicate_destinations() {
        let two = Placement::new(vec![
            Location::accelerator(0, 0),
            Location::accelerator(0, 1),
        ]);
        let src = Layout::new(two.clone(), Distribution::PartialSum);
        let dst = Layout::new(two, Distribution::Split { axis: 0 });
        assert!(!PartialSumReduceBuilder.applicable(&src, &dst));
        assert!(!ConcatFanInBuilder.applicable(&src, &dst));
    }
}
