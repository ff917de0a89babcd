//! Pass-through strategies: layouts that already agree shard-for-shard.

use super::builder::SubGraphBuilder;
use super::error::Result;
use super::graph::{GraphContext, NodeId};
use super::planner::ReconcileRequest;
use crate::layout::Layout;

/// With a single shard on each side, the shard is the whole value and the
/// distribution tag carries no information.
fn shards_equivalent(src: &Layout, dst: &Layout) -> bool {
    src.distribution == dst.distribution || (src.parallel_num() == 1 && dst.parallel_num() == 1)
}

/// Source and destination layouts are already identical; the source nodes
/// are the destination nodes. Creates nothing.
pub struct IdentityBuilder;

impl SubGraphBuilder for IdentityBuilder {
    fn name(&self) -> &'static str {
        "Identity"
    }

    fn applicable(&self, src: &Layout, dst: &Layout) -> bool {
        src.placement == dst.placement && shards_equivalent(src, dst)
    }

    fn build(&self, _ctx: &mut GraphContext, req: &ReconcileRequest<'_>) -> Result<Vec<NodeId>> {
        Ok(req.src_nodes.to_vec())
    }
}

/// Same parallel count and shard semantics, different locations: copy each
/// shard to its destination slot. Valid for any distribution since shard
/// `i` maps onto shard `i` unchanged.
pub struct OneToOneBuilder;

impl SubGraphBuilder for OneToOneBuilder {
    fn name(&self) -> &'static str {
        "OneToOne"
    }

    fn applicable(&self, src: &Layout, dst: &Layout) -> bool {
        src.parallel_num() == dst.parallel_num() && shards_equivalent(src, dst)
    }

    fn build(&self, ctx: &mut GraphContext, req: &ReconcileRequest<'_>) -> Result<Vec<NodeId>> {
        let dst_nodes = req
            .src_nodes
            .iter()
            .enumerate()
            .map(|(parallel_id, &src)| {
                ctx.get_or_create_proxy(src, req.dst.placement.location(parallel_id))
            })
            .collect();
        Ok(dst_nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxing::graph::{TaskNodeKind, TransferKind};
    use crate::layout::{DType, Distribution, LogicalValueId, ValueShape};
    use crate::placement::{Location, Placement};

    fn request<'a>(
        value: &'a LogicalValueId,
        shape: &'a ValueShape,
        src_nodes: &'a [NodeId],
        src: &'a Layout,
        dst: &'a Layout,
    ) -> ReconcileRequest<'a> {
        ReconcileRequest {
            value,
            shape,
            src_nodes,
            src,
            dst,
        }
    }

    #[test]
    fn identity_requires_equal_placements() {
        let a = Layout::new(
            Placement::new(vec![Location::host(0)]),
            Distribution::Replicate,
        );
        let b = Layout::new(
            Placement::new(vec![Location::host(1)]),
            Distribution::Replicate,
        );
        assert!(IdentityBuilder.applicable(&a, &a));
        assert!(!IdentityBuilder.applicable(&a, &b));
    }

    #[test]
    fn single_shard_distribution_tags_are_interchangeable() {
        let place = Placement::new(vec![Location::accelerator(0, 0)]);
        let split = Layout::new(place.clone(), Distribution::Split { axis: 0 });
        let partial = Layout::new(place, Distribution::PartialSum);
        assert!(IdentityBuilder.applicable(&split, &partial));
    }

    #[test]
    fn one_to_one_moves_each_shard() {
        let mut ctx = GraphContext::new();
        let src_locs = vec![Location::accelerator(0, 0), Location::accelerator(0, 1)];
        let dst_locs = vec![Location::accelerator(1, 0), Location::accelerator(1, 1)];
        let nodes: Vec<_> = src_locs.iter().map(|&l| ctx.add_source(l)).collect();

        let src = Layout::new(Placement::new(src_locs), Distribution::Split { axis: 1 });
        let dst = Layout::new(Placement::new(dst_locs.clone()), Distribution::Split { axis: 1 });
        assert!(OneToOneBuilder.applicable(&src, &dst));

        let value = LogicalValueId::new("op", "out");
        let shape = ValueShape::new(vec![2], DType::F32);
        let out = OneToOneBuilder
            .build(&mut ctx, &request(&value, &shape, &nodes, &src, &dst))
            .unwrap();

        assert_eq!(out.len(), 2);
        for (i, &node) in out.iter().enumerate() {
            let n = ctx.graph().node(node);
            assert_eq!(n.location, dst_locs[i]);
            assert_eq!(n.kind, TaskNodeKind::Transfer(TransferKind::HostToDevice));
        }
    }

    #[test]
    fn one_to_one_rejects_count_mismatch() {
        let src = Layout::new(
            Placement::new(vec![Location::host(0), Location::host(1)]),
            Distribution::Replicate,
        );
        let dst = Layout::new(
            Placement::new(vec![Location::host(0)]),
            Distribution::Replicate,
        );
        assert!(!OneToOneBuilder.applicable(&src, &dst));
    }
}
