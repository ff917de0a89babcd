//! Task graph surface mutated by the boxing strategies.
//!
//! The planner inserts nodes and edges; it never deletes them. Node ids are
//! allocated sequentially, which makes repeated planning runs against fresh
//! contexts produce identical topologies.
//!
//! [`GraphContext`] wraps the graph with the proxy cache: within one context
//! at most one transfer chain is materialized per (source node, source zone,
//! destination machine, destination zone), and repeated requests for the
//! same route return the cached node.

use std::collections::HashMap;

use tracing::trace;

use crate::layout::ValueShape;
use crate::placement::{DeviceKind, Location, MemZoneId};

/// Stable identity of a task node within one graph.
pub type NodeId = usize;

/// Directed edge kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Value dependency: the consumer reads the producer's output.
    Data,
    /// Ordering only; no value flows. Used to sequence a zero-producer
    /// after the real producer it complements.
    Control,
}

/// Which hop of a transfer chain a proxy node performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Device memory to host memory on one machine.
    DeviceToHost,
    /// Host memory to device memory on one machine.
    HostToDevice,
    /// Host-to-host across machines; lands in the destination host zone.
    Network,
}

/// What a task node computes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskNodeKind {
    /// Pre-existing producer registered by the caller.
    Source,
    /// Copy/reference of an upstream value into a new memory zone.
    Transfer(TransferKind),
    /// Synthetic producer of a zero-valued tensor; no data inputs.
    Zeros(ValueShape),
    /// Contiguous piece `piece` of `of` along `axis` of the input.
    Slice { axis: usize, piece: usize, of: usize },
    /// Concatenation of all data inputs along `axis`, in edge order.
    Concat { axis: usize },
    /// Element-wise sum of all data inputs.
    ReduceSum,
}

/// A node owned by the task graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNode {
    pub id: NodeId,
    pub kind: TaskNodeKind,
    pub location: Location,
}

impl TaskNode {
    pub fn mem_zone(&self) -> MemZoneId {
        self.location.mem_zone()
    }
}

/// A directed edge between two task nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub src: NodeId,
    pub dst: NodeId,
    pub kind: EdgeKind,
}

/// Arena of task nodes plus the edge list, in insertion order.
#[derive(Debug, Default)]
pub struct TaskGraph {
    nodes: Vec<TaskNode>,
    edges: Vec<Edge>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pre-existing producer node at `location`.
    pub fn add_source(&mut self, location: Location) -> NodeId {
        self.new_node(TaskNodeKind::Source, location)
    }

    /// Allocate a fresh node with the next sequential id.
    pub fn new_node(&mut self, kind: TaskNodeKind, location: Location) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TaskNode { id, kind, location });
        id
    }

    /// Add a directed edge.
    ///
    /// # Panics
    /// Panics if either endpoint does not exist.
    pub fn connect(&mut self, src: NodeId, dst: NodeId, kind: EdgeKind) {
        assert!(src < self.nodes.len(), "unknown source node {src}");
        assert!(dst < self.nodes.len(), "unknown destination node {dst}");
        self.edges.push(Edge { src, dst, kind });
    }

    pub fn node(&self, id: NodeId) -> &TaskNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[TaskNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Data-edge producers of `id`, in edge insertion order.
    pub fn data_inputs(&self, id: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.dst == id && e.kind == EdgeKind::Data)
            .map(|e| e.src)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ProxyCacheKey {
    src: NodeId,
    src_zone: MemZoneId,
    dst_machine: u32,
    dst_zone: MemZoneId,
}

/// Mutation surface handed to the boxing strategies: the graph plus the
/// per-context proxy cache. Single-writer; one context per planning thread.
#[derive(Debug, Default)]
pub struct GraphContext {
    graph: TaskGraph,
    proxy_cache: HashMap<ProxyCacheKey, NodeId>,
}

impl GraphContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Register a pre-existing producer node at `location`.
    pub fn add_source(&mut self, location: Location) -> NodeId {
        self.graph.add_source(location)
    }

    /// Allocate a fresh compute or zero-producer node.
    pub fn new_node(&mut self, kind: TaskNodeKind, location: Location) -> NodeId {
        self.graph.new_node(kind, location)
    }

    /// Add a directed edge between existing nodes.
    pub fn connect(&mut self, src: NodeId, dst: NodeId, kind: EdgeKind) {
        self.graph.connect(src, dst, kind);
    }

    /// Route `src`'s output into the memory zone of `dst`, reusing any
    /// previously built chain for the same route.
    ///
    /// Returns `src` itself when the zones already match. Otherwise builds
    /// the transfer chain hop by hop, caching at every level:
    ///
    /// - same machine, host<->device: one transfer node;
    /// - same machine, device<->device: stage through the host zone;
    /// - cross machine: stage to the source host, a network hop landing in
    ///   the destination host zone (cached under its own key, so routes to
    ///   several devices on one remote machine share it), then
    ///   host->device if needed.
    pub fn get_or_create_proxy(&mut self, src: NodeId, dst: Location) -> NodeId {
        let src_loc = self.graph.node(src).location;
        let src_zone = src_loc.mem_zone();
        let dst_zone = dst.mem_zone();
        if src_zone == dst_zone {
            return src;
        }

        let key = ProxyCacheKey {
            src,
            src_zone,
            dst_machine: dst.machine_id,
            dst_zone,
        };
        if let Some(&cached) = self.proxy_cache.get(&key) {
            trace!(src, node = cached, %dst, "proxy cache hit");
            return cached;
        }

        let proxy = if src_loc.machine_id != dst.machine_id {
            if dst_zone.is_host() {
                let staged = self.get_or_create_proxy(src, Location::host(src_loc.machine_id));
                self.new_transfer(TransferKind::Network, Location::host(dst.machine_id), staged)
            } else {
                // Land in the destination host zone under its own cache key
                // so routes to several devices on one remote machine share
                // the network hop, then hop host->device.
                let landed = self.get_or_create_proxy(src, Location::host(dst.machine_id));
                self.get_or_create_proxy(landed, dst)
            }
        } else {
            match (src_zone.is_host(), dst_zone.is_host()) {
                (false, true) => self.new_transfer(TransferKind::DeviceToHost, dst, src),
                (true, false) => self.new_transfer(TransferKind::HostToDevice, dst, src),
                (false, false) => {
                    let staged = self.get_or_create_proxy(src, Location::host(src_loc.machine_id));
                    self.new_transfer(TransferKind::HostToDevice, dst, staged)
                }
                // Both host: same machine implies same zone, handled above.
                (true, true) => unreachable!("distinct host zones on one machine"),
            }
        };
        self.proxy_cache.insert(key, proxy);
        proxy
    }

    fn new_transfer(&mut self, kind: TransferKind, location: Location, input: NodeId) -> NodeId {
        debug_assert!(
            kind != TransferKind::Network || location.device_kind == DeviceKind::Cpu,
            "network transfers land in host memory"
        );
        let node = self.graph.new_node(TaskNodeKind::Transfer(kind), location);
        self.graph.connect(input, node, EdgeKind::Data);
        trace!(input, node, ?kind, %location, "created transfer node");
        node
    }
}
