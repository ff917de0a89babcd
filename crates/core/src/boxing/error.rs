//! Error types for boxing.

use thiserror::Error;

use crate::layout::{Layout, LogicalValueId};

/// Errors that can occur while planning a layout reconciliation.
#[derive(Error, Debug)]
pub enum BoxingError {
    /// No strategy's applicability predicate matched the layout pair.
    ///
    /// Recoverable by the caller (e.g. pick a different destination layout);
    /// fatal to the compile pass that requested this exact pair.
    #[error("no boxing strategy covers {src} -> {dst} for value {value}")]
    LayoutNotReconcilable {
        value: LogicalValueId,
        src: Layout,
        dst: Layout,
    },

    /// Sorted source node count does not match the source placement.
    /// Caller contract violation, never retried against another strategy.
    #[error("got {actual} source nodes for a placement of parallel_num {expected}")]
    StructuralMismatch { expected: usize, actual: usize },

    /// An applicable strategy returned a destination sequence with gaps.
    #[error("strategy {strategy} produced {actual} destination nodes, expected {expected}")]
    IncompletePlan {
        strategy: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, BoxingError>;
