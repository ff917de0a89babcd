//! Logical value and layout descriptors.
//!
//! A [`Layout`] pairs a [`Placement`](crate::placement::Placement) with a
//! [`Distribution`]: *where* the shards live and *how* they relate to the
//! whole logical value. A distribution is only meaningful together with a
//! placement and a logical shape.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::placement::Placement;

/// Element type of a logical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    U8,
    U32,
    I32,
    I64,
    BF16,
    F16,
    F32,
    F64,
}

/// Shape, dtype, and repetition descriptor of a logical value.
///
/// `time_dims` is the repetition multiplicity: how many times per execution
/// the value is produced (empty means once).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueShape {
    pub dims: Vec<usize>,
    pub dtype: DType,
    #[serde(default)]
    pub time_dims: Vec<usize>,
}

impl ValueShape {
    pub fn new(dims: Vec<usize>, dtype: DType) -> Self {
        Self {
            dims,
            dtype,
            time_dims: Vec::new(),
        }
    }

    pub fn with_time_dims(mut self, time_dims: Vec<usize>) -> Self {
        self.time_dims = time_dims;
        self
    }

    /// Element count of the full logical value.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// How many times the value is produced per execution.
    pub fn repetitions(&self) -> usize {
        self.time_dims.iter().product()
    }
}

/// Identity of a logical value: the producing op and its output name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalValueId {
    pub producer: String,
    pub output: String,
}

impl LogicalValueId {
    pub fn new(producer: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            producer: producer.into(),
            output: output.into(),
        }
    }
}

impl fmt::Display for LogicalValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.producer, self.output)
    }
}

/// How per-shard data relates to the full logical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Distribution {
    /// Every shard holds the full value.
    Replicate,
    /// Shard `i` holds the `i`-th contiguous piece along `axis`.
    Split { axis: usize },
    /// The full value equals the element-wise sum of all shards.
    PartialSum,
}

impl Distribution {
    pub fn is_replicate(&self) -> bool {
        matches!(self, Distribution::Replicate)
    }

    pub fn is_split(&self) -> bool {
        matches!(self, Distribution::Split { .. })
    }

    pub fn is_partial_sum(&self) -> bool {
        matches!(self, Distribution::PartialSum)
    }

    pub fn split_axis(&self) -> Option<usize> {
        match self {
            Distribution::Split { axis } => Some(*axis),
            _ => None,
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Replicate => write!(f, "broadcast"),
            Distribution::Split { axis } => write!(f, "split({axis})"),
            Distribution::PartialSum => write!(f, "partial-sum"),
        }
    }
}

/// A complete layout: placement plus distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub placement: Placement,
    pub distribution: Distribution,
}

impl Layout {
    pub fn new(placement: Placement, distribution: Distribution) -> Self {
        Self {
            placement,
            distribution,
        }
    }

    pub fn parallel_num(&self) -> usize {
        self.placement.parallel_num()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} over {}", self.distribution, self.placement)
    }
}
