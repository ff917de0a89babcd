//! Physical placement descriptors.
//!
//! A [`Placement`] is the ordered set of machine/device locations holding the
//! shards of a distributed logical value. The index into that order is the
//! *parallel id*: it is stable for the lifetime of a layout and defines the
//! one-to-one correspondence between shards and task nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of compute device at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Host CPU. All CPU devices on a machine share host memory.
    Cpu,
    /// Accelerator (GPU or similar) with its own device memory.
    Accelerator,
}

/// One machine/device slot that can hold a shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub machine_id: u32,
    pub device_index: u32,
    pub device_kind: DeviceKind,
}

impl Location {
    /// Host memory location on `machine_id`.
    pub fn host(machine_id: u32) -> Self {
        Self {
            machine_id,
            device_index: 0,
            device_kind: DeviceKind::Cpu,
        }
    }

    /// Accelerator `device_index` on `machine_id`.
    pub fn accelerator(machine_id: u32, device_index: u32) -> Self {
        Self {
            machine_id,
            device_index,
            device_kind: DeviceKind::Accelerator,
        }
    }

    /// The addressable memory space this location writes into.
    ///
    /// Every CPU device on a machine maps to the machine's single host zone;
    /// every accelerator is its own zone. Zone equality is the unit of
    /// "already in the right place" throughout the boxing subsystem.
    pub fn mem_zone(&self) -> MemZoneId {
        match self.device_kind {
            DeviceKind::Cpu => MemZoneId {
                machine_id: self.machine_id,
                device_kind: DeviceKind::Cpu,
                device_index: 0,
            },
            DeviceKind::Accelerator => MemZoneId {
                machine_id: self.machine_id,
                device_kind: DeviceKind::Accelerator,
                device_index: self.device_index,
            },
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.device_kind {
            DeviceKind::Cpu => write!(f, "m{}:cpu", self.machine_id),
            DeviceKind::Accelerator => {
                write!(f, "m{}:accel{}", self.machine_id, self.device_index)
            }
        }
    }
}

/// A distinct addressable memory space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemZoneId {
    pub machine_id: u32,
    pub device_kind: DeviceKind,
    pub device_index: u32,
}

impl MemZoneId {
    /// Whether this is a machine's host zone.
    pub fn is_host(&self) -> bool {
        self.device_kind == DeviceKind::Cpu
    }
}

/// Ordered, non-empty sequence of locations; index = parallel id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Placement {
    locations: Vec<Location>,
}

impl Placement {
    /// Create a placement from an ordered location list.
    ///
    /// # Panics
    /// Panics if `locations` is empty.
    pub fn new(locations: Vec<Location>) -> Self {
        assert!(
            !locations.is_empty(),
            "placement must hold at least one location"
        );
        Self { locations }
    }

    /// Number of shards (length of the location list).
    pub fn parallel_num(&self) -> usize {
        self.locations.len()
    }

    /// Location of the shard at `parallel_id`.
    ///
    /// # Panics
    /// Panics if `parallel_id >= parallel_num()`.
    pub fn location(&self, parallel_id: usize) -> Location {
        self.locations[parallel_id]
    }

    /// All locations in parallel-id order.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, loc) in self.locations.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{loc}")?;
        }
        write!(f, "]")
    }
}
