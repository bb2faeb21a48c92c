//! Capacity values — the quantities deciders reason about.
//!
//! A [`Capacity`] has a `total` tier (the whole pool) and an optional `node`
//! tier (the size of a single node). Each tier is a [`Resources`] with one
//! optional byte count per dimension; `None` means "no opinion" on that
//! dimension rather than zero.

use serde::{Deserialize, Serialize};

use crate::error::AutoscaleResult;
use crate::wire::{WireReader, WireWriter};

/// Byte counts for each known dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resources {
    /// Storage in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<u64>,
    /// Memory in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
}

impl Resources {
    pub const ZERO: Resources = Resources {
        storage: Some(0),
        memory: Some(0),
    };

    pub fn new(storage: Option<u64>, memory: Option<u64>) -> Self {
        Self { storage, memory }
    }

    /// True when no dimension carries a value.
    pub fn is_empty(&self) -> bool {
        self.storage.is_none() && self.memory.is_none()
    }

    /// Dimension-wise maximum. A present value always beats an absent one.
    pub fn upper_bound(&self, other: &Resources) -> Resources {
        Resources {
            storage: max_present(self.storage, other.storage),
            memory: max_present(self.memory, other.memory),
        }
    }

    pub fn write_to(&self, out: &mut WireWriter) {
        out.write_optional(self.storage.as_ref(), |w, v| w.write_vlong(*v));
        out.write_optional(self.memory.as_ref(), |w, v| w.write_vlong(*v));
    }

    pub fn read_from(input: &mut WireReader<'_>) -> AutoscaleResult<Self> {
        let storage = input.read_optional(|r| r.read_vlong())?;
        let memory = input.read_optional(|r| r.read_vlong())?;
        Ok(Self { storage, memory })
    }
}

/// A tiered capacity: the whole pool plus, optionally, the per-node size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Capacity {
    #[serde(default)]
    pub total: Resources,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<Resources>,
}

impl Capacity {
    pub const ZERO: Capacity = Capacity {
        total: Resources::ZERO,
        node: None,
    };

    pub fn new(total: Resources, node: Option<Resources>) -> Self {
        Self { total, node }
    }

    /// Capacity with only a total tier.
    pub fn total(storage: Option<u64>, memory: Option<u64>) -> Self {
        Self::new(Resources::new(storage, memory), None)
    }

    /// Merge two capacities, keeping the larger value of every dimension in
    /// every tier. A node tier on either side survives the merge.
    ///
    /// Commutative and associative, so folding any number of capacities in
    /// any order yields the same result.
    pub fn upper_bound(&self, other: &Capacity) -> Capacity {
        let node = match (&self.node, &other.node) {
            (Some(a), Some(b)) => Some(a.upper_bound(b)),
            (Some(n), None) | (None, Some(n)) => Some(*n),
            (None, None) => None,
        };
        Capacity {
            total: self.total.upper_bound(&other.total),
            node,
        }
    }

    pub fn write_to(&self, out: &mut WireWriter) {
        self.total.write_to(out);
        out.write_optional(self.node.as_ref(), |w, n| n.write_to(w));
    }

    pub fn read_from(input: &mut WireReader<'_>) -> AutoscaleResult<Self> {
        let total = Resources::read_from(input)?;
        let node = input.read_optional(Resources::read_from)?;
        Ok(Self { total, node })
    }
}

fn max_present(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}
