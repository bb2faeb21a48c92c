//! DeciderResults — all decider verdicts for one policy evaluation.
//!
//! Holds the current capacity of the pool and the results of every decider
//! keyed by decider name, and folds them into the single capacity the policy
//! requires.
//!
//! # Aggregation
//!
//! ```text
//! if any decider is undetermined:
//!     required = undetermined
//! else:
//!     required = upper_bound(r1, r2, ..., rn)   // dimension-wise max
//! ```
//!
//! One undetermined decider cancels all others: scaling on a partial
//! picture is never safe. Deciders are kept sorted by name so rendering,
//! the wire form and equality never depend on insertion order.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::capacity::Capacity;
use crate::decider::DeciderResult;
use crate::error::{AutoscaleError, AutoscaleResult};
use crate::reason::ReasonRegistry;
use crate::wire::{WireReader, WireWriter};

/// Smallest wire size of one entry: empty name, absent capacity, absent reason.
const MIN_ENTRY_BYTES: usize = 3;

/// The decider results of one policy evaluation. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeciderResults {
    current_capacity: Capacity,
    results: BTreeMap<String, DeciderResult>,
}

impl DeciderResults {
    /// Collect decider results for a policy.
    ///
    /// Fails with [`AutoscaleError::InvalidArgument`] when no decider results
    /// are given or a decider name appears twice.
    pub fn new<K, I>(current_capacity: Capacity, results: I) -> AutoscaleResult<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, DeciderResult)>,
    {
        let mut sorted = BTreeMap::new();
        for (name, result) in results {
            match sorted.entry(name.into()) {
                Entry::Vacant(slot) => {
                    slot.insert(result);
                }
                Entry::Occupied(slot) => {
                    return Err(AutoscaleError::InvalidArgument(format!(
                        "duplicate decider result for [{}]",
                        slot.key()
                    )));
                }
            }
        }
        if sorted.is_empty() {
            return Err(AutoscaleError::InvalidArgument(
                "results can not be empty".to_string(),
            ));
        }
        Ok(Self {
            current_capacity,
            results: sorted,
        })
    }

    pub fn current_capacity(&self) -> &Capacity {
        &self.current_capacity
    }

    /// Results keyed by decider name, in name order.
    pub fn results(&self) -> &BTreeMap<String, DeciderResult> {
        &self.results
    }

    pub fn get(&self, decider: &str) -> Option<&DeciderResult> {
        self.results.get(decider)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeciderResult)> {
        self.results.iter().map(|(name, result)| (name.as_str(), result))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Names of deciders that could not produce a recommendation.
    pub fn undetermined_deciders(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, result)| result.is_undetermined())
            .map(|(name, _)| name)
            .collect()
    }

    /// The capacity this policy requires, or `None` when any decider is
    /// undetermined.
    pub fn required_capacity(&self) -> Option<Capacity> {
        let undetermined = self.undetermined_deciders();
        if !undetermined.is_empty() {
            debug!(
                deciders = ?undetermined,
                "undetermined decider cancels required capacity"
            );
            return None;
        }
        self.results
            .values()
            .filter_map(DeciderResult::required_capacity)
            .copied()
            .reduce(|acc, capacity| acc.upper_bound(&capacity))
    }

    /// Render as a JSON document.
    pub fn to_document(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn write_to(&self, out: &mut WireWriter) {
        self.current_capacity.write_to(out);
        out.write_len(self.results.len());
        for (name, result) in &self.results {
            out.write_string(name);
            result.write_to(out);
        }
    }

    pub fn read_from(input: &mut WireReader<'_>, registry: &ReasonRegistry) -> AutoscaleResult<Self> {
        let current_capacity = Capacity::read_from(input)?;
        let count = input.read_len()?;
        let mut results = Vec::with_capacity(entry_reservation(count, input.remaining()));
        for _ in 0..count {
            let name = input.read_string()?;
            let result = DeciderResult::read_from(input, registry)?;
            results.push((name, result));
        }
        Self::new(current_capacity, results)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = WireWriter::new();
        self.write_to(&mut out);
        out.into_bytes()
    }

    /// Decode a complete wire message. Trailing bytes are rejected.
    pub fn from_bytes(bytes: &[u8], registry: &ReasonRegistry) -> AutoscaleResult<Self> {
        let mut input = WireReader::new(bytes);
        let results = Self::read_from(&mut input, registry)?;
        if !input.is_exhausted() {
            return Err(AutoscaleError::Malformed(format!(
                "{} trailing bytes after decider results",
                input.remaining()
            )));
        }
        debug!(
            deciders = results.len(),
            bytes = bytes.len(),
            "decider results decoded"
        );
        Ok(results)
    }
}

/// Entries worth reserving for an untrusted `count`: no more than the
/// remaining bytes could possibly encode.
fn entry_reservation(count: usize, remaining: usize) -> usize {
    count.min(remaining / MIN_ENTRY_BYTES)
}

impl Serialize for DeciderResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(required) = self.required_capacity() {
            map.serialize_entry("required_capacity", &required)?;
        }
        map.serialize_entry("current_capacity", &self.current_capacity)?;
        map.serialize_entry("deciders", &self.results)?;
        map.end()
    }
}
