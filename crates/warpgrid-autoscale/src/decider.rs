//! A single decider's verdict.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::capacity::Capacity;
use crate::error::AutoscaleResult;
use crate::reason::{Reason, ReasonRegistry};
use crate::wire::{WireReader, WireWriter};

/// The outcome of one decider for one policy evaluation.
///
/// A missing required capacity means the decider could not produce a
/// recommendation ("undetermined"). That is not the same as "no change
/// needed", which deciders express as a present capacity at or below the
/// current one.
#[derive(Debug, Clone)]
pub struct DeciderResult {
    required_capacity: Option<Capacity>,
    reason: Option<Arc<dyn Reason>>,
}

impl DeciderResult {
    pub fn new(required_capacity: Option<Capacity>, reason: Option<Arc<dyn Reason>>) -> Self {
        Self {
            required_capacity,
            reason,
        }
    }

    /// A decider that asks for `capacity`.
    pub fn required(capacity: Capacity, reason: Option<Arc<dyn Reason>>) -> Self {
        Self::new(Some(capacity), reason)
    }

    /// A decider that cannot currently recommend anything.
    pub fn undetermined(reason: Option<Arc<dyn Reason>>) -> Self {
        Self::new(None, reason)
    }

    pub fn required_capacity(&self) -> Option<&Capacity> {
        self.required_capacity.as_ref()
    }

    pub fn reason(&self) -> Option<&dyn Reason> {
        self.reason.as_deref()
    }

    pub fn is_undetermined(&self) -> bool {
        self.required_capacity.is_none()
    }

    pub fn write_to(&self, out: &mut WireWriter) {
        out.write_optional(self.required_capacity.as_ref(), |w, c| c.write_to(w));
        out.write_optional(self.reason.as_deref(), |w, r| {
            w.write_string(r.name());
            r.write_to(w);
        });
    }

    pub fn read_from(input: &mut WireReader<'_>, registry: &ReasonRegistry) -> AutoscaleResult<Self> {
        let required_capacity = input.read_optional(Capacity::read_from)?;
        let reason = input.read_optional(|r| {
            let name = r.read_string()?;
            registry.read(&name, r)
        })?;
        Ok(Self {
            required_capacity,
            reason,
        })
    }

    fn reason_key(&self) -> Option<(&str, Vec<u8>)> {
        self.reason.as_deref().map(|r| (r.name(), r.encoded()))
    }
}

impl PartialEq for DeciderResult {
    fn eq(&self, other: &Self) -> bool {
        self.required_capacity == other.required_capacity && self.reason_key() == other.reason_key()
    }
}

impl Eq for DeciderResult {}

impl Hash for DeciderResult {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.required_capacity.hash(state);
        self.reason_key().hash(state);
    }
}

impl Serialize for DeciderResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(capacity) = &self.required_capacity {
            map.serialize_entry("required_capacity", capacity)?;
        }
        if let Some(reason) = &self.reason {
            map.serialize_entry("reason_summary", &reason.summary())?;
            map.serialize_entry("reason_details", &reason.details())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reason::SimpleReason;
    use serde_json::json;

    fn simple(summary: &str) -> Option<Arc<dyn Reason>> {
        Some(Arc::new(SimpleReason::new(summary)))
    }

    fn round_trip(result: &DeciderResult) -> DeciderResult {
        let mut out = WireWriter::new();
        result.write_to(&mut out);
        let bytes = out.into_bytes();
        let mut input = WireReader::new(&bytes);
        let decoded = DeciderResult::read_from(&mut input, &ReasonRegistry::default()).unwrap();
        assert!(input.is_exhausted());
        decoded
    }

    #[test]
    fn undetermined_is_not_zero() {
        let undetermined = DeciderResult::undetermined(None);
        let zero = DeciderResult::required(Capacity::ZERO, None);
        assert!(undetermined.is_undetermined());
        assert!(!zero.is_undetermined());
        assert_ne!(undetermined, zero);
    }

    #[test]
    fn renders_capacity_and_reason() {
        let result = DeciderResult::required(Capacity::total(Some(100), None), simple("disk full"));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "required_capacity": {"total": {"storage": 100}},
                "reason_summary": "disk full",
                "reason_details": {}
            })
        );
    }

    #[test]
    fn undetermined_render_omits_capacity() {
        let result = DeciderResult::undetermined(simple("no data yet"));
        let doc = serde_json::to_value(&result).unwrap();
        assert!(doc.get("required_capacity").is_none());
        assert_eq!(doc["reason_summary"], "no data yet");

        let bare = serde_json::to_value(DeciderResult::undetermined(None)).unwrap();
        assert_eq!(bare, json!({}));
    }

    #[test]
    fn equality_follows_reason_content() {
        let a = DeciderResult::required(Capacity::ZERO, simple("same"));
        let b = DeciderResult::required(Capacity::ZERO, simple("same"));
        let c = DeciderResult::required(Capacity::ZERO, simple("other"));
        let d = DeciderResult::required(Capacity::ZERO, None);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn wire_round_trip_with_and_without_reason() {
        for result in [
            DeciderResult::required(Capacity::total(Some(1), Some(2)), simple("why")),
            DeciderResult::required(Capacity::ZERO, None),
            DeciderResult::undetermined(simple("unknown")),
            DeciderResult::undetermined(None),
        ] {
            assert_eq!(round_trip(&result), result);
        }
    }

    #[test]
    fn unregistered_reason_fails_to_decode() {
        let result = DeciderResult::undetermined(simple("why"));
        let mut out = WireWriter::new();
        result.write_to(&mut out);
        let bytes = out.into_bytes();

        let err = DeciderResult::read_from(&mut WireReader::new(&bytes), &ReasonRegistry::new())
            .unwrap_err();
        assert!(matches!(err, crate::AutoscaleError::UnknownReason(_)));
    }
}
