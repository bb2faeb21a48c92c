//! Decider reasons — why a decider asked for the capacity it did.
//!
//! Reasons vary per decider, so the autoscaler only depends on a small
//! capability trait: something that can summarize itself, render its details
//! as a document and encode itself to the wire. Decoding goes through a
//! [`ReasonRegistry`] keyed by [`Reason::name`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{AutoscaleError, AutoscaleResult};
use crate::wire::{WireReader, WireWriter};

/// Explanation attached to a decider result.
pub trait Reason: fmt::Debug + Send + Sync {
    /// Registry key written ahead of the reason on the wire.
    fn name(&self) -> &str;

    /// One-line human summary.
    fn summary(&self) -> String;

    /// Structured details rendered under `reason_details`.
    fn details(&self) -> Value;

    fn write_to(&self, out: &mut WireWriter);
}

impl dyn Reason {
    /// Wire bytes of the reason body. Used for equality and hashing.
    pub(crate) fn encoded(&self) -> Vec<u8> {
        let mut out = WireWriter::new();
        self.write_to(&mut out);
        out.into_bytes()
    }
}

/// Decodes one reason body from the wire.
pub type ReasonReader = fn(&mut WireReader<'_>) -> AutoscaleResult<Arc<dyn Reason>>;

/// Name → reader table for decoding reasons.
#[derive(Clone)]
pub struct ReasonRegistry {
    readers: BTreeMap<String, ReasonReader>,
}

impl ReasonRegistry {
    /// An empty registry. Every reason on the wire will be rejected.
    pub fn new() -> Self {
        Self {
            readers: BTreeMap::new(),
        }
    }

    /// Register (or replace) the reader for `name`.
    pub fn register(&mut self, name: impl Into<String>, reader: ReasonReader) -> &mut Self {
        self.readers.insert(name.into(), reader);
        self
    }

    /// Decode the body of a reason registered as `name`.
    pub fn read(&self, name: &str, input: &mut WireReader<'_>) -> AutoscaleResult<Arc<dyn Reason>> {
        let reader = self
            .readers
            .get(name)
            .ok_or_else(|| AutoscaleError::UnknownReason(name.to_string()))?;
        reader(input)
    }
}

impl Default for ReasonRegistry {
    /// Registry with the built-in reasons.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(SimpleReason::NAME, SimpleReason::read_from);
        registry
    }
}

impl fmt::Debug for ReasonRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReasonRegistry")
            .field("names", &self.readers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A reason that carries only a summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleReason {
    summary: String,
}

impl SimpleReason {
    pub const NAME: &'static str = "simple";

    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
        }
    }

    fn read_from(input: &mut WireReader<'_>) -> AutoscaleResult<Arc<dyn Reason>> {
        Ok(Arc::new(Self::new(input.read_string()?)))
    }
}

impl Reason for SimpleReason {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn summary(&self) -> String {
        self.summary.clone()
    }

    fn details(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }

    fn write_to(&self, out: &mut WireWriter) {
        out.write_string(&self.summary);
    }
}
