//! Evaluation file parser.
//!
//! Describes one policy evaluation as data: the current capacity of the pool
//! and the already-computed result of each decider. A decider without a
//! `required_capacity` is undetermined.
//!
//! ```toml
//! [current_capacity.total]
//! storage = 1073741824
//!
//! [deciders.proactive_storage]
//! summary = "storage above high watermark"
//! [deciders.proactive_storage.required_capacity.total]
//! storage = 2147483648
//!
//! [deciders.ml]
//! summary = "waiting for job assignments"
//! ```

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capacity::Capacity;
use crate::decider::DeciderResult;
use crate::error::AutoscaleResult;
use crate::reason::{Reason, SimpleReason};
use crate::results::DeciderResults;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EvaluationFile {
    pub current_capacity: Capacity,
    #[serde(default, deserialize_with = "unique_deciders")]
    pub deciders: BTreeMap<String, DeciderEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DeciderEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_capacity: Option<Capacity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Decode the decider table, failing on a repeated decider name instead of
/// letting the last entry replace an earlier verdict.
fn unique_deciders<'de, D>(deserializer: D) -> Result<BTreeMap<String, DeciderEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueDeciders;

    impl<'de> Visitor<'de> for UniqueDeciders {
        type Value = BTreeMap<String, DeciderEntry>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a table of decider name to decider result")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut deciders = BTreeMap::new();
            while let Some((name, entry)) = map.next_entry::<String, DeciderEntry>()? {
                match deciders.entry(name) {
                    Entry::Vacant(slot) => {
                        slot.insert(entry);
                    }
                    Entry::Occupied(slot) => {
                        return Err(de::Error::custom(format!(
                            "duplicate decider [{}]",
                            slot.key()
                        )));
                    }
                }
            }
            Ok(deciders)
        }
    }

    deserializer.deserialize_map(UniqueDeciders)
}

impl EvaluationFile {
    /// Load from disk. `.json` files are parsed as JSON, anything else as TOML.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => Self::from_toml_str(&content)?,
        };
        debug!(?path, "evaluation file loaded");
        Ok(file)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Turn the file into decider results ready for aggregation.
    pub fn into_results(self) -> AutoscaleResult<DeciderResults> {
        let results = self.deciders.into_iter().map(|(name, entry)| {
            let reason = entry
                .summary
                .map(|summary| Arc::new(SimpleReason::new(summary)) as Arc<dyn Reason>);
            (name, DeciderResult::new(entry.required_capacity, reason))
        });
        DeciderResults::new(self.current_capacity, results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AutoscaleError;

    const SAMPLE: &str = r#"
[current_capacity.total]
storage = 1000
memory = 2000

[deciders.storage]
summary = "disk above watermark"
[deciders.storage.required_capacity.total]
storage = 1500

[deciders.memory.required_capacity.total]
memory = 2500
[deciders.memory.required_capacity.node]
memory = 500
"#;

    #[test]
    fn parses_and_aggregates() {
        let file = EvaluationFile::from_toml_str(SAMPLE).unwrap();
        assert_eq!(file.deciders.len(), 2);

        let results = file.into_results().unwrap();
        let required = results.required_capacity().unwrap();
        assert_eq!(required.total.storage, Some(1500));
        assert_eq!(required.total.memory, Some(2500));
        assert_eq!(required.node.and_then(|n| n.memory), Some(500));

        let storage = results.get("storage").unwrap();
        assert_eq!(storage.reason().unwrap().summary(), "disk above watermark");
        assert!(results.get("memory").unwrap().reason().is_none());
    }

    #[test]
    fn missing_required_capacity_is_undetermined() {
        let file = EvaluationFile::from_toml_str(
            r#"
[current_capacity.total]
storage = 1

[deciders.ml]
summary = "waiting"
"#,
        )
        .unwrap();
        let results = file.into_results().unwrap();
        assert!(results.get("ml").unwrap().is_undetermined());
        assert_eq!(results.required_capacity(), None);
    }

    #[test]
    fn no_deciders_is_invalid() {
        let file = EvaluationFile::from_toml_str("[current_capacity.total]\nstorage = 1\n").unwrap();
        assert!(matches!(
            file.into_results(),
            Err(AutoscaleError::InvalidArgument(_))
        ));
    }

    #[test]
    fn unknown_fields_rejected() {
        let err = EvaluationFile::from_toml_str(
            r#"
[current_capacity.total]
storage = 1

[deciders.a]
sumary = "typo"
"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn duplicate_decider_in_json_rejected() {
        // The undetermined verdict must not be replaced by the later one.
        let content = r#"{
            "current_capacity": {"total": {"storage": 1}},
            "deciders": {
                "a": {"summary": "undetermined"},
                "a": {"required_capacity": {"total": {"storage": 999}}}
            }
        }"#;
        let err = serde_json::from_str::<EvaluationFile>(content).unwrap_err();
        assert!(err.to_string().contains("duplicate decider [a]"), "{err}");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.json");
        std::fs::write(&path, content).unwrap();
        assert!(EvaluationFile::from_file(&path).is_err());
    }

    #[test]
    fn distinct_deciders_in_json_accepted() {
        let file: EvaluationFile = serde_json::from_str(
            r#"{
                "current_capacity": {"total": {"storage": 1}},
                "deciders": {
                    "b": {"summary": "undetermined"},
                    "a": {"required_capacity": {"total": {"storage": 999}}}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(file.deciders.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(file.into_results().unwrap().required_capacity(), None);
    }

    #[test]
    fn toml_round_trip() {
        let file = EvaluationFile::from_toml_str(SAMPLE).unwrap();
        let rendered = file.to_toml_string().unwrap();
        assert_eq!(EvaluationFile::from_toml_str(&rendered).unwrap(), file);
    }

    #[test]
    fn loads_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.json");
        std::fs::write(
            &path,
            r#"{"current_capacity": {"total": {"storage": 1}},
                "deciders": {"a": {"required_capacity": {"total": {"storage": 7}}}}}"#,
        )
        .unwrap();

        let results = EvaluationFile::from_file(&path).unwrap().into_results().unwrap();
        assert_eq!(results.required_capacity(), Some(Capacity::total(Some(7), None)));
    }
}
