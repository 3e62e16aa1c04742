//! Normalization of META documents across schema generations.

use crate::error::{ExtractError, Result};
use carmine_core::flex_string;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Modern-schema phases, in flattening priority order.
const PHASES: [&str; 3] = ["runtime", "configure", "build"];

/// Dependency types considered within each phase.
const DEP_TYPES: [&str; 3] = ["requires", "recommends", "suggests"];

/// Legacy-schema top-level requirement keys, in priority order.
const LEGACY_KEYS: [&str; 3] = ["requires", "build_requires", "configure_requires"];

/// A module provided by a distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvidesEntry {
    /// Source file inside the distribution, when declared.
    pub file: Option<String>,
    /// Provided version, flex-coerced.
    pub version: String,
}

/// Normalized distribution metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaFile {
    /// Distribution name.
    pub name: String,
    /// Distribution version.
    pub version: String,
    /// Modules provided by the distribution.
    pub provides: BTreeMap<String, ProvidesEntry>,
    /// Flattened requirements: module to constraint.
    pub requirements: BTreeMap<String, String>,
}

/// Parse a `META.json`/`MYMETA.json` document.
pub(crate) fn parse_json(data: &[u8]) -> Result<MetaFile> {
    let doc: Value = serde_json::from_slice(data)
        .map_err(|e| ExtractError::Parse(format!("META.json: {e}")))?;
    Ok(normalize(&doc))
}

/// Parse a `META.yml`/`MYMETA.yml` document.
///
/// YAML is deserialized straight into a JSON value so both serializations
/// flow through the same normalizer.
pub(crate) fn parse_yaml(data: &[u8]) -> Result<MetaFile> {
    let doc: Value =
        serde_yaml::from_slice(data).map_err(|e| ExtractError::Parse(format!("META.yml: {e}")))?;
    Ok(normalize(&doc))
}

fn normalize(doc: &Value) -> MetaFile {
    let mut provides = BTreeMap::new();
    if let Some(map) = doc.get("provides").and_then(Value::as_object) {
        for (module, entry) in map {
            provides.insert(
                module.clone(),
                ProvidesEntry {
                    file: entry
                        .get("file")
                        .and_then(Value::as_str)
                        .map(ToString::to_string),
                    version: flex_field(entry, "version"),
                },
            );
        }
    }

    MetaFile {
        name: flex_field(doc, "name"),
        version: flex_field(doc, "version"),
        provides,
        requirements: flatten_requirements(doc),
    }
}

/// Flex-coerce an object field: strings pass through, numbers take their
/// concise form, missing or non-scalar values become `0`.
fn flex_field(doc: &Value, key: &str) -> String {
    doc.get(key).map_or_else(|| "0".to_string(), flex_string)
}

/// Fold every requirement source into one flat map, first writer wins:
///
/// 1. Modern schema `prereqs.<phase>.<deptype>`, phases then dependency
///    types in declaration-priority order.
/// 2. Legacy top-level `requires`, `build_requires`, `configure_requires`.
/// 3. Vendor extension `x_alienfile.requires.share` then `.system`.
fn flatten_requirements(doc: &Value) -> BTreeMap<String, String> {
    let mut requirements = BTreeMap::new();

    if let Some(prereqs) = doc.get("prereqs").and_then(Value::as_object) {
        for phase in PHASES {
            let Some(phase_reqs) = prereqs.get(phase).and_then(Value::as_object) else {
                continue;
            };
            for dep_type in DEP_TYPES {
                if let Some(deps) = phase_reqs.get(dep_type).and_then(Value::as_object) {
                    merge(&mut requirements, deps);
                }
            }
        }
    }

    for key in LEGACY_KEYS {
        if let Some(deps) = doc.get(key).and_then(Value::as_object) {
            merge(&mut requirements, deps);
        }
    }

    for section in ["share", "system"] {
        if let Some(deps) = doc
            .pointer(&format!("/x_alienfile/requires/{section}"))
            .and_then(Value::as_object)
        {
            merge(&mut requirements, deps);
        }
    }

    requirements
}

fn merge(requirements: &mut BTreeMap<String, String>, deps: &Map<String, Value>) {
    for (module, constraint) in deps {
        requirements
            .entry(module.clone())
            .or_insert_with(|| flex_string(constraint));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_schema_flattens_in_priority_order() {
        let meta = parse_json(
            br#"{
                "name": "Example-Dist",
                "version": "1.2",
                "prereqs": {
                    "runtime": {
                        "requires": { "Foo": "1.0", "Shared": "2.0" },
                        "recommends": { "Nice::ToHave": "0.5" }
                    },
                    "configure": { "requires": { "Shared": "9.9", "Conf": "0" } },
                    "build": { "suggests": { "Builder": "3" } }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(meta.name, "Example-Dist");
        assert_eq!(meta.version, "1.2");
        assert_eq!(meta.requirements["Foo"], "1.0");
        assert_eq!(meta.requirements["Nice::ToHave"], "0.5");
        // Runtime wrote Shared first; configure must not override it.
        assert_eq!(meta.requirements["Shared"], "2.0");
        assert_eq!(meta.requirements["Conf"], "0");
        assert_eq!(meta.requirements["Builder"], "3");
    }

    #[test]
    fn legacy_schema_is_honored() {
        let meta = parse_json(
            br#"{
                "name": "Old-Dist",
                "version": 0.42,
                "requires": { "Foo": "1.0" },
                "build_requires": { "Foo": "5.0", "Bar": "2.0" },
                "configure_requires": { "Baz": 3 }
            }"#,
        )
        .unwrap();

        assert_eq!(meta.version, "0.42");
        assert_eq!(meta.requirements["Foo"], "1.0");
        assert_eq!(meta.requirements["Bar"], "2.0");
        assert_eq!(meta.requirements["Baz"], "3");
    }

    #[test]
    fn alienfile_extension_is_merged_last() {
        let meta = parse_json(
            br#"{
                "name": "Alien-Thing",
                "version": "0.1",
                "prereqs": { "runtime": { "requires": { "Tool": "1.0" } } },
                "x_alienfile": {
                    "requires": {
                        "share": { "Tool": "9.0", "Share::Dep": "0.1" },
                        "system": { "System::Dep": "0.2" }
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(meta.requirements["Tool"], "1.0");
        assert_eq!(meta.requirements["Share::Dep"], "0.1");
        assert_eq!(meta.requirements["System::Dep"], "0.2");
    }

    #[test]
    fn provides_entries_are_flex_coerced() {
        let meta = parse_json(
            br#"{
                "name": "Flex",
                "version": 2,
                "provides": {
                    "Flex": { "file": "lib/Flex.pm", "version": 2 },
                    "Flex::Util": { "version": "0.9" },
                    "Flex::Odd": { "version": null }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(meta.version, "2");
        let flex = &meta.provides["Flex"];
        assert_eq!(flex.file.as_deref(), Some("lib/Flex.pm"));
        assert_eq!(flex.version, "2");
        assert_eq!(meta.provides["Flex::Util"].version, "0.9");
        assert_eq!(meta.provides["Flex::Odd"].version, "0");
    }

    #[test]
    fn missing_fields_become_zero() {
        let meta = parse_json(br"{}").unwrap();
        assert_eq!(meta.name, "0");
        assert_eq!(meta.version, "0");
        assert!(meta.provides.is_empty());
        assert!(meta.requirements.is_empty());
    }

    #[test]
    fn yaml_flows_through_the_same_normalizer() {
        let meta = parse_yaml(
            b"---\nname: Yaml-Dist\nversion: 1.1\nrequires:\n  Foo::Bar: 0.5\n",
        )
        .unwrap();
        assert_eq!(meta.name, "Yaml-Dist");
        assert_eq!(meta.version, "1.1");
        assert_eq!(meta.requirements["Foo::Bar"], "0.5");
    }

    #[test]
    fn malformed_documents_are_parse_errors() {
        assert!(matches!(
            parse_json(b"{ not json"),
            Err(ExtractError::Parse(_))
        ));
        assert!(matches!(
            parse_yaml(b"{ : : not yaml"),
            Err(ExtractError::Parse(_))
        ));
    }
}
