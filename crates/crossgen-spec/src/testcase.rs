//! Typed test-case definitions and decoding of rendered manifest lists.
//!
//! A rendered test directory produces a YAML document with an `items` list.
//! Each item is dispatched on its `kind` into a [`TestCase`]; items of other
//! kinds are reported as [`DecodedItem::Unrecognized`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::manifest::ObjectMeta;

/// API group of the test-case kinds.
pub const TEST_GROUP: &str = "meta.dev.crossgen.io";
/// API version of the test-case kinds.
pub const TEST_VERSION: &str = "v1alpha1";
/// `kind` of a composition test.
pub const COMPOSITION_TEST_KIND: &str = "CompositionTest";
/// `kind` of an end-to-end test.
pub const E2E_TEST_KIND: &str = "E2ETest";

/// Returns the `apiVersion` of the test-case kinds.
pub fn test_api_version() -> String {
    format!("{}/{}", TEST_GROUP, TEST_VERSION)
}

/// Errors raised while decoding or validating test cases.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// The rendered document is not valid YAML.
    #[error("rendered output is not valid YAML: {0}")]
    InvalidYaml(String),

    /// The rendered document has no `items` list.
    #[error("rendered output must contain an 'items' list")]
    MissingItems,

    /// An item has a recognized kind but does not match its schema.
    #[error("failed to decode {kind}: {reason}")]
    Malformed { kind: String, reason: String },

    /// An item kind is not a test case (strict mode only).
    #[error("unrecognized item kind {kind:?}")]
    Unrecognized { kind: Option<String> },

    /// A decoded test case is invalid.
    #[error("invalid {kind} {name:?}: {}", .problems.join("; "))]
    Invalid {
        kind: &'static str,
        name: String,
        problems: Vec<String>,
    },
}

impl crate::error::BackendError for DecodeError {
    fn code(&self) -> &'static str {
        match self {
            DecodeError::InvalidYaml(_) => "DECODE_001",
            DecodeError::MissingItems => "DECODE_002",
            DecodeError::Malformed { .. } => "DECODE_003",
            DecodeError::Unrecognized { .. } => "DECODE_004",
            DecodeError::Invalid { .. } => "DECODE_005",
        }
    }

    fn category(&self) -> &'static str {
        "decode"
    }
}

/// How unrecognized or malformed items are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Skip them.
    #[default]
    Lenient,
    /// Fail the decode.
    Strict,
}

impl FromStr for DecodeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lenient" => Ok(DecodeMode::Lenient),
            "strict" => Ok(DecodeMode::Strict),
            other => Err(format!("unknown decode mode '{}'", other)),
        }
    }
}

/// Crossplane installation settings for an end-to-end test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossplaneSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_upgrade: Option<AutoUpgrade>,
}

/// Crossplane upgrade channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoUpgrade {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

/// `spec` of a composition test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionTestSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xr: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xr_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xrd: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xrd_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub observed_resources: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_resources: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assert: Vec<Value>,
}

/// A composition test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionTest {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: CompositionTestSpec,
}

fn set(value: &Option<Value>) -> bool {
    matches!(value, Some(v) if !v.is_null())
}

fn set_path(path: &Option<String>) -> bool {
    matches!(path, Some(p) if !p.is_empty())
}

impl CompositionTest {
    /// Checks that each input is given either inline or by path, not both.
    pub fn validate(&self) -> Result<(), DecodeError> {
        let spec = &self.spec;
        let mut problems = Vec::new();
        if set(&spec.xr) && set_path(&spec.xr_path) {
            problems.push("only one of 'xr' or 'xrPath' may be specified".to_string());
        }
        if set(&spec.xrd) && set_path(&spec.xrd_path) {
            problems.push("only one of 'xrd' or 'xrdPath' may be specified".to_string());
        }
        if set(&spec.composition) && set_path(&spec.composition_path) {
            problems.push(
                "only one of 'composition' or 'compositionPath' may be specified".to_string(),
            );
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::Invalid {
                kind: COMPOSITION_TEST_KIND,
                name: self.metadata.name.clone(),
                problems,
            })
        }
    }
}

/// `spec` of an end-to-end test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct E2ETestSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crossplane: Option<CrossplaneSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_conditions: Vec<String>,
    #[serde(default)]
    pub manifests: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_resources: Vec<Value>,
}

/// An end-to-end test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct E2ETest {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: E2ETestSpec,
}

impl E2ETest {
    /// Checks the minimum constraints of an end-to-end test.
    pub fn validate(&self) -> Result<(), DecodeError> {
        let mut problems = Vec::new();
        if self.spec.manifests.is_empty() {
            problems.push("spec.manifests must contain at least one manifest".to_string());
        }
        if self.spec.timeout_seconds == Some(0) {
            problems.push("spec.timeoutSeconds must be at least 1".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::Invalid {
                kind: E2E_TEST_KIND,
                name: self.metadata.name.clone(),
                problems,
            })
        }
    }
}

/// A decoded test case.
#[derive(Debug, Clone, PartialEq)]
pub enum TestCase {
    Composition(Box<CompositionTest>),
    E2E(Box<E2ETest>),
}

impl TestCase {
    /// Returns the kind of the test case.
    pub fn kind(&self) -> &'static str {
        match self {
            TestCase::Composition(_) => COMPOSITION_TEST_KIND,
            TestCase::E2E(_) => E2E_TEST_KIND,
        }
    }

    /// Returns the name of the test case.
    pub fn name(&self) -> &str {
        match self {
            TestCase::Composition(t) => &t.metadata.name,
            TestCase::E2E(t) => &t.metadata.name,
        }
    }

    /// Validates the test case.
    pub fn validate(&self) -> Result<(), DecodeError> {
        match self {
            TestCase::Composition(t) => t.validate(),
            TestCase::E2E(t) => t.validate(),
        }
    }
}

/// Outcome of decoding one rendered item.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedItem {
    Test(TestCase),
    Unrecognized { kind: Option<String> },
    Malformed { kind: String, reason: String },
}

/// Decodes one item by peeking at its `kind`.
pub fn decode_item(item: Value) -> DecodedItem {
    let kind = item.get("kind").and_then(Value::as_str).map(str::to_string);
    match kind.as_deref() {
        Some(COMPOSITION_TEST_KIND) => match serde_json::from_value::<CompositionTest>(item) {
            Ok(test) => DecodedItem::Test(TestCase::Composition(Box::new(test))),
            Err(e) => DecodedItem::Malformed {
                kind: COMPOSITION_TEST_KIND.to_string(),
                reason: e.to_string(),
            },
        },
        Some(E2E_TEST_KIND) => match serde_json::from_value::<E2ETest>(item) {
            Ok(test) => DecodedItem::Test(TestCase::E2E(Box::new(test))),
            Err(e) => DecodedItem::Malformed {
                kind: E2E_TEST_KIND.to_string(),
                reason: e.to_string(),
            },
        },
        _ => DecodedItem::Unrecognized { kind },
    }
}

/// Decodes a rendered `{ items: [...] }` document into test cases.
///
/// In [`DecodeMode::Lenient`] unrecognized and malformed items are skipped;
/// in [`DecodeMode::Strict`] the first one fails the decode.
pub fn decode_items(yaml: &[u8], mode: DecodeMode) -> Result<Vec<TestCase>, DecodeError> {
    let document: Value =
        serde_yaml::from_slice(yaml).map_err(|e| DecodeError::InvalidYaml(e.to_string()))?;
    let Some(items) = document.get("items").and_then(Value::as_array) else {
        return Err(DecodeError::MissingItems);
    };

    let mut tests = Vec::new();
    for item in items {
        match decode_item(item.clone()) {
            DecodedItem::Test(test) => tests.push(test),
            DecodedItem::Unrecognized { kind } => {
                if mode == DecodeMode::Strict {
                    return Err(DecodeError::Unrecognized { kind });
                }
                tracing::debug!(kind = ?kind, "skipping unrecognized item");
            }
            DecodedItem::Malformed { kind, reason } => {
                if mode == DecodeMode::Strict {
                    return Err(DecodeError::Malformed { kind, reason });
                }
                tracing::debug!(%kind, %reason, "skipping malformed item");
            }
        }
    }
    Ok(tests)
}

/// Parses a single end-to-end test manifest.
pub fn parse_e2e(yaml: &[u8]) -> Result<E2ETest, DecodeError> {
    let test: E2ETest = serde_yaml::from_slice(yaml).map_err(|e| DecodeError::Malformed {
        kind: E2E_TEST_KIND.to_string(),
        reason: e.to_string(),
    })?;
    if test.kind != E2E_TEST_KIND {
        return Err(DecodeError::Unrecognized {
            kind: Some(test.kind),
        });
    }
    test.validate()?;
    Ok(test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RENDERED: &str = r#"
items:
  - apiVersion: meta.dev.crossgen.io/v1alpha1
    kind: CompositionTest
    metadata:
      name: test-xbucket
    spec:
      timeoutSeconds: 60
      xrPath: examples/xbucket.yaml
      compositionPath: apis/xbucket/composition.yaml
      assert:
        - apiVersion: s3.aws.upbound.io/v1beta1
          kind: Bucket
  - apiVersion: v1
    kind: Bogus
  - apiVersion: meta.dev.crossgen.io/v1alpha1
    kind: E2ETest
    metadata:
      name: e2e-xbucket
    spec:
      crossplane:
        version: 1.20.0
        autoUpgrade:
          channel: Stable
      defaultConditions: [Ready]
      manifests:
        - kind: XBucket
"#;

    #[test]
    fn test_decode_lenient_skips_unknown() {
        let tests = decode_items(RENDERED.as_bytes(), DecodeMode::Lenient).unwrap();
        assert_eq!(tests.len(), 2);
        assert_eq!(tests[0].kind(), "CompositionTest");
        assert_eq!(tests[0].name(), "test-xbucket");
        let TestCase::Composition(comp) = &tests[0] else {
            panic!("expected composition test");
        };
        assert_eq!(comp.spec.timeout_seconds, Some(60));
        assert_eq!(comp.spec.assert.len(), 1);

        let TestCase::E2E(e2e) = &tests[1] else {
            panic!("expected e2e test");
        };
        let crossplane = e2e.spec.crossplane.as_ref().unwrap();
        assert_eq!(crossplane.version.as_deref(), Some("1.20.0"));
        assert_eq!(
            crossplane.auto_upgrade.as_ref().unwrap().channel.as_deref(),
            Some("Stable")
        );
    }

    #[test]
    fn test_decode_strict_rejects_unknown() {
        let err = decode_items(RENDERED.as_bytes(), DecodeMode::Strict).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Unrecognized {
                kind: Some("Bogus".into())
            }
        );
    }

    #[test]
    fn test_decode_requires_items_list() {
        assert_eq!(
            decode_items(b"items: {}", DecodeMode::Lenient).unwrap_err(),
            DecodeError::MissingItems
        );
        assert_eq!(
            decode_items(b"kind: List", DecodeMode::Lenient).unwrap_err(),
            DecodeError::MissingItems
        );
    }

    #[test]
    fn test_malformed_item() {
        let yaml = "items:\n  - kind: CompositionTest\n    spec:\n      timeoutSeconds: soon\n";
        assert!(decode_items(yaml.as_bytes(), DecodeMode::Lenient)
            .unwrap()
            .is_empty());
        assert!(matches!(
            decode_items(yaml.as_bytes(), DecodeMode::Strict),
            Err(DecodeError::Malformed { .. })
        ));
    }

    #[test]
    fn test_composition_validate_exclusive_inputs() {
        let mut test = CompositionTest::default();
        test.spec.xr = Some(serde_json::json!({"kind": "XBucket"}));
        test.spec.xr_path = Some("examples/xr.yaml".into());
        test.spec.composition_path = Some("c.yaml".into());
        let err = test.validate().unwrap_err();
        assert!(err.to_string().contains("'xr' or 'xrPath'"));
        assert!(!err.to_string().contains("composition"));

        test.spec.xr_path = None;
        assert!(test.validate().is_ok());
    }

    #[test]
    fn test_parse_e2e() {
        let yaml = "apiVersion: meta.dev.crossgen.io/v1alpha1\nkind: E2ETest\nmetadata: {name: e}\nspec:\n  timeoutSeconds: 0\n  manifests: []\n";
        let err = parse_e2e(yaml.as_bytes()).unwrap_err();
        let DecodeError::Invalid { problems, .. } = err else {
            panic!("expected invalid");
        };
        assert_eq!(problems.len(), 2);

        let ok = "kind: E2ETest\nspec:\n  manifests: [{kind: XBucket}]\n";
        assert!(parse_e2e(ok.as_bytes()).is_ok());
    }
}
