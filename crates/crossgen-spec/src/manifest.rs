//! Kubernetes and Crossplane definition manifests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SpecError, SpecResult};
use crate::openapi::Schema;

/// `kind` of a CustomResourceDefinition.
pub const CRD_KIND: &str = "CustomResourceDefinition";
/// `kind` of a CompositeResourceDefinition.
pub const XRD_KIND: &str = "CompositeResourceDefinition";
/// `apiVersion` of generated CustomResourceDefinitions.
pub const CRD_API_VERSION: &str = "apiextensions.k8s.io/v1";

/// `apiVersion`/`kind` header shared by every manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

/// The subset of object metadata definitions carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Resource naming block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Names {
    pub kind: String,
    #[serde(default)]
    pub plural: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singular: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub short_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

impl Names {
    /// Returns the list kind, defaulting to `<Kind>List`.
    pub fn list_kind(&self) -> String {
        self.list_kind
            .clone()
            .unwrap_or_else(|| format!("{}List", self.kind))
    }
}

/// Validation block wrapping the structural schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    #[serde(rename = "openAPIV3Schema", default)]
    pub open_api_v3_schema: Option<Schema>,
}

/// One version of a CustomResourceDefinition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdVersion {
    pub name: String,
    #[serde(default)]
    pub served: bool,
    #[serde(default)]
    pub storage: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Validation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subresources: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_printer_columns: Vec<Value>,
}

impl CrdVersion {
    /// Returns the structural schema of this version, if any.
    pub fn open_api_schema(&self) -> Option<&Schema> {
        self.schema.as_ref()?.open_api_v3_schema.as_ref()
    }
}

/// `spec` of a CustomResourceDefinition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdSpec {
    pub group: String,
    pub names: Names,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default)]
    pub versions: Vec<CrdVersion>,
}

fn default_scope() -> String {
    "Namespaced".to_string()
}

/// A Kubernetes CustomResourceDefinition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomResourceDefinition {
    #[serde(default = "crd_api_version")]
    pub api_version: String,
    #[serde(default = "crd_kind")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: CrdSpec,
}

fn crd_api_version() -> String {
    CRD_API_VERSION.to_string()
}

fn crd_kind() -> String {
    CRD_KIND.to_string()
}

impl CustomResourceDefinition {
    /// Returns the versions that are served.
    pub fn served_versions(&self) -> impl Iterator<Item = &CrdVersion> {
        self.spec.versions.iter().filter(|v| v.served)
    }

    /// Serializes the CRD back to YAML.
    pub fn to_yaml(&self) -> SpecResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| SpecError::serialize_failed(format!("CRD {}", self.metadata.name), e))
    }
}

/// One version of a CompositeResourceDefinition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XrdVersion {
    pub name: String,
    #[serde(default)]
    pub served: bool,
    #[serde(default)]
    pub referenceable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Validation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_printer_columns: Vec<Value>,
}

/// `spec` of a CompositeResourceDefinition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XrdSpec {
    pub group: String,
    pub names: Names,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_names: Option<Names>,
    #[serde(default)]
    pub versions: Vec<XrdVersion>,
}

/// A Crossplane CompositeResourceDefinition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResourceDefinition {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: XrdSpec,
}

impl CompositeResourceDefinition {
    /// Returns the version that is both served and referenceable.
    pub fn referenceable_version(&self) -> Option<&XrdVersion> {
        self.spec.versions.iter().find(|v| v.served && v.referenceable)
    }
}

/// A classified manifest document.
#[derive(Debug, Clone, PartialEq)]
pub enum Manifest {
    Crd(Box<CustomResourceDefinition>),
    Xrd(Box<CompositeResourceDefinition>),
    /// Any other kind; ignored by the generators.
    Other { kind: Option<String> },
}

/// Classifies every YAML document in `bytes` by its `kind`.
///
/// `path` is only used for error context.
pub fn classify(path: &str, bytes: &[u8]) -> SpecResult<Vec<Manifest>> {
    let parse_err = |source| SpecError::ParseFailed {
        path: path.to_string(),
        source,
    };

    let mut manifests = Vec::new();
    for document in serde_yaml::Deserializer::from_slice(bytes) {
        let value = serde_yaml::Value::deserialize(document).map_err(parse_err)?;
        if value.is_null() {
            continue;
        }
        let meta: TypeMeta = serde_yaml::from_value(value.clone()).map_err(parse_err)?;
        let manifest = match meta.kind.as_deref() {
            Some(CRD_KIND) => Manifest::Crd(Box::new(
                serde_yaml::from_value(value).map_err(parse_err)?,
            )),
            Some(XRD_KIND) => Manifest::Xrd(Box::new(
                serde_yaml::from_value(value).map_err(parse_err)?,
            )),
            _ => Manifest::Other { kind: meta.kind },
        };
        manifests.push(manifest);
    }
    Ok(manifests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: buckets.storage.acme.co
spec:
  group: storage.acme.co
  names:
    kind: Bucket
    plural: buckets
  scope: Cluster
  versions:
    - name: v1beta1
      served: true
      storage: false
      schema:
        openAPIV3Schema:
          type: object
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
"#;

    #[test]
    fn test_classify_crd() {
        let manifests = classify("crd.yaml", CRD.as_bytes()).unwrap();
        assert_eq!(manifests.len(), 1);
        let Manifest::Crd(crd) = &manifests[0] else {
            panic!("expected CRD");
        };
        assert_eq!(crd.spec.names.kind, "Bucket");
        assert_eq!(crd.spec.names.list_kind(), "BucketList");
        let served: Vec<&str> = crd.served_versions().map(|v| v.name.as_str()).collect();
        assert_eq!(served, vec!["v1beta1", "v1"]);
        assert!(crd.spec.versions[1].open_api_schema().is_some());
    }

    #[test]
    fn test_classify_multi_document() {
        let yaml = "kind: ConfigMap\n---\n---\nkind: Composition\n";
        let manifests = classify("x.yaml", yaml.as_bytes()).unwrap();
        assert_eq!(
            manifests,
            vec![
                Manifest::Other {
                    kind: Some("ConfigMap".into())
                },
                Manifest::Other {
                    kind: Some("Composition".into())
                },
            ]
        );
    }

    #[test]
    fn test_classify_reports_path_on_bad_yaml() {
        let err = classify("apis/broken.yaml", b"kind: [unclosed").unwrap_err();
        assert!(err.to_string().contains("apis/broken.yaml"));
    }
}
