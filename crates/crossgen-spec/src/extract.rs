//! Spec extraction: CRD versions to OpenAPI v3 documents.
//!
//! Every served version carrying a structural schema becomes one document.
//! Component names follow `<group>.<version>.<Kind>` for the resource,
//! `<group>.<version>.<Kind>List` for its list, and the shared
//! `io.k8s.apimachinery.pkg.apis.meta.v1.<Type>` names for metadata.

use std::collections::BTreeMap;

use serde_json::json;

use crate::error::{SpecError, SpecResult};
use crate::manifest::CustomResourceDefinition;
use crate::meta::{meta_name, meta_v1_schemas};
use crate::openapi::{component_ref, OpenApiDocument, Schema};

/// Extension naming the group/version/kind a schema describes.
pub const GVK_EXTENSION: &str = "x-kubernetes-group-version-kind";

/// Returns the component name of a resource kind.
pub fn schema_name(group: &str, version: &str, kind: &str) -> String {
    format!("{}.{}.{}", group, version, kind)
}

/// One OpenAPI document extracted from a CRD version.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSpec {
    /// API group of the resource.
    pub group: String,
    /// Kind of the resource.
    pub kind: String,
    /// Version the document describes.
    pub version: String,
    /// Path of the manifest the CRD came from.
    pub source: String,
    /// The document itself.
    pub document: OpenApiDocument,
}

impl ExtractedSpec {
    /// Returns the component name of the resource kind.
    pub fn kind_schema_name(&self) -> String {
        schema_name(&self.group, &self.version, &self.kind)
    }
}

/// Builds one OpenAPI document per served version of `crd`.
///
/// Versions without a schema are skipped. Output is keyed by version name.
pub fn extract_openapi(
    crd: &CustomResourceDefinition,
) -> SpecResult<BTreeMap<String, OpenApiDocument>> {
    let group = &crd.spec.group;
    let names = &crd.spec.names;
    if group.is_empty() || names.kind.is_empty() {
        return Err(SpecError::invalid_definition(
            "CustomResourceDefinition",
            &crd.metadata.name,
            "spec.group and spec.names.kind are required",
        ));
    }

    let mut documents = BTreeMap::new();
    for version in crd.served_versions() {
        let Some(root) = version.open_api_schema() else {
            tracing::debug!(
                crd = %crd.metadata.name,
                version = %version.name,
                "served version has no schema"
            );
            continue;
        };

        let api_version = format!("{}/{}", group, version.name);
        let kind_name = schema_name(group, &version.name, &names.kind);
        let list_kind = names.list_kind();
        let list_name = schema_name(group, &version.name, &list_kind);
        let list_ref = component_ref(&list_name);

        let mut doc = OpenApiDocument::new(
            format!("{} {}", crd.metadata.name, version.name),
            version.name.clone(),
        );
        let schemas = doc.schemas_mut();
        schemas.insert(
            kind_name.clone(),
            kind_schema(root, group, &version.name, &names.kind, &api_version),
        );
        schemas.insert(
            list_name,
            list_schema(&kind_name, group, &version.name, &list_kind),
        );
        schemas.extend(meta_v1_schemas());

        let collection = if crd.spec.scope == "Cluster" {
            format!("/apis/{}/{}/{}", group, version.name, names.plural)
        } else {
            format!(
                "/apis/{}/{}/namespaces/{{namespace}}/{}",
                group, version.name, names.plural
            )
        };
        doc.paths.insert(
            collection,
            json!({
                "get": {
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": list_ref }
                                }
                            }
                        }
                    }
                }
            }),
        );

        documents.insert(version.name.clone(), doc);
    }
    Ok(documents)
}

fn gvk(group: &str, version: &str, kind: &str) -> serde_json::Value {
    json!([{ "group": group, "kind": kind, "version": version }])
}

fn kind_schema(root: &Schema, group: &str, version: &str, kind: &str, api_version: &str) -> Schema {
    let mut schema = root.clone();
    if schema.schema_type.is_none() {
        schema.schema_type = Some("object".to_string());
    }

    let mut api_version_prop = schema
        .properties
        .remove("apiVersion")
        .unwrap_or_else(|| Schema::typed("string"));
    api_version_prop.default = Some(json!(api_version));
    let mut kind_prop = schema
        .properties
        .remove("kind")
        .unwrap_or_else(|| Schema::typed("string"));
    kind_prop.default = Some(json!(kind));

    schema.properties.insert("apiVersion".to_string(), api_version_prop);
    schema.properties.insert("kind".to_string(), kind_prop);
    schema.properties.insert(
        "metadata".to_string(),
        Schema::all_of_ref(&meta_name("ObjectMeta"))
            .with_description("Standard object's metadata."),
    );
    schema.set_extension(GVK_EXTENSION, gvk(group, version, kind));
    schema
}

fn list_schema(kind_name: &str, group: &str, version: &str, list_kind: &str) -> Schema {
    let mut schema = Schema::typed("object")
        .with_description(&format!("{} is a list of {}", list_kind, kind_name))
        .with_property("apiVersion", Schema::typed("string"))
        .with_property("kind", Schema::typed("string"))
        .with_property(
            "items",
            Schema::typed("array").with_items(Schema::reference(kind_name)),
        )
        .with_property("metadata", Schema::all_of_ref(&meta_name("ListMeta")));
    schema.required = vec!["items".to_string()];
    schema.set_extension(GVK_EXTENSION, gvk(group, version, list_kind));
    schema
}
