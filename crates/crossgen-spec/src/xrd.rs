//! Derivation of CustomResourceDefinitions from a CompositeResourceDefinition.
//!
//! A composite resource definition publishes a cluster-scoped composite
//! resource (XR) and, when `claimNames` is set, a namespaced claim. Both are
//! plain CRDs whose schemas are the XRD's schema plus the machinery fields
//! Crossplane adds to every composite and claim.

use std::collections::BTreeMap;

use crate::error::{SpecError, SpecResult};
use crate::manifest::{
    CompositeResourceDefinition, CrdSpec, CrdVersion, CustomResourceDefinition, Names,
    ObjectMeta, Validation, XrdVersion, CRD_API_VERSION, CRD_KIND,
};
use crate::openapi::Schema;

/// The CRDs published by one XRD.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedCrds {
    /// The composite resource CRD.
    pub composite: CustomResourceDefinition,
    /// The claim CRD, present when the XRD offers a claim.
    pub claim: Option<CustomResourceDefinition>,
}

/// Derives the composite (and claim) CRDs for an XRD.
pub fn derive_crds(xrd: &CompositeResourceDefinition) -> SpecResult<DerivedCrds> {
    if xrd.spec.group.is_empty() || xrd.spec.names.kind.is_empty() {
        return Err(SpecError::invalid_definition(
            "CompositeResourceDefinition",
            &xrd.metadata.name,
            "spec.group and spec.names.kind are required",
        ));
    }
    // The referenceable version becomes the storage version of the derived
    // CRDs, which need exactly one.
    if xrd.referenceable_version().is_none() {
        return Err(SpecError::invalid_definition(
            "CompositeResourceDefinition",
            &xrd.metadata.name,
            "no served and referenceable version",
        ));
    }

    let composite = derive(
        xrd,
        &xrd.spec.names,
        "Cluster",
        "composite",
        composite_spec_fields(),
    );
    let claim = xrd
        .spec
        .claim_names
        .as_ref()
        .map(|names| derive(xrd, names, "Namespaced", "claim", claim_spec_fields()));

    Ok(DerivedCrds { composite, claim })
}

fn derive(
    xrd: &CompositeResourceDefinition,
    names: &Names,
    scope: &str,
    category: &str,
    spec_fields: BTreeMap<String, Schema>,
) -> CustomResourceDefinition {
    let mut names = names.clone();
    if names.list_kind.is_none() {
        names.list_kind = Some(format!("{}List", names.kind));
    }
    if !names.categories.iter().any(|c| c == category) {
        names.categories.push(category.to_string());
    }

    let versions = xrd
        .spec
        .versions
        .iter()
        .map(|version| derive_version(version, &spec_fields))
        .collect();

    CustomResourceDefinition {
        api_version: CRD_API_VERSION.to_string(),
        kind: CRD_KIND.to_string(),
        metadata: ObjectMeta {
            name: format!("{}.{}", names.plural, xrd.spec.group),
            ..Default::default()
        },
        spec: CrdSpec {
            group: xrd.spec.group.clone(),
            names,
            scope: scope.to_string(),
            versions,
        },
    }
}

fn derive_version(version: &XrdVersion, spec_fields: &BTreeMap<String, Schema>) -> CrdVersion {
    let mut schema = version
        .schema
        .as_ref()
        .and_then(|v| v.open_api_v3_schema.clone())
        .unwrap_or_else(|| Schema::typed("object"));
    if schema.schema_type.is_none() {
        schema.schema_type = Some("object".to_string());
    }

    let spec = schema
        .properties
        .entry("spec".to_string())
        .or_insert_with(|| Schema::typed("object"));
    for (name, field) in spec_fields {
        spec.properties
            .entry(name.clone())
            .or_insert_with(|| field.clone());
    }

    let status = schema
        .properties
        .entry("status".to_string())
        .or_insert_with(|| Schema::typed("object"));
    for (name, field) in status_fields() {
        status.properties.entry(name).or_insert(field);
    }

    CrdVersion {
        name: version.name.clone(),
        served: version.served,
        storage: version.referenceable,
        schema: Some(Validation {
            open_api_v3_schema: Some(schema),
        }),
        subresources: Some(serde_json::json!({ "status": {} })),
        additional_printer_columns: version.additional_printer_columns.clone(),
    }
}

fn string() -> Schema {
    Schema::typed("string")
}

fn object_ref(fields: &[&str]) -> Schema {
    let mut schema = Schema::typed("object");
    for field in fields {
        schema.properties.insert(field.to_string(), string());
    }
    schema.required = vec!["name".to_string()];
    schema
}

fn label_selector() -> Schema {
    let mut schema = Schema::typed("object").with_property(
        "matchLabels",
        Schema::typed("object").with_additional(string()),
    );
    schema.required = vec!["matchLabels".to_string()];
    schema
}

fn enum_of(values: &[&str]) -> Schema {
    let mut schema = string();
    schema.enum_values = values.iter().map(|v| serde_json::json!(v)).collect();
    schema
}

fn shared_spec_fields() -> BTreeMap<String, Schema> {
    BTreeMap::from([
        ("compositionRef".to_string(), object_ref(&["name"])),
        ("compositionSelector".to_string(), label_selector()),
        ("compositionRevisionRef".to_string(), object_ref(&["name"])),
        ("compositionRevisionSelector".to_string(), label_selector()),
        (
            "compositionUpdatePolicy".to_string(),
            enum_of(&["Automatic", "Manual"]),
        ),
    ])
}

fn composite_spec_fields() -> BTreeMap<String, Schema> {
    let mut fields = shared_spec_fields();
    fields.insert(
        "claimRef".to_string(),
        object_ref(&["apiVersion", "kind", "name", "namespace"]),
    );
    fields.insert(
        "resourceRefs".to_string(),
        Schema::typed("array").with_items(object_ref(&["apiVersion", "kind", "name"])),
    );
    fields.insert(
        "writeConnectionSecretToRef".to_string(),
        object_ref(&["name", "namespace"]),
    );
    fields
}

fn claim_spec_fields() -> BTreeMap<String, Schema> {
    let mut fields = shared_spec_fields();
    fields.insert(
        "compositeDeletePolicy".to_string(),
        enum_of(&["Background", "Foreground"]),
    );
    fields.insert(
        "resourceRef".to_string(),
        object_ref(&["apiVersion", "kind", "name"]),
    );
    fields.insert(
        "writeConnectionSecretToRef".to_string(),
        object_ref(&["name"]),
    );
    fields
}

fn status_fields() -> BTreeMap<String, Schema> {
    let condition = {
        let mut schema = Schema::typed("object")
            .with_property("type", string())
            .with_property("status", string())
            .with_property("reason", string())
            .with_property("message", string())
            .with_property(
                "lastTransitionTime",
                string().with_format("date-time"),
            );
        schema.required = vec![
            "lastTransitionTime".to_string(),
            "reason".to_string(),
            "status".to_string(),
            "type".to_string(),
        ];
        schema
    };
    BTreeMap::from([
        (
            "conditions".to_string(),
            Schema::typed("array").with_items(condition),
        ),
        (
            "connectionDetails".to_string(),
            Schema::typed("object").with_property(
                "lastPublishedTime",
                string().with_format("date-time"),
            ),
        ),
    ])
}
