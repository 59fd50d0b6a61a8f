//! crossgen JSON Schema backend
//!
//! Writes one JSON Schema file per OpenAPI component for editors (for example
//! the YAML language server). Files are flat under `models/`, named after the
//! component with dots replaced by dashes, so references stay simple:
//! `#/components/schemas/platform.example.com.v1.Widget` becomes
//! `platform-example-com-v1-Widget.schema.json`.
//!
//! Objects that do not say otherwise get `additionalProperties: false` so that
//! editors flag misspelled fields. Objects marked
//! `x-kubernetes-preserve-unknown-fields` are left open.

use std::collections::BTreeMap;

use crossgen_spec::collect::collect_openapis;
use crossgen_spec::openapi::{ref_target, AdditionalProperties, Schema};
use crossgen_vfs::{FileSystem, VirtualFileTree};
use serde_json::Value;

pub mod error;

pub use error::{JsonError, JsonResult};

const PRESERVE_UNKNOWN_FIELDS: &str = "x-kubernetes-preserve-unknown-fields";

/// Generates JSON Schemas for every definition in `fs`.
///
/// Returns `None` when the tree holds no CRDs or XRDs.
pub fn generate(fs: &dyn FileSystem, exclude: &[String]) -> JsonResult<Option<VirtualFileTree>> {
    let specs = collect_openapis(fs, exclude)?;
    if specs.is_empty() {
        tracing::debug!("no definitions found, skipping JSON Schema generation");
        return Ok(None);
    }

    let mut schemas: BTreeMap<String, Schema> = BTreeMap::new();
    for spec in specs {
        schemas.extend(spec.document.components.schemas);
    }

    let mut out = VirtualFileTree::new();
    for (name, schema) in &schemas {
        let converted = to_json_schema(schema).map_err(|source| JsonError::Convert {
            schema: name.clone(),
            source,
        })?;
        let bytes = serde_json::to_vec_pretty(&converted).map_err(|source| JsonError::Convert {
            schema: name.clone(),
            source,
        })?;
        out.write(&schema_file(name), &bytes)?;
    }

    tracing::info!(files = out.len(), "generated JSON Schemas");
    Ok(Some(out))
}

/// Path of the schema file for a component.
pub fn schema_file(name: &str) -> String {
    format!("models/{}", file_name(name))
}

fn file_name(name: &str) -> String {
    format!("{}.schema.json", name.replace('.', "-"))
}

/// Converts an OpenAPI schema into a standalone JSON Schema value.
pub fn to_json_schema(schema: &Schema) -> Result<Value, serde_json::Error> {
    let mut schema = schema.clone();
    schema.visit_mut(&mut |node| {
        close_object(node);
        relink(node);
    });
    serde_json::to_value(&schema)
}

fn close_object(schema: &mut Schema) {
    if schema.is_type("object")
        && !schema.extension_flag(PRESERVE_UNKNOWN_FIELDS)
        && schema.additional_properties.is_none()
    {
        schema.additional_properties = Some(AdditionalProperties::Bool(false));
    }
}

/// Points a component reference at the sibling schema file.
fn relink(schema: &mut Schema) {
    let Some(reference) = schema.reference.as_mut() else {
        return;
    };
    if let Some(file) = ref_target(reference).map(file_name) {
        *reference = file;
    }
}
