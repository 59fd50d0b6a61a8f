//! Document rewrites applied before Go emission.
//!
//! The per-kind pipeline runs, in order: [`rename_types`],
//! [`replace_number_with_int`], [`remove_required`],
//! [`reference_meta_types`], [`remove_meta_schemas`], and
//! [`keep_only_components`].

use crossgen_spec::openapi::{is_meta_v1, ref_target, OpenApiDocument, Schema};
use serde_json::json;

use crate::naming::{fix_name, type_name};

/// Extension naming the Go type generated for a schema.
pub const GO_TYPE_NAME: &str = "x-go-type-name";

/// Extension overriding the Go type of a schema.
pub const GO_TYPE: &str = "x-go-type";

/// Extension naming the package an overridden type comes from.
pub const GO_TYPE_IMPORT: &str = "x-go-type-import";

/// Import path of the shared `meta/v1` package.
pub const META_IMPORT_PATH: &str = "dev.crossgen.io/models/io/k8s/meta/v1";

/// Package alias for the shared `meta/v1` package.
pub const META_IMPORT_ALIAS: &str = "metav1";

/// Names every component and every nested property schema.
///
/// A property's type is named after its parent plus the capitalized property
/// name; array items reuse the property's name.
pub fn rename_types(doc: &mut OpenApiDocument) {
    for (name, schema) in doc.schemas_mut().iter_mut() {
        let base = fix_name(name);
        schema.set_extension(GO_TYPE_NAME, base.clone());
        rename_properties(schema, &base);
    }
}

fn rename_properties(schema: &mut Schema, base: &str) {
    for (prop, child) in schema.properties.iter_mut() {
        let name = fix_name(&format!("{}{}", base, type_name(prop)));
        child.set_extension(GO_TYPE_NAME, name.clone());
        rename_properties(child, &name);
        if let Some(items) = child.items.as_deref_mut() {
            items.set_extension(GO_TYPE_NAME, name.clone());
            rename_properties(items, &name);
        }
    }
}

/// Maps every `number` to Go's `int`.
pub fn replace_number_with_int(doc: &mut OpenApiDocument) {
    doc.visit_schemas_mut(&mut |schema| {
        if schema.is_type("number") {
            schema.set_extension(GO_TYPE, "int");
        }
    });
}

/// Clears every `required` list so all generated fields are optional.
pub fn remove_required(doc: &mut OpenApiDocument) {
    doc.visit_schemas_mut(&mut |schema| schema.required.clear());
}

/// Points every `meta/v1` reference at the shared Go package.
///
/// A direct `$ref` or an `allOf` wrapping one gets an `x-go-type` of
/// `metav1.<Type>` and the matching import; the `allOf` is dropped.
pub fn reference_meta_types(doc: &mut OpenApiDocument) {
    doc.visit_schemas_mut(&mut |schema| {
        if let Some(target) = meta_target(schema) {
            schema.set_extension(GO_TYPE, format!("{}.{}", META_IMPORT_ALIAS, fix_name(&target)));
            schema.set_extension(
                GO_TYPE_IMPORT,
                json!({ "path": META_IMPORT_PATH, "name": META_IMPORT_ALIAS }),
            );
            schema.all_of.clear();
        }
    });
}

fn meta_target(schema: &Schema) -> Option<String> {
    let direct = schema.reference.as_deref();
    let wrapped = schema.all_of.iter().find_map(|s| s.reference.as_deref());
    direct
        .or(wrapped)
        .and_then(ref_target)
        .filter(|target| is_meta_v1(target))
        .map(str::to_string)
}

/// Drops the `meta/v1` components; they live in the shared package.
pub fn remove_meta_schemas(doc: &mut OpenApiDocument) {
    doc.schemas_mut().retain(|name, _| !is_meta_v1(name));
}

/// Drops everything but the component schemas.
pub fn keep_only_components(doc: &mut OpenApiDocument) {
    doc.paths.clear();
}
