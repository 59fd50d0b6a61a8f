//! OpenAPI v3 document model.
//!
//! The model covers the structural-schema subset produced by CRDs and keeps
//! every other keyword (validation limits, `x-kubernetes-*` and generator
//! extensions) in a flattened map so documents survive a round trip.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of component references inside a document.
pub const COMPONENT_REF_PREFIX: &str = "#/components/schemas/";

/// Name prefix shared by every Kubernetes `meta/v1` schema.
pub const META_V1_PREFIX: &str = "io.k8s.apimachinery.pkg.apis.meta.v1";

/// Builds a component reference for `name`.
pub fn component_ref(name: &str) -> String {
    format!("{}{}", COMPONENT_REF_PREFIX, name)
}

/// Returns the component name a reference points at, if it is local.
pub fn ref_target(reference: &str) -> Option<&str> {
    reference.strip_prefix(COMPONENT_REF_PREFIX)
}

/// Returns true if `name` belongs to the shared `meta/v1` vocabulary.
pub fn is_meta_v1(name: &str) -> bool {
    name.contains(META_V1_PREFIX)
}

/// `additionalProperties` is either a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<Schema>),
}

/// An OpenAPI v3 schema object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Every other keyword, including vendor extensions.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl Schema {
    /// Creates a schema of the given `type`.
    pub fn typed(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Default::default()
        }
    }

    /// Creates a `$ref` schema pointing at a component.
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(component_ref(name)),
            ..Default::default()
        }
    }

    /// Creates a schema that wraps a component reference in `allOf`.
    ///
    /// This is how Kubernetes publishes `metadata` so that a description can
    /// sit next to the reference.
    pub fn all_of_ref(name: &str) -> Self {
        Self {
            all_of: vec![Self::reference(name)],
            ..Default::default()
        }
    }

    /// Builder: sets the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Builder: sets the format.
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Builder: adds a property.
    pub fn with_property(mut self, name: &str, schema: Schema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self
    }

    /// Builder: sets the item schema.
    pub fn with_items(mut self, items: Schema) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    /// Builder: sets `additionalProperties` to a schema.
    pub fn with_additional(mut self, schema: Schema) -> Self {
        self.additional_properties = Some(AdditionalProperties::Schema(Box::new(schema)));
        self
    }

    /// Returns true if `type` equals `t`.
    pub fn is_type(&self, t: &str) -> bool {
        self.schema_type.as_deref() == Some(t)
    }

    /// Reads a vendor extension.
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    /// Reads a string vendor extension.
    pub fn extension_str(&self, key: &str) -> Option<&str> {
        self.extensions.get(key).and_then(Value::as_str)
    }

    /// Reads a boolean vendor extension, treating absence as false.
    pub fn extension_flag(&self, key: &str) -> bool {
        self.extensions
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Sets a vendor extension.
    pub fn set_extension(&mut self, key: &str, value: impl Into<Value>) {
        self.extensions.insert(key.to_string(), value.into());
    }

    /// Visits this schema and every nested schema depth first.
    ///
    /// Nested schemas are reached through `properties`, `items`,
    /// `additionalProperties`, `allOf`, `anyOf`, `oneOf`, and `not`.
    pub fn visit_mut(&mut self, f: &mut dyn FnMut(&mut Schema)) {
        f(self);
        for child in self.properties.values_mut() {
            child.visit_mut(f);
        }
        if let Some(items) = self.items.as_deref_mut() {
            items.visit_mut(f);
        }
        if let Some(AdditionalProperties::Schema(extra)) = self.additional_properties.as_mut() {
            extra.visit_mut(f);
        }
        for child in self
            .all_of
            .iter_mut()
            .chain(self.any_of.iter_mut())
            .chain(self.one_of.iter_mut())
        {
            child.visit_mut(f);
        }
        if let Some(not) = self.not.as_deref_mut() {
            not.visit_mut(f);
        }
    }

    /// Collects the component names referenced anywhere in this schema.
    pub fn referenced_components(&self) -> Vec<String> {
        let mut clone = self.clone();
        let mut found = Vec::new();
        clone.visit_mut(&mut |schema| {
            if let Some(target) = schema.reference.as_deref().and_then(ref_target) {
                if !found.iter().any(|f: &String| f == target) {
                    found.push(target.to_string());
                }
            }
        });
        found
    }
}

/// `info` block of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
}

/// `components` block of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: BTreeMap<String, Schema>,
}

/// An OpenAPI v3 document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(default)]
    pub paths: BTreeMap<String, Value>,
    #[serde(default)]
    pub components: Components,
}

impl OpenApiDocument {
    /// Creates an empty document with the given title and version.
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            openapi: "3.0.0".to_string(),
            info: Info {
                title: title.into(),
                version: version.into(),
            },
            paths: BTreeMap::new(),
            components: Components::default(),
        }
    }

    /// Returns the component schemas.
    pub fn schemas(&self) -> &BTreeMap<String, Schema> {
        &self.components.schemas
    }

    /// Returns the component schemas mutably.
    pub fn schemas_mut(&mut self) -> &mut BTreeMap<String, Schema> {
        &mut self.components.schemas
    }

    /// Visits every component schema (and everything nested in it).
    pub fn visit_schemas_mut(&mut self, f: &mut dyn FnMut(&mut Schema)) {
        for schema in self.components.schemas.values_mut() {
            schema.visit_mut(f);
        }
    }

    /// Renames a component and rewrites every reference to it.
    pub fn rename_component(&mut self, from: &str, to: &str) {
        if let Some(schema) = self.components.schemas.remove(from) {
            self.components.schemas.insert(to.to_string(), schema);
        }
        let old_ref = component_ref(from);
        let new_ref = component_ref(to);
        self.visit_schemas_mut(&mut |schema| {
            if schema.reference.as_deref() == Some(old_ref.as_str()) {
                schema.reference = Some(new_ref.clone());
            }
        });
    }

    /// Serializes the document as YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
