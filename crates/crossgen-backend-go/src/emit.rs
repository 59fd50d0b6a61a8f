//! Go source emission.
//!
//! Every component becomes a named Go type. Objects with properties become
//! structs, string enums become typed string constants, and everything else
//! becomes an alias. Nested objects are hoisted to their own structs named by
//! their `x-go-type-name`. Types are written in name order.
//!
//! Components claim their names first. A nested type, struct field, or enum
//! constant whose name is already taken gets the first free numeric suffix.

use std::collections::{BTreeMap, BTreeSet};

use crossgen_spec::openapi::{ref_target, AdditionalProperties, OpenApiDocument, Schema};

use crate::error::{GoError, GoResult};
use crate::mutate::{GO_TYPE, GO_TYPE_IMPORT, GO_TYPE_NAME};
use crate::naming::{fix_name, type_name, unique_name};

const PRESERVE_UNKNOWN_FIELDS: &str = "x-kubernetes-preserve-unknown-fields";
const INT_OR_STRING: &str = "x-kubernetes-int-or-string";
const ANY: &str = "interface{}";

/// Renders `doc` as a Go file in package `package`.
pub fn emit(doc: &OpenApiDocument, package: &str) -> GoResult<String> {
    let mut emitter = Emitter {
        component: String::new(),
        components: BTreeMap::new(),
        imports: BTreeMap::new(),
        types: BTreeMap::new(),
    };
    for (name, schema) in doc.schemas() {
        let base = schema
            .extension_str(GO_TYPE_NAME)
            .map(str::to_string)
            .unwrap_or_else(|| fix_name(name));
        let go_name = unique_name(&base, |c| emitter.components.values().any(|n| n == c));
        emitter.components.insert(name.clone(), go_name);
    }
    for (name, schema) in doc.schemas() {
        emitter.component = name.clone();
        let go_name = emitter.resolve_component(name)?;
        emitter.define(&go_name, schema, Some(name))?;
    }
    Ok(emitter.render(package, &doc.info.title))
}

struct Emitter {
    /// Component being emitted, for error context.
    component: String,
    /// Component name to its Go type name.
    components: BTreeMap<String, String>,
    /// Import path to optional alias.
    imports: BTreeMap<String, Option<String>>,
    /// Go type name to its declaration.
    types: BTreeMap<String, String>,
}

impl Emitter {
    fn error(&self, message: impl Into<String>) -> GoError {
        GoError::codegen(&self.component, message)
    }

    fn define(&mut self, name: &str, schema: &Schema, component: Option<&str>) -> GoResult<()> {
        if self.types.contains_key(name) {
            return Err(self.error(format!("duplicate type name {}", name)));
        }
        self.types.insert(name.to_string(), String::new());

        let mut decl = String::new();
        let summary = match component {
            Some(component) => format!("defines model for {}.", component),
            None => String::new(),
        };
        write_comment(&mut decl, "", name, schema.description.as_deref().unwrap_or(&summary));

        if is_struct(schema) {
            decl.push_str(&format!("type {} struct {{\n", name));
            let mut fields = BTreeSet::new();
            for (prop, child) in &schema.properties {
                let mut base = type_name(prop);
                if base.is_empty() {
                    base = "Field".to_string();
                }
                let field = unique_name(&base, |c| fields.contains(c));
                fields.insert(field.clone());
                let hint = fix_name(&format!("{}{}", name, field));
                let go_type = self.go_type(child, &hint)?;
                let required = schema.required.iter().any(|r| r == prop);
                let (go_type, tag) = if required {
                    (go_type, format!("json:\"{}\"", prop))
                } else {
                    (optional(go_type), format!("json:\"{},omitempty\"", prop))
                };
                if let Some(description) = child.description.as_deref() {
                    write_comment(&mut decl, "\t", &field, description);
                }
                decl.push_str(&format!("\t{} {} `{}`\n", field, go_type, tag));
            }
            decl.push_str("}\n");
        } else if is_string_enum(schema) {
            decl.push_str(&format!("type {} string\n\n", name));
            decl.push_str(&format!("// Defines values for {}.\nconst (\n", name));
            let mut constants = BTreeSet::new();
            for value in schema.enum_values.iter().filter_map(|v| v.as_str()) {
                let suffix = if value.is_empty() { "Empty".to_string() } else { type_name(value) };
                let constant = unique_name(&format!("{}{}", name, suffix), |c| {
                    constants.contains(c)
                });
                constants.insert(constant.clone());
                let literal = serde_json::to_string(value).map_err(|e| self.error(e.to_string()))?;
                decl.push_str(&format!("\t{} {} = {}\n", constant, name, literal));
            }
            decl.push_str(")\n");
        } else {
            let target = self.alias_type(schema, name)?;
            decl.push_str(&format!("type {} = {}\n", name, target));
        }

        self.types.insert(name.to_string(), decl);
        Ok(())
    }

    /// Go type of a schema that is not itself a struct or enum.
    fn alias_type(&mut self, schema: &Schema, name: &str) -> GoResult<String> {
        if let Some(go_type) = self.overridden(schema) {
            return Ok(go_type);
        }
        let mut plain = schema.clone();
        plain.extensions.remove(GO_TYPE_NAME);
        self.go_type(&plain, &format!("{}Value", name))
    }

    fn overridden(&mut self, schema: &Schema) -> Option<String> {
        let go_type = schema.extension_str(GO_TYPE)?.to_string();
        if let Some(import) = schema.extension(GO_TYPE_IMPORT) {
            if let Some(path) = import.get("path").and_then(|p| p.as_str()) {
                let alias = import.get("name").and_then(|n| n.as_str()).map(str::to_string);
                self.imports.insert(path.to_string(), alias);
            }
        }
        Some(go_type)
    }

    fn resolve_ref(&self, reference: &str) -> GoResult<String> {
        let target = ref_target(reference)
            .ok_or_else(|| self.error(format!("unsupported reference {}", reference)))?;
        self.resolve_component(target)
            .map_err(|_| self.error(format!("unresolved reference {}", reference)))
    }

    fn resolve_component(&self, component: &str) -> GoResult<String> {
        self.components
            .get(component)
            .cloned()
            .ok_or_else(|| self.error(format!("unknown component {}", component)))
    }

    /// Name for a hoisted type that collides with no component or defined type.
    fn unique_type(&self, base: &str) -> String {
        unique_name(base, |c| {
            self.types.contains_key(c) || self.components.values().any(|n| n == c)
        })
    }

    fn go_type(&mut self, schema: &Schema, hint: &str) -> GoResult<String> {
        if let Some(go_type) = self.overridden(schema) {
            return Ok(go_type);
        }
        if let Some(reference) = schema.reference.as_deref() {
            return self.resolve_ref(reference);
        }
        if schema.all_of.len() == 1 && schema.properties.is_empty() {
            return self.go_type(&schema.all_of[0], hint);
        }
        if schema.extension_flag(INT_OR_STRING) {
            return Ok(ANY.to_string());
        }

        let named = || {
            schema
                .extension_str(GO_TYPE_NAME)
                .map(str::to_string)
                .unwrap_or_else(|| hint.to_string())
        };

        match schema.schema_type.as_deref() {
            Some("string") => match schema.format.as_deref() {
                Some("date-time") => {
                    self.imports.insert("time".to_string(), None);
                    Ok("time.Time".to_string())
                }
                Some("byte") => Ok("[]byte".to_string()),
                _ if is_string_enum(schema) => {
                    let name = self.unique_type(&named());
                    self.define(&name, schema, None)?;
                    Ok(name)
                }
                _ => Ok("string".to_string()),
            },
            Some("integer") => Ok(match schema.format.as_deref() {
                Some("int32") => "int32",
                _ => "int64",
            }
            .to_string()),
            Some("number") => Ok(match schema.format.as_deref() {
                Some("float") => "float32",
                _ => "float64",
            }
            .to_string()),
            Some("boolean") => Ok("bool".to_string()),
            Some("array") => match schema.items.as_deref() {
                Some(items) => Ok(format!("[]{}", self.go_type(items, hint)?)),
                None => Ok(format!("[]{}", ANY)),
            },
            Some("object") | None if is_struct(schema) => {
                let name = self.unique_type(&named());
                self.define(&name, schema, None)?;
                Ok(name)
            }
            Some("object") => {
                if schema.extension_flag(PRESERVE_UNKNOWN_FIELDS) {
                    return Ok(format!("map[string]{}", ANY));
                }
                match schema.additional_properties.as_ref() {
                    Some(AdditionalProperties::Schema(values)) => {
                        let value = self.go_type(values, &format!("{}Value", hint))?;
                        Ok(format!("map[string]{}", value))
                    }
                    _ => Ok(format!("map[string]{}", ANY)),
                }
            }
            None => Ok(ANY.to_string()),
            Some(other) => Err(self.error(format!("unsupported type {:?}", other))),
        }
    }

    fn render(&self, package: &str, title: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "// Package {} contains models generated from {}.\n",
            package, title
        ));
        out.push_str("//\n// Code generated by crossgen. DO NOT EDIT.\n");
        out.push_str(&format!("package {}\n", package));

        if !self.imports.is_empty() {
            let (std, external): (Vec<_>, Vec<_>) = self
                .imports
                .iter()
                .partition(|(path, _)| !path.split('/').next().unwrap_or_default().contains('.'));
            out.push_str("\nimport (\n");
            let groups: Vec<_> = [std, external].into_iter().filter(|g| !g.is_empty()).collect();
            for (index, group) in groups.iter().enumerate() {
                if index > 0 {
                    out.push('\n');
                }
                for (path, alias) in group {
                    match alias {
                        Some(alias) => out.push_str(&format!("\t{} \"{}\"\n", alias, path)),
                        None => out.push_str(&format!("\t\"{}\"\n", path)),
                    }
                }
            }
            out.push_str(")\n");
        }

        for decl in self.types.values() {
            out.push('\n');
            out.push_str(decl);
        }
        out
    }
}

fn is_struct(schema: &Schema) -> bool {
    !schema.properties.is_empty() && matches!(schema.schema_type.as_deref(), Some("object") | None)
}

fn is_string_enum(schema: &Schema) -> bool {
    schema.is_type("string")
        && schema.format.is_none()
        && schema.enum_values.iter().any(|v| v.is_string())
}

/// Pointer for scalars and structs; slices, maps, and interfaces are nilable already.
fn optional(go_type: String) -> String {
    if go_type.starts_with("[]") || go_type.starts_with("map[") || go_type == ANY {
        go_type
    } else {
        format!("*{}", go_type)
    }
}

fn write_comment(out: &mut String, indent: &str, name: &str, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    for (index, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if index == 0 {
            out.push_str(&format!("{}// {} {}\n", indent, name, line));
        } else if line.is_empty() {
            out.push_str(&format!("{}//\n", indent));
        } else {
            out.push_str(&format!("{}// {}\n", indent, line));
        }
    }
}
