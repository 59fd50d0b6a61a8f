//! The Kubernetes `meta/v1` schemas every CRD document references.

use std::collections::BTreeMap;

use crate::openapi::{Schema, META_V1_PREFIX};

/// Returns the full component name of a `meta/v1` type.
pub fn meta_name(type_name: &str) -> String {
    format!("{}.{}", META_V1_PREFIX, type_name)
}

fn string(description: &str) -> Schema {
    Schema::typed("string").with_description(description)
}

fn int64(description: &str) -> Schema {
    Schema::typed("integer")
        .with_format("int64")
        .with_description(description)
}

fn string_map(description: &str) -> Schema {
    Schema::typed("object")
        .with_additional(Schema::typed("string"))
        .with_description(description)
}

fn string_list(description: &str) -> Schema {
    Schema::typed("array")
        .with_items(Schema::typed("string"))
        .with_description(description)
}

fn time_ref(description: &str) -> Schema {
    Schema::all_of_ref(&meta_name("Time")).with_description(description)
}

fn object_meta() -> Schema {
    Schema::typed("object")
        .with_description("ObjectMeta is metadata that all persisted resources must have.")
        .with_property(
            "annotations",
            string_map("Unstructured key value map stored with a resource."),
        )
        .with_property("creationTimestamp", time_ref("Timestamp of when this object was created."))
        .with_property(
            "deletionGracePeriodSeconds",
            int64("Seconds allowed for graceful termination."),
        )
        .with_property(
            "deletionTimestamp",
            time_ref("Timestamp at which this resource will be deleted."),
        )
        .with_property(
            "finalizers",
            string_list("Must be empty before the object is deleted from the registry."),
        )
        .with_property("generateName", string("Optional prefix used to generate a unique name."))
        .with_property(
            "generation",
            int64("A sequence number representing a specific generation of the desired state."),
        )
        .with_property(
            "labels",
            string_map("Map of string keys and values used to organize and categorize objects."),
        )
        .with_property(
            "managedFields",
            Schema::typed("array")
                .with_items(Schema::reference(&meta_name("ManagedFieldsEntry")))
                .with_description("Maps workflow-id and version to the set of fields managed by that workflow."),
        )
        .with_property("name", string("Name must be unique within a namespace."))
        .with_property(
            "namespace",
            string("Namespace defines the space within which each name must be unique."),
        )
        .with_property(
            "ownerReferences",
            Schema::typed("array")
                .with_items(Schema::reference(&meta_name("OwnerReference")))
                .with_description("List of objects depended by this object."),
        )
        .with_property(
            "resourceVersion",
            string("Opaque value that represents the internal version of this object."),
        )
        .with_property("uid", string("Unique in time and space value for this object."))
}

fn managed_fields_entry() -> Schema {
    Schema::typed("object")
        .with_description("ManagedFieldsEntry is a workflow-id, a FieldSet and the group version of the resource that the fieldset applies to.")
        .with_property(
            "apiVersion",
            string("Version of the resource that this field set applies to."),
        )
        .with_property(
            "fieldsType",
            string("Discriminator for the different fields format and version."),
        )
        .with_property(
            "fieldsV1",
            Schema::all_of_ref(&meta_name("FieldsV1"))
                .with_description("The first JSON version format."),
        )
        .with_property("manager", string("Identifier of the workflow managing these fields."))
        .with_property(
            "operation",
            string("Type of operation which lead to this entry being created."),
        )
        .with_property("subresource", string("Name of the subresource used to update that object."))
        .with_property(
            "time",
            time_ref("Timestamp of when the managed field set entry was last changed."),
        )
}

fn owner_reference() -> Schema {
    let mut schema = Schema::typed("object")
        .with_description("OwnerReference contains enough information to let you identify an owning object.")
        .with_property("apiVersion", string("API version of the referent."))
        .with_property(
            "blockOwnerDeletion",
            Schema::typed("boolean")
                .with_description("Block deletion of the owner until this reference is removed."),
        )
        .with_property(
            "controller",
            Schema::typed("boolean")
                .with_description("If true, this reference points to the managing controller."),
        )
        .with_property("kind", string("Kind of the referent."))
        .with_property("name", string("Name of the referent."))
        .with_property("uid", string("UID of the referent."));
    schema.required = ["apiVersion", "kind", "name", "uid"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    schema
}

fn list_meta() -> Schema {
    Schema::typed("object")
        .with_description("ListMeta describes metadata that synthetic resources must have.")
        .with_property(
            "continue",
            string("Set if the user should set a limit on the number of items returned."),
        )
        .with_property("remainingItemCount", int64("Number of subsequent items in the list."))
        .with_property(
            "resourceVersion",
            string("Identifies the server's internal version of this object."),
        )
}

/// Returns every `meta/v1` schema keyed by full component name.
pub fn meta_v1_schemas() -> BTreeMap<String, Schema> {
    BTreeMap::from([
        (meta_name("ObjectMeta"), object_meta()),
        (meta_name("ListMeta"), list_meta()),
        (meta_name("ManagedFieldsEntry"), managed_fields_entry()),
        (meta_name("OwnerReference"), owner_reference()),
        (
            meta_name("Time"),
            Schema::typed("string")
                .with_format("date-time")
                .with_description("Time is a wrapper around time.Time which supports correct marshaling to YAML and JSON."),
        ),
        (
            meta_name("FieldsV1"),
            Schema::typed("object")
                .with_description("FieldsV1 stores a set of fields in a data structure like a Trie, in JSON format."),
        ),
    ])
}
