//! Restructuring of the KCL importer's output.
//!
//! `kcl import` names files after the full group, version, and kind
//! (`models/v1alpha1/platform_acme_co_v1alpha1_x_bucket.k`). Kinds from
//! different groups would collide in a flat layout, so every file is moved
//! to `<reversed group>/<version>/<kind>.k`
//! (`co/acme/platform/v1alpha1/xbucket.k`).

use crossgen_spec::versions::is_known_api_version;
use crossgen_vfs::path;
use crossgen_vfs::FileSystem;

use crate::error::{KclError, KclResult};

const META_DIR: &str = "k8s/apimachinery/pkg/apis/meta/v1";
const MANAGED_FIELDS_FIELD: &str = "managedFields?: [ManagedFieldsEntry]";
const MANAGED_FIELDS_ANY: &str = "managedFields?: any";

/// Returns the restructured location of an importer file, relative to the
/// target directory.
///
/// The name is split on `_`; the first known API version (which must not be
/// the first part) splits group from kind. Returns `None` for files that do
/// not follow the pattern.
pub fn restructured_path(file_name: &str) -> Option<String> {
    let parts: Vec<&str> = file_name.split('_').collect();
    let version = parts.iter().position(|part| is_known_api_version(part))?;
    if version == 0 {
        return None;
    }

    let mut dirs: Vec<&str> = parts[..version].to_vec();
    dirs.reverse();
    dirs.push(parts[version]);

    let name = parts[version + 1..].concat().replace("swagger", "");
    if name.is_empty() {
        return None;
    }
    Some(format!("{}/{}", dirs.join("/"), name))
}

/// Moves the importer output under `source` into the layout under `target`.
///
/// `kcl.mod` and `kcl.mod.lock` are copied as they are. The shared `k8s`
/// tree is copied once after `managedFields` is loosened to `any` and
/// `managed_fields_entry.k` is dropped.
pub fn transform_structure(fs: &mut dyn FileSystem, source: &str, target: &str) -> KclResult<()> {
    for file in ["kcl.mod", "kcl.mod.lock"] {
        copy_entry(fs, &path::join(source, file), &path::join(target, file))?;
    }

    let meta_dir = path::join(source, META_DIR);
    let object_meta = path::join(&meta_dir, "object_meta.k");
    if fs.is_file(&object_meta) {
        let content = fs
            .read_to_string(&object_meta)
            .map_err(|e| KclError::restructure(&object_meta, e))?;
        let updated = content.replace(MANAGED_FIELDS_FIELD, MANAGED_FIELDS_ANY);
        fs.write(&object_meta, updated.as_bytes())
            .map_err(|e| KclError::restructure(&object_meta, e))?;
    }
    fs.remove(&path::join(&meta_dir, "managed_fields_entry.k"))?;

    let k8s = path::join(source, "k8s");
    for file in fs.files_under(&k8s)? {
        if let Some(rest) = path::strip_dir(&file, &k8s) {
            let to = path::join(&path::join(target, "k8s"), rest);
            copy_entry(fs, &file, &to)?;
        }
    }

    let mut moved = 0;
    for file in fs.files_under(source)? {
        if path::strip_dir(&file, &k8s).is_some() {
            continue;
        }
        let Some(relative) = restructured_path(path::file_name(&file)) else {
            continue;
        };
        copy_entry(fs, &file, &path::join(target, &relative))?;
        moved += 1;
    }
    tracing::debug!(files = moved, "restructured KCL schemas");
    Ok(())
}

fn copy_entry(fs: &mut dyn FileSystem, from: &str, to: &str) -> KclResult<()> {
    if let Some(entry) = fs.entry(from).cloned() {
        fs.write_entry(to, entry)
            .map_err(|e| KclError::restructure(from, e))?;
    }
    Ok(())
}
