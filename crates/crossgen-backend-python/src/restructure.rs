//! Restructuring of the model generator's output.
//!
//! The generator writes one package per input document,
//! `generated/<group>_<version>_<kind>/`, each holding its own copy of the
//! Kubernetes `io/k8s` models and a module per group version
//! (`co/acme/platform/v1alpha1.py`). Kinds of the same group version would
//! overwrite each other if merged as they are, so every module is moved into
//! a directory named after its kind (`co/acme/platform/<kind>/v1alpha1.py`)
//! and its relative imports are re-anchored at the new depth. The shared
//! `io/k8s/apimachinery` models are copied once. Groups under `k8s.io`
//! (`io/k8s/storage/snapshot/v1.py`) are kind modules like any other.

use crossgen_vfs::{path, FileSystem};

use crate::error::{PythonError, PythonResult};

const SHARED_PREFIX: &str = "io/k8s/apimachinery/";
const INIT_FILE: &str = "__init__.py";

/// Rewrites the leading dots of a `from` import of the Kubernetes models.
///
/// `depth` is the number of dots that reaches the package root from the
/// importing module. Imports of `io.k8s` get `depth` dots; imports of `k8s`
/// (made from inside the `io` package) get one less, and imports of
/// `apimachinery` (made from inside `io.k8s`) two less. Other lines are
/// returned unchanged.
pub fn adjust_leading_dots(line: &str, depth: usize) -> String {
    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];
    let Some(target) = body.strip_prefix("from ") else {
        return line.to_string();
    };
    let module = target.trim_start_matches('.');
    let dots = if is_package(module, "io.k8s") {
        depth
    } else if is_package(module, "k8s") {
        depth.saturating_sub(1)
    } else if target.starts_with('.') && is_package(module, "apimachinery") {
        depth.saturating_sub(2)
    } else {
        return line.to_string();
    };
    format!("{}from {}{}", indent, ".".repeat(dots), module)
}

fn is_package(module: &str, package: &str) -> bool {
    module
        .strip_prefix(package)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['.', ' ']))
}

/// Applies [`adjust_leading_dots`] to every line of a module.
pub fn adjust_imports(source: &str, depth: usize) -> String {
    source
        .split('\n')
        .map(|line| adjust_leading_dots(line, depth))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns where a module of a package for `kind` belongs, relative to the
/// target directory.
///
/// A module whose directory is already named after the kind stays put.
/// Modules at the package root and package markers have no place in the
/// layout; markers are recreated for the final tree.
pub fn relocated_path(module: &str, kind: &str) -> Option<String> {
    let parent = path::parent(module);
    if parent.is_empty() || path::file_name(module) == INIT_FILE {
        return None;
    }
    if path::file_name(parent) == kind {
        return Some(module.to_string());
    }
    Some(path::join(&path::join(parent, kind), path::file_name(module)))
}

/// Number of dots that climbs from a module at `module` to the package root.
fn import_depth(module: &str) -> usize {
    let parent = path::parent(module);
    if parent.is_empty() {
        1
    } else {
        parent.split('/').count() + 1
    }
}

/// Moves the generator output under `source` into the layout under `target`
/// and adds an `__init__.py` to every package directory.
pub fn transform_structure(
    fs: &mut dyn FileSystem,
    source: &str,
    target: &str,
) -> PythonResult<()> {
    let mut moved = 0;
    for file in fs.files_under(source)? {
        let Some((package, module)) =
            path::strip_dir(&file, source).and_then(|rel| rel.split_once('/'))
        else {
            continue;
        };
        let kind = package.rsplit('_').next().unwrap_or(package);

        let (dest, depth) = if module.starts_with(SHARED_PREFIX) {
            let dest = path::join(target, module);
            if fs.is_file(&dest) {
                continue;
            }
            (dest, None)
        } else {
            let Some(relocated) = relocated_path(module, kind) else {
                tracing::trace!(path = %file, "skipping module outside the package layout");
                continue;
            };
            let depth = import_depth(&relocated);
            (path::join(target, &relocated), Some(depth))
        };

        let contents = match depth {
            Some(depth) if dest.ends_with(".py") => {
                let source = fs
                    .read_to_string(&file)
                    .map_err(|e| PythonError::restructure(&file, e))?;
                adjust_imports(&source, depth).into_bytes()
            }
            _ => fs
                .read(&file)
                .map_err(|e| PythonError::restructure(&file, e))?
                .to_vec(),
        };
        fs.write(&dest, &contents)
            .map_err(|e| PythonError::restructure(&dest, e))?;
        moved += 1;
    }

    add_init_files(fs, target)?;
    tracing::debug!(files = moved, "restructured Python models");
    Ok(())
}

fn add_init_files(fs: &mut dyn FileSystem, target: &str) -> PythonResult<()> {
    let packages: Vec<String> = fs
        .dirs()
        .into_iter()
        .filter(|dir| dir == target || path::strip_dir(dir, target).is_some())
        .collect();
    for dir in packages {
        let init = path::join(&dir, INIT_FILE);
        if !fs.is_file(&init) {
            fs.write(&init, b"")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossgen_vfs::VirtualFileTree;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_adjust_leading_dots() {
        let cases = [
            ("from io.k8s.apimachinery.pkg.apis.meta import v1", 0, "from io.k8s.apimachinery.pkg.apis.meta import v1"),
            ("from k8s.apimachinery.pkg.apis.meta import v1", 0, "from k8s.apimachinery.pkg.apis.meta import v1"),
            ("from ..io.k8s.apimachinery.pkg.apis.meta import v1", 1, "from .io.k8s.apimachinery.pkg.apis.meta import v1"),
            ("from io.k8s.apimachinery.pkg.apis.meta import v1", 3, "from ...io.k8s.apimachinery.pkg.apis.meta import v1"),
            ("from ......io.k8s.apimachinery.pkg.apis.meta import v1", 2, "from ..io.k8s.apimachinery.pkg.apis.meta import v1"),
            ("from ......k8s.apimachinery.pkg.apis.meta import v1", 2, "from .k8s.apimachinery.pkg.apis.meta import v1"),
            ("from ....k8s.apimachinery.pkg.apis.meta import v1", 6, "from .....k8s.apimachinery.pkg.apis.meta import v1"),
            ("from some.other.module import something", 3, "from some.other.module import something"),
            ("from k8sutils import thing", 3, "from k8sutils import thing"),
        ];
        for (line, depth, expected) in cases {
            assert_eq!(adjust_leading_dots(line, depth), expected, "{line} at depth {depth}");
        }
    }

    #[test]
    fn test_relocated_path() {
        assert_eq!(
            relocated_path("co/acme/platform/v1alpha1.py", "subnetwork").as_deref(),
            Some("co/acme/platform/subnetwork/v1alpha1.py")
        );
        assert_eq!(
            relocated_path("io/upbound/aws/eks/accessentry/v1beta1.py", "accessentry").as_deref(),
            Some("io/upbound/aws/eks/accessentry/v1beta1.py")
        );
        assert_eq!(relocated_path("__init__.py", "subnetwork"), None);
        assert_eq!(relocated_path("co/acme/__init__.py", "subnetwork"), None);
        assert_eq!(relocated_path("co/acme/platform/__init__.py", "subnetwork"), None);
    }

    #[test]
    fn test_adjust_imports_from_inside_io_k8s() {
        assert_eq!(
            adjust_leading_dots("from ...apimachinery.pkg.apis.meta import v1", 6),
            "from ....apimachinery.pkg.apis.meta import v1"
        );
        assert_eq!(
            adjust_leading_dots("from apimachinery import v1", 6),
            "from apimachinery import v1"
        );
    }

    #[test]
    fn test_transform_structure() {
        let meta = "io/k8s/apimachinery/pkg/apis/meta";
        let mut files = Vec::new();
        for package in [
            "platform_acme_co_v1alpha1_subnetwork",
            "platform_acme_co_v1alpha1_compositecluster",
        ] {
            files.push((
                format!("generated/{package}/{meta}/v1.py"),
                "from __future__ import annotations",
            ));
            files.push((format!("generated/{package}/{meta}/__init__.py"), ""));
            files.push((
                format!("generated/{package}/co/acme/platform/v1alpha1.py"),
                "from ....io.k8s.apimachinery.pkg.apis.meta import v1",
            ));
            files.push((format!("generated/{package}/co/acme/platform/__init__.py"), ""));
        }
        let package = "eks_aws_upbound_io_v1beta1_accessentry";
        files.push((
            format!("generated/{package}/{meta}/v1.py"),
            "from __future__ import annotations",
        ));
        files.push((
            format!("generated/{package}/io/upbound/aws/eks/accessentry/v1beta1.py"),
            "from ....k8s.apimachinery.pkg.apis.meta import v1",
        ));
        files.push((
            format!("generated/{package}/io/upbound/aws/eks/accessentry/__init__.py"),
            "",
        ));

        let mut fs = VirtualFileTree::from_files(files).unwrap();
        transform_structure(&mut fs, "generated", "sorted").unwrap();

        let expected = [
            ("sorted/io/k8s/apimachinery/pkg/apis/meta/v1.py", "from __future__ import annotations"),
            ("sorted/io/k8s/apimachinery/pkg/apis/meta/__init__.py", ""),
            ("sorted/co/acme/platform/subnetwork/v1alpha1.py", "from .....io.k8s.apimachinery.pkg.apis.meta import v1"),
            ("sorted/co/acme/platform/subnetwork/__init__.py", ""),
            ("sorted/co/acme/platform/compositecluster/v1alpha1.py", "from .....io.k8s.apimachinery.pkg.apis.meta import v1"),
            ("sorted/co/acme/platform/compositecluster/__init__.py", ""),
            ("sorted/io/upbound/aws/eks/accessentry/v1beta1.py", "from .....k8s.apimachinery.pkg.apis.meta import v1"),
            ("sorted/io/upbound/aws/eks/accessentry/__init__.py", ""),
        ];
        for (file, contents) in expected {
            assert_eq!(fs.read_to_string(file).unwrap(), contents, "{file}");
        }
        assert!(fs.is_file("sorted/__init__.py"));
        assert!(fs.is_file("sorted/co/acme/__init__.py"));
        assert!(!fs.is_file("sorted/co/acme/platform/v1alpha1.py"));
        assert!(!fs.is_file("sorted/co/acme/subnetwork/__init__.py"));
    }

    #[test]
    fn test_transform_structure_kinds_sharing_a_group_module() {
        let meta = "io/k8s/apimachinery/pkg/apis/meta";
        let mut files = Vec::new();
        let groups = [
            ("snapshot_storage_k8s_io_v1", "io/k8s/storage/snapshot/v1.py"),
            ("platform_example_com_v1", "com/example/platform/v1.py"),
        ];
        for (prefix, module) in groups {
            for kind in ["widget", "widgetclass"] {
                let package = format!("{prefix}_{kind}");
                files.push((
                    format!("generated/{package}/{meta}/v1.py"),
                    "from __future__ import annotations".to_string(),
                ));
                files.push((
                    format!("generated/{package}/{module}"),
                    format!("class {kind}: pass"),
                ));
                let init = path::join(path::parent(module), INIT_FILE);
                files.push((format!("generated/{package}/{init}"), String::new()));
            }
        }

        let mut fs = VirtualFileTree::from_files(files).unwrap();
        transform_structure(&mut fs, "generated", "sorted").unwrap();

        for dir in ["sorted/io/k8s/storage/snapshot", "sorted/com/example/platform"] {
            for kind in ["widget", "widgetclass"] {
                let module = format!("{dir}/{kind}/v1.py");
                assert_eq!(fs.read_to_string(&module).unwrap(), format!("class {kind}: pass"));
                assert!(fs.is_file(&format!("{dir}/{kind}/__init__.py")), "{dir}/{kind}");
            }
            assert!(!fs.is_file(&format!("{dir}/v1.py")), "{dir}");
        }
        assert!(fs.is_file("sorted/io/k8s/apimachinery/pkg/apis/meta/v1.py"));
    }
}
