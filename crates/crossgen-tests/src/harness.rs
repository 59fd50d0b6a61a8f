//! Test harness utilities: stand-ins for the generator images and gates for
//! tests that need a Docker daemon.

use crossgen_runner::{SandboxRequest, StubRunner};
use crossgen_spec::versions::is_known_api_version;
use crossgen_spec::CustomResourceDefinition;
use crossgen_vfs::{path, FileSystem};

/// Check if Docker tests should run based on environment variable.
pub fn should_run_docker_tests() -> bool {
    std::env::var("CROSSGEN_RUN_DOCKER_TESTS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Check if the docker executable is on PATH.
pub fn is_docker_available() -> bool {
    which::which("docker").is_ok()
}

/// A runner standing in for both generator images, picked by image name.
pub fn fake_generators() -> StubRunner {
    StubRunner::new(|fs, request| {
        if is_kcl(request) {
            fake_kcl_import(fs)
        } else {
            fake_python_codegen(fs)
        }
    })
}

/// A runner that writes `output` as the rendered `test.yaml`.
pub fn rendering_runner(output: &'static str) -> StubRunner {
    StubRunner::new(move |fs, _| {
        fs.write("test.yaml", output.as_bytes())?;
        Ok(())
    })
}

fn is_kcl(request: &SandboxRequest) -> bool {
    request.image.contains("kcl")
}

fn staged_documents(fs: &dyn FileSystem) -> Vec<String> {
    fs.paths()
        .into_iter()
        .filter(|p| p.ends_with(".yaml"))
        .collect()
}

/// Writes what `kcl import -m crd` writes: one file per CRD version named
/// `<group>_<version>_<kind>.k` plus the shared `k8s` tree.
fn fake_kcl_import(fs: &mut dyn FileSystem) -> crossgen_runner::RunnerResult<()> {
    for file in staged_documents(fs) {
        let bytes = fs.read(&file)?.to_vec();
        let Ok(crd) = serde_yaml::from_slice::<CustomResourceDefinition>(&bytes) else {
            continue;
        };
        let group = crd.spec.group.replace(['.', '-'], "_");
        let kind = crd.spec.names.kind.to_lowercase();
        for version in &crd.spec.versions {
            let out = format!(
                "models/{v}/{}_{v}_{}.k",
                group,
                kind,
                v = version.name
            );
            fs.write(&out, format!("schema {}:\n", crd.spec.names.kind).as_bytes())?;
        }
    }
    fs.write("models/kcl.mod", b"[package]\nname = \"models\"\n")?;
    fs.write(
        "models/k8s/apimachinery/pkg/apis/meta/v1/object_meta.k",
        b"schema ObjectMeta:\n    managedFields?: [ManagedFieldsEntry]\n",
    )?;
    fs.write(
        "models/k8s/apimachinery/pkg/apis/meta/v1/managed_fields_entry.k",
        b"schema ManagedFieldsEntry:\n",
    )?;
    Ok(())
}

/// Writes what `datamodel-codegen` writes: one package per staged document
/// `<group>_<version>_<kind>.yaml`, each with its own Kubernetes models.
fn fake_python_codegen(fs: &mut dyn FileSystem) -> crossgen_runner::RunnerResult<()> {
    for file in staged_documents(fs) {
        let stem = path::file_name(&file).trim_end_matches(".yaml").to_string();
        let parts: Vec<&str> = stem.split('_').collect();
        let Some(version) = parts.iter().position(|part| is_known_api_version(part)) else {
            continue;
        };
        let mut group: Vec<&str> = parts[..version].to_vec();
        group.reverse();

        let package = format!("generated/{}", stem);
        fs.write(
            &format!("{}/io/k8s/apimachinery/pkg/apis/meta/v1.py", package),
            b"class ObjectMeta: ...\n",
        )?;
        let depth = ".".repeat(group.len() + 1);
        fs.write(
            &format!("{}/{}/{}.py", package, group.join("/"), parts[version]),
            format!("from {}io.k8s.apimachinery.pkg.apis.meta import v1\n", depth).as_bytes(),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossgen_vfs::VirtualFileTree;

    #[test]
    fn test_fake_kcl_import_names_files_like_the_importer() {
        let mut fs = VirtualFileTree::from_files([(
            "widget.yaml",
            crate::fixtures::WIDGET_CRD,
        )])
        .unwrap();
        fake_kcl_import(&mut fs).unwrap();
        assert!(fs.is_file("models/v1/platform_example_com_v1_widget.k"));
        assert!(fs.is_file("models/kcl.mod"));
    }

    #[test]
    fn test_fake_python_codegen_skips_unversioned_names() {
        let mut fs = VirtualFileTree::from_files([("notes.yaml", "a: 1\n")]).unwrap();
        fake_python_codegen(&mut fs).unwrap();
        assert_eq!(fs.paths(), vec!["notes.yaml"]);
    }
}
