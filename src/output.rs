//! Writing generated artifacts to disk
//!
//! `generate` owns its output directory: the full artifact set is written to
//! a staging directory next to it and swapped in with renames, so readers see
//! either the previous set or the new one and units of removed pods disappear.

use crate::error::{PodwrightError, Result};
use crate::generate::Generation;
use crate::unit::render_unit;
use std::fs;
use std::path::Path;

/// File the firewall rule set is written to
pub const FIREWALL_FILE: &str = "firewall.json";

/// How unit descriptors are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnitFormat {
    /// systemd unit files
    #[default]
    Unit,
    /// Descriptor JSON
    Json,
}

/// One generated file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub content: String,
}

/// Unit files of a generation, in pod name order
pub fn unit_artifacts(generation: &Generation, format: UnitFormat) -> Result<Vec<Artifact>> {
    generation
        .units
        .iter()
        .map(|unit| -> Result<Artifact> {
            Ok(match format {
                UnitFormat::Unit => Artifact {
                    file_name: unit.unit_file_name(),
                    content: render_unit(unit),
                },
                UnitFormat::Json => Artifact {
                    file_name: format!("{}.json", unit.service_name),
                    content: serde_json::to_string_pretty(unit)? + "\n",
                },
            })
        })
        .collect()
}

/// The firewall rule set as a JSON file
pub fn firewall_artifact(generation: &Generation) -> Result<Artifact> {
    Ok(Artifact {
        file_name: FIREWALL_FILE.to_string(),
        content: serde_json::to_string_pretty(&generation.firewall)? + "\n",
    })
}

/// Every artifact `generate` produces
pub fn all_artifacts(generation: &Generation) -> Result<Vec<Artifact>> {
    let mut artifacts = unit_artifacts(generation, UnitFormat::Unit)?;
    artifacts.push(firewall_artifact(generation)?);
    Ok(artifacts)
}

/// Write artifacts into a directory, leaving other files alone
pub fn write_into(dir: &Path, artifacts: &[Artifact]) -> Result<()> {
    fs::create_dir_all(dir)?;
    for artifact in artifacts {
        let path = dir.join(&artifact.file_name);
        fs::write(&path, &artifact.content)?;
        tracing::debug!("Wrote {}", path.display());
    }
    Ok(())
}

/// Replace a directory's contents with exactly these artifacts
pub fn replace_dir(dir: &Path, artifacts: &[Artifact]) -> Result<()> {
    let parent = match dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".podwright-")
        .tempdir_in(parent)?;
    write_into(staging.path(), artifacts)?;

    if !dir.exists() {
        fs::rename(staging.path(), dir)?;
        tracing::info!("Wrote {} files to {}", artifacts.len(), dir.display());
        return Ok(());
    }

    if !dir.is_dir() {
        return Err(PodwrightError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a directory", dir.display()),
        )));
    }

    // The previous set is moved onto an empty placeholder and removed when
    // `retired` drops.
    let retired = tempfile::Builder::new()
        .prefix(".podwright-old-")
        .tempdir_in(parent)?;
    fs::rename(dir, retired.path())?;
    if let Err(e) = fs::rename(staging.path(), dir) {
        fs::rename(retired.path(), dir)?;
        return Err(e.into());
    }

    tracing::info!("Replaced {} with {} files", dir.display(), artifacts.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::run_pods;
    use crate::pod::RawPod;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn generation(names: &[&str]) -> Generation {
        let pods: BTreeMap<String, RawPod> = names
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    RawPod::new(&format!("/srv/{}", name)).forward("tcp", 8080, 80),
                )
            })
            .collect();
        run_pods(&pods, "podman-compose").unwrap()
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_all_artifacts_include_firewall() {
        let artifacts = all_artifacts(&generation(&["web"])).unwrap();
        let names: Vec<&str> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(names, vec!["pod-web.service", "firewall.json"]);
        assert!(artifacts[1].content.contains("\"allowedTCPPorts\""));
    }

    #[test]
    fn test_json_unit_artifacts() {
        let artifacts = unit_artifacts(&generation(&["web"]), UnitFormat::Json).unwrap();
        assert_eq!(artifacts[0].file_name, "pod-web.json");
        assert!(artifacts[0].content.ends_with("}\n"));
    }

    #[test]
    fn test_replace_dir_creates_output() {
        let root = TempDir::new().unwrap();
        let out = root.path().join("out");

        replace_dir(&out, &all_artifacts(&generation(&["db", "web"])).unwrap()).unwrap();
        assert_eq!(
            file_names(&out),
            vec!["firewall.json", "pod-db.service", "pod-web.service"]
        );
    }

    #[test]
    fn test_replace_dir_removes_stale_units() {
        let root = TempDir::new().unwrap();
        let out = root.path().join("out");

        replace_dir(&out, &all_artifacts(&generation(&["db", "web"])).unwrap()).unwrap();
        replace_dir(&out, &all_artifacts(&generation(&["web"])).unwrap()).unwrap();

        assert_eq!(file_names(&out), vec!["firewall.json", "pod-web.service"]);
        // No staging or retired directories are left beside the output.
        assert_eq!(file_names(root.path()), vec!["out"]);
    }

    #[test]
    fn test_replace_dir_rejects_file() {
        let root = TempDir::new().unwrap();
        let out = root.path().join("out");
        fs::write(&out, "not a directory").unwrap();

        assert!(replace_dir(&out, &all_artifacts(&generation(&["web"])).unwrap()).is_err());
        assert_eq!(fs::read_to_string(&out).unwrap(), "not a directory");
        assert_eq!(file_names(root.path()), vec!["out"]);
    }

    #[test]
    fn test_write_into_keeps_other_files() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("notes.txt"), "keep").unwrap();

        let artifacts = unit_artifacts(&generation(&["web"]), UnitFormat::Unit).unwrap();
        write_into(root.path(), &artifacts).unwrap();
        assert_eq!(file_names(root.path()), vec!["notes.txt", "pod-web.service"]);
    }
}
