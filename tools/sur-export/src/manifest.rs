//! Manifest parsing and batch builds
//!
//! Parses a `meshes.toml` such as:
//!
//! ```toml
//! [output]
//! dir = "build/meshes"
//! format = "binary"
//!
//! [meshes]
//! crate = "raw/crate.obj"
//! ship = { path = "raw/ship.obj", scale = 0.01, forward = "-Z", up = "Y" }
//!
//! [merged.level]
//! sources = ["raw/floor.obj", "raw/walls.sur"]
//! facet_normals = true
//! ```
//!
//! Every entry becomes one `<name>.sur` in the output directory. Settings on
//! an entry override the ones in `[output]`.

use anyhow::{Context, Result, bail};
use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use sur_codec::{Axis, FormatVersion, ReadOptions, Transform, WriteOptions};

use crate::mesh::{self, ConvertOptions, MeshFile, SUR_EXT};

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub meshes: HashMap<String, MeshEntry>,
    #[serde(default)]
    pub merged: HashMap<String, MergedEntry>,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Defaults for every entry
    #[serde(flatten)]
    pub defaults: EntrySettings,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            defaults: EntrySettings::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("meshes/")
}

/// Per-entry conversion settings; unset fields fall back to `[output]`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EntrySettings {
    /// `ascii` or `binary`
    pub format: Option<String>,
    pub facet_normals: Option<bool>,
    pub flip_winding: Option<bool>,
    pub scale: Option<f64>,
    pub forward: Option<String>,
    pub up: Option<String>,
}

impl EntrySettings {
    /// Fill unset fields from `defaults`
    pub fn or(&self, defaults: &EntrySettings) -> EntrySettings {
        EntrySettings {
            format: self.format.clone().or_else(|| defaults.format.clone()),
            facet_normals: self.facet_normals.or(defaults.facet_normals),
            flip_winding: self.flip_winding.or(defaults.flip_winding),
            scale: self.scale.or(defaults.scale),
            forward: self.forward.clone().or_else(|| defaults.forward.clone()),
            up: self.up.clone().or_else(|| defaults.up.clone()),
        }
    }

    pub fn resolve(&self) -> Result<ConvertOptions> {
        let version = match &self.format {
            Some(format) => format
                .parse::<FormatVersion>()
                .map_err(anyhow::Error::msg)?,
            None => FormatVersion::default(),
        };
        let forward = parse_axis(self.forward.as_deref(), Axis::Y)?;
        let up = parse_axis(self.up.as_deref(), Axis::Z)?;
        let transform = Transform::new(self.scale.unwrap_or(1.0), forward, up)?;

        Ok(ConvertOptions {
            read: ReadOptions::default(),
            write: WriteOptions {
                facet_normals: self.facet_normals.unwrap_or(false),
                flip_winding: self.flip_winding.unwrap_or(false),
                ..WriteOptions::with_version(version)
            },
            transform,
        })
    }
}

fn parse_axis(value: Option<&str>, default: Axis) -> Result<Axis> {
    Ok(match value {
        Some(s) => s.parse()?,
        None => default,
    })
}

#[derive(Debug, Deserialize)]
pub struct MeshSpec {
    pub path: PathBuf,
    #[serde(flatten)]
    pub settings: EntrySettings,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MeshEntry {
    Simple(PathBuf),
    Detailed(MeshSpec),
}

impl MeshEntry {
    pub fn path(&self) -> &Path {
        match self {
            MeshEntry::Simple(p) => p,
            MeshEntry::Detailed(spec) => &spec.path,
        }
    }

    pub fn settings(&self) -> Option<&EntrySettings> {
        match self {
            MeshEntry::Simple(_) => None,
            MeshEntry::Detailed(spec) => Some(&spec.settings),
        }
    }
}

/// Several sources concatenated into one SUR file
#[derive(Debug, Deserialize)]
pub struct MergedEntry {
    pub sources: Vec<PathBuf>,
    #[serde(flatten)]
    pub settings: EntrySettings,
}

/// One output file of a build
struct Job<'a> {
    name: &'a str,
    sources: Vec<&'a Path>,
    settings: EntrySettings,
}

impl Manifest {
    fn jobs(&self) -> Vec<Job<'_>> {
        let defaults = &self.output.defaults;
        let mut jobs: Vec<Job<'_>> = self
            .meshes
            .iter()
            .map(|(name, entry)| Job {
                name,
                sources: vec![entry.path()],
                settings: entry
                    .settings()
                    .map_or_else(|| defaults.clone(), |s| s.or(defaults)),
            })
            .chain(self.merged.iter().map(|(name, entry)| Job {
                name,
                sources: entry.sources.iter().map(PathBuf::as_path).collect(),
                settings: entry.settings.or(defaults),
            }))
            .collect();
        jobs.sort_by(|a, b| a.name.cmp(b.name));
        jobs
    }
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
    Ok(manifest)
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    let mut names = HashSet::new();

    for job in manifest.jobs() {
        if !names.insert(job.name) {
            bail!(
                "Mesh '{}' is listed in both [meshes] and [merged]",
                job.name
            );
        }
        if job.sources.is_empty() {
            bail!("Merged mesh '{}' has no sources", job.name);
        }
        for source in &job.sources {
            if MeshFile::from_path(source).is_none() {
                bail!("Unsupported mesh format for '{}': {:?}", job.name, source);
            }
            if !source.exists() {
                bail!("Mesh '{}' source not found: {:?}", job.name, source);
            }
        }
        job.settings
            .resolve()
            .with_context(|| format!("Invalid settings for mesh '{}'", job.name))?;
    }

    Ok(())
}

/// Build every entry of a manifest, returning the written files
///
/// Entries are independent and convert in parallel.
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<Vec<PathBuf>> {
    validate(manifest)?;

    let output_dir = output_override.unwrap_or(&manifest.output.dir);
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    manifest
        .jobs()
        .par_iter()
        .map(|job| build_job(job, output_dir))
        .collect()
}

fn build_job(job: &Job<'_>, output_dir: &Path) -> Result<PathBuf> {
    let output = output_dir.join(format!("{}.{}", job.name, SUR_EXT));
    let options = job.settings.resolve()?;
    tracing::info!("Converting mesh: {} -> {:?}", job.name, output);

    let mut facets = Vec::new();
    for source in &job.sources {
        facets.extend(mesh::load_facets(source, &options.read)?);
    }
    mesh::export_sur(&output, facets, &options)
        .with_context(|| format!("Failed to build mesh '{}'", job.name))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest: Manifest = toml::from_str(
            r#"
            [output]
            dir = "out"
            format = "binary"
            facet_normals = true

            [meshes]
            cube = "cube.obj"
            ship = { path = "ship.obj", format = "ascii", scale = 0.5, up = "Y", forward = "-Z" }

            [merged.level]
            sources = ["a.obj", "b.sur"]
            flip_winding = true
            "#,
        )
        .unwrap();

        assert_eq!(manifest.output.dir, PathBuf::from("out"));
        assert_eq!(manifest.meshes["cube"].path(), Path::new("cube.obj"));
        assert!(manifest.meshes["cube"].settings().is_none());
        assert_eq!(manifest.merged["level"].sources.len(), 2);

        let jobs = manifest.jobs();
        let names: Vec<&str> = jobs.iter().map(|j| j.name).collect();
        assert_eq!(names, ["cube", "level", "ship"]);

        // Inherits everything from [output]
        let cube = jobs[0].settings.resolve().unwrap();
        assert_eq!(cube.write.version, FormatVersion::BinaryV2);
        assert!(cube.write.facet_normals);
        assert!(cube.transform.is_identity());

        let level = jobs[1].settings.resolve().unwrap();
        assert!(level.write.flip_winding);
        assert!(level.write.facet_normals);

        // Entry settings win over [output]
        let ship = jobs[2].settings.resolve().unwrap();
        assert_eq!(ship.write.version, FormatVersion::AsciiV1);
        assert_eq!(ship.transform.scale(), 0.5);
        assert_eq!(ship.transform.forward(), Axis::NegZ);
        assert_eq!(ship.transform.up(), Axis::Y);
    }

    #[test]
    fn test_default_output_dir() {
        let manifest: Manifest = toml::from_str("[meshes]\na = \"a.obj\"\n").unwrap();
        assert_eq!(manifest.output.dir, default_output_dir());
        assert_eq!(manifest.output.defaults, EntrySettings::default());
    }

    #[test]
    fn test_bad_settings() {
        let bad_format = EntrySettings {
            format: Some("stl".into()),
            ..Default::default()
        };
        assert!(bad_format.resolve().is_err());

        let collinear = EntrySettings {
            forward: Some("Z".into()),
            ..Default::default()
        };
        assert!(collinear.resolve().is_err());

        let bad_scale = EntrySettings {
            scale: Some(-1.0),
            ..Default::default()
        };
        assert!(bad_scale.resolve().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("tri.obj");
        std::fs::write(&obj, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let toml = format!(
            "[meshes]\ntri = {:?}\n\n[merged.tri]\nsources = [{:?}]\n",
            obj, obj
        );
        let manifest: Manifest = toml::from_str(&toml).unwrap();
        let err = validate(&manifest).unwrap_err();
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn test_validate_missing_source() {
        let manifest: Manifest =
            toml::from_str("[meshes]\ngone = \"does/not/exist.obj\"\n").unwrap();
        let err = validate(&manifest).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_build_all_merges_sources() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.obj");
        let b = dir.path().join("b.obj");
        std::fs::write(&a, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        std::fs::write(&b, "v 0 0 0\nv 0 1 0\nv -1 0 0\nf 1 2 3\n").unwrap();

        let toml = format!(
            "[meshes]\na = {:?}\n\n[merged.both]\nsources = [{:?}, {:?}]\nformat = \"binary\"\n",
            a, a, b
        );
        let manifest: Manifest = toml::from_str(&toml).unwrap();
        let out = dir.path().join("out");
        let mut written = build_all(&manifest, Some(&out)).unwrap();
        written.sort();
        assert_eq!(written, vec![out.join("a.sur"), out.join("both.sur")]);

        let both = sur_codec::read_file(&out.join("both.sur"), &ReadOptions::default()).unwrap();
        assert_eq!(both.triangle_count(), 2);
        // Origin and (0,1,0) are shared between the two sources
        assert_eq!(both.vertex_count(), 4);
    }
}
