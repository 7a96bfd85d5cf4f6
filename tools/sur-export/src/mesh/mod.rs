//! Mesh conversion (OBJ/SUR -> SUR, SUR -> OBJ)

mod obj;
mod types;

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use sur_codec::{Facet, FormatVersion, Mesh, ReadOptions, write_file};

pub use obj::{parse_obj_facets, write_obj};
pub use types::{ConvertOptions, MeshFile, MeshInfo, OBJ_EXT, SUR_EXT};

/// Load any supported mesh file as raw facets, in the file's own frame
pub fn load_facets(input: &Path, read: &ReadOptions) -> Result<Vec<Facet>> {
    match MeshFile::from_path(input) {
        Some(MeshFile::Obj) => parse_obj_facets(input),
        Some(MeshFile::Sur) => {
            let mesh = sur_codec::read_file(input, read)
                .with_context(|| format!("Failed to read SUR: {:?}", input))?;
            Ok(mesh.facets().collect())
        }
        None => bail!(
            "Unsupported mesh format: {:?} (use .{} or .{})",
            input,
            SUR_EXT,
            OBJ_EXT
        ),
    }
}

/// Write facets to a SUR file, moving them into the frame described by
/// `options.transform` first
pub fn export_sur<I>(output: &Path, facets: I, options: &ConvertOptions) -> Result<Mesh>
where
    I: IntoIterator<Item = Facet>,
{
    let facets = options.transform.export_facets(facets);
    let mesh = write_file(output, facets, &options.write)
        .with_context(|| format!("Failed to write SUR: {:?}", output))?;

    tracing::debug!(
        "Wrote {:?}: {} vertices, {} triangles ({})",
        output,
        mesh.vertex_count(),
        mesh.triangle_count(),
        options.write.version
    );
    Ok(mesh)
}

/// Convert a single file, picking the direction from the extensions
pub fn convert(input: &Path, output: &Path, options: &ConvertOptions) -> Result<()> {
    let Some(source) = MeshFile::from_path(input) else {
        bail!("Unsupported input format: {:?}", input);
    };
    let Some(target) = MeshFile::from_path(output) else {
        bail!("Unsupported output format: {:?}", output);
    };

    match (source, target) {
        (_, MeshFile::Sur) => {
            let facets = load_facets(input, &options.read)?;
            export_sur(output, facets, options)?;
        }
        (MeshFile::Sur, MeshFile::Obj) => {
            let mut mesh = sur_codec::read_file(input, &options.read)
                .with_context(|| format!("Failed to read SUR: {:?}", input))?;
            options.transform.import_mesh(&mut mesh);
            if options.write.flip_winding {
                mesh.flip_winding();
            }
            if options.write.facet_normals && mesh.facet_normals.is_none() {
                mesh.compute_facet_normals();
            }
            write_obj(output, &mesh, options.write.facet_normals)?;
        }
        (MeshFile::Obj, MeshFile::Obj) => {
            bail!("Nothing to convert: {:?} and {:?} are both OBJ", input, output)
        }
    }

    Ok(())
}

/// Read a SUR file and summarize it
pub fn inspect(input: &Path, read: &ReadOptions) -> Result<MeshInfo> {
    let version = match read.version {
        Some(version) => version,
        None => sniff_file(input)?,
    };
    let mesh = sur_codec::read_file(input, read)
        .with_context(|| format!("Failed to read SUR: {:?}", input))?;

    Ok(MeshInfo {
        version,
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        has_facet_normals: mesh.facet_normals.is_some(),
        bounds: mesh.bounds(),
    })
}

fn sniff_file(input: &Path) -> Result<FormatVersion> {
    let file = File::open(input).with_context(|| format!("Failed to open {:?}", input))?;
    let mut prefix = Vec::with_capacity(sur_codec::SUR_MAGIC.len());
    file.take(sur_codec::SUR_MAGIC.len() as u64)
        .read_to_end(&mut prefix)
        .with_context(|| format!("Failed to read {:?}", input))?;
    Ok(FormatVersion::sniff(&prefix))
}

/// Log a [`MeshInfo`] the way `sur-export info` shows it
pub fn log_info(input: &Path, info: &MeshInfo) {
    tracing::info!("{:?}:", input);
    tracing::info!("  format:        {}", info.version);
    tracing::info!("  vertices:      {}", info.vertex_count);
    tracing::info!("  triangles:     {}", info.triangle_count);
    tracing::info!(
        "  facet normals: {}",
        if info.has_facet_normals { "yes" } else { "no" }
    );
    match info.bounds {
        Some((min, max)) => tracing::info!("  bounds:        {:?} .. {:?}", min, max),
        None => tracing::info!("  bounds:        (empty)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sur_codec::{Axis, Transform, WriteOptions};

    const TRIANGLE_OBJ: &str = "v 0 0 0\nv 2 0 0\nv 0 2 0\nf 1 2 3\n";

    #[test]
    fn test_obj_to_binary_sur_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("tri.obj");
        let sur = dir.path().join("tri.sur");
        let back = dir.path().join("back.obj");
        std::fs::write(&obj, TRIANGLE_OBJ).unwrap();

        let options = ConvertOptions {
            write: WriteOptions {
                facet_normals: true,
                ..WriteOptions::with_version(FormatVersion::BinaryV2)
            },
            ..ConvertOptions::default()
        };
        convert(&obj, &sur, &options).unwrap();

        let info = inspect(&sur, &ReadOptions::default()).unwrap();
        assert_eq!(info.version, FormatVersion::BinaryV2);
        assert_eq!(info.vertex_count, 3);
        assert_eq!(info.triangle_count, 1);
        assert!(info.has_facet_normals);
        assert_eq!(info.bounds, Some(([0.0; 3], [2.0, 2.0, 0.0])));

        convert(&sur, &back, &options).unwrap();
        let text = std::fs::read_to_string(&back).unwrap();
        assert!(text.contains("vn 0 0 1"));
        assert!(text.contains("f 1//1 2//2 3//3"));
    }

    #[test]
    fn test_transform_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("tri.obj");
        let sur = dir.path().join("tri.sur");
        let back = dir.path().join("back.obj");
        std::fs::write(&obj, TRIANGLE_OBJ).unwrap();

        let export = ConvertOptions {
            transform: Transform::new(2.0, Axis::NegZ, Axis::Y).unwrap(),
            ..ConvertOptions::default()
        };
        convert(&obj, &sur, &export).unwrap();

        // Canonical +Y (forward) lands on file -Z, doubled
        let mesh = sur_codec::read_file(&sur, &ReadOptions::default()).unwrap();
        assert!(mesh.vertices.contains(&[0.0, 0.0, -4.0]));
        assert!(mesh.vertices.contains(&[4.0, 0.0, 0.0]));

        // Scale multiplies on import too, so undo it with the reciprocal
        let import = ConvertOptions {
            transform: Transform::new(0.5, Axis::NegZ, Axis::Y).unwrap(),
            ..ConvertOptions::default()
        };
        convert(&sur, &back, &import).unwrap();
        let facets = parse_obj_facets(&back).unwrap();
        assert_eq!(facets, vec![[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]]]);
    }

    #[test]
    fn test_unsupported_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("tri.obj");
        std::fs::write(&obj, TRIANGLE_OBJ).unwrap();

        let options = ConvertOptions::default();
        assert!(convert(&obj, &dir.path().join("tri.stl"), &options).is_err());
        assert!(convert(&obj, &dir.path().join("copy.obj"), &options).is_err());
        assert!(load_facets(&dir.path().join("tri.ply"), &ReadOptions::default()).is_err());
    }

    #[test]
    fn test_mesh_file_from_path() {
        assert_eq!(MeshFile::from_path(Path::new("a/b.SUR")), Some(MeshFile::Sur));
        assert_eq!(MeshFile::from_path(Path::new("b.obj")), Some(MeshFile::Obj));
        assert_eq!(MeshFile::from_path(Path::new("b")), None);
        assert_eq!(MeshFile::Sur.default_target(), MeshFile::Obj);
    }
}
