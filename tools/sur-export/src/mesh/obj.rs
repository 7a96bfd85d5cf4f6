//! Wavefront OBJ interop
//!
//! Only positions and faces are read. Polygons are fan-triangulated, so
//! quads become two triangles before they reach the SUR writer.

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use sur_codec::{Facet, Mesh, Point, corner_normals};

/// Parse an OBJ file into facets (one per triangle, corner positions inline)
pub fn parse_obj_facets(input: &Path) -> Result<Vec<Facet>> {
    let file = File::open(input).with_context(|| format!("Failed to open OBJ: {:?}", input))?;
    parse_obj_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse OBJ: {:?}", input))
}

pub(crate) fn parse_obj_reader<R: BufRead>(reader: R) -> Result<Vec<Facet>> {
    let mut positions: Vec<Point> = Vec::new();
    let mut facets: Vec<Facet> = Vec::new();

    for (line_idx, line) in reader.lines().enumerate() {
        let line_number = line_idx + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts[0] {
            "v" => {
                if parts.len() < 4 {
                    bail!("line {}: vertex needs 3 coordinates", line_number);
                }
                let mut p = [0.0; 3];
                for (slot, s) in p.iter_mut().zip(&parts[1..4]) {
                    *slot = s
                        .parse()
                        .with_context(|| format!("line {}: bad coordinate {:?}", line_number, s))?;
                }
                positions.push(p);
            }
            "f" => {
                let corners = parts[1..]
                    .iter()
                    .map(|v| resolve_obj_vertex(v, positions.len()))
                    .collect::<Option<Vec<usize>>>()
                    .with_context(|| format!("line {}: bad face {:?}", line_number, line))?;

                if corners.len() < 3 {
                    bail!("line {}: face needs at least 3 vertices", line_number);
                }

                // Triangulate (fan triangulation for convex polygons)
                for i in 1..corners.len() - 1 {
                    facets.push([
                        positions[corners[0]],
                        positions[corners[i]],
                        positions[corners[i + 1]],
                    ]);
                }
            }
            // Texture coordinates, normals, groups and materials are ignored
            _ => {}
        }
    }

    if facets.is_empty() {
        bail!("No faces found in OBJ file");
    }

    Ok(facets)
}

/// Resolve an OBJ face corner ("v", "v/vt", "v/vt/vn" or "v//vn") to a
/// 0-based position index
///
/// Negative indices count back from the most recent vertex.
fn resolve_obj_vertex(s: &str, position_count: usize) -> Option<usize> {
    let vi: i64 = s.split('/').next()?.parse().ok()?;
    let index = match vi {
        0 => return None,
        i if i > 0 => (i - 1) as usize, // OBJ indices are 1-based
        i => position_count.checked_sub(i.unsigned_abs() as usize)?,
    };
    (index < position_count).then_some(index)
}

/// Write a mesh as OBJ
///
/// With `use_facet_normals` and normals present, every corner references the
/// normal of its triangle, which keeps the shading flat.
pub fn write_obj(output: &Path, mesh: &Mesh, use_facet_normals: bool) -> Result<()> {
    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    write_obj_to(&mut writer, mesh, use_facet_normals)
        .with_context(|| format!("Failed to write OBJ: {:?}", output))?;
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_obj_to<W: Write>(
    w: &mut W,
    mesh: &Mesh,
    use_facet_normals: bool,
) -> Result<()> {
    for [x, y, z] in &mesh.vertices {
        writeln!(w, "v {} {} {}", x, y, z)?;
    }

    let normals = if use_facet_normals {
        let normals = corner_normals(mesh);
        if normals.is_none() {
            tracing::warn!("Mesh has no facet normals, writing OBJ without normals");
        }
        normals
    } else {
        None
    };

    match normals {
        Some(normals) => {
            for [x, y, z] in &normals {
                writeln!(w, "vn {} {} {}", x, y, z)?;
            }
            for (t, [a, b, c]) in mesh.triangles.iter().enumerate() {
                let n = 3 * t + 1;
                writeln!(
                    w,
                    "f {}//{} {}//{} {}//{}",
                    a + 1,
                    n,
                    b + 1,
                    n + 1,
                    c + 1,
                    n + 2
                )?;
            }
        }
        None => {
            for [a, b, c] in &mesh.triangles {
                writeln!(w, "f {} {} {}", a + 1, b + 1, c + 1)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_splits_into_two_triangles() {
        let obj = "# quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1 4//1\n";
        let facets = parse_obj_reader(obj.as_bytes()).unwrap();
        assert_eq!(
            facets,
            vec![
                [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
                [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            ]
        );
    }

    #[test]
    fn test_negative_indices() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let facets = parse_obj_reader(obj.as_bytes()).unwrap();
        assert_eq!(facets[0][2], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_bad_face_reference() {
        let obj = "v 0 0 0\nv 1 0 0\nf 1 2 3\n";
        let err = parse_obj_reader(obj.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_no_faces() {
        assert!(parse_obj_reader("v 0 0 0\n".as_bytes()).is_err());
    }

    #[test]
    fn test_resolve_obj_vertex() {
        assert_eq!(resolve_obj_vertex("1", 3), Some(0));
        assert_eq!(resolve_obj_vertex("3/7/2", 3), Some(2));
        assert_eq!(resolve_obj_vertex("-1", 3), Some(2));
        assert_eq!(resolve_obj_vertex("0", 3), None);
        assert_eq!(resolve_obj_vertex("4", 3), None);
        assert_eq!(resolve_obj_vertex("-4", 3), None);
        assert_eq!(resolve_obj_vertex("x", 3), None);
    }

    fn triangle_mesh(normals: Option<Vec<Point>>) -> Mesh {
        Mesh {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            triangles: vec![[0, 1, 2]],
            facet_normals: normals,
        }
    }

    #[test]
    fn test_write_obj_plain() {
        let mut out = Vec::new();
        write_obj_to(&mut out, &triangle_mesh(None), true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
    }

    #[test]
    fn test_write_obj_flat_normals() {
        let mut out = Vec::new();
        write_obj_to(&mut out, &triangle_mesh(Some(vec![[0.0, 0.0, 1.0]])), true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("vn 0 0 1\n").count(), 3);
        assert!(text.ends_with("f 1//1 2//2 3//3\n"));
    }

    #[test]
    fn test_write_obj_normals_not_requested() {
        let mut out = Vec::new();
        write_obj_to(&mut out, &triangle_mesh(Some(vec![[0.0, 0.0, 1.0]])), false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("vn"));
    }
}
