//! End-to-end behavior of the SUR codec: round trips, stable
//! re-serialization, deduplication and corrupt-file handling

use std::collections::HashSet;

use sur_codec::{
    ErrorKind, Facet, FormatVersion, Mesh, ReadOptions, WriteOptions, corner_normals,
    expanded_corners, read, read_file, write, write_file, write_mesh,
};

/// Unit cube, 12 triangles, outward-facing
fn cube_facets() -> Vec<Facet> {
    let p = |x: f64, y: f64, z: f64| [x, y, z];
    let quads = [
        [p(0., 0., 0.), p(0., 1., 0.), p(1., 1., 0.), p(1., 0., 0.)], // bottom
        [p(0., 0., 1.), p(1., 0., 1.), p(1., 1., 1.), p(0., 1., 1.)], // top
        [p(0., 0., 0.), p(1., 0., 0.), p(1., 0., 1.), p(0., 0., 1.)], // front
        [p(0., 1., 0.), p(0., 1., 1.), p(1., 1., 1.), p(1., 1., 0.)], // back
        [p(0., 0., 0.), p(0., 0., 1.), p(0., 1., 1.), p(0., 1., 0.)], // left
        [p(1., 0., 0.), p(1., 1., 0.), p(1., 1., 1.), p(1., 0., 1.)], // right
    ];
    quads
        .iter()
        .flat_map(|q| [[q[0], q[1], q[2]], [q[2], q[3], q[0]]])
        .collect()
}

fn facet_key(facet: &Facet) -> [[u64; 3]; 3] {
    facet.map(|p| p.map(f64::to_bits))
}

fn encode(facets: Vec<Facet>, version: FormatVersion) -> Vec<u8> {
    let mut out = Vec::new();
    write(&mut out, facets, &WriteOptions::with_version(version)).unwrap();
    out
}

#[test]
fn test_round_trip_preserves_triangles() {
    for version in [FormatVersion::AsciiV1, FormatVersion::BinaryV2] {
        let facets = cube_facets();
        let bytes = encode(facets.clone(), version);
        let mesh = read(bytes.as_slice(), &ReadOptions::default()).unwrap();

        assert_eq!(mesh.vertex_count(), 8, "{} cube shares corners", version);
        assert_eq!(mesh.triangle_count(), 12);

        let expected: HashSet<_> = facets.iter().map(facet_key).collect();
        let actual: HashSet<_> = mesh.facets().map(|f| facet_key(&f)).collect();
        assert_eq!(actual, expected, "{} round trip", version);
    }
}

#[test]
fn test_reserialization_is_stable() {
    for version in [FormatVersion::AsciiV1, FormatVersion::BinaryV2] {
        let facets = vec![[[0.1, 0.2, 0.3], [1.0 / 3.0, -2.5, 1e6], [7.0, 8.0, 9.0]]];
        let first = encode(facets, version);
        let mesh = read(first.as_slice(), &ReadOptions::default()).unwrap();

        let mut second = Vec::new();
        write_mesh(&mut second, &mesh, &WriteOptions::with_version(version)).unwrap();
        let again = read(second.as_slice(), &ReadOptions::default()).unwrap();

        assert_eq!(again, mesh);
        assert_eq!(second, first, "{} bytes differ", version);
    }
}

#[test]
fn test_shared_corner_written_once() {
    let text = String::from_utf8(encode(
        vec![
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            [[1.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]],
        ],
        FormatVersion::AsciiV1,
    ))
    .unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "4");
    assert_eq!(lines[5], "2");
    assert_eq!(&lines[6..], &["0 1 2", "2 3 0"]);
}

#[test]
fn test_near_duplicates_not_merged() {
    let mut out = Vec::new();
    let mesh = write(
        &mut out,
        vec![
            [[0.5, 0.5, 0.5], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[0.5 + 1e-9, 0.5, 0.5], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        ],
        &WriteOptions::default(),
    )
    .unwrap();
    assert_eq!(mesh.vertex_count(), 4);
}

#[test]
fn test_index_equal_to_vertex_count() {
    let err = read(
        "2\n0 0 0\n1 0 0\n1\n0 1 2\n".as_bytes(),
        &ReadOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
}

#[test]
fn test_short_vertex_section() {
    let err = read("3\n0 0 0\n1 0 0\n".as_bytes(), &ReadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TruncatedStream);
}

#[test]
fn test_binary_normals_expand_per_corner() {
    let options = WriteOptions {
        facet_normals: true,
        ..WriteOptions::with_version(FormatVersion::BinaryV2)
    };
    let mut out = Vec::new();
    write(&mut out, cube_facets(), &options).unwrap();

    let mesh = read(out.as_slice(), &ReadOptions::default()).unwrap();
    let normals = corner_normals(&mesh).unwrap();
    let corners = expanded_corners(&mesh);
    assert_eq!(normals.len(), 36);
    assert_eq!(corners.len(), 36);

    // Bottom face points down, top face points up
    assert_eq!(normals[0], [0.0, 0.0, -1.0]);
    assert_eq!(normals[6], [0.0, 0.0, 1.0]);
    assert!(normals.chunks(3).all(|c| c[0] == c[1] && c[1] == c[2]));
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.sur");

    let written = write_file(
        &path,
        cube_facets(),
        &WriteOptions::with_version(FormatVersion::BinaryV2),
    )
    .unwrap();
    let mesh = read_file(&path, &ReadOptions::default()).unwrap();
    assert_eq!(mesh, written);
}

#[test]
fn test_forced_ascii_reads_ascii() {
    let mesh = read(
        "1\n1 2 3\n0\n".as_bytes(),
        &ReadOptions::with_version(FormatVersion::AsciiV1),
    )
    .unwrap();
    assert_eq!(
        mesh,
        Mesh {
            vertices: vec![[1.0, 2.0, 3.0]],
            triangles: vec![],
            facet_normals: None,
        }
    );
}

#[test]
fn test_parallel_independent_reads() {
    let bytes = encode(cube_facets(), FormatVersion::AsciiV1);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| read(bytes.as_slice(), &ReadOptions::default())))
            .collect();
        for handle in handles {
            let mesh = handle.join().unwrap().unwrap();
            assert_eq!(mesh.triangle_count(), 12);
        }
    });
}
