use std::io::Write;

use ply_io::{
    read_ply_mesh, read_ply_positions, LoaderOptions, MeshError, PlyMeshReader, PointCloudReader, Reader,
};
use proptest::prelude::*;
use tempfile::NamedTempFile;

fn write_temp(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

/// Big-endian pentagon plus a triangle, with per-vertex `texture_u/texture_v`
/// stored as doubles and a `vertex_index` list.
fn binary_polygons() -> Vec<u8> {
    let mut data = b"ply\n\
format binary_big_endian 1.0\n\
comment made by hand\n\
element vertex 6\n\
property float x\n\
property float y\n\
property float z\n\
property double texture_u\n\
property double texture_v\n\
element material 1\n\
property uchar red\n\
element face 2\n\
property list uchar ushort vertex_index\n\
end_header\n"
        .to_vec();
    let points = [
        [1.0f32, 0.0, 0.0],
        [0.309, 0.951, 0.0],
        [-0.809, 0.588, 0.0],
        [-0.809, -0.588, 0.0],
        [0.309, -0.951, 0.0],
        [0.0, 0.0, 1.0],
    ];
    for (i, p) in points.iter().enumerate() {
        for v in p {
            data.extend(v.to_be_bytes());
        }
        data.extend((i as f64 * 0.5).to_be_bytes());
        data.extend(1.0f64.to_be_bytes());
    }
    data.push(255);
    data.push(5);
    for i in 0u16..5 {
        data.extend(i.to_be_bytes());
    }
    data.push(3);
    for i in [0u16, 1, 5] {
        data.extend(i.to_be_bytes());
    }
    data
}

#[test]
fn test_read_binary_polygons_from_disk() {
    let file = write_temp(&binary_polygons());
    let mesh = read_ply_mesh(file.path()).unwrap();

    assert_eq!(mesh.num_vertices(), 6);
    assert_eq!(mesh.num_triangles(), 4);
    assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 1, 5]);
    assert!(!mesh.has_normals());
    assert_eq!(mesh.texcoords[3], [1.5, 1.0]);
}

#[test]
fn test_reader_trait() {
    let file = write_temp(&binary_polygons());
    let mut reader = <PlyMeshReader as Reader>::open(file.path()).unwrap();
    let meshes = reader.read_meshes().unwrap();
    assert_eq!(meshes.len(), 1);
    // Reads are repeatable.
    assert_eq!(Reader::read_mesh(&mut reader).unwrap(), meshes[0]);
    assert_eq!(reader.read_points().unwrap().len(), 6);
}

#[test]
fn test_point_cloud() {
    let file = write_temp(
        b"ply\nformat ascii 1.0\nelement vertex 2\nproperty double x\nproperty double y\nproperty double z\nend_header\n1 2 3\n4 5 6\n",
    );
    assert_eq!(read_ply_mesh(file.path()).unwrap_err(), MeshError::FaceDataMissing);
    assert_eq!(
        read_ply_positions(file.path()).unwrap(),
        vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]
    );

    let mut reader = PlyMeshReader::open(file.path())
        .unwrap()
        .with_options(LoaderOptions::new().with_require_faces(false));
    assert_eq!(reader.read_mesh().unwrap().num_triangles(), 0);
}

#[test]
fn test_open_errors() {
    assert!(matches!(
        PlyMeshReader::open("/nonexistent/dir/missing.ply"),
        Err(MeshError::FileOpenFailed(_))
    ));
    assert!(matches!(
        ply_io::load("/nonexistent/dir/missing.ply"),
        Err(MeshError::FileOpenFailed(_))
    ));

    let file = write_temp(b"not a ply file\n");
    assert!(matches!(read_ply_mesh(file.path()), Err(MeshError::Corrupted(_))));
}

fn polygon_file(sides: &[usize]) -> (Vec<u8>, usize) {
    let vertices: usize = sides.iter().sum();
    let mut text = format!(
        "ply\nformat ascii 1.0\nelement vertex {}\nproperty float x\nproperty float y\nproperty float z\n\
         element face {}\nproperty list uchar uint vertex_indices\nend_header\n",
        vertices,
        sides.len()
    );
    for &n in sides {
        for k in 0..n {
            let a = k as f32 / n as f32 * std::f32::consts::TAU;
            text.push_str(&format!("{} {} 0\n", a.cos(), a.sin()));
        }
    }
    let mut base = 0;
    for &n in sides {
        let row: Vec<String> = (base..base + n).map(|i| i.to_string()).collect();
        text.push_str(&format!("{} {}\n", n, row.join(" ")));
        base += n;
    }
    (text.into_bytes(), vertices)
}

proptest! {
    #[test]
    fn regular_polygons_fan_into_n_minus_two(sides in prop::collection::vec(3usize..12, 1..6)) {
        let (data, vertices) = polygon_file(&sides);
        let mesh = ply_io::load_from_bytes(data, &LoaderOptions::default()).unwrap();

        let expected: usize = sides.iter().map(|n| n - 2).sum();
        prop_assert_eq!(mesh.num_triangles(), expected);
        prop_assert!(mesh.indices.iter().all(|&i| (i as usize) < vertices));
    }
}
