use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ply_core::PlyReader;

/// Binary little-endian grid with `n * n` vertices and `(n - 1)^2` quads.
fn grid_ply(n: u32) -> Vec<u8> {
    let quads = (n - 1) * (n - 1);
    let mut data = format!(
        "ply\nformat binary_little_endian 1.0\n\
         element vertex {}\nproperty float x\nproperty float y\nproperty float z\n\
         element face {}\nproperty list uchar uint vertex_indices\nend_header\n",
        n * n,
        quads
    )
    .into_bytes();
    for j in 0..n {
        for i in 0..n {
            for v in [i as f32, j as f32, 0.0f32] {
                data.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
    for j in 0..n - 1 {
        for i in 0..n - 1 {
            let a = j * n + i;
            data.push(4);
            for v in [a, a + 1, a + n + 1, a + n] {
                data.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
    data
}

fn bench_load_element(c: &mut Criterion) {
    let data = grid_ply(256);

    c.bench_function("load_vertex_and_face", |b| {
        b.iter(|| {
            let mut reader = PlyReader::from_bytes(data.clone()).unwrap();
            let rows = reader.load_element().unwrap().num_rows();
            reader.next_element();
            let faces = reader.load_element().unwrap().num_rows();
            black_box((rows, faces))
        })
    });

    c.bench_function("extract_and_triangulate", |b| {
        let mut reader = PlyReader::from_bytes(data.clone()).unwrap();
        let positions: Vec<f32> = reader.load_element().unwrap().extract_properties_vec(&[0, 1, 2]).unwrap();
        reader.next_element();
        let faces = reader.load_element().unwrap();
        b.iter(|| {
            let tris: Vec<u32> = faces.extract_triangles_vec(0, &positions, positions.len() / 3).unwrap();
            black_box(tris)
        })
    });
}

criterion_group!(benches, bench_load_element);
criterion_main!(benches);
