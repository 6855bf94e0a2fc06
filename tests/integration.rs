//! End-to-end coverage across the STL exchange boundary and the
//! simplification core, exercising the public crate surface the way the
//! CLI driver uses it.

use mesh_simplify::geometry::{Triangle, Vec3};
use mesh_simplify::{simplify_mesh, stl};

fn unit_cube() -> Vec<Triangle> {
    let v = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(0.0, 1.0, 1.0),
    ];
    let idx: [[usize; 3]; 12] = [
        [0, 1, 2], [0, 2, 3],
        [4, 6, 5], [4, 7, 6],
        [0, 5, 1], [0, 4, 5],
        [1, 5, 6], [1, 6, 2],
        [2, 6, 7], [2, 7, 3],
        [3, 7, 4], [3, 4, 0],
    ];
    idx.iter().map(|f| Triangle::new(v[f[0]], v[f[1]], v[f[2]])).collect()
}

#[test]
fn stl_round_trip_then_simplify_reduces_face_count() {
    let dir = std::env::temp_dir();
    let path = dir.join("mesh_simplify_integration_cube.stl");

    let cube = unit_cube();
    stl::write_binary(&path, &cube).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let loaded = stl::read_binary(&bytes).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.len(), cube.len());

    let simplified = simplify_mesh(&loaded, 0.5);
    assert!(simplified.len() <= loaded.len());
    assert!(!simplified.is_empty());
}

#[test]
fn factor_just_under_one_allows_only_a_single_collapse() {
    let cube = unit_cube();
    // floor(12 * 0.999) == 11, so at most one collapse can fire; that
    // collapse removes the two faces sharing the edge and replaces the
    // rest, a net -2, so the result is 10, not a no-op.
    let out = simplify_mesh(&cube, 0.999);
    assert!(out.len() <= cube.len());
    assert!(out.len() >= 10);
}

#[test]
fn ascii_stl_snippet_parses_expected_triangle_count() {
    let text = "\
solid box
facet normal 0 0 -1
outer loop
vertex 0 0 0
vertex 0 1 0
vertex 1 1 0
endloop
endfacet
facet normal 0 0 -1
outer loop
vertex 0 0 0
vertex 1 1 0
vertex 1 0 0
endloop
endfacet
endsolid box
";
    let out = stl::read_ascii(text).unwrap();
    assert_eq!(out.len(), 2);
}
