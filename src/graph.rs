//! Consolidates a flat triangle soup into the incidence graph: unique
//! vertices keyed by position, per-vertex accumulated quadrics, the face
//! list, and the vertex->faces / vertex->edges incidence maps.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::geometry::{Matrix, Triangle, Vec3};
use crate::mesh::{pair_key, EdgeArena, EdgeId, FaceArena, FaceId, PairKey, VertexArena, VertexId};

pub struct Graph {
    pub vertices: VertexArena,
    pub faces: FaceArena,
    pub edges: EdgeArena,
    pub vertex_faces: AHashMap<VertexId, Vec<FaceId>>,
    pub vertex_edges: AHashMap<VertexId, Vec<EdgeId>>,
}

impl Graph {
    /// Build the incidence graph from an input triangle soup, per spec
    /// section 4.2: dedup positions, accumulate quadrics, build faces,
    /// build the initial edge set, and populate both incidence maps.
    pub fn build(input: &[Triangle]) -> Graph {
        let mut vertices = VertexArena::default();
        let mut faces = FaceArena::default();
        let mut edges = EdgeArena::default();
        let mut vertex_faces: AHashMap<VertexId, Vec<FaceId>> = AHashMap::new();
        let mut vertex_edges: AHashMap<VertexId, Vec<EdgeId>> = AHashMap::new();

        // 1. one vertex per distinct input position, using an ordered
        // map so construction is deterministic regardless of hash seed.
        let mut by_position: BTreeMap<Vec3, VertexId> = BTreeMap::new();
        for t in input {
            for p in [t.v1, t.v2, t.v3] {
                by_position
                    .entry(p)
                    .or_insert_with(|| vertices.push(p, Matrix::default()));
            }
        }

        // 2. accumulate each triangle's plane quadric into its three vertices.
        for t in input {
            let q = t.quadric();
            for p in [t.v1, t.v2, t.v3] {
                let id = by_position[&p];
                let v = vertices.get_mut(id);
                v.quadric = v.quadric + q;
            }
        }

        // 3 & 4. one face per input triangle, with vertex->faces incidence.
        let mut input_faces = Vec::with_capacity(input.len());
        for t in input {
            let v1 = by_position[&t.v1];
            let v2 = by_position[&t.v2];
            let v3 = by_position[&t.v3];
            let f = faces.push(v1, v2, v3);
            vertex_faces.entry(v1).or_default().push(f);
            vertex_faces.entry(v2).or_default().push(f);
            vertex_faces.entry(v3).or_default().push(f);
            input_faces.push((v1, v2, v3));
        }

        // 5. dedup the three edges of each triangle by canonical PairKey.
        let mut by_pair: AHashMap<PairKey, EdgeId> = AHashMap::new();
        for &(v1, v2, v3) in &input_faces {
            for (a, b) in [(v1, v2), (v2, v3), (v3, v1)] {
                let key = pair_key(vertices.position(a), vertices.position(b));
                by_pair
                    .entry(key)
                    .or_insert_with(|| edges.push(a, b, &vertices));
            }
        }

        // 6. push every edge onto vertex->edges incidence.
        for &id in by_pair.values() {
            let e = edges.get(id);
            vertex_edges.entry(e.a).or_default().push(id);
            vertex_edges.entry(e.b).or_default().push(id);
        }

        Graph {
            vertices,
            faces,
            edges,
            vertex_faces,
            vertex_edges,
        }
    }
}
