//! The collapse loop: the main simplification driver, plus the mesh
//! extractor that turns surviving faces back into a flat triangle
//! sequence. This is the single public entry point of the core.

use ahash::AHashSet;

use crate::geometry::{Matrix, Triangle, Vec3, EPSILON};
use crate::graph::Graph;
use crate::mesh::{EdgeId, FaceId, VertexId};
use crate::queue::CollapseQueue;

/// Number of equally spaced samples (inclusive of both endpoints) used
/// to search the segment [a, b] when the quadric sum is singular. The
/// spec requires the sample set be deterministic and uniformly spaced
/// but does not mandate this exact count.
const SEGMENT_SAMPLES: usize = 33;

/// The vertex position minimizing `q.quadric_error` for the merged
/// quadric of an edge's two endpoints: solve directly when `q` is
/// well-conditioned, otherwise fall back to a line search along the
/// segment between the endpoints.
pub(crate) fn best_vertex_position(q: Matrix, a: Vec3, b: Vec3) -> Vec3 {
    if q.determinant().abs() > EPSILON {
        let v = q.quadric_vector();
        if v.x.is_finite() && v.y.is_finite() && v.z.is_finite() {
            return v;
        }
    }

    let d = b - a;
    let mut best_error = f64::INFINITY;
    let mut best = a;
    for i in 0..SEGMENT_SAMPLES {
        let t = i as f64 / (SEGMENT_SAMPLES - 1) as f64;
        let candidate = a + d * t;
        let error = q.quadric_error(candidate);
        if error < best_error {
            best_error = error;
            best = candidate;
        }
    }
    best
}

/// Reduce `input` to approximately `factor * input.len()` faces using
/// Garland-Heckbert quadric error metric edge collapse. Returns a new
/// triangle sequence; `input` is left untouched.
pub fn simplify(input: &[Triangle], factor: f64) -> Vec<Triangle> {
    let mut graph = Graph::build(input);
    let mut queue = CollapseQueue::default();

    let edge_ids: Vec<EdgeId> = graph.vertex_edges.values().flatten().copied().collect();
    let mut seen_edges = AHashSet::new();
    for id in edge_ids {
        if seen_edges.insert(id) {
            let err = graph.edges.error(id, &graph.vertices);
            queue.push(id, err);
        }
    }

    let mut num_faces = input.len();
    let target = (input.len() as f64 * factor).floor() as usize;

    while num_faces > target {
        let Some(p) = queue.pop() else { break };
        if graph.edges.is_removed(p) {
            continue;
        }
        graph.edges.mark_removed(p);

        let edge = graph.edges.get(p);
        let (a, b) = (edge.a, edge.b);

        let distinct_faces = incident(&graph.vertex_faces, a, b, |id| !graph.faces.is_removed(*id));
        let distinct_edges = incident(&graph.vertex_edges, a, b, |id| !graph.edges.is_removed(*id));

        let qa = graph.vertices.get(a).quadric;
        let qb = graph.vertices.get(b).quadric;
        let q_star = qa + qb;
        let v_pos = best_vertex_position(q_star, graph.vertices.position(a), graph.vertices.position(b));
        let v_star = graph.vertices.push(v_pos, q_star);

        let mut new_faces: Vec<FaceId> = Vec::with_capacity(distinct_faces.len());
        let mut valid = true;
        for &f in &distinct_faces {
            let old = graph.faces.get(f);
            let remap = |v: VertexId| if v == a || v == b { v_star } else { v };
            let (nv1, nv2, nv3) = (remap(old.v1), remap(old.v2), remap(old.v3));
            let candidate = graph.faces.push(nv1, nv2, nv3);

            if graph.faces.is_degenerate(candidate, &graph.vertices) {
                // one of the two faces that shared the collapsed edge; drop silently.
                continue;
            }
            let old_normal = graph.faces.normal(f, &graph.vertices);
            let new_normal = graph.faces.normal(candidate, &graph.vertices);
            if new_normal.dot(&old_normal) < EPSILON {
                valid = false;
                break;
            }
            new_faces.push(candidate);
        }
        if !valid {
            // p stays removed -- it is consumed regardless of outcome.
            continue;
        }

        graph.vertex_faces.remove(&a);
        graph.vertex_faces.remove(&b);
        for &f in &distinct_faces {
            graph.faces.mark_removed(f);
            num_faces -= 1;
        }
        for &f in &new_faces {
            let face = graph.faces.get(f);
            for v in [face.v1, face.v2, face.v3] {
                graph.vertex_faces.entry(v).or_default().push(f);
            }
            num_faces += 1;
        }

        graph.vertex_edges.remove(&a);
        graph.vertex_edges.remove(&b);
        let mut seen_far: AHashSet<Vec3> = AHashSet::default();
        for &q in &distinct_edges {
            graph.edges.mark_removed(q);

            let e = graph.edges.get(q);
            let remap = |v: VertexId| if v == a || v == b { v_star } else { v };
            let (na, nb) = (remap(e.a), remap(e.b));
            if na == v_star && nb == v_star {
                // the (A, B) self-edge after merging; already consumed as p.
                continue;
            }
            let far = if na == v_star { nb } else { na };
            let far_pos = graph.vertices.position(far);
            if !seen_far.insert(far_pos) {
                continue;
            }

            let new_edge = graph.edges.push(v_star, far, &graph.vertices);
            let err = graph.edges.error(new_edge, &graph.vertices);
            queue.push(new_edge, err);
            graph.vertex_edges.entry(v_star).or_default().push(new_edge);
            graph.vertex_edges.entry(far).or_default().push(new_edge);
        }
    }

    extract(&graph)
}

/// The union of `map[a]` and `map[b]`, filtered by `keep` and
/// deduplicated by identity.
fn incident<T, F>(map: &ahash::AHashMap<VertexId, Vec<T>>, a: VertexId, b: VertexId, keep: F) -> Vec<T>
where
    T: Copy + Eq + std::hash::Hash,
    F: Fn(&T) -> bool,
{
    let mut seen = AHashSet::new();
    let mut out = Vec::new();
    for id in map.get(&a).into_iter().flatten().chain(map.get(&b).into_iter().flatten()) {
        if keep(id) && seen.insert(*id) {
            out.push(*id);
        }
    }
    out
}

/// Walk every surviving face reachable from the incidence map and emit
/// one output triangle per distinct live face.
fn extract(graph: &Graph) -> Vec<Triangle> {
    let mut seen = AHashSet::new();
    let mut out = Vec::new();
    for faces in graph.vertex_faces.values() {
        for &f in faces {
            if !graph.faces.is_removed(f) && seen.insert(f) {
                let face = graph.faces.get(f);
                out.push(Triangle::new(
                    graph.vertices.position(face.v1),
                    graph.vertices.position(face.v2),
                    graph.vertices.position(face.v3),
                ));
            }
        }
    }
    out
}
