//! Mesh primitives: vertices, faces and edges as they live inside the
//! three append-only arenas the collapse loop mutates through.
//!
//! Every cross-reference is an index into its arena rather than a
//! pointer, per the arena/index pattern: no object is ever freed mid-run,
//! retirement is the `removed` flag, and incidence maps are allowed to
//! hold stale entries because every reader filters them out.

use std::cell::Cell;

use crate::geometry::{Matrix, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub u32);

pub struct Vertex {
    pub position: Vec3,
    pub quadric: Matrix,
}

pub struct Face {
    pub v1: VertexId,
    pub v2: VertexId,
    pub v3: VertexId,
    pub removed: Cell<bool>,
}

pub struct Edge {
    pub a: VertexId,
    pub b: VertexId,
    pub removed: Cell<bool>,
    cached_error: Cell<Option<f64>>,
}

/// The vertex arena. Positions inserted during `build()` occupy a fixed
/// prefix; collapse-generated replacement vertices are appended as the
/// loop runs and live until `simplify` returns.
#[derive(Default)]
pub struct VertexArena {
    vertices: Vec<Vertex>,
}

impl VertexArena {
    pub fn push(&mut self, position: Vec3, quadric: Matrix) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Vertex { position, quadric });
        id
    }

    pub fn get(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id.0 as usize]
    }

    pub fn position(&self, id: VertexId) -> Vec3 {
        self.vertices[id.0 as usize].position
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }
}

#[derive(Default)]
pub struct FaceArena {
    faces: Vec<Face>,
}

impl FaceArena {
    pub fn push(&mut self, v1: VertexId, v2: VertexId, v3: VertexId) -> FaceId {
        let id = FaceId(self.faces.len() as u32);
        self.faces.push(Face {
            v1,
            v2,
            v3,
            removed: Cell::new(false),
        });
        id
    }

    pub fn get(&self, id: FaceId) -> &Face {
        &self.faces[id.0 as usize]
    }

    pub fn is_removed(&self, id: FaceId) -> bool {
        self.faces[id.0 as usize].removed.get()
    }

    pub fn mark_removed(&self, id: FaceId) {
        self.faces[id.0 as usize].removed.set(true);
    }

    /// Whether two of the face's three vertices share a (epsilon-tolerant)
    /// position -- a zero-area triangle with no meaningful normal.
    pub fn is_degenerate(&self, id: FaceId, vertices: &VertexArena) -> bool {
        let f = self.get(id);
        let p1 = vertices.position(f.v1);
        let p2 = vertices.position(f.v2);
        let p3 = vertices.position(f.v3);
        p1 == p2 || p1 == p3 || p2 == p3
    }

    pub fn normal(&self, id: FaceId, vertices: &VertexArena) -> Vec3 {
        let f = self.get(id);
        let p1 = vertices.position(f.v1);
        let p2 = vertices.position(f.v2);
        let p3 = vertices.position(f.v3);
        (p2 - p1).cross(&(p3 - p1)).normalize()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }
}

/// The ordered pair (min, max) of the two endpoint positions under
/// `Vec3`'s strict lex order, used only to dedup the three edges of each
/// triangle while the initial edge set is built.
pub type PairKey = (Vec3, Vec3);

pub fn pair_key(a: Vec3, b: Vec3) -> PairKey {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Default)]
pub struct EdgeArena {
    edges: Vec<Edge>,
}

impl EdgeArena {
    /// Construct and push a new edge, canonicalizing so that
    /// `vertices[a].position <= vertices[b].position`.
    pub fn push(&mut self, a: VertexId, b: VertexId, vertices: &VertexArena) -> EdgeId {
        let (a, b) = if vertices.position(a) <= vertices.position(b) {
            (a, b)
        } else {
            (b, a)
        };
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            a,
            b,
            removed: Cell::new(false),
            cached_error: Cell::new(None),
        });
        id
    }

    pub fn get(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0 as usize]
    }

    pub fn is_removed(&self, id: EdgeId) -> bool {
        self.edges[id.0 as usize].removed.get()
    }

    pub fn mark_removed(&self, id: EdgeId) {
        self.edges[id.0 as usize].removed.set(true);
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// The cached quadric error for this edge, computing it on first
    /// access. The comparator calls through this, so no separate
    /// "dirty" tracking is needed -- an edge's error is only ever read
    /// after the edge is fully constructed.
    pub fn error(&self, id: EdgeId, vertices: &VertexArena) -> f64 {
        let e = self.get(id);
        if let Some(cached) = e.cached_error.get() {
            return cached;
        }
        let q = vertices.get(e.a).quadric + vertices.get(e.b).quadric;
        let v = crate::simplify::best_vertex_position(q, vertices.position(e.a), vertices.position(e.b));
        let err = q.quadric_error(v);
        e.cached_error.set(Some(err));
        err
    }
}
