//! Quadric-error-metric triangle mesh simplification.
//!
//! The public surface is a single function, [`simplify::simplify`], that
//! reduces a flat triangle soup to approximately `factor * len` faces.
//! Everything else in this crate is either internal to that algorithm
//! (`geometry`, `mesh`, `graph`, `queue`) or an I/O collaborator at the
//! edge of the system (`stl`).

pub mod geometry;
pub mod graph;
pub mod mesh;
pub mod queue;
pub mod simplify;
pub mod stl;

pub use geometry::{Matrix, Triangle, Vec3};
pub use simplify::simplify as simplify_mesh;
