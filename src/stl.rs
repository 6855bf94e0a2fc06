//! STL exchange: the core's only required file format, per spec section
//! 6. Binary and ASCII readers hand back a flat triangle soup (stored
//! normals are discarded, the engine only trusts positions); the writer
//! recomputes normals from the emitted geometry at write time.

use anyhow::{anyhow, Result};
use rayon::prelude::*;

use crate::geometry::{Triangle, Vec3};

const HEADER_SIZE: usize = 84;
const TRIANGLE_SIZE: usize = 12 * 4 + 2;
const WRITER_SIGNATURE: &str = "mesh-simplify";

#[repr(C, packed)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct RawStlTriangle {
    normal: [f32; 3],
    vertices: [f32; 9],
    attribute: u16,
}

/// Parse a binary STL file: an 80-byte header, a little-endian `u32`
/// triangle count, then one bit-exact 50-byte record per triangle.
pub fn read_binary(bytes: &[u8]) -> Result<Vec<Triangle>> {
    if bytes.len() < HEADER_SIZE {
        return Err(anyhow!("STL file too short: {} bytes", bytes.len()));
    }
    let count = u32::from_le_bytes(bytes[80..84].try_into().unwrap()) as usize;

    let body = &bytes[HEADER_SIZE..];
    let expected = count * TRIANGLE_SIZE;
    if body.len() < expected {
        return Err(anyhow!(
            "STL header claims {} triangles but only {} bytes follow",
            count,
            body.len()
        ));
    }

    let raw: &[RawStlTriangle] = bytemuck::try_cast_slice(&body[..expected])
        .map_err(|_| anyhow!("could not interpret STL body as triangle records"))?;

    Ok(raw
        .iter()
        .map(|t| {
            let v = t.vertices;
            Triangle::new(
                Vec3::new(v[0] as f64, v[1] as f64, v[2] as f64),
                Vec3::new(v[3] as f64, v[4] as f64, v[5] as f64),
                Vec3::new(v[6] as f64, v[7] as f64, v[8] as f64),
            )
        })
        .collect())
}

/// Parse an ASCII STL file: every `vertex x y z` line is one position,
/// every three consecutive ones form a triangle. `facet`/`outer loop`/
/// `endloop` keywords and stored normals are not validated or trusted.
pub fn read_ascii(text: &str) -> Result<Vec<Triangle>> {
    let mut positions = Vec::new();
    for line in text.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() == 4 && fields[0] == "vertex" {
            let x: f64 = fields[1].parse().map_err(|_| anyhow!("bad vertex x: {}", fields[1]))?;
            let y: f64 = fields[2].parse().map_err(|_| anyhow!("bad vertex y: {}", fields[2]))?;
            let z: f64 = fields[3].parse().map_err(|_| anyhow!("bad vertex z: {}", fields[3]))?;
            positions.push(Vec3::new(x, y, z));
        }
    }
    if positions.len() % 3 != 0 {
        return Err(anyhow!(
            "ASCII STL has {} vertex lines, not a multiple of 3",
            positions.len()
        ));
    }
    Ok(positions
        .chunks_exact(3)
        .map(|c| Triangle::new(c[0], c[1], c[2]))
        .collect())
}

/// Dispatch on a file's extension, case- and dot-insensitively.
pub fn read_auto(path: &std::path::Path, bytes: &[u8]) -> Result<Vec<Triangle>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "stl" => {
            // binary STL has no required magic bytes; an ASCII file
            // conventionally starts with "solid", but some binary
            // writers embed that word in their 80-byte header too, so
            // the binary reader's length/arithmetic check is the
            // authoritative signal. Prefer it, fall back to ASCII.
            read_binary(bytes).or_else(|_| read_ascii(&String::from_utf8_lossy(bytes)))
        }
        other => Err(anyhow!("unsupported file extension: `{}`", other)),
    }
}

/// Write a binary STL file, recomputing each triangle's normal from its
/// emitted positions (the core never tracks or trusts input normals).
pub fn write_binary(path: &std::path::Path, triangles: &[Triangle]) -> Result<()> {
    let mut header = [0u8; 80];
    let sig = WRITER_SIGNATURE.as_bytes();
    header[..sig.len().min(80)].copy_from_slice(&sig[..sig.len().min(80)]);

    let mut out = Vec::with_capacity(HEADER_SIZE + triangles.len() * TRIANGLE_SIZE);
    out.extend_from_slice(&header);
    out.extend_from_slice(&(triangles.len() as u32).to_le_bytes());

    let records: Vec<RawStlTriangle> = triangles
        .par_iter()
        .map(|t| {
            let n = t.normal();
            RawStlTriangle {
                normal: [n.x as f32, n.y as f32, n.z as f32],
                vertices: [
                    t.v1.x as f32, t.v1.y as f32, t.v1.z as f32,
                    t.v2.x as f32, t.v2.y as f32, t.v2.z as f32,
                    t.v3.x as f32, t.v3.y as f32, t.v3.z as f32,
                ],
                attribute: 0,
            }
        })
        .collect();

    for r in &records {
        out.extend_from_slice(bytemuck::bytes_of(r));
    }

    std::fs::write(path, out).map_err(|e| anyhow!("writing {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Triangle> {
        vec![
            Triangle::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
            Triangle::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
        ]
    }

    #[test]
    fn binary_round_trip_preserves_count_and_positions() {
        let dir = std::env::temp_dir();
        let path = dir.join("mesh_simplify_roundtrip_test.stl");
        let input = sample();
        write_binary(&path, &input).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let out = read_binary(&bytes).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(out.len(), input.len());
        for (a, b) in input.iter().zip(out.iter()) {
            assert!((a.v1.x - b.v1.x).abs() < 1e-5);
            assert!((a.v1.y - b.v1.y).abs() < 1e-5);
            assert!((a.v3.z - b.v3.z).abs() < 1e-5);
        }
    }

    #[test]
    fn ascii_reader_parses_vertex_lines() {
        let text = r#"
solid test
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 1 0 0
vertex 0 1 0
endloop
endfacet
endsolid test
"#;
        let out = read_ascii(text).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].v2.x, 1.0);
    }

    #[test]
    fn binary_reader_rejects_truncated_file() {
        let bytes = vec![0u8; 10];
        assert!(read_binary(&bytes).is_err());
    }
}
