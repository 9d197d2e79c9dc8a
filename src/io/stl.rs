//! STL reader and writer for context geometry and sensor meshes.
//!
//! STL stores raw triangles only. Shared vertices are merged on read so the
//! resulting mesh is indexed.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::error::{GeometryKind, RadiationError};
use crate::geom::mesh::{Mesh, TriangleIndex};
use crate::{Point, Vector};

/// STL file format variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StlFormat {
    /// ASCII text format (human-readable, larger file size)
    Ascii,
    /// Binary format (compact, faster to read/write)
    Binary,
}

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

/// Writes the fan triangulation of a mesh to an STL file.
pub fn write_stl(path: &Path, mesh: &Mesh, name: &str, format: StlFormat) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let triangles = mesh.triangles();

    match format {
        StlFormat::Ascii => {
            writeln!(writer, "solid {}", name)?;
            for tri in &triangles {
                let (normal, pts) = facet(mesh, tri);
                writeln!(
                    writer,
                    "  facet normal {} {} {}",
                    normal.dx, normal.dy, normal.dz
                )?;
                writeln!(writer, "    outer loop")?;
                for p in pts {
                    writeln!(writer, "      vertex {} {} {}", p.x, p.y, p.z)?;
                }
                writeln!(writer, "    endloop")?;
                writeln!(writer, "  endfacet")?;
            }
            writeln!(writer, "endsolid {}", name)?;
        }
        StlFormat::Binary => {
            let mut header = [0u8; HEADER_LEN];
            let header_str = format!("binary STL - {}", name);
            let bytes = header_str.as_bytes();
            let len = bytes.len().min(HEADER_LEN);
            header[..len].copy_from_slice(&bytes[..len]);
            writer.write_all(&header)?;
            writer.write_all(&(triangles.len() as u32).to_le_bytes())?;

            for tri in &triangles {
                let (normal, pts) = facet(mesh, tri);
                for v in [normal.dx, normal.dy, normal.dz] {
                    writer.write_all(&(v as f32).to_le_bytes())?;
                }
                for p in pts {
                    for v in [p.x, p.y, p.z] {
                        writer.write_all(&(v as f32).to_le_bytes())?;
                    }
                }
                // Attribute byte count (unused)
                writer.write_all(&0u16.to_le_bytes())?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

fn facet(mesh: &Mesh, tri: &TriangleIndex) -> (Vector, [Point; 3]) {
    let p0 = mesh.vertices[tri.0];
    let p1 = mesh.vertices[tri.1];
    let p2 = mesh.vertices[tri.2];
    let normal = Vector::normal(p0, p1, p2).unwrap_or(Vector::new(0.0, 0.0, 1.0));
    (normal, [p0, p1, p2])
}

/// Reads triangles from an STL file (ASCII or binary) into a Mesh.
pub fn read_stl(path: &Path) -> Result<Mesh> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    parse_stl(&bytes).with_context(|| format!("Failed to parse STL: {}", path.display()))
}

/// Parses STL content. Binary files may also start with "solid", so the
/// size implied by the triangle count decides the format.
pub fn parse_stl(bytes: &[u8]) -> Result<Mesh> {
    if bytes.len() >= HEADER_LEN + 4 {
        let count = u32::from_le_bytes([
            bytes[HEADER_LEN],
            bytes[HEADER_LEN + 1],
            bytes[HEADER_LEN + 2],
            bytes[HEADER_LEN + 3],
        ]) as usize;
        if bytes.len() == HEADER_LEN + 4 + count * TRIANGLE_LEN {
            return parse_binary(bytes, count);
        }
    }
    let text = std::str::from_utf8(bytes).context("STL is neither binary nor ASCII")?;
    if !text.trim_start().starts_with("solid") {
        bail!("ASCII STL must start with 'solid'");
    }
    parse_ascii(text)
}

fn parse_ascii(text: &str) -> Result<Mesh> {
    let mut builder = MeshBuilder::default();
    let mut current: Vec<Point> = Vec::with_capacity(3);

    for (n, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("vertex") {
            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            if parts.len() < 4 {
                bail!("Incomplete vertex at line {}", n + 1);
            }
            let coord = |s: &str| -> Result<f64> {
                s.parse()
                    .with_context(|| format!("Invalid vertex coordinate at line {}", n + 1))
            };
            current.push(Point::new(coord(parts[1])?, coord(parts[2])?, coord(parts[3])?));
        } else if trimmed.starts_with("endloop") {
            if current.len() != 3 {
                bail!(
                    "Facet ending at line {} has {} vertices",
                    n + 1,
                    current.len()
                );
            }
            builder.push([current[0], current[1], current[2]])?;
            current.clear();
        }
    }
    Ok(builder.finish())
}

fn parse_binary(bytes: &[u8], count: usize) -> Result<Mesh> {
    let mut builder = MeshBuilder::default();
    let read_f32 = |at: usize| -> f64 {
        f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as f64
    };
    for i in 0..count {
        // Skip the 12-byte facet normal
        let base = HEADER_LEN + 4 + i * TRIANGLE_LEN + 12;
        let vertex = |k: usize| {
            let at = base + k * 12;
            Point::new(read_f32(at), read_f32(at + 4), read_f32(at + 8))
        };
        builder.push([vertex(0), vertex(1), vertex(2)])?;
    }
    Ok(builder.finish())
}

const STL_DEDUP_SCALE: f64 = 1e9;

/// Collects triangles and merges coincident vertices.
///
/// Non-finite vertices are rejected before merging since they have no
/// meaningful dedup key.
#[derive(Default)]
struct MeshBuilder {
    vertices: Vec<Point>,
    faces: Vec<Vec<usize>>,
    vertex_map: HashMap<(i64, i64, i64), usize>,
}

impl MeshBuilder {
    fn push(&mut self, tri: [Point; 3]) -> Result<()> {
        if let Some(p) = tri.iter().find(|p| !p.is_finite()) {
            return Err(RadiationError::geometry(
                GeometryKind::Context,
                self.faces.len(),
                format!("non-finite vertex {p:?}"),
            )
            .into());
        }
        let face = tri.iter().map(|p| self.vertex_index(*p)).collect();
        self.faces.push(face);
        Ok(())
    }

    fn vertex_index(&mut self, p: Point) -> usize {
        let key = (
            (p.x * STL_DEDUP_SCALE).round() as i64,
            (p.y * STL_DEDUP_SCALE).round() as i64,
            (p.z * STL_DEDUP_SCALE).round() as i64,
        );
        *self.vertex_map.entry(key).or_insert_with(|| {
            self.vertices.push(p);
            self.vertices.len() - 1
        })
    }

    fn finish(self) -> Mesh {
        Mesh::new(self.vertices, self.faces)
    }
}
