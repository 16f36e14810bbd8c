//! OBJ mesh import

use anyhow::{Context, Result, bail};
use glam::{Vec2, Vec3};
use hashbrown::HashMap;
use page_common::{Face, PolyMesh, Vertex};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One face corner: position, optional texcoord and normal (0-based)
pub type Corner = (u32, Option<u32>, Option<u32>);

/// Raw OBJ contents before corners are welded into vertices
#[derive(Debug, Default)]
pub struct ObjData {
    pub positions: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    pub faces: Vec<Vec<Corner>>,
}

impl ObjData {
    /// Weld corners into vertices
    ///
    /// Corners sharing the same `(v, vt, vn)` triple become one vertex, so
    /// a position on a UV or normal seam is split into one vertex per side.
    pub fn to_poly_mesh(&self) -> PolyMesh {
        let mut welded: HashMap<Corner, u32> = HashMap::new();
        let mut vertices = Vec::new();
        let mut faces = Vec::with_capacity(self.faces.len());

        for corners in &self.faces {
            let face = corners
                .iter()
                .map(|&corner| {
                    *welded.entry(corner).or_insert_with(|| {
                        let (v, vt, vn) = corner;
                        let mut vertex = Vertex::new(self.positions[v as usize]);
                        if let Some(vt) = vt {
                            vertex.uv = self.tex_coords[vt as usize];
                        }
                        if let Some(vn) = vn {
                            vertex.normal = self.normals[vn as usize];
                        }
                        vertices.push(vertex);
                        (vertices.len() - 1) as u32
                    })
                })
                .collect();
            faces.push(Face::new(face));
        }

        PolyMesh::new(vertices, faces)
    }

    /// Face position indices, ignoring texcoords and normals
    pub fn position_faces(&self) -> Vec<Vec<u32>> {
        self.faces
            .iter()
            .map(|corners| corners.iter().map(|c| c.0).collect())
            .collect()
    }
}

/// Parse an OBJ file from disk
pub fn parse_obj_file(input: &Path) -> Result<ObjData> {
    let file = File::open(input).with_context(|| format!("Failed to open OBJ: {:?}", input))?;
    parse_obj(BufReader::new(file)).with_context(|| format!("Failed to parse OBJ: {:?}", input))
}

/// Parse OBJ text
///
/// Only `v`, `vt`, `vn` and `f` statements are used; everything else
/// (groups, materials, smoothing) is skipped.
pub fn parse_obj(reader: impl BufRead) -> Result<ObjData> {
    let mut obj = ObjData::default();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let line_number = number + 1;

        match parts[0] {
            "v" => {
                obj.positions.push(Vec3::from_array(parse_floats(&parts[1..], line_number)?));
            }
            "vt" => {
                obj.tex_coords.push(Vec2::from_array(parse_floats(&parts[1..], line_number)?));
            }
            "vn" => {
                obj.normals.push(Vec3::from_array(parse_floats(&parts[1..], line_number)?));
            }
            "f" => {
                let corners = parts[1..]
                    .iter()
                    .map(|s| parse_corner(s, &obj, line_number))
                    .collect::<Result<Vec<_>>>()?;
                obj.faces.push(corners);
            }
            _ => {}
        }
    }

    if obj.positions.is_empty() {
        bail!("No vertices found in OBJ file");
    }

    Ok(obj)
}

/// First `N` numbers of a statement; extra components (w) are ignored
fn parse_floats<const N: usize>(parts: &[&str], line: usize) -> Result<[f32; N]> {
    if parts.len() < N {
        bail!(
            "Line {}: expected {} components, found {}",
            line,
            N,
            parts.len()
        );
    }
    let mut values = [0.0f32; N];
    for (value, part) in values.iter_mut().zip(parts) {
        *value = part
            .parse()
            .with_context(|| format!("Line {}: invalid number '{}'", line, part))?;
    }
    Ok(values)
}

/// Parse a corner reference: "v", "v/vt", "v/vt/vn" or "v//vn"
fn parse_corner(s: &str, obj: &ObjData, line: usize) -> Result<Corner> {
    let mut parts = s.split('/');

    let v = match parts.next() {
        Some(p) if !p.is_empty() => resolve_index(p, obj.positions.len(), "position", line)?,
        _ => bail!("Line {}: face corner '{}' has no position", line, s),
    };
    let vt = match parts.next() {
        Some(p) if !p.is_empty() => {
            Some(resolve_index(p, obj.tex_coords.len(), "texcoord", line)?)
        }
        _ => None,
    };
    let vn = match parts.next() {
        Some(p) if !p.is_empty() => Some(resolve_index(p, obj.normals.len(), "normal", line)?),
        _ => None,
    };

    Ok((v, vt, vn))
}

/// Resolve a 1-based (or negative, relative) OBJ index against `count`
/// elements read so far
fn resolve_index(s: &str, count: usize, what: &str, line: usize) -> Result<u32> {
    let raw: i64 = s
        .parse()
        .with_context(|| format!("Line {}: invalid {} index '{}'", line, what, s))?;
    let index = if raw < 0 { count as i64 + raw } else { raw - 1 };
    if raw == 0 || index < 0 || index >= count as i64 {
        bail!(
            "Line {}: {} index {} out of range ({} defined)",
            line,
            what,
            raw,
            count
        );
    }
    Ok(index as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl none
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_parse_quad() {
        let obj = parse_obj(QUAD.as_bytes()).unwrap();
        assert_eq!(obj.positions.len(), 4);
        assert_eq!(obj.tex_coords.len(), 4);
        assert_eq!(obj.faces, vec![vec![
            (0, Some(0), Some(0)),
            (1, Some(1), Some(0)),
            (2, Some(2), Some(0)),
            (3, Some(3), Some(0)),
        ]]);

        let poly = obj.to_poly_mesh();
        assert_eq!(poly.vertices.len(), 4);
        assert_eq!(poly.faces, vec![Face::new(vec![0, 1, 2, 3])]);
        assert_eq!(poly.vertices[2].uv, Vec2::new(1.0, 1.0));
        assert_eq!(poly.vertices[2].normal, Vec3::Z);
    }

    #[test]
    fn test_seams_split_vertices() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
v 1 1 0
vt 0 0
vt 0.5 0
f 1/1 2/1 3/1
f 2/2 4/1 3/1
";
        let poly = parse_obj(text.as_bytes()).unwrap().to_poly_mesh();
        // Position 2 appears with two different texcoords
        assert_eq!(poly.vertices.len(), 5);
        assert_eq!(poly.faces[1], Face::new(vec![3, 4, 2]));
    }

    #[test]
    fn test_negative_indices() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let obj = parse_obj(text.as_bytes()).unwrap();
        assert_eq!(obj.position_faces(), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_rejects_bad_index() {
        let text = "v 0 0 0\nv 1 0 0\nf 1 2 3\n";
        let err = parse_obj(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{}", err);

        let text = "v 0 0 0\nf 0 1 1\n";
        assert!(parse_obj(text.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_short_vertex_lines() {
        let text = "v 0 0 0\nv 1 0\nv 0 1 0\nf 1 2 3\n";
        let err = parse_obj(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Line 2"), "{}", err);

        assert!(parse_obj("v 0 0 0\nvt 0.5\n".as_bytes()).is_err());
        assert!(parse_obj("v 0 0 0\nvn 0 1\n".as_bytes()).is_err());
        // A w component is allowed
        assert!(parse_obj("v 0 0 0 1\n".as_bytes()).is_ok());
    }

    #[test]
    fn test_rejects_empty() {
        assert!(parse_obj("# nothing\n".as_bytes()).is_err());
    }
}
