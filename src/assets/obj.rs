//! Minimal Wavefront OBJ reader
//!
//! Only geometry is read: `v`, `vn` and `f`. Faces with more than three
//! corners are fan-triangulated. Texture coordinates, groups and materials
//! are skipped.

use glam::Vec3;
use thiserror::Error;

/// Problems found while parsing an OBJ file
#[derive(Debug, Error, PartialEq)]
pub enum ObjError {
    #[error("line {line}: expected a number, found {token:?}")]
    BadNumber { line: usize, token: String },
    #[error("line {line}: {keyword} needs {expected} components")]
    MissingComponent {
        line: usize,
        keyword: &'static str,
        expected: usize,
    },
    #[error("line {line}: face needs at least 3 vertices, got {count}")]
    DegenerateFace { line: usize, count: usize },
    #[error("line {line}: index {index} out of range (have {len})")]
    IndexOutOfRange { line: usize, index: i64, len: usize },
    #[error("no faces found")]
    Empty,
}

/// Triangle soup: every three vertices form a triangle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
}

impl ObjMesh {
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }
}

#[derive(Clone, Copy)]
struct Corner {
    position: usize,
    normal: Option<usize>,
}

/// Parse OBJ text into a triangle list
pub fn parse(source: &str) -> Result<ObjMesh, ObjError> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut mesh = ObjMesh::default();

    for (i, raw) in source.lines().enumerate() {
        let line = i + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        let mut tokens = content.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            "v" => positions.push(parse_vec3(&mut tokens, line, "v")?),
            "vn" => normals.push(parse_vec3(&mut tokens, line, "vn")?),
            "f" => {
                let corners = tokens
                    .map(|t| parse_corner(t, line, positions.len(), normals.len()))
                    .collect::<Result<Vec<_>, _>>()?;
                if corners.len() < 3 {
                    return Err(ObjError::DegenerateFace {
                        line,
                        count: corners.len(),
                    });
                }
                for k in 1..corners.len() - 1 {
                    push_triangle(
                        &mut mesh,
                        &positions,
                        &normals,
                        [corners[0], corners[k], corners[k + 1]],
                    );
                }
            }
            _ => {}
        }
    }

    if mesh.positions.is_empty() {
        return Err(ObjError::Empty);
    }
    Ok(mesh)
}

fn parse_vec3<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line: usize,
    keyword: &'static str,
) -> Result<Vec3, ObjError> {
    let mut out = [0.0f32; 3];
    for slot in &mut out {
        let token = tokens.next().ok_or(ObjError::MissingComponent {
            line,
            keyword,
            expected: 3,
        })?;
        *slot = token.parse().map_err(|_| ObjError::BadNumber {
            line,
            token: token.to_string(),
        })?;
    }
    Ok(Vec3::from_array(out))
}

/// Resolve a 1-based (or negative, relative) OBJ index
fn resolve_index(raw: &str, line: usize, len: usize) -> Result<usize, ObjError> {
    let index: i64 = raw.parse().map_err(|_| ObjError::BadNumber {
        line,
        token: raw.to_string(),
    })?;
    let resolved = if index < 0 {
        len as i64 + index
    } else {
        index - 1
    };
    if resolved < 0 || resolved >= len as i64 {
        return Err(ObjError::IndexOutOfRange { line, index, len });
    }
    Ok(resolved as usize)
}

fn parse_corner(
    token: &str,
    line: usize,
    position_count: usize,
    normal_count: usize,
) -> Result<Corner, ObjError> {
    // v, v/vt, v//vn, v/vt/vn
    let mut parts = token.split('/');
    let position = resolve_index(parts.next().unwrap_or(""), line, position_count)?;
    let _texcoord = parts.next();
    let normal = match parts.next() {
        Some(n) if !n.is_empty() => Some(resolve_index(n, line, normal_count)?),
        _ => None,
    };
    Ok(Corner { position, normal })
}

fn push_triangle(mesh: &mut ObjMesh, positions: &[Vec3], normals: &[Vec3], tri: [Corner; 3]) {
    let [a, b, c] = tri.map(|corner| positions[corner.position]);
    let flat = (b - a).cross(c - a).normalize_or(Vec3::Y);

    for corner in tri {
        let normal = corner
            .normal
            .map(|n| normals[n].normalize_or(flat))
            .unwrap_or(flat);
        mesh.positions.push(positions[corner.position].to_array());
        mesh.normals.push(normal.to_array());
    }
}
