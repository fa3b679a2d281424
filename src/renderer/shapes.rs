//! Procedural meshes for the scenery and particles

use glam::Vec3;
use std::f32::consts::TAU;

use super::vertex::MeshVertex;
use crate::assets::ObjMesh;

/// Indexed triangle list ready for upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    fn push(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices
            .push(MeshVertex::new(position.to_array(), normal.to_array()));
        index
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Triangle soup from a parsed OBJ file
pub fn from_obj(mesh: &ObjMesh) -> MeshData {
    let vertices: Vec<MeshVertex> = mesh
        .positions
        .iter()
        .zip(&mesh.normals)
        .map(|(p, n)| MeshVertex::new(*p, *n))
        .collect();
    let indices = (0..vertices.len() as u32).collect();
    MeshData { vertices, indices }
}

/// Unit square in the XZ plane, facing +Y
pub fn plane() -> MeshData {
    let mut mesh = MeshData::default();
    let corners = [
        Vec3::new(-0.5, 0.0, -0.5),
        Vec3::new(-0.5, 0.0, 0.5),
        Vec3::new(0.5, 0.0, 0.5),
        Vec3::new(0.5, 0.0, -0.5),
    ];
    for c in corners {
        mesh.push(c, Vec3::Y);
    }
    mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
    mesh
}

/// Capped cylinder centred on the origin along Y. A zero top radius gives a cone.
pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let mut mesh = MeshData::default();
    let half = height * 0.5;
    // Normals lean outward by the taper
    let slope = (radius_bottom - radius_top) / height;

    for i in 0..segments {
        let t0 = i as f32 / segments as f32 * TAU;
        let t1 = (i + 1) as f32 / segments as f32 * TAU;
        let (s0, c0) = t0.sin_cos();
        let (s1, c1) = t1.sin_cos();
        let n0 = Vec3::new(s0, slope, c0).normalize();
        let n1 = Vec3::new(s1, slope, c1).normalize();

        let a = mesh.push(Vec3::new(s0 * radius_bottom, -half, c0 * radius_bottom), n0);
        let b = mesh.push(Vec3::new(s1 * radius_bottom, -half, c1 * radius_bottom), n1);
        let c = mesh.push(Vec3::new(s1 * radius_top, half, c1 * radius_top), n1);
        let d = mesh.push(Vec3::new(s0 * radius_top, half, c0 * radius_top), n0);
        mesh.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }

    cap(&mut mesh, radius_bottom, -half, segments, false);
    if radius_top > 0.0 {
        cap(&mut mesh, radius_top, half, segments, true);
    }
    mesh
}

fn cap(mesh: &mut MeshData, radius: f32, y: f32, segments: u32, up: bool) {
    let normal = if up { Vec3::Y } else { Vec3::NEG_Y };
    let centre = mesh.push(Vec3::new(0.0, y, 0.0), normal);
    let first = mesh.vertices.len() as u32;
    for i in 0..segments {
        let (s, c) = (i as f32 / segments as f32 * TAU).sin_cos();
        mesh.push(Vec3::new(s * radius, y, c * radius), normal);
    }
    for i in 0..segments {
        let a = first + i;
        let b = first + (i + 1) % segments;
        if up {
            mesh.indices.extend_from_slice(&[centre, a, b]);
        } else {
            mesh.indices.extend_from_slice(&[centre, b, a]);
        }
    }
}

/// Cone with its base at -height/2 and tip at +height/2
pub fn cone(radius: f32, height: f32, segments: u32) -> MeshData {
    cylinder(0.0, radius, height, segments)
}

/// Unit octahedron (used for particles)
pub fn octahedron() -> MeshData {
    let mut mesh = MeshData::default();
    let axes = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
    let faces = [
        (0, 2, 4),
        (2, 1, 4),
        (1, 3, 4),
        (3, 0, 4),
        (2, 0, 5),
        (1, 2, 5),
        (3, 1, 5),
        (0, 3, 5),
    ];
    for (a, b, c) in faces {
        let (pa, pb, pc) = (axes[a], axes[b], axes[c]);
        let normal = (pb - pa).cross(pc - pa).normalize();
        let i = mesh.push(pa, normal);
        mesh.push(pb, normal);
        mesh.push(pc, normal);
        mesh.indices.extend_from_slice(&[i, i + 1, i + 2]);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_outward(mesh: &MeshData) {
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| {
                Vec3::from_array(mesh.vertices[i as usize].position)
            });
            let face = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            // Counter-clockwise winding seen from outside
            assert!(face.dot(centroid) >= -1e-5, "inward face at {centroid:?}");
        }
    }

    #[test]
    fn test_plane() {
        let mesh = plane();
        assert_eq!(mesh.triangle_count(), 2);
        let a = Vec3::from_array(mesh.vertices[0].position);
        let b = Vec3::from_array(mesh.vertices[1].position);
        let c = Vec3::from_array(mesh.vertices[2].position);
        assert!((b - a).cross(c - a).y > 0.0);
    }

    #[test]
    fn test_cylinder_counts() {
        let mesh = cylinder(0.2, 0.5, 1.5, 8);
        // 8 side quads + 2 caps of 8
        assert_eq!(mesh.triangle_count(), 16 + 16);
        assert_outward(&mesh);
    }

    #[test]
    fn test_cone_has_no_top_cap() {
        let mesh = cone(0.2, 1.5, 8);
        assert_eq!(mesh.triangle_count(), 16 + 8);
        assert_outward(&mesh);
    }

    #[test]
    fn test_octahedron_faces_outward() {
        let mesh = octahedron();
        assert_eq!(mesh.triangle_count(), 8);
        assert_outward(&mesh);
        for v in &mesh.vertices {
            assert!((Vec3::from_array(v.normal).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_from_obj() {
        let obj = crate::assets::obj::parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let mesh = from_obj(&obj);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices[1].position, [1.0, 0.0, 0.0]);
    }
}
