//! Procedural primitive mesh generation for scene geometry and prizes.
//!
//! All builders produce CPU-side [`MeshData`]; GPU upload happens in the
//! renderer. Curved shapes carry analytic smooth normals, polyhedra are
//! flat shaded with one vertex per face corner.

use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// Vertex with position and normal.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShapeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl ShapeVertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
        }
    }
}

/// CPU-side mesh ready for upload.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<ShapeVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Build a flat-shaded mesh from shared positions and a triangle
    /// index list. Each triangle gets its own three vertices carrying
    /// the face normal.
    pub fn flat_shaded(positions: &[Vec3], triangles: &[[u32; 3]]) -> Self {
        let mut mesh = MeshData::default();
        for tri in triangles {
            let [a, b, c] = [
                positions[tri[0] as usize],
                positions[tri[1] as usize],
                positions[tri[2] as usize],
            ];
            let normal = (b - a).cross(c - a).normalize_or_zero();
            let base = mesh.vertices.len() as u32;
            mesh.vertices.push(ShapeVertex::new(a, normal));
            mesh.vertices.push(ShapeVertex::new(b, normal));
            mesh.vertices.push(ShapeVertex::new(c, normal));
            mesh.indices.extend([base, base + 1, base + 2]);
        }
        mesh
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Axis-aligned box, flat shaded.
pub fn cuboid(half_extents: Vec3) -> MeshData {
    let h = half_extents;
    let mut mesh = MeshData::default();
    // (normal, four corners counter-clockwise when viewed from outside)
    let faces: [(Vec3, [Vec3; 4]); 6] = [
        (
            Vec3::X,
            [
                Vec3::new(h.x, -h.y, -h.z),
                Vec3::new(h.x, h.y, -h.z),
                Vec3::new(h.x, h.y, h.z),
                Vec3::new(h.x, -h.y, h.z),
            ],
        ),
        (
            -Vec3::X,
            [
                Vec3::new(-h.x, -h.y, h.z),
                Vec3::new(-h.x, h.y, h.z),
                Vec3::new(-h.x, h.y, -h.z),
                Vec3::new(-h.x, -h.y, -h.z),
            ],
        ),
        (
            Vec3::Y,
            [
                Vec3::new(-h.x, h.y, -h.z),
                Vec3::new(-h.x, h.y, h.z),
                Vec3::new(h.x, h.y, h.z),
                Vec3::new(h.x, h.y, -h.z),
            ],
        ),
        (
            -Vec3::Y,
            [
                Vec3::new(-h.x, -h.y, h.z),
                Vec3::new(-h.x, -h.y, -h.z),
                Vec3::new(h.x, -h.y, -h.z),
                Vec3::new(h.x, -h.y, h.z),
            ],
        ),
        (
            Vec3::Z,
            [
                Vec3::new(-h.x, -h.y, h.z),
                Vec3::new(h.x, -h.y, h.z),
                Vec3::new(h.x, h.y, h.z),
                Vec3::new(-h.x, h.y, h.z),
            ],
        ),
        (
            -Vec3::Z,
            [
                Vec3::new(h.x, -h.y, -h.z),
                Vec3::new(-h.x, -h.y, -h.z),
                Vec3::new(-h.x, h.y, -h.z),
                Vec3::new(h.x, h.y, -h.z),
            ],
        ),
    ];
    for (normal, corners) in faces {
        let base = mesh.vertices.len() as u32;
        for corner in corners {
            mesh.vertices.push(ShapeVertex::new(corner, normal));
        }
        mesh.indices
            .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// Flat horizontal quad facing +Y, centered at the origin.
pub fn plane(half_x: f32, half_z: f32) -> MeshData {
    let mut mesh = MeshData::default();
    let corners = [
        Vec3::new(-half_x, 0.0, -half_z),
        Vec3::new(-half_x, 0.0, half_z),
        Vec3::new(half_x, 0.0, half_z),
        Vec3::new(half_x, 0.0, -half_z),
    ];
    for corner in corners {
        mesh.vertices.push(ShapeVertex::new(corner, Vec3::Y));
    }
    mesh.indices.extend([0, 1, 2, 0, 2, 3]);
    mesh
}

/// Longitude/latitude sphere with smooth normals.
pub fn uv_sphere(radius: f32, sectors: u32, stacks: u32) -> MeshData {
    let mut mesh = MeshData::default();
    for stack in 0..=stacks {
        let phi = PI * stack as f32 / stacks as f32;
        for sector in 0..=sectors {
            let theta = TAU * sector as f32 / sectors as f32;
            let normal = Vec3::new(
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            );
            mesh.vertices.push(ShapeVertex::new(normal * radius, normal));
        }
    }
    let ring = sectors + 1;
    for stack in 0..stacks {
        for sector in 0..sectors {
            let a = stack * ring + sector;
            let b = a + ring;
            // Pole rows collapse one edge of the quad; emitting the
            // degenerate half would leave slivers with unstable winding
            if stack != 0 {
                mesh.indices.extend([a, a + 1, b]);
            }
            if stack != stacks - 1 {
                mesh.indices.extend([a + 1, b + 1, b]);
            }
        }
    }
    mesh
}

/// Capped cylinder standing on the XZ plane, centered at the origin.
pub fn cylinder(radius: f32, height: f32, segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let half = height / 2.0;

    // Side with smooth radial normals
    for seg in 0..=segments {
        let theta = TAU * seg as f32 / segments as f32;
        let normal = Vec3::new(theta.cos(), 0.0, theta.sin());
        let rim = normal * radius;
        mesh.vertices
            .push(ShapeVertex::new(rim + Vec3::Y * half, normal));
        mesh.vertices
            .push(ShapeVertex::new(rim - Vec3::Y * half, normal));
    }
    for seg in 0..segments {
        let a = seg * 2;
        mesh.indices.extend([a, a + 2, a + 1, a + 2, a + 3, a + 1]);
    }

    // Caps
    for (y, normal) in [(half, Vec3::Y), (-half, -Vec3::Y)] {
        let center = mesh.vertices.len() as u32;
        mesh.vertices
            .push(ShapeVertex::new(Vec3::new(0.0, y, 0.0), normal));
        for seg in 0..=segments {
            let theta = TAU * seg as f32 / segments as f32;
            mesh.vertices.push(ShapeVertex::new(
                Vec3::new(radius * theta.cos(), y, radius * theta.sin()),
                normal,
            ));
        }
        for seg in 0..segments {
            let a = center + 1 + seg;
            if normal.y > 0.0 {
                mesh.indices.extend([center, a + 1, a]);
            } else {
                mesh.indices.extend([center, a, a + 1]);
            }
        }
    }
    mesh
}

/// Cone with its apex up and a circular base cap.
pub fn cone(radius: f32, height: f32, segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let half = height / 2.0;
    let apex = Vec3::new(0.0, half, 0.0);
    let slope = radius / height;

    // Slanted side, one apex vertex per segment so normals stay sane
    for seg in 0..=segments {
        let theta = TAU * seg as f32 / segments as f32;
        let dir = Vec3::new(theta.cos(), 0.0, theta.sin());
        let normal = (dir + Vec3::Y * slope).normalize();
        mesh.vertices
            .push(ShapeVertex::new(dir * radius - Vec3::Y * half, normal));
        mesh.vertices.push(ShapeVertex::new(apex, normal));
    }
    for seg in 0..segments {
        let a = seg * 2;
        mesh.indices.extend([a, a + 1, a + 2]);
    }

    // Base cap
    let center = mesh.vertices.len() as u32;
    mesh.vertices
        .push(ShapeVertex::new(Vec3::new(0.0, -half, 0.0), -Vec3::Y));
    for seg in 0..=segments {
        let theta = TAU * seg as f32 / segments as f32;
        mesh.vertices.push(ShapeVertex::new(
            Vec3::new(radius * theta.cos(), -half, radius * theta.sin()),
            -Vec3::Y,
        ));
    }
    for seg in 0..segments {
        let a = center + 1 + seg;
        mesh.indices.extend([center, a, a + 1]);
    }
    mesh
}

/// Torus around the Y axis with smooth normals.
pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    for j in 0..=radial_segments {
        let v = TAU * j as f32 / radial_segments as f32;
        for i in 0..=tubular_segments {
            let u = TAU * i as f32 / tubular_segments as f32;
            let center = Vec3::new(radius * u.cos(), 0.0, radius * u.sin());
            let normal =
                Vec3::new(v.cos() * u.cos(), v.sin(), v.cos() * u.sin()).normalize();
            mesh.vertices
                .push(ShapeVertex::new(center + normal * tube, normal));
        }
    }
    let ring = tubular_segments + 1;
    for j in 0..radial_segments {
        for i in 0..tubular_segments {
            let a = j * ring + i;
            let b = a + ring;
            mesh.indices.extend([a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    mesh
}

/// (p, q) torus knot tube. `p` windings around the axis of symmetry,
/// `q` through the hole.
pub fn torus_knot(
    radius: f32,
    tube: f32,
    tubular_segments: u32,
    radial_segments: u32,
    p: f32,
    q: f32,
) -> MeshData {
    let curve = |t: f32| -> Vec3 {
        let r = radius * (2.0 + (q * t).cos()) * 0.5;
        Vec3::new(r * (p * t).cos(), radius * (q * t).sin() * 0.5, r * (p * t).sin())
    };

    let mut mesh = MeshData::default();
    for i in 0..=tubular_segments {
        let t = TAU * i as f32 / tubular_segments as f32;
        let center = curve(t);
        let tangent = (curve(t + 0.01) - center).normalize();
        // Frame from the tangent; the curve never runs parallel to Y+X
        let bitangent = tangent.cross(center + Vec3::Y).normalize();
        let side = tangent.cross(bitangent).normalize();
        for j in 0..=radial_segments {
            let v = TAU * j as f32 / radial_segments as f32;
            let normal = (side * v.cos() + bitangent * v.sin()).normalize();
            mesh.vertices
                .push(ShapeVertex::new(center + normal * tube, normal));
        }
    }
    let ring = radial_segments + 1;
    for i in 0..tubular_segments {
        for j in 0..radial_segments {
            let a = i * ring + j;
            let b = a + ring;
            mesh.indices.extend([a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    mesh
}

/// Regular tetrahedron circumscribed by `radius`, flat shaded.
pub fn tetrahedron(radius: f32) -> MeshData {
    let positions: Vec<Vec3> = [
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
    ]
    .iter()
    .map(|p| p.normalize() * radius)
    .collect();
    let triangles = [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];
    MeshData::flat_shaded(&positions, &triangles)
}

/// Regular octahedron circumscribed by `radius`, flat shaded.
pub fn octahedron(radius: f32) -> MeshData {
    let positions = [
        Vec3::X * radius,
        -Vec3::X * radius,
        Vec3::Y * radius,
        -Vec3::Y * radius,
        Vec3::Z * radius,
        -Vec3::Z * radius,
    ];
    let triangles = [
        [2, 4, 0],
        [2, 0, 5],
        [2, 5, 1],
        [2, 1, 4],
        [3, 0, 4],
        [3, 5, 0],
        [3, 1, 5],
        [3, 4, 1],
    ];
    MeshData::flat_shaded(&positions, &triangles)
}

fn icosahedron_raw(radius: f32) -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let positions: Vec<Vec3> = [
        Vec3::new(-1.0, phi, 0.0),
        Vec3::new(1.0, phi, 0.0),
        Vec3::new(-1.0, -phi, 0.0),
        Vec3::new(1.0, -phi, 0.0),
        Vec3::new(0.0, -1.0, phi),
        Vec3::new(0.0, 1.0, phi),
        Vec3::new(0.0, -1.0, -phi),
        Vec3::new(0.0, 1.0, -phi),
        Vec3::new(phi, 0.0, -1.0),
        Vec3::new(phi, 0.0, 1.0),
        Vec3::new(-phi, 0.0, -1.0),
        Vec3::new(-phi, 0.0, 1.0),
    ]
    .iter()
    .map(|p| p.normalize() * radius)
    .collect();
    let triangles = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    (positions, triangles)
}

/// Regular icosahedron circumscribed by `radius`, flat shaded.
pub fn icosahedron(radius: f32) -> MeshData {
    let (positions, triangles) = icosahedron_raw(radius);
    MeshData::flat_shaded(&positions, &triangles)
}

/// Regular dodecahedron circumscribed by `radius`, flat shaded.
///
/// Built as the dual of the icosahedron: face centroids become the
/// twenty vertices, and the five faces around each icosahedron vertex
/// become a pentagon.
pub fn dodecahedron(radius: f32) -> MeshData {
    let (icosa_positions, icosa_faces) = icosahedron_raw(1.0);
    let centroids: Vec<Vec3> = icosa_faces
        .iter()
        .map(|f| {
            let c = (icosa_positions[f[0] as usize]
                + icosa_positions[f[1] as usize]
                + icosa_positions[f[2] as usize])
                / 3.0;
            c.normalize() * radius
        })
        .collect();

    let mut triangles: Vec<[u32; 3]> = Vec::new();
    for (vi, vertex) in icosa_positions.iter().enumerate() {
        let axis = vertex.normalize();
        // Faces touching this vertex form one pentagon
        let mut corners: Vec<u32> = icosa_faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.contains(&(vi as u32)))
            .map(|(fi, _)| fi as u32)
            .collect();
        debug_assert_eq!(corners.len(), 5);

        // Sort the centroids by angle around the vertex direction
        let tangent = axis.cross(if axis.x.abs() < 0.9 { Vec3::X } else { Vec3::Y }).normalize();
        let bitangent = axis.cross(tangent);
        let angle = |ci: u32| -> f32 {
            let d = centroids[ci as usize];
            d.dot(bitangent).atan2(d.dot(tangent))
        };
        corners.sort_by(|&a, &b| {
            angle(a)
                .partial_cmp(&angle(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Fan-triangulate, flipping if the winding faces inward
        for i in 1..4 {
            let (a, b, c) = (corners[0], corners[i], corners[i + 1]);
            let pa = centroids[a as usize];
            let n = (centroids[b as usize] - pa).cross(centroids[c as usize] - pa);
            if n.dot(axis) >= 0.0 {
                triangles.push([a, b, c]);
            } else {
                triangles.push([a, c, b]);
            }
        }
    }
    MeshData::flat_shaded(&centroids, &triangles)
}

/// The ten prize shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Cube,
    Sphere,
    Cone,
    Cylinder,
    Torus,
    Tetrahedron,
    Octahedron,
    Dodecahedron,
    Icosahedron,
    TorusKnot,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 10] = [
        ShapeKind::Cube,
        ShapeKind::Sphere,
        ShapeKind::Cone,
        ShapeKind::Cylinder,
        ShapeKind::Torus,
        ShapeKind::Tetrahedron,
        ShapeKind::Octahedron,
        ShapeKind::Dodecahedron,
        ShapeKind::Icosahedron,
        ShapeKind::TorusKnot,
    ];
}

/// Build the display mesh for a prize shape. `size` is the nominal
/// bounding size; per-kind ratios keep the shapes visually balanced.
pub fn shape_mesh(kind: ShapeKind, size: f32) -> MeshData {
    match kind {
        ShapeKind::Cube => cuboid(Vec3::splat(size / 2.0)),
        ShapeKind::Sphere => uv_sphere(size * 0.6, 16, 12),
        ShapeKind::Cone => cone(size * 0.6, size * 1.2, 16),
        ShapeKind::Cylinder => cylinder(size * 0.5, size, 16),
        ShapeKind::Torus => torus(size * 0.5, size * 0.2, 12, 16),
        ShapeKind::Tetrahedron => tetrahedron(size * 0.7),
        ShapeKind::Octahedron => octahedron(size * 0.7),
        ShapeKind::Dodecahedron => dodecahedron(size * 0.6),
        ShapeKind::Icosahedron => icosahedron(size * 0.6),
        ShapeKind::TorusKnot => torus_knot(size * 0.4, size * 0.15, 48, 8, 2.0, 3.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_mesh(mesh: &MeshData) {
        assert!(!mesh.vertices.is_empty());
        assert_eq!(mesh.indices.len() % 3, 0);
        for &i in &mesh.indices {
            assert!((i as usize) < mesh.vertices.len());
        }
        for v in &mesh.vertices {
            let n = Vec3::from(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-3, "non-unit normal {n:?}");
        }
    }

    #[test]
    fn every_shape_kind_builds_a_valid_mesh() {
        for kind in ShapeKind::ALL {
            let mesh = shape_mesh(kind, 0.25);
            check_mesh(&mesh);
        }
    }

    #[test]
    fn cuboid_has_six_quads() {
        let mesh = cuboid(Vec3::splat(0.5));
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn dodecahedron_has_twelve_pentagons() {
        let mesh = dodecahedron(1.0);
        // 12 pentagons, 3 triangles each, flat shaded
        assert_eq!(mesh.triangle_count(), 36);
        // Every vertex sits on the circumsphere
        for v in &mesh.vertices {
            let p = Vec3::from(v.position);
            assert!((p.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn polyhedra_face_outward() {
        for mesh in [tetrahedron(1.0), octahedron(1.0), icosahedron(1.0), dodecahedron(1.0)] {
            for tri in mesh.indices.chunks(3) {
                let a = Vec3::from(mesh.vertices[tri[0] as usize].position);
                let n = Vec3::from(mesh.vertices[tri[0] as usize].normal);
                // Face normal points away from the origin for convex solids
                assert!(n.dot(a) > 0.0, "inward-facing triangle at {a:?}");
            }
        }
    }

    #[test]
    fn curved_surfaces_wind_outward() {
        // With back-face culling on, a clockwise quad disappears; the
        // geometric normal of each triangle must agree with the stored
        // smooth normals.
        for mesh in [
            uv_sphere(1.0, 12, 8),
            cylinder(0.5, 1.0, 12),
            cone(0.5, 1.0, 12),
            torus(0.5, 0.2, 8, 12),
            torus_knot(0.5, 0.15, 32, 6, 2.0, 3.0),
        ] {
            for tri in mesh.indices.chunks(3) {
                let [a, b, c] = [
                    Vec3::from(mesh.vertices[tri[0] as usize].position),
                    Vec3::from(mesh.vertices[tri[1] as usize].position),
                    Vec3::from(mesh.vertices[tri[2] as usize].position),
                ];
                let geometric = (b - a).cross(c - a);
                if geometric.length() < 1e-9 {
                    continue;
                }
                let stored = Vec3::from(mesh.vertices[tri[0] as usize].normal)
                    + Vec3::from(mesh.vertices[tri[1] as usize].normal)
                    + Vec3::from(mesh.vertices[tri[2] as usize].normal);
                assert!(
                    geometric.dot(stored) > 0.0,
                    "clockwise triangle {tri:?} ({a:?} {b:?} {c:?})"
                );
            }
        }
    }

    #[test]
    fn sphere_pole_rows_are_single_fans() {
        let (sectors, stacks) = (12u32, 8u32);
        let mesh = uv_sphere(1.0, sectors, stacks);
        // One fan triangle per sector at each pole, two per quad between
        let expected = (sectors * (stacks - 2) * 2 + sectors * 2) as usize;
        assert_eq!(mesh.triangle_count(), expected);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [
                Vec3::from(mesh.vertices[tri[0] as usize].position),
                Vec3::from(mesh.vertices[tri[1] as usize].position),
                Vec3::from(mesh.vertices[tri[2] as usize].position),
            ];
            assert!(
                (b - a).cross(c - a).length() > 1e-6,
                "degenerate triangle {tri:?}"
            );
        }
    }

    #[test]
    fn sphere_positions_match_radius() {
        let mesh = uv_sphere(2.0, 8, 6);
        for v in &mesh.vertices {
            assert!((Vec3::from(v.position).length() - 2.0).abs() < 1e-4);
        }
    }
}
