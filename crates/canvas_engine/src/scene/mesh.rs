//! Mesh representation and procedural primitives
//!
//! Meshes are plain CPU-side geometry. The gizmo shapes build both their
//! visible meshes and their collision triangle soups from the generators in
//! this module, so every generator emits an indexed triangle list with
//! consistent winding and outward normals.
//!
//! All generators are centered on the origin. Round primitives (cylinder,
//! cone, torus) are built around the Y axis.

use std::f32::consts::TAU;

use crate::foundation::math::Vec3;

/// 3D vertex data structure for rendering
///
/// `#[repr(C)]` keeps the layout stable for GPU buffer uploads.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in 3D space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// How the index buffer is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveTopology {
    /// Every three indices form a triangle
    #[default]
    Triangles,
    /// Every two indices form a line segment
    Lines,
    /// Every index is a point
    Points,
}

/// 3D mesh containing vertices and indices
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Index data
    pub indices: Vec<u32>,

    /// Index interpretation
    pub topology: PrimitiveTopology,
}

impl Mesh {
    /// Create a new triangle mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            topology: PrimitiveTopology::Triangles,
        }
    }

    /// Whether the mesh has no drawable geometry
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Vertex position as a vector
    pub fn position(&self, index: u32) -> Vec3 {
        let p = self.vertices[index as usize].position;
        Vec3::new(p[0], p[1], p[2])
    }

    /// Iterate the triangles of a triangle mesh
    ///
    /// Yields nothing for other topologies. Triangles referencing indices out of
    /// range are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        let count = if self.topology == PrimitiveTopology::Triangles {
            self.indices.len() / 3
        } else {
            0
        };
        let vertex_count = self.vertices.len() as u32;
        (0..count).filter_map(move |t| {
            let i = &self.indices[t * 3..t * 3 + 3];
            if i.iter().any(|&idx| idx >= vertex_count) {
                return None;
            }
            Some([self.position(i[0]), self.position(i[1]), self.position(i[2])])
        })
    }

    /// Axis-aligned cube with the given half extents
    pub fn cube(half_extents: Vec3) -> Self {
        let h = half_extents;
        // (normal, tangent u, tangent v) per face
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (n, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = [
                    (n[0] + u[0] * su + v[0] * sv) * h.x,
                    (n[1] + u[1] * su + v[1] * sv) * h.y,
                    (n[2] + u[2] * su + v[2] * sv) * h.z,
                ];
                vertices.push(Vertex::new(p, n, [(su + 1.0) * 0.5, (sv + 1.0) * 0.5]));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(vertices, indices)
    }

    /// Quad in the XZ plane facing +Y
    pub fn plane(half_width: f32, half_depth: f32) -> Self {
        let n = [0.0, 1.0, 0.0];
        let vertices = vec![
            Vertex::new([-half_width, 0.0, half_depth], n, [0.0, 0.0]),
            Vertex::new([half_width, 0.0, half_depth], n, [1.0, 0.0]),
            Vertex::new([half_width, 0.0, -half_depth], n, [1.0, 1.0]),
            Vertex::new([-half_width, 0.0, -half_depth], n, [0.0, 1.0]),
        ];
        Self::new(vertices, vec![0, 1, 2, 0, 2, 3])
    }

    /// Capped frustum of a cone around the Y axis
    ///
    /// `base_radius` is at y = -height/2, `peak_radius` at y = +height/2. A
    /// peak radius of zero produces a cone.
    pub fn frustum(base_radius: f32, peak_radius: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let half = height * 0.5;
        let slope = (base_radius - peak_radius) / height.max(f32::EPSILON);

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // side wall
        for i in 0..=segments {
            let theta = i as f32 / segments as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            let normal = Vec3::new(sin, slope, cos).normalize();
            let n = [normal.x, normal.y, normal.z];
            let u = i as f32 / segments as f32;
            vertices.push(Vertex::new([sin * base_radius, -half, cos * base_radius], n, [u, 0.0]));
            vertices.push(Vertex::new([sin * peak_radius, half, cos * peak_radius], n, [u, 1.0]));
        }
        for i in 0..segments {
            let b0 = i * 2;
            let t0 = b0 + 1;
            let b1 = b0 + 2;
            let t1 = b0 + 3;
            indices.extend_from_slice(&[b0, b1, t0, t0, b1, t1]);
        }

        // caps
        for (y, radius, up) in [(-half, base_radius, -1.0f32), (half, peak_radius, 1.0f32)] {
            if radius <= 0.0 {
                continue;
            }
            let n = [0.0, up, 0.0];
            let center = vertices.len() as u32;
            vertices.push(Vertex::new([0.0, y, 0.0], n, [0.5, 0.5]));
            for i in 0..=segments {
                let theta = i as f32 / segments as f32 * TAU;
                let (sin, cos) = theta.sin_cos();
                vertices.push(Vertex::new(
                    [sin * radius, y, cos * radius],
                    n,
                    [sin * 0.5 + 0.5, cos * 0.5 + 0.5],
                ));
            }
            for i in 0..segments {
                let a = center + 1 + i;
                let b = a + 1;
                if up > 0.0 {
                    indices.extend_from_slice(&[center, a, b]);
                } else {
                    indices.extend_from_slice(&[center, b, a]);
                }
            }
        }

        Self::new(vertices, indices)
    }

    /// Capped cylinder around the Y axis
    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Self {
        Self::frustum(radius, radius, height, segments)
    }

    /// Cone around the Y axis with its tip at +Y
    pub fn cone(radius: f32, height: f32, segments: u32) -> Self {
        Self::frustum(radius, 0.0, height, segments)
    }

    /// UV sphere
    pub fn sphere(radius: f32, latitude_bands: u32, longitude_bands: u32) -> Self {
        let lat = latitude_bands.max(2);
        let lon = longitude_bands.max(3);
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for i in 0..=lat {
            let theta = i as f32 * std::f32::consts::PI / lat as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            for j in 0..=lon {
                let phi = j as f32 * TAU / lon as f32;
                let (sin_phi, cos_phi) = phi.sin_cos();
                let n = [cos_phi * sin_theta, cos_theta, sin_phi * sin_theta];
                vertices.push(Vertex::new(
                    [n[0] * radius, n[1] * radius, n[2] * radius],
                    n,
                    [j as f32 / lon as f32, i as f32 / lat as f32],
                ));
            }
        }
        for i in 0..lat {
            for j in 0..lon {
                let first = i * (lon + 1) + j;
                let second = first + lon + 1;
                indices.extend_from_slice(&[first + 1, second, first, first + 1, second + 1, second]);
            }
        }

        Self::new(vertices, indices)
    }

    /// Torus (or torus sector) lying in the XZ plane around the Y axis
    ///
    /// `sector_angle` is in degrees; 360 produces a closed ring.
    pub fn torus(tube_radius: f32, ring_radius: f32, sector_angle: f32, segments: u32, sides: u32) -> Self {
        let segments = segments.max(3);
        let sides = sides.max(3);
        let sector = sector_angle.to_radians();
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for i in 0..=sides {
            let v = i as f32 / sides as f32 * TAU;
            let (sin_v, cos_v) = v.sin_cos();
            for j in 0..=segments {
                let u = j as f32 / segments as f32 * sector;
                let (sin_u, cos_u) = u.sin_cos();
                let r = ring_radius + tube_radius * cos_v;
                let position = [cos_u * r, sin_v * tube_radius, sin_u * r];
                let normal = [cos_u * cos_v, sin_v, sin_u * cos_v];
                vertices.push(Vertex::new(
                    position,
                    normal,
                    [j as f32 / segments as f32, i as f32 / sides as f32],
                ));
            }
        }
        for i in 0..sides {
            for j in 0..segments {
                let first = i * (segments + 1) + j;
                let second = (i + 1) * (segments + 1) + j;
                indices.extend_from_slice(&[first, second, first + 1, second, second + 1, first + 1]);
            }
        }

        Self::new(vertices, indices)
    }
}
