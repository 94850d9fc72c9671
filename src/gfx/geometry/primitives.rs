//! # Primitive Shape Generation
//!
//! Procedural shapes appended to a [`MeshBuilder`]. Every shape writes its
//! triangles counter-clockwise when seen from the side its normals face.

use std::collections::HashMap;

use cgmath::{InnerSpace, Vector2, Vector3};

use super::{mesh::MeshBuilder, vertex::VertexPosNormTexCol};

#[rustfmt::skip]
const ICOSAHEDRON_FACES: [[u32; 3]; 20] = [
    [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
    [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
    [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
    [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
];

/// Adds a flat quad centred on `center`
///
/// `tangent` runs along the U axis and `scale` is the full size along the
/// tangent and bitangent (`normal x tangent`). UVs span 0..1 across the quad.
pub fn add_plane(
    builder: &mut MeshBuilder,
    center: Vector3<f32>,
    normal: Vector3<f32>,
    tangent: Vector3<f32>,
    scale: Vector2<f32>,
    color: [f32; 4],
) {
    let normal = normal.normalize();
    // Re-orthogonalise in case the tangent is not quite perpendicular
    let tangent = (tangent - normal * tangent.dot(normal)).normalize();
    let bitangent = normal.cross(tangent);
    let half_u = tangent * (scale.x / 2.0);
    let half_v = bitangent * (scale.y / 2.0);

    let corners = [
        (center - half_u - half_v, [0.0, 0.0]),
        (center + half_u - half_v, [1.0, 0.0]),
        (center + half_u + half_v, [1.0, 1.0]),
        (center - half_u + half_v, [0.0, 1.0]),
    ];
    let mut indices = [0u32; 4];
    for (slot, (position, uv)) in indices.iter_mut().zip(corners) {
        *slot = builder.add_vertex(VertexPosNormTexCol::new(
            position.into(),
            normal.into(),
            uv,
            color,
        ));
    }
    builder.add_index_tri(indices[0], indices[1], indices[2]);
    builder.add_index_tri(indices[0], indices[2], indices[3]);
}

/// Adds an axis-aligned box with one quad per face
pub fn add_cube(
    builder: &mut MeshBuilder,
    center: Vector3<f32>,
    size: Vector3<f32>,
    color: [f32; 4],
) {
    let faces = [
        (Vector3::unit_x(), Vector3::unit_y()),
        (-Vector3::unit_x(), -Vector3::unit_y()),
        (Vector3::unit_y(), -Vector3::unit_x()),
        (-Vector3::unit_y(), Vector3::unit_x()),
        (Vector3::unit_z(), Vector3::unit_x()),
        (-Vector3::unit_z(), -Vector3::unit_x()),
    ];
    let extent = |axis: Vector3<f32>| {
        axis.x.abs() * size.x + axis.y.abs() * size.y + axis.z.abs() * size.z
    };
    for (normal, tangent) in faces {
        let bitangent = normal.cross(tangent);
        add_plane(
            builder,
            center + normal * (extent(normal) / 2.0),
            normal,
            tangent,
            Vector2::new(extent(tangent), extent(bitangent)),
            color,
        );
    }
}

/// Adds a subdivided icosahedron projected onto a sphere
///
/// Each subdivision splits every triangle into four. Shared edges reuse the
/// same midpoint vertex so the sphere stays watertight.
pub fn add_ico_sphere(
    builder: &mut MeshBuilder,
    center: Vector3<f32>,
    radius: f32,
    subdivisions: u32,
    color: [f32; 4],
) {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    let mut directions: Vec<Vector3<f32>> = [
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ]
    .iter()
    .map(|p| Vector3::from(*p).normalize())
    .collect();
    let mut faces = ICOSAHEDRON_FACES.to_vec();

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, directions: &mut Vec<Vector3<f32>>| {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let mid = (directions[a as usize] + directions[b as usize]).normalize();
                directions.push(mid);
                (directions.len() - 1) as u32
            })
        };
        let mut next = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let ab = midpoint(a, b, &mut directions);
            let bc = midpoint(b, c, &mut directions);
            let ca = midpoint(c, a, &mut directions);
            next.extend_from_slice(&[[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
        }
        faces = next;
    }

    let base = builder.vertex_count() as u32;
    for direction in &directions {
        let uv = [
            0.5 + direction.y.atan2(direction.x) / (2.0 * std::f32::consts::PI),
            0.5 + direction.z.clamp(-1.0, 1.0).asin() / std::f32::consts::PI,
        ];
        builder.add_vertex(VertexPosNormTexCol::new(
            (center + direction * radius).into(),
            (*direction).into(),
            uv,
            color,
        ));
    }
    for [a, b, c] in faces {
        builder.add_index_tri(base + a, base + b, base + c);
    }
}

/// Reverses triangle winding and flips normals so the inside faces outward
pub fn invert_faces(builder: &mut MeshBuilder) {
    for triangle in builder.indices_mut().chunks_exact_mut(3) {
        triangle.swap(1, 2);
    }
    for vertex in builder.vertices_mut() {
        vertex.normal = vertex.normal.map(|n| -n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const WHITE: [f32; 4] = [1.0; 4];

    fn triangle_normal(builder: &MeshBuilder, tri: usize) -> Vector3<f32> {
        let idx = &builder.indices()[tri * 3..tri * 3 + 3];
        let p = |i: u32| Vector3::from(builder.vertices()[i as usize].position);
        (p(idx[1]) - p(idx[0])).cross(p(idx[2]) - p(idx[0]))
    }

    #[test]
    fn test_ground_plane_extent_and_winding() {
        let mut builder = MeshBuilder::new();
        add_plane(
            &mut builder,
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::unit_z(),
            Vector3::unit_x(),
            Vector2::new(25.0, 25.0),
            WHITE,
        );
        assert_eq!(builder.vertex_count(), 4);
        assert_eq!(builder.triangle_count(), 2);
        assert_eq!(builder.vertices()[0].position, [-12.5, -12.5, 0.0]);
        assert_eq!(builder.vertices()[2].position, [12.5, 12.5, 0.0]);
        for tri in 0..2 {
            assert!(triangle_normal(&builder, tri).z > 0.0);
        }
    }

    #[test]
    fn test_cube_faces_point_outward() {
        let mut builder = MeshBuilder::new();
        add_cube(
            &mut builder,
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 2.0, 3.0),
            WHITE,
        );
        assert_eq!(builder.vertex_count(), 24);
        assert_eq!(builder.triangle_count(), 12);
        for tri in 0..12 {
            let idx = builder.indices()[tri * 3] as usize;
            let outward = Vector3::from(builder.vertices()[idx].normal);
            assert!(triangle_normal(&builder, tri).dot(outward) > 0.0);
        }
        let max_z = builder
            .vertices()
            .iter()
            .map(|v| v.position[2])
            .fold(f32::MIN, f32::max);
        assert_relative_eq!(max_z, 1.5);
    }

    #[test]
    fn test_ico_sphere_counts_and_radius() {
        let mut builder = MeshBuilder::new();
        add_ico_sphere(&mut builder, Vector3::new(1.0, 0.0, 0.0), 2.0, 1, WHITE);
        assert_eq!(builder.vertex_count(), 42);
        assert_eq!(builder.triangle_count(), 80);
        for vertex in builder.vertices() {
            let offset = Vector3::from(vertex.position) - Vector3::new(1.0, 0.0, 0.0);
            assert_relative_eq!(offset.magnitude(), 2.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_invert_faces_turns_sphere_inside_out() {
        let mut builder = MeshBuilder::new();
        add_ico_sphere(&mut builder, Vector3::new(0.0, 0.0, 0.0), 1.0, 0, WHITE);
        invert_faces(&mut builder);
        for tri in 0..builder.triangle_count() {
            let idx = builder.indices()[tri * 3] as usize;
            let position = Vector3::from(builder.vertices()[idx].position);
            assert!(triangle_normal(&builder, tri).dot(position) < 0.0);
            assert!(Vector3::from(builder.vertices()[idx].normal).dot(position) < 0.0);
        }
    }
}
