use glam::Vec3;

use super::mesh::DEFAULT_NORMAL;

/// Unnormalized face normal; its length is twice the triangle's area.
pub fn face_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    (v1 - v0).cross(v2 - v0)
}

/// Per-vertex normals as the area-weighted average of every face touching the
/// vertex. Vertices that no face references (or whose faces are degenerate)
/// fall back to the default up vector.
pub fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let normal = face_normal(positions[a], positions[b], positions[c]);
        normals[a] += normal;
        normals[b] += normal;
        normals[c] += normal;
    }

    for normal in &mut normals {
        *normal = normal.try_normalize().unwrap_or(DEFAULT_NORMAL);
    }
    normals
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn flat_quad_faces_up() {
        let positions = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, -1.0),
        ];
        let normals = compute_normals(&positions, &[0, 1, 2, 2, 3, 0]);

        for n in normals {
            assert_relative_eq!(n.x, 0.0);
            assert_relative_eq!(n.y, 1.0);
            assert_relative_eq!(n.z, 0.0);
        }
    }

    #[test]
    fn larger_face_dominates_shared_vertex() {
        // Vertex 0 is shared by a big +Z triangle and a small +X triangle.
        let positions = [
            Vec3::ZERO,
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(0.0, 4.0, 0.0),
            Vec3::new(0.0, 0.1, 0.0),
            Vec3::new(0.0, 0.0, 0.1),
        ];
        let normals = compute_normals(&positions, &[0, 1, 2, 0, 3, 4]);

        assert!(normals[0].z > normals[0].x);
        assert_relative_eq!(normals[0].length(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn unreferenced_vertex_gets_default() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::splat(9.0)];
        let normals = compute_normals(&positions, &[0, 1, 2]);
        assert_eq!(normals[3], DEFAULT_NORMAL);
    }
}
