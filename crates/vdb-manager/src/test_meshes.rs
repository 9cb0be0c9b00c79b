//! Column-blocked meshes shared by unit tests.

/// Axis-aligned cube of edge `side` centered at the origin.
///
/// Returns `(vertices, faces)` with one-based faces.
pub fn cube(side: f64) -> (Vec<f64>, Vec<f64>) {
    let h = side / 2.0;
    let corners = [
        [-h, -h, -h],
        [h, -h, -h],
        [h, h, -h],
        [-h, h, -h],
        [-h, -h, h],
        [h, -h, h],
        [h, h, h],
        [-h, h, h],
    ];
    let triangles: [[usize; 3]; 12] = [
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [2, 3, 7],
        [2, 7, 6],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];
    column_blocked(&corners, &triangles)
}

/// Lays out points and zero-based triangles as column-blocked buffers.
#[allow(clippy::cast_precision_loss)]
pub fn column_blocked(points: &[[f64; 3]], triangles: &[[usize; 3]]) -> (Vec<f64>, Vec<f64>) {
    let mut vertices = Vec::with_capacity(points.len() * 3);
    for axis in 0..3 {
        vertices.extend(points.iter().map(|p| p[axis]));
    }
    let mut faces = Vec::with_capacity(triangles.len() * 3);
    for corner in 0..3 {
        faces.extend(triangles.iter().map(|t| (t[corner] + 1) as f64));
    }
    (vertices, faces)
}
