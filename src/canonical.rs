//! Canonical triangle order
//!
//! Source libraries enumerate triangles in whatever order they like. To make
//! merged output byte-reproducible every triangle is rotated so its smallest
//! vertex index comes first, and the triangles are then sorted by their
//! index triples.
//!
//! Rotation keeps the winding. A later index only moves to the front when it
//! is strictly smaller than both others, so triangles with a tied minimum are
//! left as they are: `[2, 5, 2]` and even `[5, 2, 2]` stay unchanged.

use crate::model::Triangle;

/// Rotate `[i0, i1, i2]` so that the smallest index comes first
///
/// ```
/// use threemf_merge::canonical::canonicalize;
///
/// assert_eq!(canonicalize([7, 3, 5]), [3, 5, 7]);
/// assert_eq!(canonicalize([7, 5, 3]), [3, 7, 5]);
/// assert_eq!(canonicalize([2, 5, 2]), [2, 5, 2]);
/// ```
pub fn canonicalize(indices: [usize; 3]) -> [usize; 3] {
    let [i0, i1, i2] = indices;
    if i1 < i0 && i1 < i2 {
        [i1, i2, i0]
    } else if i2 < i0 && i2 < i1 {
        [i2, i0, i1]
    } else {
        indices
    }
}

/// Rotate a triangle in place, carrying per-vertex properties along
pub fn canonicalize_triangle(triangle: &mut Triangle) {
    let [i0, i1, i2] = triangle.indices();
    let shift = if i1 < i0 && i1 < i2 {
        1
    } else if i2 < i0 && i2 < i1 {
        2
    } else {
        return;
    };

    let mut vertices = [triangle.v1, triangle.v2, triangle.v3];
    let mut properties = [triangle.p1, triangle.p2, triangle.p3];
    vertices.rotate_left(shift);
    properties.rotate_left(shift);

    [triangle.v1, triangle.v2, triangle.v3] = vertices;
    [triangle.p1, triangle.p2, triangle.p3] = properties;
}

/// Canonicalize every triangle, then order them ascending by index triple
pub fn sort(triangles: &mut [Triangle]) {
    for triangle in triangles.iter_mut() {
        canonicalize_triangle(triangle);
    }
    triangles.sort_by_key(Triangle::indices);
}
