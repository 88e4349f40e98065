//! Static quad geometry drawn by the compositor.
//!
//! The quad covers clip space and is never modified. Orientation is only
//! ever corrected through the per-frame coordinate transform.

/// Number of floats per vertex in both the position and texture streams.
pub const COORDS_PER_VERTEX: i32 = 2;

/// Byte stride between consecutive vertices.
pub const VERTEX_STRIDE: i32 = COORDS_PER_VERTEX * 4;

/// Clip-space corners: top-left, bottom-left, bottom-right, top-right.
pub const QUAD_POSITIONS: [f32; 8] = [
    -1.0, 1.0, //
    -1.0, -1.0, //
    1.0, -1.0, //
    1.0, 1.0,
];

/// Texture coordinates for a non-rotated, non-mirrored source.
pub const QUAD_TEX_COORDS: [f32; 8] = [
    0.0, 1.0, //
    1.0, 1.0, //
    1.0, 0.0, //
    0.0, 0.0,
];

/// Two triangles: {0, 1, 2} and {0, 2, 3}.
pub const DRAW_ORDER: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Returns the clip-space triangles traced by [`DRAW_ORDER`].
#[must_use]
pub fn triangles() -> [[[f32; 2]; 3]; 2] {
    let vertex = |i: u16| {
        let i = usize::from(i) * 2;
        [QUAD_POSITIONS[i], QUAD_POSITIONS[i + 1]]
    };
    let mut tris = [[[0.0; 2]; 3]; 2];
    for (t, tri) in tris.iter_mut().enumerate() {
        for (c, corner) in tri.iter_mut().enumerate() {
            *corner = vertex(DRAW_ORDER[t * 3 + c]);
        }
    }
    tris
}

/// Signed area of a 2-D triangle (positive when counter-clockwise).
#[must_use]
pub fn signed_area(tri: &[[f32; 2]; 3]) -> f32 {
    let [a, b, c] = tri;
    0.5 * ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]))
}
