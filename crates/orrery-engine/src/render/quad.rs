//! Shared sprite quad: two triangles, six vertices, unit size centered on
//! the origin. Every sprite draws this geometry; only the model matrix and
//! the bound texture differ.

pub const QUAD_VERTEX_COUNT: u32 = 6;

pub const QUAD_POSITIONS: [[f32; 2]; 6] = [
    [-0.5, -0.5],
    [0.5, -0.5],
    [0.5, 0.5],
    [-0.5, -0.5],
    [0.5, 0.5],
    [-0.5, 0.5],
];

/// Texture rows run top to bottom, so the quad's bottom edge samples `v = 1`.
pub const QUAD_TEX_COORDS: [[f32; 2]; 6] = [
    [0.0, 1.0],
    [1.0, 1.0],
    [1.0, 0.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [0.0, 0.0],
];
