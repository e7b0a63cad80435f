// SPDX-License-Identifier: GPL-3.0-only

//! Model-view-projection for the preview quad
//!
//! Matrices are column-major `[f32; 16]`, the layout WGSL expects for a
//! `mat4x4<f32>` uniform. Projection follows the OpenGL conventions
//! (clip z in `-w..w`) and is remapped to wgpu's `0..w` depth range.

/// Column-major 4x4 matrix
pub type Mat4 = [f32; 16];

/// Near plane of the preview frustum
pub const NEAR: f32 = 3.0;
/// Far plane of the preview frustum
pub const FAR: f32 = 7.0;
/// Camera position; the quad sits at the origin on the near plane
pub const EYE: [f32; 3] = [0.0, 0.0, -3.0];

pub const IDENTITY: Mat4 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Maps OpenGL clip z (`-w..w`) to wgpu clip z (`0..w`)
pub const OPENGL_TO_WGPU: Mat4 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.5, 0.0, //
    0.0, 0.0, 0.5, 1.0,
];

/// `a * b`
pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [0.0; 16];
    for col in 0..4 {
        for row in 0..4 {
            out[col * 4 + row] = (0..4).map(|k| a[k * 4 + row] * b[col * 4 + k]).sum();
        }
    }
    out
}

/// Transform a point `[x, y, z, w]`
pub fn transform(m: &Mat4, v: [f32; 4]) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (row, value) in out.iter_mut().enumerate() {
        *value = (0..4).map(|k| m[k * 4 + row] * v[k]).sum();
    }
    out
}

/// Perspective frustum, same as `glFrustum`
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let mut m = [0.0; 16];
    m[0] = 2.0 * near / (right - left);
    m[5] = 2.0 * near / (top - bottom);
    m[8] = (right + left) / (right - left);
    m[9] = (top + bottom) / (top - bottom);
    m[10] = -(far + near) / (far - near);
    m[11] = -1.0;
    m[14] = -2.0 * far * near / (far - near);
    m
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = dot(v, v).sqrt();
    if len == 0.0 {
        return v;
    }
    [v[0] / len, v[1] / len, v[2] / len]
}

/// Right-handed view matrix, same as `gluLookAt`
pub fn look_at(eye: [f32; 3], center: [f32; 3], up: [f32; 3]) -> Mat4 {
    let f = normalize(sub(center, eye));
    let s = normalize(cross(f, up));
    let u = cross(s, f);
    let (tx, ty, tz) = (-dot(s, eye), -dot(u, eye), dot(f, eye));

    [
        s[0], u[0], -f[0], 0.0, //
        s[1], u[1], -f[1], 0.0, //
        s[2], u[2], -f[2], 0.0, //
        tx, ty, tz, 1.0,
    ]
}

/// Flip X in model space
pub const MIRROR_X: Mat4 = [
    -1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Full preview transform for a surface of the given aspect ratio.
///
/// Looking down +Z from behind the quad mirrors X, which is the selfie
/// orientation. `mirrored = false` undoes that flip in model space.
pub fn preview_mvp(aspect: f32, mirrored: bool) -> Mat4 {
    let projection = frustum(-aspect, aspect, -1.0, 1.0, NEAR, FAR);
    let view = look_at(EYE, [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
    let model = if mirrored { IDENTITY } else { MIRROR_X };
    multiply(
        &OPENGL_TO_WGPU,
        &multiply(&projection, &multiply(&view, &model)),
    )
}
