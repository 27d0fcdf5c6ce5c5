//! # relic_math - Math Primitives
//!
//! Fixed-size numeric aggregates shared by the scene model and the save
//! codec: 2/3/4-component vectors, quaternions, 4x4 matrices and RGBA
//! colors. All components are `f32`; field order is part of the public
//! contract (the save stream writes fields in declaration order).

pub mod color;
pub mod matrix;
pub mod quaternion;
pub mod vector;

pub use color::*;
pub use matrix::*;
pub use quaternion::*;
pub use vector::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const TAU: f32 = PI * 2.0;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
    pub const EPSILON: f32 = 1e-6;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

/// Convert radians to degrees
#[inline]
pub fn degrees(radians: f32) -> f32 {
    radians * consts::RAD_TO_DEG
}
