//! # vfc-math
//!
//! Small linear-algebra types for colorimetry derivations.
//!
//! Colorspace matrices (YUV<->RGB, RGB<->XYZ, gamut conversion) are derived
//! in double precision and narrowed to `f32` only when baked into a kernel
//! operation, so that fused matrix products and inverses stay exact to the
//! working precision of the derivation.
//!
//! # Types
//!
//! - [`Vec3`] - 3-component f64 vector
//! - [`Mat3`] - row-major 3x3 f64 matrix with determinant and inverse

#![warn(missing_docs)]

pub mod mat3;
pub mod vec3;

pub use mat3::Mat3;
pub use vec3::Vec3;
