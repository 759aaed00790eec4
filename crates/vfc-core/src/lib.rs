//! # vfc-core
//!
//! Core types for scanline video frame conversion.
//!
//! This crate provides the foundational types used throughout the VFC-RS
//! ecosystem:
//!
//! - [`PixelType`], [`PixelFormat`], [`ImageFormat`] - pixel and image metadata
//! - [`Filter`], [`FilterDescriptor`] - the line-buffered filter interface
//! - [`LineBuffer`] - ring-buffered scanline views
//! - [`AlignedVec`] - 64-byte aligned allocation for coefficient tables and
//!   scratch memory
//! - [`CpuClass`], [`query_features`] - runtime CPU capability dispatch
//!
//! ## Crate Structure
//!
//! This crate is the foundation of VFC-RS and has no internal dependencies.
//! All other VFC-RS crates depend on `vfc-core`:
//!
//! ```text
//! vfc-core (this crate)
//!    ^
//!    |
//!    +-- vfc-math (matrices for colorimetry)
//!    +-- vfc-resize (polyphase resamplers)
//!    +-- vfc-depth (depth conversion and dithering)
//!    +-- vfc-color (colorspace conversion)
//!    +-- vfc-graph (filter graph engine and builder)
//! ```

#![warn(missing_docs)]

pub mod alloc;
pub mod cpu;
pub mod error;
pub mod filter;
pub mod linebuf;
pub mod numeric;
pub mod pixel;

pub use alloc::{AlignedVec, ALIGNMENT};
pub use cpu::{query_features, CpuClass, CpuFeatures, KernelTier};
pub use error::{CoreError, CoreResult};
pub use filter::{Filter, FilterDescriptor, FilterFlags, PlaneDescriptor, MAX_PLANES};
pub use linebuf::{select_buffer_mask, LineBuffer, BUFFER_MAX};
pub use pixel::{
    AlphaType, ChromaLocation, ColorFamily, ColorPrimaries, ColorRange, DitherType, FieldParity,
    ImageFormat, MatrixCoefficients, PixelFormat, PixelType, TransferCharacteristics,
};
